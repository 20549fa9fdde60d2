//! gpsd client speaking the JSON protocol over TCP.
//!
//! The provider connects lazily, enables watching once, and then sends a
//! `?POLL;` per sample. gpsd answers with a `POLL` object holding the most
//! recent `TPV` report of every device; the best report that satisfies the
//! requested accuracy becomes the fix.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::PositionProvider;
use crate::common::constants::{GPSD_CONNECT_TIMEOUT_MS, GPSD_READ_TIMEOUT_MS};
use crate::error::SourceError;
use crate::geo::Position;
use crate::source::AccuracyTier;

const WATCH_COMMAND: &[u8] = b"?WATCH={\"enable\":true};\n";
const POLL_COMMAND: &[u8] = b"?POLL;\n";

// gpsd interleaves VERSION, DEVICES and WATCH objects with replies
const MAX_LINES_PER_POLL: usize = 32;

#[derive(Debug, Deserialize)]
struct GpsdMessage {
    class: String,
    #[serde(default)]
    tpv: Vec<TpvReport>,
}

#[derive(Debug, Deserialize)]
struct TpvReport {
    #[serde(default)]
    mode: u8,
    lat: Option<f64>,
    lon: Option<f64>,
    time: Option<String>,
}

pub struct GpsdProvider {
    address: String,
    debug_enabled: bool,
    connection: Option<BufReader<TcpStream>>,
}

impl GpsdProvider {
    pub fn new(address: impl Into<String>, debug_enabled: bool) -> Self {
        Self {
            address: address.into(),
            debug_enabled,
            connection: None,
        }
    }

    fn unavailable(&self, reason: impl Into<String>) -> SourceError {
        SourceError::Unavailable {
            provider: "gpsd".to_string(),
            reason: reason.into(),
        }
    }

    fn map_io_error(&self, err: std::io::Error) -> SourceError {
        match err.kind() {
            ErrorKind::PermissionDenied => SourceError::PermissionDenied {
                provider: "gpsd".to_string(),
            },
            ErrorKind::WouldBlock | ErrorKind::TimedOut => {
                self.unavailable(format!("no reply from {}", self.address))
            }
            _ => self.unavailable(err.to_string()),
        }
    }

    fn resolve(&self) -> Result<SocketAddr, SourceError> {
        self.address
            .to_socket_addrs()
            .map_err(|e| self.unavailable(format!("cannot resolve {}: {}", self.address, e)))?
            .next()
            .ok_or_else(|| self.unavailable(format!("no address for {}", self.address)))
    }

    fn connect(&mut self) -> Result<(), SourceError> {
        if self.connection.is_some() {
            return Ok(());
        }

        let addr = self.resolve()?;
        let stream = TcpStream::connect_timeout(&addr, Duration::from_millis(GPSD_CONNECT_TIMEOUT_MS))
            .map_err(|e| self.map_io_error(e))?;
        stream
            .set_read_timeout(Some(Duration::from_millis(GPSD_READ_TIMEOUT_MS)))
            .map_err(|e| self.map_io_error(e))?;

        let mut reader = BufReader::new(stream);
        reader
            .get_mut()
            .write_all(WATCH_COMMAND)
            .map_err(|e| self.map_io_error(e))?;

        if self.debug_enabled {
            log_pipe!();
            log_debug!("Connected to gpsd at {}", self.address);
        }

        self.connection = Some(reader);
        Ok(())
    }

    fn poll(&mut self, accuracy: AccuracyTier) -> Result<Option<Position>, SourceError> {
        let Some(reader) = self.connection.as_mut() else {
            return Err(self.unavailable("not connected"));
        };

        let result = (|| -> std::io::Result<Option<String>> {
            reader.get_mut().write_all(POLL_COMMAND)?;
            for _ in 0..MAX_LINES_PER_POLL {
                let mut line = String::new();
                if reader.read_line(&mut line)? == 0 {
                    return Err(std::io::Error::new(
                        ErrorKind::UnexpectedEof,
                        "gpsd closed the connection",
                    ));
                }
                if line.contains("\"class\":\"POLL\"") {
                    return Ok(Some(line));
                }
            }
            Ok(None)
        })();

        match result {
            Ok(Some(line)) => Ok(select_fix(&line, accuracy)),
            Ok(None) => {
                // A late reply must not be read as the answer to the next poll
                self.connection = None;
                if self.debug_enabled {
                    log_pipe!();
                    log_debug!("No POLL reply from gpsd, reconnecting on the next sample");
                }
                Ok(None)
            }
            Err(e) => {
                // Reconnect on the next sample
                self.connection = None;
                Err(self.map_io_error(e))
            }
        }
    }
}

/// Pick the freshest TPV report in a POLL reply that meets `accuracy`.
fn select_fix(line: &str, accuracy: AccuracyTier) -> Option<Position> {
    let message: GpsdMessage = serde_json::from_str(line.trim()).ok()?;
    if message.class != "POLL" {
        return None;
    }

    message
        .tpv
        .iter()
        .filter(|report| report.mode >= accuracy.minimum_fix_mode())
        .filter_map(|report| {
            let timestamp = report
                .time
                .as_deref()
                .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
                .map(|t| t.with_timezone(&Utc))
                .unwrap_or_else(Utc::now);
            Position::new(report.lat?, report.lon?, timestamp).ok()
        })
        .max_by_key(|position| position.timestamp)
}

impl PositionProvider for GpsdProvider {
    fn name(&self) -> &str {
        "gpsd"
    }

    fn current_fix(&mut self, accuracy: AccuracyTier) -> Result<Option<Position>, SourceError> {
        self.connect()?;
        let fix = self.poll(accuracy)?;

        if self.debug_enabled && fix.is_none() {
            log_pipe!();
            log_debug!("gpsd has no {} accuracy fix yet", accuracy.as_str());
        }

        Ok(fix)
    }

    fn release(&mut self) {
        if let Some(mut reader) = self.connection.take() {
            let _ = reader
                .get_mut()
                .write_all(b"?WATCH={\"enable\":false};\n");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    const POLL_REPLY: &str = r#"{"class":"POLL","time":"2024-05-01T10:00:02.000Z","active":2,"tpv":[{"class":"TPV","device":"/dev/ttyUSB0","mode":2,"time":"2024-05-01T10:00:01.000Z","lat":28.5800,"lon":77.3596},{"class":"TPV","device":"/dev/ttyACM0","mode":3,"time":"2024-05-01T10:00:00.000Z","lat":28.5782472,"lon":77.3596155}],"sky":[]}"#;

    #[test]
    fn test_select_fix_honors_accuracy() {
        let high = select_fix(POLL_REPLY, AccuracyTier::High).unwrap();
        assert_eq!(high.latitude, 28.5782472);

        // Balanced accepts the newer 2D fix
        let balanced = select_fix(POLL_REPLY, AccuracyTier::Balanced).unwrap();
        assert_eq!(balanced.latitude, 28.5800);
    }

    #[test]
    fn test_select_fix_ignores_reports_without_coordinates() {
        let reply = r#"{"class":"POLL","tpv":[{"class":"TPV","mode":1}]}"#;
        assert!(select_fix(reply, AccuracyTier::Low).is_none());
        assert!(select_fix("not json", AccuracyTier::Low).is_none());
    }

    #[test]
    fn test_refused_connection_is_unavailable() {
        // Bind and drop to get a port with nothing listening
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();

        let mut provider = GpsdProvider::new(format!("127.0.0.1:{port}"), false);
        let err = provider.current_fix(AccuracyTier::High).unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_polls_fake_gpsd() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let server = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut writer = stream;
            let mut line = String::new();

            reader.read_line(&mut line).unwrap();
            assert!(line.starts_with("?WATCH"));
            writer
                .write_all(b"{\"class\":\"DEVICES\",\"devices\":[]}\n")
                .unwrap();

            line.clear();
            reader.read_line(&mut line).unwrap();
            assert!(line.starts_with("?POLL"));
            writer.write_all(POLL_REPLY.as_bytes()).unwrap();
            writer.write_all(b"\n").unwrap();
        });

        let mut provider = GpsdProvider::new(address, false);
        let fix = provider.current_fix(AccuracyTier::High).unwrap().unwrap();
        assert_eq!(fix.longitude, 77.3596155);

        provider.release();
        server.join().unwrap();
    }

    #[test]
    fn test_missing_poll_reply_forces_reconnect() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let server = std::thread::spawn(move || {
            // First connection: the reply is buried behind unrelated reports
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut writer = stream;
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            line.clear();
            reader.read_line(&mut line).unwrap();
            assert!(line.starts_with("?POLL"));
            for _ in 0..MAX_LINES_PER_POLL {
                writer.write_all(b"{\"class\":\"SKY\",\"satellites\":[]}\n").unwrap();
            }
            writer.write_all(POLL_REPLY.as_bytes()).unwrap();
            writer.write_all(b"\n").unwrap();

            // Second connection answers straight away
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut writer = stream;
            line.clear();
            reader.read_line(&mut line).unwrap();
            assert!(line.starts_with("?WATCH"));
            line.clear();
            reader.read_line(&mut line).unwrap();
            assert!(line.starts_with("?POLL"));
            writer.write_all(POLL_REPLY.as_bytes()).unwrap();
            writer.write_all(b"\n").unwrap();
        });

        let mut provider = GpsdProvider::new(address, false);
        assert_eq!(provider.current_fix(AccuracyTier::High).unwrap(), None);
        assert!(provider.connection.is_none());

        let fix = provider.current_fix(AccuracyTier::High).unwrap().unwrap();
        assert_eq!(fix.latitude, 28.5782472);

        provider.release();
        server.join().unwrap();
    }
}
