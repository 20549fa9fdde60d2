//! Structured logging with box-drawing output.
//!
//! Every line geofencer prints goes through this module so the daemon output
//! keeps one visual shape:
//!
//! ```text
//! ┏ geofencer v0.3.0 ━━╸
//! ┃
//! ┣ Monitoring region
//! ┃   Center: 28.578247°N, 77.359616°E
//! ┃   Radius: 100 m
//! ┣[INFO] Entered location
//! ╹
//! ```
//!
//! ## Conventions
//!
//! - `log_block_start!` opens a new conceptual block (blank pipe, then `┣ message`).
//! - `log_decorated!` continues a block with `┣ message`.
//! - `log_indented!` prints nested details as `┃   message`.
//! - `log_pipe!` inserts a bare `┃`, normally before a semantic message
//!   (`log_info!`, `log_warning!`, `log_error!`, `log_debug!`, `log_critical!`).
//! - `log_version!` prints the startup header, `log_end!` the final `╹`.
//!
//! Output can be redirected to a file (ANSI codes stripped) through a writer
//! thread, and silenced completely with [`Log::set_enabled`].

use std::io::Write;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Sender, channel};

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);
static TIMESTAMPS_ENABLED: AtomicBool = AtomicBool::new(false);

// Set once when --log is active
static LOG_CHANNEL: OnceLock<Sender<LogMessage>> = OnceLock::new();

enum LogMessage {
    Formatted(String),
    Shutdown,
}

/// Line shapes produced by the logging macros.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Decorated,
    Indented,
    BlockStart,
    Warning,
    WarningStandalone,
    Error,
    ErrorStandalone,
    ErrorExit,
    Info,
    Debug,
    Critical,
}

/// Main logging interface.
pub struct Log;

impl Log {
    /// Enable or disable all output.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Prefix every line with the local wall-clock time.
    ///
    /// Used for debug runs and replays where the order of samples, transitions
    /// and display updates matters more than the visual block layout.
    pub fn set_timestamps(enabled: bool) {
        TIMESTAMPS_ENABLED.store(enabled, Ordering::SeqCst);
    }

    /// Route all further output to `file_path` until the guard is dropped.
    pub fn start_file_logging(file_path: String) -> anyhow::Result<LoggerGuard> {
        let (tx, rx) = channel();

        LOG_CHANNEL
            .set(tx.clone())
            .map_err(|_| anyhow::anyhow!("Logger channel already initialized"))?;

        let handle = std::thread::Builder::new()
            .name("geofencer-log".to_string())
            .spawn(move || {
                let mut file = std::fs::File::create(&file_path)?;

                loop {
                    match rx.recv() {
                        Ok(LogMessage::Formatted(text)) => {
                            file.write_all(text.as_bytes())?;
                        }
                        Ok(LogMessage::Shutdown) | Err(_) => {
                            file.flush()?;
                            break;
                        }
                    }
                }

                Ok::<(), anyhow::Error>(())
            })?;

        Ok(LoggerGuard {
            tx,
            handle: Some(handle),
        })
    }

    /// Timestamp prefix for the current line, empty unless enabled.
    pub fn timestamp_prefix() -> String {
        if TIMESTAMPS_ENABLED.load(Ordering::SeqCst) {
            format!("[{}] ", chrono::Local::now().format("%H:%M:%S"))
        } else {
            String::new()
        }
    }

    /// Format and write one line. Called by the macros.
    pub fn emit(kind: LineKind, message: &str) {
        if !Self::is_enabled() {
            return;
        }
        let prefix = Self::timestamp_prefix();
        write_output(&format_line(&prefix, kind, message));
    }

    /// Write a fixed marker line (`┃`, `╹`, version header).
    pub fn emit_raw(marker: &str) {
        if !Self::is_enabled() {
            return;
        }
        let prefix = Self::timestamp_prefix();
        write_output(&format!("{prefix}{marker}\n"));
    }
}

fn format_line(prefix: &str, kind: LineKind, message: &str) -> String {
    match kind {
        LineKind::Decorated => format!("{prefix}┣ {message}\n"),
        LineKind::Indented => format!("{prefix}┃   {message}\n"),
        LineKind::BlockStart => format!("{prefix}┃\n{prefix}┣ {message}\n"),
        LineKind::Warning => format!("{prefix}┣[\x1b[33mWARNING\x1b[0m] {message}\n"),
        LineKind::WarningStandalone => format!("{prefix}[\x1b[33mWARNING\x1b[0m] {message}\n"),
        LineKind::Error => format!("{prefix}┣[\x1b[31mERROR\x1b[0m] {message}\n"),
        LineKind::ErrorStandalone => format!("{prefix}[\x1b[31mERROR\x1b[0m] {message}\n"),
        LineKind::ErrorExit => format!("{prefix}┃\n{prefix}┗[\x1b[31mERROR\x1b[0m] {message}\n"),
        LineKind::Info => format!("{prefix}┣[\x1b[32mINFO\x1b[0m] {message}\n"),
        LineKind::Debug => format!("{prefix}┣[\x1b[32mDEBUG\x1b[0m] {message}\n"),
        LineKind::Critical => format!("{prefix}┣[\x1b[31mCRITICAL\x1b[0m] {message}\n"),
    }
}

/// Guard for file logging that flushes and joins the writer thread on drop.
pub struct LoggerGuard {
    tx: Sender<LogMessage>,
    handle: Option<std::thread::JoinHandle<anyhow::Result<()>>>,
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(LogMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == 'm' {
                    break;
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Route formatted output to the log file thread or stdout.
///
/// Falls back to stdout once the file writer has shut down.
pub fn write_output(text: &str) {
    if let Some(tx) = LOG_CHANNEL.get()
        && tx.send(LogMessage::Formatted(strip_ansi_codes(text))).is_ok()
    {
        return;
    }
    print!("{text}");
    let _ = std::io::stdout().flush();
}

// # Logging Macros

/// Log a decorated message as part of an existing block.
#[macro_export]
macro_rules! log_decorated {
    ($($arg:tt)+) => {
        $crate::common::logger::Log::emit(
            $crate::common::logger::LineKind::Decorated,
            &format!($($arg)+),
        )
    };
}

/// Log an indented detail line.
#[macro_export]
macro_rules! log_indented {
    ($($arg:tt)+) => {
        $crate::common::logger::Log::emit(
            $crate::common::logger::LineKind::Indented,
            &format!($($arg)+),
        )
    };
}

/// Log a bare pipe for vertical spacing.
#[macro_export]
macro_rules! log_pipe {
    () => {
        $crate::common::logger::Log::emit_raw("┃")
    };
}

/// Start a new block of related output.
#[macro_export]
macro_rules! log_block_start {
    ($($arg:tt)+) => {
        $crate::common::logger::Log::emit(
            $crate::common::logger::LineKind::BlockStart,
            &format!($($arg)+),
        )
    };
}

/// Log the application version header.
#[macro_export]
macro_rules! log_version {
    () => {
        $crate::common::logger::Log::emit_raw(&format!(
            "┏ geofencer v{} ━━╸",
            env!("CARGO_PKG_VERSION")
        ))
    };
}

/// Log the final termination marker.
#[macro_export]
macro_rules! log_end {
    () => {
        $crate::common::logger::Log::emit_raw("╹")
    };
}

/// Log a warning inside the pipe structure.
#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)+) => {
        $crate::common::logger::Log::emit(
            $crate::common::logger::LineKind::Warning,
            &format!($($arg)+),
        )
    };
}

/// Log a warning outside the pipe structure (argument parsing, early exits).
#[macro_export]
macro_rules! log_warning_standalone {
    ($($arg:tt)+) => {
        $crate::common::logger::Log::emit(
            $crate::common::logger::LineKind::WarningStandalone,
            &format!($($arg)+),
        )
    };
}

/// Log an error inside the pipe structure.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)+) => {
        $crate::common::logger::Log::emit(
            $crate::common::logger::LineKind::Error,
            &format!($($arg)+),
        )
    };
}

/// Log an error outside the pipe structure.
#[macro_export]
macro_rules! log_error_standalone {
    ($($arg:tt)+) => {
        $crate::common::logger::Log::emit(
            $crate::common::logger::LineKind::ErrorStandalone,
            &format!($($arg)+),
        )
    };
}

/// Log an error that terminates the current flow (`┗[ERROR]`).
#[macro_export]
macro_rules! log_error_exit {
    ($($arg:tt)+) => {
        $crate::common::logger::Log::emit(
            $crate::common::logger::LineKind::ErrorExit,
            &format!($($arg)+),
        )
    };
}

/// Log an informational message.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)+) => {
        $crate::common::logger::Log::emit(
            $crate::common::logger::LineKind::Info,
            &format!($($arg)+),
        )
    };
}

/// Log a debug/operational message.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)+) => {
        $crate::common::logger::Log::emit(
            $crate::common::logger::LineKind::Debug,
            &format!($($arg)+),
        )
    };
}

/// Log a critical message.
#[macro_export]
macro_rules! log_critical {
    ($($arg:tt)+) => {
        $crate::common::logger::Log::emit(
            $crate::common::logger::LineKind::Critical,
            &format!($($arg)+),
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_ansi_codes() {
        let colored = "┣[\x1b[32mINFO\x1b[0m] Entered location\n";
        assert_eq!(strip_ansi_codes(colored), "┣[INFO] Entered location\n");
        assert_eq!(strip_ansi_codes("plain"), "plain");
    }

    #[test]
    fn test_line_shapes() {
        assert_eq!(format_line("", LineKind::Indented, "x"), "┃   x\n");
        assert_eq!(format_line("", LineKind::BlockStart, "x"), "┃\n┣ x\n");
        assert_eq!(
            format_line("[12:00:00] ", LineKind::Decorated, "x"),
            "[12:00:00] ┣ x\n"
        );
    }
}
