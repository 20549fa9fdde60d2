//! The daemon's main loop.
//!
//! `Core` owns the [`Monitor`] and reacts to three inputs:
//!
//! - signals and config-file changes (`SignalMessage`)
//! - session failures reported by the monitor (`SessionEvent`)
//! - the retry timer armed after a recoverable failure
//!
//! A lost provider is retried up to `retry_attempts` times, `retry_delay`
//! apart. A refused permission stops monitoring for good.

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, never, select};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::common::constants::RETRY_RESET_AFTER_SECS;
use crate::common::utils::{format_coordinates, format_distance, private_path};
use crate::config::{self, Config, SourceKind};
use crate::error::{GeofenceError, SourceError};
use crate::io::lock::LockGuard;
use crate::io::signals::{SignalMessage, SignalState};
use crate::monitor::{Monitor, SessionEvent};
use crate::source::{
    GpsdProvider, PolledSource, PositionProvider, PositionSource, ReplayProvider, SamplingConfig,
};

/// Replay run settings for `geofencer simulate`.
#[derive(Debug, Clone)]
pub struct Simulation {
    pub track: PathBuf,
    pub interval: Duration,
}

pub(crate) struct CoreParams {
    pub config: Config,
    pub config_path: Option<PathBuf>,
    pub signal_state: SignalState,
    pub monitor: Monitor,
    pub debug_enabled: bool,
    pub lock: Option<LockGuard>,
    pub simulation: Option<Simulation>,
}

pub(crate) struct Core {
    config: Config,
    config_path: Option<PathBuf>,
    signal_state: SignalState,
    monitor: Monitor,
    debug_enabled: bool,
    lock: Option<LockGuard>,
    simulation: Option<Simulation>,
    retries_used: u32,
    retry_timer: Receiver<Instant>,
    session_started: Option<Instant>,
}

impl Core {
    pub fn new(params: CoreParams) -> Self {
        Self {
            config: params.config,
            config_path: params.config_path,
            signal_state: params.signal_state,
            monitor: params.monitor,
            debug_enabled: params.debug_enabled,
            lock: params.lock,
            simulation: params.simulation,
            retries_used: 0,
            retry_timer: never(),
            session_started: None,
        }
    }

    pub fn execute(mut self) -> Result<()> {
        if let Some(custom_dir) = config::loading::get_custom_config_dir() {
            log_block_start!("Base directory: {}", private_path(&custom_dir));
        }

        let result = self.start_session().and_then(|()| self.main_loop());

        self.monitor.stop_monitoring();
        if let Some(lock) = self.lock.take() {
            if self.debug_enabled {
                log_pipe!();
                log_debug!("Releasing lock {}", private_path(lock.path()));
            }
            drop(lock);
        }

        log_block_start!("Monitoring stopped");
        result
    }

    fn main_loop(&mut self) -> Result<()> {
        let events = self.monitor.events();

        loop {
            let signals = self.signal_state.signal_receiver.clone();
            let retry = self.retry_timer.clone();

            select! {
                recv(signals) -> message => match message {
                    Ok(SignalMessage::Reload) => self.handle_config_reload()?,
                    Ok(SignalMessage::Shutdown) | Err(_) => return Ok(()),
                },
                recv(events) -> event => {
                    if let Ok(event) = event
                        && !self.handle_session_event(event)?
                    {
                        return Ok(());
                    }
                },
                recv(retry) -> _ => {
                    self.retry_timer = never();
                    self.start_session()?;
                },
            }
        }
    }

    fn sampling(&self) -> SamplingConfig {
        let mut sampling = self.config.sampling();
        if let Some(simulation) = &self.simulation {
            sampling.poll_interval = simulation.interval;
            sampling.fastest_interval = simulation.interval;
        }
        sampling
    }

    fn start_session(&mut self) -> Result<()> {
        let source = build_source(&self.config, self.simulation.as_ref(), self.debug_enabled)?;
        self.start_session_with(source)
    }

    fn start_session_with(&mut self, source: Box<dyn PositionSource>) -> Result<()> {
        let region = self.config.region().context("Invalid monitoring region")?;
        let sampling = self.sampling();

        match self.monitor.start_monitoring(region, sampling, source) {
            Ok(_) => {
                self.session_started = Some(Instant::now());
                log_block_start!(
                    "Monitoring {} within {}",
                    format_coordinates(region.center_latitude(), region.center_longitude()),
                    format_distance(region.radius_meters())
                );
                Ok(())
            }
            Err(e) => {
                let retryable = matches!(e, GeofenceError::SourceUnavailable(_));
                self.handle_failure(e, retryable)
            }
        }
    }

    /// Returns `false` when the loop should end.
    fn handle_session_event(&mut self, event: SessionEvent) -> Result<bool> {
        if self.monitor.current_session() != Some(event.session_id()) {
            // Report from a session that has since been replaced
            return Ok(true);
        }

        let SessionEvent::Failed { cause, .. } = event;

        if self.simulation.is_some() && matches!(cause, SourceError::Exhausted { .. }) {
            log_block_start!("Replay finished");
            return Ok(false);
        }

        self.monitor.stop_monitoring();

        if self
            .session_started
            .is_some_and(|started| started.elapsed() >= Duration::from_secs(RETRY_RESET_AFTER_SECS))
        {
            self.retries_used = 0;
        }

        let retryable = cause.is_retryable();
        self.handle_failure(GeofenceError::from(cause), retryable)?;
        Ok(true)
    }

    fn handle_failure(&mut self, error: GeofenceError, retryable: bool) -> Result<()> {
        log_pipe!();
        log_error!("{}", error);

        let attempts = self.config.retry_attempts();
        if retryable && self.retries_used < attempts {
            self.retries_used += 1;
            let delay = self.config.retry_delay();
            log_indented!(
                "Retrying in {}s (attempt {}/{})",
                delay.as_secs(),
                self.retries_used,
                attempts
            );
            self.retry_timer = crossbeam_channel::after(delay);
            return Ok(());
        }

        if matches!(error, GeofenceError::PermissionDenied(_)) {
            log_indented!("Grant location access and restart geofencer");
        }
        Err(error).context("Monitoring cannot continue")
    }

    fn handle_config_reload(&mut self) -> Result<()> {
        let reloaded = match &self.config_path {
            Some(path) => Config::load_from_path(path),
            None => Config::load(),
        };

        // Nothing changes unless the new settings also yield a region and a source
        let prepared = reloaded.and_then(|config| {
            config.region().context("Invalid monitoring region")?;
            let source = build_source(&config, self.simulation.as_ref(), self.debug_enabled)?;
            Ok((config, source))
        });

        let (new_config, source) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => {
                log_pipe!();
                log_warning!("Configuration reload failed: {:#}", e);
                log_indented!("Keeping the current settings");
                return Ok(());
            }
        };

        log_block_start!("Configuration reloaded");
        if new_config.bus() != self.config.bus()
            || new_config.notification_mode() != self.config.notification_mode()
        {
            log_indented!("transition_capacity and notifications apply after a restart");
        }

        self.config = new_config;
        self.retries_used = 0;
        self.retry_timer = never();

        // Replaces the running session, so containment state starts over
        self.start_session_with(source)
    }
}

/// Build the position source selected by `config`, or the replay track for a
/// simulation.
pub(crate) fn build_source(
    config: &Config,
    simulation: Option<&Simulation>,
    debug_enabled: bool,
) -> Result<Box<dyn PositionSource>> {
    let provider: Box<dyn PositionProvider> = match (simulation, config.source_kind()) {
        (Some(simulation), _) => Box::new(ReplayProvider::from_file(&simulation.track)?),
        (None, SourceKind::Replay) => {
            let file = config
                .replay_file
                .as_deref()
                .context("source = \"replay\" requires replay_file")?;
            Box::new(ReplayProvider::from_file(Path::new(file))?)
        }
        (None, SourceKind::Gpsd) => Box::new(GpsdProvider::new(config.gpsd_address(), debug_enabled)),
    };

    Ok(Box::new(PolledSource::new(provider)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{BusConfig, EventBus};
    use crate::common::logger::Log;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn track(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file
    }

    fn core_for(track: &NamedTempFile, config: Config) -> (Core, EventBus) {
        let bus = EventBus::new(BusConfig::default()).unwrap();
        let core = Core::new(CoreParams {
            config,
            config_path: None,
            signal_state: SignalState::detached(),
            monitor: Monitor::new(bus.clone()),
            debug_enabled: false,
            lock: None,
            simulation: Some(Simulation {
                track: track.path().to_path_buf(),
                interval: Duration::from_millis(5),
            }),
        });
        (core, bus)
    }

    #[test]
    fn test_simulation_runs_to_completion() {
        Log::set_enabled(false);
        let file = track(&["28.5830,77.3596155", "28.5782472,77.3596155", "28.5830,77.3596155"]);
        let (core, bus) = core_for(&file, Config::default());
        let transitions = bus.subscribe_transitions();

        core.execute().unwrap();

        let received: Vec<bool> = std::iter::from_fn(|| transitions.try_recv())
            .map(|t| t.inside)
            .collect();
        assert_eq!(received, vec![true, false]);
    }

    #[test]
    fn test_shutdown_signal_ends_loop() {
        Log::set_enabled(false);
        let lines = vec!["28.5782472,77.3596155"; 1000];
        let file = track(&lines);
        let (core, _bus) = core_for(&file, Config::default());

        core.signal_state
            .signal_sender
            .send(SignalMessage::Shutdown)
            .unwrap();
        core.execute().unwrap();
    }

    fn write_replay_config(path: &Path, replay_file: &Path) {
        std::fs::write(
            path,
            format!(
                "source = \"replay\"\nreplay_file = \"{}\"\npoll_interval = 1000\nfastest_interval = 1000\n",
                replay_file.display()
            ),
        )
        .unwrap();
    }

    #[test]
    fn test_reload_with_unusable_source_keeps_running_session() {
        Log::set_enabled(false);
        let dir = tempfile::tempdir().unwrap();
        let lines = vec!["28.5782472,77.3596155"; 100];
        let file = track(&lines);
        let config_path = dir.path().join("geofencer.toml");
        write_replay_config(&config_path, file.path());

        let config = Config::load_from_path(&config_path).unwrap();
        let bus = EventBus::new(BusConfig::default()).unwrap();
        let mut core = Core::new(CoreParams {
            config: config.clone(),
            config_path: Some(config_path.clone()),
            signal_state: SignalState::detached(),
            monitor: Monitor::new(bus),
            debug_enabled: false,
            lock: None,
            simulation: None,
        });

        core.start_session().unwrap();
        let session = core.monitor.current_session();
        assert!(session.is_some());

        // Passes validation, but the track cannot be opened
        write_replay_config(&config_path, Path::new("/nonexistent/track.csv"));
        core.handle_config_reload().unwrap();

        assert_eq!(core.monitor.current_session(), session);
        assert!(core.monitor.is_running());
        assert_eq!(core.config, config);

        // The daemon loop survives the same sequence
        core.signal_state
            .signal_sender
            .send(SignalMessage::Reload)
            .unwrap();
        core.signal_state
            .signal_sender
            .send(SignalMessage::Shutdown)
            .unwrap();
        core.execute().unwrap();
    }

    #[test]
    fn test_missing_track_is_an_error() {
        Log::set_enabled(false);
        let config = Config::default();
        let simulation = Simulation {
            track: PathBuf::from("/nonexistent/track.csv"),
            interval: Duration::from_millis(5),
        };
        assert!(build_source(&config, Some(&simulation), false).is_err());
    }
}
