//! Application coordinator for the geofencer daemon.
//!
//! Acquires process resources (config, instance lock, signal thread, config
//! watcher), wires the event bus to its consumers, and hands control to the
//! main loop. The builder covers the two ways the daemon is started:
//!
//! - Normal run: `Geofencer::new(debug_enabled).run()`
//! - Replay run: `Geofencer::new(debug_enabled).simulate(track, interval).run()`

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::bus::EventBus;
use crate::common::logger::Log;
use crate::config::{self, Config, NotificationMode};
use crate::core::{Core, CoreParams, Simulation};
use crate::io::lock::acquire_lock;
use crate::io::signals::setup_signal_handler;
use crate::monitor::Monitor;
use crate::sinks::{DesktopNotifier, DisplaySink, LogNotifier, NotificationSink, Notifier, SinkHandle};

pub struct Geofencer {
    debug_enabled: bool,
    create_lock: bool,
    simulation: Option<Simulation>,
}

impl Geofencer {
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            debug_enabled,
            create_lock: true,
            simulation: None,
        }
    }

    /// Run without the single-instance lock.
    pub fn without_lock(mut self) -> Self {
        self.create_lock = false;
        self
    }

    /// Replay `track` instead of the configured source, one position per
    /// `interval`, and exit once the track is used up.
    pub fn simulate(mut self, track: PathBuf, interval: Duration) -> Self {
        self.simulation = Some(Simulation { track, interval });
        self.without_lock()
    }

    pub fn run(self) -> Result<()> {
        log_version!();
        if self.debug_enabled || self.simulation.is_some() {
            Log::set_timestamps(true);
        }

        let config_path = Config::get_config_path()?;
        let config = Config::load().context("Configuration failed")?;

        let lock = if self.create_lock {
            match acquire_lock()? {
                Some(lock) => Some(lock),
                None => anyhow::bail!("Cannot start - another geofencer instance is running"),
            }
        } else {
            None
        };

        let signal_state = setup_signal_handler(self.debug_enabled)?;

        if self.simulation.is_none()
            && let Err(e) = config::watcher::start_config_watcher(
                config_path.clone(),
                signal_state.signal_sender.clone(),
                self.debug_enabled,
            )
        {
            log_pipe!();
            log_warning!("Config file watching unavailable: {}", e);
            log_indented!("Hot config reload disabled, use 'geofencer reload' instead");
        }

        config.log_config(Some(&config_path));
        if let Some(simulation) = &self.simulation {
            log_indented!(
                "Simulating {} every {}ms",
                simulation.track.display(),
                simulation.interval.as_millis()
            );
        }

        let bus = EventBus::new(config.bus())?;
        let mut sinks = vec![DisplaySink::spawn(&bus)?];
        if let Some(notifier) = build_notifier(config.notification_mode(), self.debug_enabled) {
            sinks.push(NotificationSink::spawn(&bus, notifier)?);
        }
        if self.debug_enabled {
            log_pipe!();
            log_debug!(
                "Event bus: {} position and {} transition subscriber(s), {} queued transitions each",
                bus.latest_subscribers(),
                bus.transition_subscribers(),
                bus.transition_capacity()
            );
        }

        if lock.is_some() {
            log_block_start!("Lock acquired, starting geofencer...");
        }

        let monitor = Monitor::new(bus).with_debug(self.debug_enabled);
        let result = Core::new(CoreParams {
            config,
            config_path: Some(config_path),
            signal_state,
            monitor,
            debug_enabled: self.debug_enabled,
            lock,
            simulation: self.simulation,
        })
        .execute();

        stop_sinks(sinks);
        result
    }
}

fn build_notifier(mode: NotificationMode, debug_enabled: bool) -> Option<Box<dyn Notifier>> {
    match mode {
        NotificationMode::Desktop => Some(Box::new(DesktopNotifier::new(debug_enabled))),
        NotificationMode::Log => Some(Box::new(LogNotifier)),
        NotificationMode::None => None,
    }
}

fn stop_sinks(sinks: Vec<SinkHandle>) {
    for mut sink in sinks {
        sink.stop();
    }
}
