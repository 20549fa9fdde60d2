//! Configuration for the geofencer daemon.
//!
//! Settings live in `geofencer.toml` under `$XDG_CONFIG_HOME/geofencer/`, or
//! under the directory given with `--config`. A commented default file is
//! written on first run:
//!
//! ```toml
//! #[Region]
//! latitude = 28.5782472      # Center latitude in degrees (-90 to 90)
//! longitude = 77.3596155     # Center longitude in degrees (-180 to 180)
//! radius = 100.0             # Region radius in meters (up to 100000)
//!
//! #[Sampling]
//! poll_interval = 3000       # Target time between samples in milliseconds
//! fastest_interval = 2000    # Samples never come faster than this (ms, >= 1000)
//! accuracy = "high"          # Fix quality: "high", "balanced" or "low"
//!
//! #[Source]
//! source = "gpsd"            # Position source: "gpsd" or "replay"
//! gpsd_address = "127.0.0.1:2947"
//! ```
//!
//! Every field is optional; missing values fall back to the defaults in
//! [`crate::common::constants`]. All values are checked by
//! [`validation::validate_config`] before the daemon uses them.

pub mod builder;
pub mod loading;
pub mod validation;
pub mod watcher;

#[cfg(test)]
mod tests;

use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::bus::BusConfig;
use crate::common::constants::*;
use crate::common::utils::{format_coordinates, format_distance, private_path};
use crate::error::GeofenceError;
use crate::geo::Region;
use crate::source::{AccuracyTier, SamplingConfig};

/// Where positions come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Gpsd,
    Replay,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Gpsd => "gpsd",
            SourceKind::Replay => "replay",
        }
    }
}

/// How transition alerts are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationMode {
    Desktop,
    Log,
    None,
}

impl NotificationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationMode::Desktop => "desktop",
            NotificationMode::Log => "log",
            NotificationMode::None => "none",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Config {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Radius in meters.
    pub radius: Option<f64>,

    /// Milliseconds.
    pub poll_interval: Option<u64>,
    /// Milliseconds.
    pub fastest_interval: Option<u64>,
    pub accuracy: Option<AccuracyTier>,

    pub source: Option<SourceKind>,
    pub gpsd_address: Option<String>,
    pub replay_file: Option<String>,

    pub transition_capacity: Option<usize>,
    pub notifications: Option<NotificationMode>,

    pub retry_attempts: Option<u32>,
    /// Seconds.
    pub retry_delay: Option<u64>,
}

impl Config {
    pub fn load() -> Result<Self> {
        loading::load()
    }

    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        loading::load_from_path(path)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        loading::get_config_path()
    }

    /// The monitored region.
    pub fn region(&self) -> Result<Region, GeofenceError> {
        Region::new(
            self.latitude.unwrap_or(DEFAULT_LATITUDE),
            self.longitude.unwrap_or(DEFAULT_LONGITUDE),
            self.radius.unwrap_or(DEFAULT_RADIUS_METERS),
        )
    }

    pub fn sampling(&self) -> SamplingConfig {
        SamplingConfig::new(
            Duration::from_millis(self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL_MS)),
            Duration::from_millis(self.fastest_interval.unwrap_or(DEFAULT_FASTEST_INTERVAL_MS)),
            self.accuracy.unwrap_or(DEFAULT_ACCURACY),
        )
    }

    pub fn bus(&self) -> BusConfig {
        BusConfig {
            transition_capacity: self
                .transition_capacity
                .unwrap_or(DEFAULT_TRANSITION_CAPACITY),
        }
    }

    pub fn source_kind(&self) -> SourceKind {
        self.source.unwrap_or(SourceKind::Gpsd)
    }

    pub fn gpsd_address(&self) -> &str {
        self.gpsd_address.as_deref().unwrap_or(DEFAULT_GPSD_ADDRESS)
    }

    pub fn notification_mode(&self) -> NotificationMode {
        self.notifications.unwrap_or(NotificationMode::Desktop)
    }

    pub fn retry_attempts(&self) -> u32 {
        self.retry_attempts.unwrap_or(DEFAULT_RETRY_ATTEMPTS)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay.unwrap_or(DEFAULT_RETRY_DELAY_SECS))
    }

    /// Print the effective settings.
    pub fn log_config(&self, config_path: Option<&PathBuf>) {
        match config_path {
            Some(path) => log_block_start!("Loaded configuration from {}", private_path(path)),
            None => log_block_start!("Loaded configuration"),
        }

        let latitude = self.latitude.unwrap_or(DEFAULT_LATITUDE);
        let longitude = self.longitude.unwrap_or(DEFAULT_LONGITUDE);
        let sampling = self.sampling();

        log_indented!("Center: {}", format_coordinates(latitude, longitude));
        log_indented!(
            "Radius: {}",
            format_distance(self.radius.unwrap_or(DEFAULT_RADIUS_METERS))
        );
        log_indented!(
            "Sampling: every {}ms at {} accuracy",
            sampling.effective_interval().as_millis(),
            sampling.accuracy.as_str()
        );
        match self.source_kind() {
            SourceKind::Gpsd => log_indented!("Source: gpsd at {}", self.gpsd_address()),
            SourceKind::Replay => log_indented!(
                "Source: replay of {}",
                self.replay_file.as_deref().unwrap_or("(unset)")
            ),
        }
        log_indented!("Notifications: {}", self.notification_mode().as_str());
    }
}
