//! Application-wide defaults and limits.

use crate::source::AccuracyTier;

// # Exit codes
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

// # Region defaults (the original deployment target)
pub const DEFAULT_LATITUDE: f64 = 28.5782472;
pub const DEFAULT_LONGITUDE: f64 = 77.3596155;
pub const DEFAULT_RADIUS_METERS: f64 = 100.0;
pub const MAXIMUM_RADIUS_METERS: f64 = 100_000.0;

// # Sampling (milliseconds)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;
pub const DEFAULT_FASTEST_INTERVAL_MS: u64 = 2000;
pub const MINIMUM_FASTEST_INTERVAL_MS: u64 = 1000;
pub const MAXIMUM_POLL_INTERVAL_MS: u64 = 3_600_000;
pub const DEFAULT_ACCURACY: AccuracyTier = AccuracyTier::High;
pub const DEFAULT_SIMULATION_INTERVAL_MS: u64 = 250;

// # Position source
pub const DEFAULT_SOURCE: &str = "gpsd";
pub const DEFAULT_GPSD_ADDRESS: &str = "127.0.0.1:2947";
pub const GPSD_CONNECT_TIMEOUT_MS: u64 = 2000;
pub const GPSD_READ_TIMEOUT_MS: u64 = 2000;

// # Event bus
pub const DEFAULT_TRANSITION_CAPACITY: usize = 8;
pub const LATEST_POSITION_CAPACITY: usize = 1;

// # Session retry policy
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 5;
pub const MINIMUM_RETRY_DELAY_SECS: u64 = 1;
pub const MAXIMUM_RETRY_DELAY_SECS: u64 = 3600;
// A session that survived this long gets a fresh retry budget
pub const RETRY_RESET_AFTER_SECS: u64 = 60;

// # Notifications
pub const DEFAULT_NOTIFICATIONS: &str = "desktop";
pub const NOTIFICATION_TITLE: &str = "Geofence Alert";
pub const ENTERED_MESSAGE: &str = "Entered location";
pub const EXITED_MESSAGE: &str = "Exited location";

// # Files
pub const CONFIG_FILE_NAME: &str = "geofencer.toml";
pub const LOCK_FILE_NAME: &str = "geofencer.lock";
