//! # geofencer
//!
//! Circular geofence monitoring with edge-triggered enter/exit alerts.
//!
//! The library holds everything the `geofencer` binary runs, split so the
//! pieces can be tested on their own:
//!
//! - **Geometry**: `geo` with positions, regions and haversine containment
//! - **Sources**: `source` with the polled and push position sources and the
//!   gpsd and replay providers
//! - **State**: `fence`, the edge-triggered inside/outside state machine
//! - **Delivery**: `bus`, the two-channel event bus, and `sinks`, its display
//!   and notification consumers
//! - **Sessions**: `monitor`, which runs one sampler thread per session
//! - **Daemon**: `Geofencer` (resource setup), the internal `core` main loop,
//!   `config`, `io` (signals, lock file) and `commands`

// Macros first so every later module can use them
#[macro_use]
pub mod common;

pub mod args;
pub mod bus;
pub mod commands;
pub mod config;
pub mod error;
pub mod fence;
pub mod geo;
pub mod io;
pub mod monitor;
pub mod sinks;
pub mod source;

mod core;
mod geofencer;

pub use crate::core::Simulation;
pub use bus::{BusConfig, EventBus, PositionUpdate, Subscription};
pub use error::{GeofenceError, SourceError};
pub use fence::{FenceState, GeofenceStateMachine, TransitionEvent};
pub use geo::{Position, Region};
pub use geofencer::Geofencer;
pub use monitor::{Monitor, SessionEvent};
pub use source::{AccuracyTier, PositionSource, SamplingConfig};
