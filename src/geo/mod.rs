//! Geographic primitives for a single circular geofence.
//!
//! - [`position`]: validated position fixes and the monitored [`Region`]
//! - [`containment`]: great-circle distance and inside/outside evaluation

pub mod containment;
pub mod position;

pub use containment::{ContainmentResult, EARTH_RADIUS_METERS, evaluate, haversine_distance};
pub use position::{Position, Region};
