//! Position fixes and the monitored region.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::constants::MAXIMUM_RADIUS_METERS;
use crate::error::{GeofenceError, SourceError};

/// A single timestamped position fix.
///
/// Positions are plain values: every pipeline stage receives its own copy and
/// nothing mutates a fix after it has been produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}

impl Position {
    /// Build a fix, rejecting coordinates that could poison distance math.
    ///
    /// Sources call this at their boundary so the containment evaluator only
    /// ever sees finite, in-range coordinates.
    pub fn new(latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Result<Self, SourceError> {
        let position = Self {
            latitude,
            longitude,
            timestamp,
        };
        if position.is_valid() {
            Ok(position)
        } else {
            Err(SourceError::InvalidFix {
                latitude,
                longitude,
            })
        }
    }

    /// Convenience constructor stamped with the current time.
    pub fn now(latitude: f64, longitude: f64) -> Result<Self, SourceError> {
        Self::new(latitude, longitude, Utc::now())
    }

    pub fn is_valid(&self) -> bool {
        valid_coordinates(self.latitude, self.longitude)
    }
}

/// The circular region being monitored.
///
/// Fields are private so a `Region` can only exist with a positive, finite
/// radius and a valid center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Region {
    center_latitude: f64,
    center_longitude: f64,
    radius_meters: f64,
}

impl Region {
    pub fn new(
        center_latitude: f64,
        center_longitude: f64,
        radius_meters: f64,
    ) -> Result<Self, GeofenceError> {
        if !valid_coordinates(center_latitude, center_longitude) {
            return Err(GeofenceError::InvalidRegion(format!(
                "center ({center_latitude}, {center_longitude}) is not a valid coordinate"
            )));
        }
        if !radius_meters.is_finite() || radius_meters <= 0.0 {
            return Err(GeofenceError::InvalidRegion(format!(
                "radius must be a positive number of meters (got {radius_meters})"
            )));
        }
        if radius_meters > MAXIMUM_RADIUS_METERS {
            return Err(GeofenceError::InvalidRegion(format!(
                "radius {radius_meters} m exceeds the {MAXIMUM_RADIUS_METERS} m limit"
            )));
        }

        Ok(Self {
            center_latitude,
            center_longitude,
            radius_meters,
        })
    }

    pub fn center_latitude(&self) -> f64 {
        self.center_latitude
    }

    pub fn center_longitude(&self) -> f64 {
        self.center_longitude
    }

    pub fn radius_meters(&self) -> f64 {
        self.radius_meters
    }
}

fn valid_coordinates(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_rejects_non_finite() {
        assert!(Position::now(f64::NAN, 0.0).is_err());
        assert!(Position::now(0.0, f64::INFINITY).is_err());
        assert!(matches!(
            Position::now(91.0, 0.0),
            Err(SourceError::InvalidFix { latitude, .. }) if latitude == 91.0
        ));
        assert!(Position::now(-90.0, 180.0).is_ok());
    }

    #[test]
    fn test_region_requires_positive_radius() {
        assert!(Region::new(28.5782472, 77.3596155, 100.0).is_ok());
        assert!(matches!(
            Region::new(28.5782472, 77.3596155, 0.0),
            Err(GeofenceError::InvalidRegion(_))
        ));
        assert!(Region::new(28.5782472, 77.3596155, -5.0).is_err());
        assert!(Region::new(28.5782472, 77.3596155, f64::NAN).is_err());
        assert!(Region::new(28.5782472, 77.3596155, MAXIMUM_RADIUS_METERS + 1.0).is_err());
    }

    #[test]
    fn test_region_rejects_bad_center() {
        assert!(Region::new(f64::NAN, 0.0, 10.0).is_err());
        assert!(Region::new(0.0, 200.0, 10.0).is_err());
    }
}
