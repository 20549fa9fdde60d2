//! Inside/outside evaluation against a circular region.
//!
//! Distances use the haversine great-circle formula on a spherical Earth,
//! which is well within a meter of the ellipsoidal distance for regions of a
//! few hundred kilometers or less.

use serde::Serialize;

use super::position::{Position, Region};

/// Mean Earth radius (IUGG), in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// Outcome of evaluating one position against a region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContainmentResult {
    /// Great-circle distance to the region center; `f64::INFINITY` when the
    /// position could not be evaluated.
    pub distance_meters: f64,
    pub inside: bool,
}

impl ContainmentResult {
    /// Sentinel for positions with non-finite coordinates.
    pub const UNKNOWN: ContainmentResult = ContainmentResult {
        distance_meters: f64::INFINITY,
        inside: false,
    };
}

/// Great-circle distance in meters between two coordinates in degrees.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push `a` a hair outside [0, 1] for antipodal points
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Evaluate whether `position` lies within `region`.
///
/// A position exactly on the boundary counts as inside. Non-finite
/// coordinates never reach here from a source, but if they do the result is
/// [`ContainmentResult::UNKNOWN`] rather than a NaN distance.
pub fn evaluate(position: &Position, region: &Region) -> ContainmentResult {
    if !position.latitude.is_finite() || !position.longitude.is_finite() {
        return ContainmentResult::UNKNOWN;
    }

    let distance_meters = haversine_distance(
        position.latitude,
        position.longitude,
        region.center_latitude(),
        region.center_longitude(),
    );

    if !distance_meters.is_finite() {
        return ContainmentResult::UNKNOWN;
    }

    ContainmentResult {
        distance_meters,
        inside: distance_meters <= region.radius_meters(),
    }
}
