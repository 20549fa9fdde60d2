//! Error taxonomy for the monitoring core.
//!
//! The core distinguishes recoverable source failures (permission, provider)
//! from programmer errors (bad region, bad bus capacity). None of these are
//! ever reported through the `transitions` channel; the session surfaces them
//! to its owner through [`crate::monitor::SessionEvent`] or a `Result`.

use thiserror::Error;

/// Failures raised by a position source or its provider.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    /// The provider refused access (missing consent or OS permission).
    #[error("permission denied by {provider}")]
    PermissionDenied { provider: String },

    /// The provider could not be reached or stopped responding.
    #[error("{provider} unavailable: {reason}")]
    Unavailable { provider: String, reason: String },

    /// A fix carried non-finite or out-of-range coordinates.
    #[error("invalid fix ({latitude}, {longitude})")]
    InvalidFix { latitude: f64, longitude: f64 },

    /// A scripted source ran out of positions.
    #[error("{provider} has no more positions")]
    Exhausted { provider: String },
}

impl SourceError {
    /// Whether the owner may try the same source again after a delay.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SourceError::Unavailable { .. })
    }
}

/// Errors surfaced by the geofence core to its owner.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeofenceError {
    #[error("location permission denied: {0}")]
    PermissionDenied(String),

    #[error("position source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("invalid region: {0}")]
    InvalidRegion(String),

    /// A transition channel with no capacity would lose edges.
    #[error("transition channel capacity must be at least 1 (got {capacity})")]
    BusOverflow { capacity: usize },
}

impl From<SourceError> for GeofenceError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::PermissionDenied { .. } => GeofenceError::PermissionDenied(err.to_string()),
            other => GeofenceError::SourceUnavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_stays_distinct() {
        let err = SourceError::PermissionDenied {
            provider: "gpsd".to_string(),
        };
        assert!(!err.is_retryable());
        assert!(matches!(
            GeofenceError::from(err),
            GeofenceError::PermissionDenied(_)
        ));
    }

    #[test]
    fn test_other_source_errors_map_to_unavailable() {
        let err = SourceError::Unavailable {
            provider: "gpsd".to_string(),
            reason: "connection refused".to_string(),
        };
        assert!(err.is_retryable());
        assert_eq!(
            GeofenceError::from(err),
            GeofenceError::SourceUnavailable("gpsd unavailable: connection refused".to_string())
        );

        let exhausted = SourceError::Exhausted {
            provider: "replay".to_string(),
        };
        assert!(!exhausted.is_retryable());
        assert!(matches!(
            GeofenceError::from(exhausted),
            GeofenceError::SourceUnavailable(_)
        ));
    }
}
