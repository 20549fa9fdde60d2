//! Position sources feeding a monitoring session.
//!
//! A [`PositionSource`] turns some external location service into an ordered
//! stream of [`SourceEvent`]s. Two variants exist:
//!
//! - [`PolledSource`]: asks a [`PositionProvider`] for a fix at a bounded
//!   cadence and yields raw positions for the state machine to evaluate.
//! - [`PushSource`]: registers the region with a [`GeofenceRegistrar`] that
//!   performs containment itself and pushes enter/exit edges.
//!
//! Sources fail fast. A missing permission or unreachable provider is reported
//! once as a [`SourceError`]; retrying is the session owner's decision.

pub mod polled;
pub mod provider;
pub mod push;

use crossbeam_channel::Receiver;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::SourceError;
use crate::geo::{Position, Region};

pub use polled::PolledSource;
pub use provider::{GpsdProvider, PositionProvider, ReplayProvider};
pub use push::{EdgeKind, FenceEdge, GeofenceRegistrar, PushSource};

/// Requested fix quality, traded against power and latency by providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccuracyTier {
    /// Only full 3D fixes.
    High,
    /// 2D fixes are acceptable.
    Balanced,
    /// Any fix that carries coordinates.
    Low,
}

impl AccuracyTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccuracyTier::High => "high",
            AccuracyTier::Balanced => "balanced",
            AccuracyTier::Low => "low",
        }
    }

    /// Minimum gpsd fix mode (2 = 2D, 3 = 3D) accepted for this tier.
    pub fn minimum_fix_mode(&self) -> u8 {
        match self {
            AccuracyTier::High => 3,
            AccuracyTier::Balanced => 2,
            AccuracyTier::Low => 0,
        }
    }
}

/// Sampling cadence for a monitoring session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingConfig {
    /// Target time between samples.
    pub poll_interval: Duration,
    /// Floor under the sampling interval; samples never come faster.
    pub fastest_interval: Duration,
    pub accuracy: AccuracyTier,
}

impl SamplingConfig {
    pub fn new(poll_interval: Duration, fastest_interval: Duration, accuracy: AccuracyTier) -> Self {
        Self {
            poll_interval,
            fastest_interval,
            accuracy,
        }
    }

    /// The interval actually waited between two samples.
    pub fn effective_interval(&self) -> Duration {
        self.poll_interval.max(self.fastest_interval)
    }
}

/// One item produced by a position source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceEvent {
    /// A raw fix that still needs containment evaluation.
    Fix(Position),
    /// An edge already detected by an external registrar.
    Edge(FenceEdge),
}

/// Common interface over polled and push sources.
///
/// A session calls `open` once, then `next_event` until it returns `Ok(None)`
/// (cancelled) or an error, and finally `close`. Sources are restartable: a
/// closed source may be opened again for a new session.
pub trait PositionSource: Send {
    /// Short name used in logs.
    fn name(&self) -> String;

    /// Acquire the underlying provider subscription for `region`.
    fn open(&mut self, region: &Region, config: &SamplingConfig) -> Result<(), SourceError>;

    /// Block until the next event.
    ///
    /// Returns `Ok(None)` as soon as `cancel` receives a message or is
    /// disconnected, at the latest one sampling interval after the request.
    fn next_event(&mut self, cancel: &Receiver<()>) -> Result<Option<SourceEvent>, SourceError>;

    /// Release the provider subscription. Idempotent.
    fn close(&mut self);
}

/// Reject positions that would poison distance math before they reach the
/// state machine.
pub(crate) fn validate_position(position: Position) -> Result<Position, SourceError> {
    if position.is_valid() {
        Ok(position)
    } else {
        Err(SourceError::InvalidFix {
            latitude: position.latitude,
            longitude: position.longitude,
        })
    }
}
