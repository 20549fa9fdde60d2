//! Low-level position providers used by [`crate::source::PolledSource`].

pub mod gpsd;
pub mod replay;

use crate::error::SourceError;
use crate::geo::Position;
use crate::source::AccuracyTier;

pub use gpsd::GpsdProvider;
pub use replay::ReplayProvider;

/// Something that can be asked "where are we now?".
pub trait PositionProvider: Send {
    fn name(&self) -> &str;

    /// Current fix at the requested accuracy.
    ///
    /// `Ok(None)` means the provider is healthy but has no acceptable fix yet.
    fn current_fix(&mut self, accuracy: AccuracyTier) -> Result<Option<Position>, SourceError>;

    /// Drop any connection or subscription held by the provider.
    fn release(&mut self) {}
}
