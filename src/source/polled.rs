//! Interval-driven sampling of a position provider.

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use std::time::{Duration, Instant};

use super::{PositionSource, SamplingConfig, SourceEvent, provider::PositionProvider, validate_position};
use crate::error::SourceError;
use crate::geo::Region;

/// Polls a [`PositionProvider`] once per sampling interval.
///
/// The first sample after `open` is taken immediately; later samples wait for
/// [`SamplingConfig::effective_interval`]. A provider that has no fix yet is
/// simply asked again on the next tick.
pub struct PolledSource {
    provider: Box<dyn PositionProvider>,
    config: Option<SamplingConfig>,
    last_sample: Option<Instant>,
}

impl PolledSource {
    pub fn new(provider: Box<dyn PositionProvider>) -> Self {
        Self {
            provider,
            config: None,
            last_sample: None,
        }
    }

    /// Wait until the next tick. Returns `false` when cancelled.
    fn wait_for_tick(&self, cancel: &Receiver<()>, interval: Duration) -> bool {
        let Some(last) = self.last_sample else {
            return matches!(cancel.try_recv(), Err(TryRecvError::Empty));
        };

        let remaining = interval.saturating_sub(last.elapsed());
        matches!(cancel.recv_timeout(remaining), Err(RecvTimeoutError::Timeout))
    }
}

impl PositionSource for PolledSource {
    fn name(&self) -> String {
        format!("polled:{}", self.provider.name())
    }

    fn open(&mut self, _region: &Region, config: &SamplingConfig) -> Result<(), SourceError> {
        self.config = Some(*config);
        self.last_sample = None;
        Ok(())
    }

    fn next_event(&mut self, cancel: &Receiver<()>) -> Result<Option<SourceEvent>, SourceError> {
        let config = self.config.ok_or_else(|| SourceError::Unavailable {
            provider: self.provider.name().to_string(),
            reason: "source was not opened".to_string(),
        })?;
        let interval = config.effective_interval();

        loop {
            if !self.wait_for_tick(cancel, interval) {
                return Ok(None);
            }
            self.last_sample = Some(Instant::now());

            if let Some(position) = self.provider.current_fix(config.accuracy)? {
                return validate_position(position).map(|p| Some(SourceEvent::Fix(p)));
            }
        }
    }

    fn close(&mut self) {
        if self.config.take().is_some() {
            self.provider.release();
        }
    }
}
