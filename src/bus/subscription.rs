use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::sync::Weak;
use std::time::Duration;

use super::channel::BroadcastChannel;

/// A live subscription to one bus channel.
///
/// Dropping the subscription unregisters it; the publisher stops queueing for
/// it on the next publish at the latest.
pub struct Subscription<T: Clone + Send> {
    id: u64,
    rx: Receiver<T>,
    channel: Weak<BroadcastChannel<T>>,
}

impl<T: Clone + Send> Subscription<T> {
    pub(crate) fn new(id: u64, rx: Receiver<T>, channel: Weak<BroadcastChannel<T>>) -> Self {
        Self { id, rx, channel }
    }

    /// Block until the next item. `None` once the bus is gone.
    pub fn recv(&self) -> Option<T> {
        self.rx.recv().ok()
    }

    /// Wait up to `timeout`. `None` on timeout or once the bus is gone.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<T> {
        match self.rx.recv_timeout(timeout) {
            Ok(value) => Some(value),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn try_recv(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Items currently queued for this subscriber.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Underlying receiver, for use in `crossbeam_channel::select!`.
    pub fn receiver(&self) -> &Receiver<T> {
        &self.rx
    }
}

impl<T: Clone + Send> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(channel) = self.channel.upgrade() {
            channel.unsubscribe(self.id);
        }
    }
}
