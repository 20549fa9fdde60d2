//! Fan-out channel with per-subscriber bounded queues.

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::subscription::Subscription;

struct Slot<T> {
    id: u64,
    tx: Sender<T>,
    // Publisher-side handle on the same queue, used to evict the oldest item
    evict: Receiver<T>,
}

/// Outcome of one publish call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PublishReport {
    pub delivered: usize,
    /// Items pushed out of full subscriber queues to make room.
    pub evicted: usize,
}

/// A broadcast channel where every subscriber owns a bounded FIFO.
///
/// When a subscriber's queue is full the oldest queued item is discarded, so
/// the publisher never blocks and a slow subscriber only ever loses its own
/// stale items. New subscribers receive nothing that was published before they
/// subscribed.
pub(crate) struct BroadcastChannel<T> {
    name: &'static str,
    capacity: usize,
    subscribers: Mutex<Vec<Slot<T>>>,
    next_id: AtomicU64,
    evicted_total: AtomicU64,
}

impl<T: Clone + Send> BroadcastChannel<T> {
    pub(crate) fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            capacity,
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            evicted_total: AtomicU64::new(0),
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    fn slots(&self) -> MutexGuard<'_, Vec<Slot<T>>> {
        // A panicking subscriber cannot leave the list half-updated
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn subscribe(self: &Arc<Self>) -> Subscription<T> {
        let (tx, rx) = bounded(self.capacity);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        self.slots().push(Slot {
            id,
            tx,
            evict: rx.clone(),
        });

        Subscription::new(id, rx, Arc::downgrade(self))
    }

    pub(crate) fn unsubscribe(&self, id: u64) {
        self.slots().retain(|slot| slot.id != id);
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.slots().len()
    }

    pub(crate) fn evicted_total(&self) -> u64 {
        self.evicted_total.load(Ordering::Relaxed)
    }

    /// Deliver `value` to every current subscriber.
    pub(crate) fn publish(&self, value: T) -> PublishReport {
        let mut report = PublishReport::default();
        let slots = self.slots();

        for slot in slots.iter() {
            let mut pending = value.clone();
            loop {
                match slot.tx.try_send(pending) {
                    Ok(()) => {
                        report.delivered += 1;
                        break;
                    }
                    Err(TrySendError::Full(returned)) => {
                        // Publishers are serialized by the lock, so after one
                        // eviction the retry finds room.
                        if slot.evict.try_recv().is_ok() {
                            report.evicted += 1;
                        }
                        pending = returned;
                    }
                    Err(TrySendError::Disconnected(_)) => break,
                }
            }
        }
        drop(slots);

        if report.evicted > 0 {
            self.evicted_total
                .fetch_add(report.evicted as u64, Ordering::Relaxed);
        }
        report
    }
}
