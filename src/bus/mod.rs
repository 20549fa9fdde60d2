//! Two-channel event bus between the monitoring core and its consumers.
//!
//! - `latest` carries a [`PositionUpdate`] for every sample. Each subscriber
//!   holds at most one item, so a slow reader only ever sees the newest value.
//! - `transitions` carries every [`TransitionEvent`] in order, through a
//!   bounded queue per subscriber. Transitions are never merged; if a
//!   subscriber falls a full queue behind, its oldest entries are dropped and
//!   counted.
//!
//! Subscribers see only what is published after they subscribe. The bus is
//! cheap to clone and may be published to from several threads.

mod channel;
mod subscription;

use serde::Serialize;
use std::sync::Arc;

use crate::common::constants::{DEFAULT_TRANSITION_CAPACITY, LATEST_POSITION_CAPACITY};
use crate::error::GeofenceError;
use crate::fence::TransitionEvent;
use crate::geo::Position;

use channel::BroadcastChannel;
pub use channel::PublishReport;
pub use subscription::Subscription;

/// The most recent evaluated sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionUpdate {
    pub position: Position,
    pub inside: bool,
    pub distance_meters: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusConfig {
    /// Queue length per `transitions` subscriber.
    pub transition_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            transition_capacity: DEFAULT_TRANSITION_CAPACITY,
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    latest: Arc<BroadcastChannel<PositionUpdate>>,
    transitions: Arc<BroadcastChannel<TransitionEvent>>,
}

impl EventBus {
    /// Build a bus. A zero transition capacity is rejected because every
    /// publish would immediately discard the event.
    pub fn new(config: BusConfig) -> Result<Self, GeofenceError> {
        if config.transition_capacity == 0 {
            return Err(GeofenceError::BusOverflow {
                capacity: config.transition_capacity,
            });
        }

        Ok(Self {
            latest: Arc::new(BroadcastChannel::new("latest", LATEST_POSITION_CAPACITY)),
            transitions: Arc::new(BroadcastChannel::new(
                "transitions",
                config.transition_capacity,
            )),
        })
    }

    pub fn subscribe_latest(&self) -> Subscription<PositionUpdate> {
        self.latest.subscribe()
    }

    pub fn subscribe_transitions(&self) -> Subscription<TransitionEvent> {
        self.transitions.subscribe()
    }

    /// Replace every subscriber's latest value.
    pub fn publish_position(&self, update: PositionUpdate) -> PublishReport {
        self.latest.publish(update)
    }

    pub fn publish_transition(&self, event: TransitionEvent) -> PublishReport {
        let report = self.transitions.publish(event);
        if report.evicted > 0 {
            log_pipe!();
            log_warning!(
                "{} channel full: dropped {} queued transition(s) for slow subscribers",
                self.transitions.name(),
                report.evicted
            );
        }
        report
    }

    /// Transitions discarded from full subscriber queues since the bus was
    /// created.
    pub fn dropped_transitions(&self) -> u64 {
        self.transitions.evicted_total()
    }

    pub fn transition_capacity(&self) -> usize {
        self.transitions.capacity()
    }

    pub fn latest_subscribers(&self) -> usize {
        self.latest.subscriber_count()
    }

    pub fn transition_subscribers(&self) -> usize {
        self.transitions.subscriber_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn position(lat: f64) -> Position {
        Position::now(lat, 77.3596155).unwrap()
    }

    fn update(lat: f64) -> PositionUpdate {
        PositionUpdate {
            position: position(lat),
            inside: true,
            distance_meters: 0.0,
        }
    }

    fn transition(lat: f64, inside: bool) -> TransitionEvent {
        TransitionEvent {
            position: position(lat),
            inside,
            distance_meters: 0.0,
        }
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let result = EventBus::new(BusConfig {
            transition_capacity: 0,
        });
        assert!(matches!(result, Err(GeofenceError::BusOverflow { capacity: 0 })));
    }

    #[test]
    fn test_latest_conflates_to_newest() {
        let bus = EventBus::new(BusConfig::default()).unwrap();
        let sub = bus.subscribe_latest();

        bus.publish_position(update(28.0));
        bus.publish_position(update(28.1));
        bus.publish_position(update(28.2));

        assert_eq!(sub.pending(), 1);
        assert_eq!(sub.try_recv().unwrap().position.latitude, 28.2);
        assert!(sub.try_recv().is_none());
    }

    #[test]
    fn test_no_replay_for_late_subscribers() {
        let bus = EventBus::new(BusConfig::default()).unwrap();
        bus.publish_position(update(28.0));
        bus.publish_transition(transition(28.0, true));

        let latest = bus.subscribe_latest();
        let transitions = bus.subscribe_transitions();
        assert!(latest.try_recv().is_none());
        assert!(transitions.try_recv().is_none());
    }

    #[test]
    fn test_transitions_keep_order_without_coalescing() {
        let bus = EventBus::new(BusConfig::default()).unwrap();
        let sub = bus.subscribe_transitions();

        bus.publish_transition(transition(28.0, true));
        bus.publish_transition(transition(28.1, false));
        bus.publish_transition(transition(28.2, true));

        let received: Vec<bool> = std::iter::from_fn(|| sub.try_recv())
            .map(|e| e.inside)
            .collect();
        assert_eq!(received, vec![true, false, true]);
        assert_eq!(bus.dropped_transitions(), 0);
    }

    #[test]
    fn test_full_transition_queue_drops_oldest() {
        let bus = EventBus::new(BusConfig {
            transition_capacity: 2,
        })
        .unwrap();
        let sub = bus.subscribe_transitions();

        bus.publish_transition(transition(28.0, true));
        bus.publish_transition(transition(28.1, false));
        let report = bus.publish_transition(transition(28.2, true));

        assert_eq!(report.evicted, 1);
        assert_eq!(bus.dropped_transitions(), 1);
        assert_eq!(sub.try_recv().unwrap().position.latitude, 28.1);
        assert_eq!(sub.try_recv().unwrap().position.latitude, 28.2);
    }

    #[test]
    fn test_every_subscriber_gets_every_transition() {
        let bus = EventBus::new(BusConfig::default()).unwrap();
        let first = bus.subscribe_transitions();
        let second = bus.subscribe_transitions();

        let report = bus.publish_transition(transition(28.0, true));
        assert_eq!(report.delivered, 2);
        assert!(first.recv_timeout(Duration::from_millis(100)).is_some());
        assert!(second.recv_timeout(Duration::from_millis(100)).is_some());
    }

    #[test]
    fn test_dropping_subscription_unregisters() {
        let bus = EventBus::new(BusConfig::default()).unwrap();
        let sub = bus.subscribe_transitions();
        assert_eq!(bus.transition_subscribers(), 1);

        drop(sub);
        assert_eq!(bus.transition_subscribers(), 0);
        assert_eq!(bus.publish_transition(transition(28.0, true)).delivered, 0);
    }

    #[test]
    fn test_subscription_ends_when_bus_is_dropped() {
        let bus = EventBus::new(BusConfig::default()).unwrap();
        let sub = bus.subscribe_latest();
        drop(bus);
        assert!(sub.recv().is_none());
    }

    #[test]
    fn test_concurrent_publishers_lose_nothing_with_room() {
        let bus = EventBus::new(BusConfig {
            transition_capacity: 64,
        })
        .unwrap();
        let sub = bus.subscribe_transitions();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let bus = bus.clone();
                std::thread::spawn(move || {
                    for i in 0..10 {
                        bus.publish_transition(transition(28.0, i % 2 == 0));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(std::iter::from_fn(|| sub.try_recv()).count(), 40);
        assert_eq!(bus.dropped_transitions(), 0);
    }
}
