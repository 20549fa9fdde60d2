//! Alerting on boundary crossings.

use anyhow::{Context, Result};
use crossbeam_channel::{bounded, select};

use super::SinkHandle;
use crate::bus::EventBus;
use crate::common::constants::{ENTERED_MESSAGE, EXITED_MESSAGE, NOTIFICATION_TITLE};
use crate::fence::TransitionEvent;

/// Something that can show a short alert to the user.
///
/// Delivery is best effort: an implementation that cannot reach its backend
/// logs and returns, it never fails the caller.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send {
    fn notify(&mut self, title: &str, body: &str);
}

/// Title and body for a transition alert.
pub fn message_for(event: &TransitionEvent) -> (&'static str, &'static str) {
    if event.inside {
        (NOTIFICATION_TITLE, ENTERED_MESSAGE)
    } else {
        (NOTIFICATION_TITLE, EXITED_MESSAGE)
    }
}

/// Writes alerts into the daemon log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, title: &str, body: &str) {
        log_pipe!();
        log_info!("{}: {}", title, body);
    }
}

/// Forwards every transition to a [`Notifier`].
pub struct NotificationSink;

impl NotificationSink {
    /// Subscribe to transitions and start delivering alerts.
    ///
    /// The subscription is taken before this returns, so every transition
    /// published afterwards reaches the notifier.
    pub fn spawn(bus: &EventBus, mut notifier: Box<dyn Notifier>) -> Result<SinkHandle> {
        let subscription = bus.subscribe_transitions();
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let handle = std::thread::Builder::new()
            .name("geofencer-notify".to_string())
            .spawn(move || {
                loop {
                    select! {
                        recv(stop_rx) -> _ => {
                            while let Some(item) = subscription.try_recv() {
                                let (title, body) = message_for(&item);
                                notifier.notify(title, body);
                            }
                            break;
                        },
                        recv(subscription.receiver()) -> event => match event {
                            Ok(event) => {
                                let (title, body) = message_for(&event);
                                notifier.notify(title, body);
                            }
                            Err(_) => break,
                        },
                    }
                }
            })
            .context("Failed to spawn notification thread")?;

        Ok(SinkHandle::new("notification", stop_tx, handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::BusConfig;
    use crate::geo::Position;
    use mockall::predicate::eq;
    use std::time::Duration;

    fn event(inside: bool) -> TransitionEvent {
        TransitionEvent {
            position: Position::now(28.5782472, 77.3596155).unwrap(),
            inside,
            distance_meters: 0.0,
        }
    }

    #[test]
    fn test_message_for_transition() {
        assert_eq!(message_for(&event(true)), ("Geofence Alert", "Entered location"));
        assert_eq!(message_for(&event(false)), ("Geofence Alert", "Exited location"));
    }

    #[test]
    fn test_sink_notifies_once_per_transition() {
        let bus = EventBus::new(BusConfig::default()).unwrap();
        let (done_tx, done_rx) = bounded::<()>(2);

        let mut notifier = MockNotifier::new();
        let mut sequence = mockall::Sequence::new();
        let first_done = done_tx.clone();
        notifier
            .expect_notify()
            .with(eq("Geofence Alert"), eq("Entered location"))
            .times(1)
            .in_sequence(&mut sequence)
            .returning(move |_, _| {
                let _ = first_done.send(());
            });
        notifier
            .expect_notify()
            .with(eq("Geofence Alert"), eq("Exited location"))
            .times(1)
            .in_sequence(&mut sequence)
            .returning(move |_, _| {
                let _ = done_tx.send(());
            });

        let mut sink = NotificationSink::spawn(&bus, Box::new(notifier)).unwrap();
        bus.publish_transition(event(true));
        bus.publish_transition(event(false));

        done_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        done_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        sink.stop();
    }
}
