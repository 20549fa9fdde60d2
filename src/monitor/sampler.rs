//! The per-session worker thread.

use crossbeam_channel::{Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};

use super::SessionEvent;
use crate::bus::{EventBus, PositionUpdate};
use crate::common::utils::{format_coordinates, format_distance};
use crate::fence::{GeofenceStateMachine, TransitionEvent};
use crate::source::{PositionSource, SourceEvent};

/// Publication gate shared between the sampler and `stop_monitoring`.
///
/// The sampler evaluates and publishes while holding the lock and only if the
/// gate is still open. Closing the gate therefore waits for any in-flight
/// evaluation, and nothing is published once it returns.
pub(crate) struct Gate {
    open: Mutex<bool>,
}

impl Gate {
    pub(crate) fn opened() -> Arc<Self> {
        Arc::new(Self {
            open: Mutex::new(true),
        })
    }

    pub(crate) fn enter(&self) -> MutexGuard<'_, bool> {
        self.open.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn close(&self) {
        *self.enter() = false;
    }
}

pub(crate) struct Sampler {
    pub(crate) session_id: u64,
    pub(crate) machine: GeofenceStateMachine,
    pub(crate) source: Box<dyn PositionSource>,
    pub(crate) bus: EventBus,
    pub(crate) gate: Arc<Gate>,
    pub(crate) cancel: Receiver<()>,
    pub(crate) events: Sender<SessionEvent>,
    pub(crate) debug_enabled: bool,
}

impl Sampler {
    /// Run until cancelled or the source fails. The source is released when
    /// the sampler is dropped.
    pub(crate) fn run(mut self) {
        loop {
            match self.source.next_event(&self.cancel) {
                Ok(None) => break,
                Ok(Some(event)) => {
                    if !self.process(event) {
                        break;
                    }
                }
                Err(cause) => {
                    // A stopped session reports nothing
                    let gate = self.gate.enter();
                    if *gate {
                        let _ = self.events.send(SessionEvent::Failed {
                            session_id: self.session_id,
                            cause,
                        });
                    }
                    break;
                }
            }
        }
    }

    /// Evaluate one event and publish the results. Returns `false` if the
    /// session has been stopped.
    fn process(&mut self, event: SourceEvent) -> bool {
        let gate = self.gate.enter();
        if !*gate {
            return false;
        }

        match event {
            SourceEvent::Fix(position) => {
                let observation = self.machine.observe(position);
                self.bus.publish_position(PositionUpdate {
                    position,
                    inside: observation.containment.inside,
                    distance_meters: observation.containment.distance_meters,
                });

                if self.debug_enabled {
                    log_pipe!();
                    log_debug!(
                        "Sample {} is {} from center ({})",
                        format_coordinates(position.latitude, position.longitude),
                        format_distance(observation.containment.distance_meters),
                        if observation.containment.inside {
                            "inside"
                        } else {
                            "outside"
                        }
                    );
                }

                if let Some(transition) = observation.transition {
                    self.emit(transition);
                }
            }
            SourceEvent::Edge(edge) => {
                let transition = self.machine.apply_edge(&edge);
                self.bus.publish_position(PositionUpdate {
                    position: transition.position,
                    inside: transition.inside,
                    distance_meters: transition.distance_meters,
                });
                self.emit(transition);
            }
        }

        drop(gate);
        true
    }

    fn emit(&self, transition: TransitionEvent) {
        self.bus.publish_transition(transition);

        if self.debug_enabled {
            log_pipe!();
            log_debug!(
                "Transition: {} at {}",
                if transition.inside { "entered" } else { "exited" },
                format_distance(transition.distance_meters)
            );
        }
    }
}

impl Drop for Sampler {
    // Also runs when the sampler never started because its thread failed to spawn
    fn drop(&mut self) {
        self.source.close();

        if self.debug_enabled {
            log_pipe!();
            log_debug!(
                "Session {} released {}",
                self.session_id,
                self.source.name()
            );
        }
    }
}
