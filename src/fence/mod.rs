//! Edge-triggered inside/outside tracking for one region.
//!
//! The state machine turns a stream of containment results into transitions.
//! Only flips produce events: staying inside, or staying outside, is silent.
//! The first evaluation after a (re)start primes the state without emitting,
//! so a session that starts inside the region does not announce an entry.

use serde::Serialize;

use crate::geo::{ContainmentResult, Position, Region, evaluate, haversine_distance};
use crate::source::FenceEdge;

/// Where the monitored device was last seen relative to the region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FenceState {
    /// No valid evaluation since the session started.
    Uninitialized,
    Inside,
    Outside,
}

impl FenceState {
    fn from_inside(inside: bool) -> Self {
        if inside {
            FenceState::Inside
        } else {
            FenceState::Outside
        }
    }
}

/// A detected crossing of the region boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TransitionEvent {
    /// The position that caused the crossing.
    pub position: Position,
    /// `true` for an entry, `false` for an exit.
    pub inside: bool,
    pub distance_meters: f64,
}

impl TransitionEvent {
    pub fn is_entry(&self) -> bool {
        self.inside
    }
}

/// Result of feeding one position into the state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub containment: ContainmentResult,
    pub transition: Option<TransitionEvent>,
}

pub struct GeofenceStateMachine {
    region: Region,
    state: FenceState,
}

impl GeofenceStateMachine {
    pub fn new(region: Region) -> Self {
        Self {
            region,
            state: FenceState::Uninitialized,
        }
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn state(&self) -> FenceState {
        self.state
    }

    /// Evaluate `position` and advance the state.
    ///
    /// A position that cannot be evaluated leaves the state untouched.
    pub fn observe(&mut self, position: Position) -> Observation {
        let containment = evaluate(&position, &self.region);
        if !containment.distance_meters.is_finite() {
            return Observation {
                containment,
                transition: None,
            };
        }

        let next = FenceState::from_inside(containment.inside);
        let transition = match self.state {
            FenceState::Uninitialized => None,
            current if current == next => None,
            _ => Some(TransitionEvent {
                position,
                inside: containment.inside,
                distance_meters: containment.distance_meters,
            }),
        };
        self.state = next;

        Observation {
            containment,
            transition,
        }
    }

    /// Accept an edge detected by an external registrar.
    ///
    /// The registrar already decided containment, so the edge always becomes
    /// a transition and the local state simply follows it.
    pub fn apply_edge(&mut self, edge: &FenceEdge) -> TransitionEvent {
        let distance_meters = haversine_distance(
            edge.position.latitude,
            edge.position.longitude,
            self.region.center_latitude(),
            self.region.center_longitude(),
        );
        let inside = edge.is_enter();
        self.state = FenceState::from_inside(inside);

        TransitionEvent {
            position: edge.position,
            inside,
            distance_meters: if distance_meters.is_finite() {
                distance_meters
            } else {
                f64::INFINITY
            },
        }
    }

    /// Forget the last state; the next observation primes again.
    pub fn reset(&mut self) {
        self.state = FenceState::Uninitialized;
    }
}
