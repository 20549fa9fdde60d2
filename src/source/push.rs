//! Sources backed by an external geofencing service.
//!
//! Some platforms evaluate containment themselves and only report edges. The
//! registrar abstracts that service: it is handed the region and a sender, and
//! pushes a [`FenceEdge`] every time the device crosses the boundary.

use crossbeam_channel::{Receiver, Sender, select, unbounded};
use serde::Serialize;

use super::{PositionSource, SamplingConfig, SourceEvent, validate_position};
use crate::error::SourceError;
use crate::geo::{Position, Region};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Enter,
    Exit,
}

/// A boundary crossing reported by a registrar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FenceEdge {
    pub kind: EdgeKind,
    /// Where the registrar observed the crossing.
    pub position: Position,
}

impl FenceEdge {
    pub fn is_enter(&self) -> bool {
        self.kind == EdgeKind::Enter
    }
}

/// An external service that watches a region on our behalf.
#[cfg_attr(test, mockall::automock)]
pub trait GeofenceRegistrar: Send {
    fn name(&self) -> String;

    /// Start watching `region`, delivering crossings to `edges`.
    fn register(&mut self, region: &Region, edges: Sender<FenceEdge>) -> Result<(), SourceError>;

    /// Stop watching. Must be safe to call when nothing is registered.
    fn unregister(&mut self);
}

/// Adapts a [`GeofenceRegistrar`] to the [`PositionSource`] interface.
pub struct PushSource {
    registrar: Box<dyn GeofenceRegistrar>,
    edges: Option<Receiver<FenceEdge>>,
}

impl PushSource {
    pub fn new(registrar: Box<dyn GeofenceRegistrar>) -> Self {
        Self {
            registrar,
            edges: None,
        }
    }
}

impl PositionSource for PushSource {
    fn name(&self) -> String {
        format!("push:{}", self.registrar.name())
    }

    fn open(&mut self, region: &Region, _config: &SamplingConfig) -> Result<(), SourceError> {
        // Re-registering replaces any earlier region
        self.close();

        let (tx, rx) = unbounded();
        self.registrar.register(region, tx)?;
        self.edges = Some(rx);
        Ok(())
    }

    fn next_event(&mut self, cancel: &Receiver<()>) -> Result<Option<SourceEvent>, SourceError> {
        let Some(edges) = self.edges.as_ref() else {
            return Err(SourceError::Unavailable {
                provider: self.registrar.name(),
                reason: "source was not opened".to_string(),
            });
        };

        select! {
            recv(cancel) -> _ => Ok(None),
            recv(edges) -> edge => match edge {
                Ok(edge) => {
                    let position = validate_position(edge.position)?;
                    Ok(Some(SourceEvent::Edge(FenceEdge { position, ..edge })))
                }
                Err(_) => Err(SourceError::Unavailable {
                    provider: self.registrar.name(),
                    reason: "registrar stopped delivering edges".to_string(),
                }),
            },
        }
    }

    fn close(&mut self) {
        if self.edges.take().is_some() {
            self.registrar.unregister();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::AccuracyTier;
    use crossbeam_channel::bounded;
    use mockall::predicate::always;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn sampling() -> SamplingConfig {
        SamplingConfig::new(
            Duration::from_millis(3000),
            Duration::from_millis(2000),
            AccuracyTier::High,
        )
    }

    fn region() -> Region {
        Region::new(28.5782472, 77.3596155, 100.0).unwrap()
    }

    #[test]
    fn test_edges_are_forwarded_and_unregistered_once() {
        let captured: Arc<Mutex<Option<Sender<FenceEdge>>>> = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&captured);

        let mut registrar = MockGeofenceRegistrar::new();
        registrar.expect_name().return_const("mock".to_string());
        registrar
            .expect_register()
            .with(always(), always())
            .times(1)
            .returning(move |_, tx| {
                *slot.lock().unwrap() = Some(tx);
                Ok(())
            });
        registrar.expect_unregister().times(1).return_const(());

        let mut source = PushSource::new(Box::new(registrar));
        source.open(&region(), &sampling()).unwrap();

        let edge = FenceEdge {
            kind: EdgeKind::Enter,
            position: Position::now(28.5782472, 77.3596155).unwrap(),
        };
        captured.lock().unwrap().as_ref().unwrap().send(edge).unwrap();

        let (_cancel_tx, cancel_rx) = bounded::<()>(1);
        assert_eq!(
            source.next_event(&cancel_rx).unwrap(),
            Some(SourceEvent::Edge(edge))
        );

        source.close();
        source.close();
    }

    #[test]
    fn test_registration_failure_is_reported() {
        let mut registrar = MockGeofenceRegistrar::new();
        registrar.expect_name().return_const("mock".to_string());
        registrar.expect_register().returning(|_, _| {
            Err(SourceError::PermissionDenied {
                provider: "mock".to_string(),
            })
        });
        registrar.expect_unregister().times(0);

        let mut source = PushSource::new(Box::new(registrar));
        assert!(matches!(
            source.open(&region(), &sampling()),
            Err(SourceError::PermissionDenied { .. })
        ));
        source.close();
    }

    #[test]
    fn test_cancel_wins_when_no_edges_arrive() {
        let mut registrar = MockGeofenceRegistrar::new();
        registrar.expect_name().return_const("mock".to_string());
        let keep: Arc<Mutex<Vec<Sender<FenceEdge>>>> = Arc::new(Mutex::new(Vec::new()));
        let keep_clone = Arc::clone(&keep);
        registrar.expect_register().returning(move |_, tx| {
            keep_clone.lock().unwrap().push(tx);
            Ok(())
        });
        registrar.expect_unregister().return_const(());

        let mut source = PushSource::new(Box::new(registrar));
        source.open(&region(), &sampling()).unwrap();

        let (cancel_tx, cancel_rx) = bounded::<()>(1);
        cancel_tx.send(()).unwrap();
        assert_eq!(source.next_event(&cancel_rx).unwrap(), None);
    }
}
