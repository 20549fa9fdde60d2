//! Monitoring sessions.
//!
//! A [`Monitor`] owns at most one active session. Starting a session opens
//! the position source and spawns a sampler thread that feeds every event
//! through a fresh [`GeofenceStateMachine`] and publishes the results on the
//! [`EventBus`]. Starting again replaces the running session; stopping is
//! idempotent and returns only once the source has been released.
//!
//! Source failures never appear on the bus. A session that dies reports
//! exactly one [`SessionEvent::Failed`] on the channel returned by
//! [`Monitor::events`].

mod sampler;

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

use crate::bus::EventBus;
use crate::common::utils::{format_coordinates, format_distance};
use crate::error::{GeofenceError, SourceError};
use crate::fence::GeofenceStateMachine;
use crate::geo::Region;
use crate::source::{PositionSource, SamplingConfig};

use sampler::{Gate, Sampler};

/// Out-of-band notices about a session's lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The source failed and the session has stopped.
    Failed { session_id: u64, cause: SourceError },
}

impl SessionEvent {
    pub fn session_id(&self) -> u64 {
        match self {
            SessionEvent::Failed { session_id, .. } => *session_id,
        }
    }

    /// The failure in the core error taxonomy.
    pub fn error(&self) -> GeofenceError {
        match self {
            SessionEvent::Failed { cause, .. } => GeofenceError::from(cause.clone()),
        }
    }
}

struct ActiveSession {
    id: u64,
    region: Region,
    gate: Arc<Gate>,
    cancel: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

pub struct Monitor {
    bus: EventBus,
    events_tx: Sender<SessionEvent>,
    events_rx: Receiver<SessionEvent>,
    active: Mutex<Option<ActiveSession>>,
    next_session: AtomicU64,
    debug_enabled: bool,
}

impl Monitor {
    pub fn new(bus: EventBus) -> Self {
        let (events_tx, events_rx) = unbounded();
        Self {
            bus,
            events_tx,
            events_rx,
            active: Mutex::new(None),
            next_session: AtomicU64::new(1),
            debug_enabled: false,
        }
    }

    pub fn with_debug(mut self, debug_enabled: bool) -> Self {
        self.debug_enabled = debug_enabled;
        self
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Receiver for session failure notices.
    pub fn events(&self) -> Receiver<SessionEvent> {
        self.events_rx.clone()
    }

    fn active(&self) -> MutexGuard<'_, Option<ActiveSession>> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_running(&self) -> bool {
        self.active()
            .as_ref()
            .and_then(|session| session.handle.as_ref())
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn current_region(&self) -> Option<Region> {
        self.active().as_ref().map(|session| session.region)
    }

    pub fn current_session(&self) -> Option<u64> {
        self.active().as_ref().map(|session| session.id)
    }

    /// Begin watching `region` with `source`, replacing any running session.
    ///
    /// The source is opened before this returns, so a refused permission or
    /// unreachable provider is reported here. Later failures arrive as a
    /// [`SessionEvent`]. Returns the new session id.
    pub fn start_monitoring(
        &self,
        region: Region,
        config: SamplingConfig,
        mut source: Box<dyn PositionSource>,
    ) -> Result<u64, GeofenceError> {
        // The lock is not held across the join or `open`
        let previous = self.active().take();
        if let Some(previous) = previous {
            self.shutdown(previous);
        }

        source.open(&region, &config)?;

        let session_id = self.next_session.fetch_add(1, Ordering::Relaxed);
        let gate = Gate::opened();
        let (cancel_tx, cancel_rx) = bounded(1);
        let source_name = source.name();

        let sampler = Sampler {
            session_id,
            machine: GeofenceStateMachine::new(region),
            source,
            bus: self.bus.clone(),
            gate: Arc::clone(&gate),
            cancel: cancel_rx,
            events: self.events_tx.clone(),
            debug_enabled: self.debug_enabled,
        };

        let handle = std::thread::Builder::new()
            .name(format!("geofencer-session-{session_id}"))
            .spawn(move || sampler.run())
            .map_err(|e| {
                GeofenceError::SourceUnavailable(format!("failed to start sampler thread: {e}"))
            })?;

        if self.debug_enabled {
            log_pipe!();
            log_debug!(
                "Session {} watching {} within {} using {} (every {}ms)",
                session_id,
                format_coordinates(region.center_latitude(), region.center_longitude()),
                format_distance(region.radius_meters()),
                source_name,
                config.effective_interval().as_millis()
            );
        }

        let replaced = self.active().replace(ActiveSession {
            id: session_id,
            region,
            gate,
            cancel: cancel_tx,
            handle: Some(handle),
        });
        // A concurrent start installed its session in the meantime
        if let Some(replaced) = replaced {
            self.shutdown(replaced);
        }

        Ok(session_id)
    }

    /// Stop the active session, if any.
    ///
    /// Once this returns no further position or transition from the session
    /// is published and its source has been closed.
    pub fn stop_monitoring(&self) {
        let previous = self.active().take();
        if let Some(session) = previous {
            self.shutdown(session);
        }
    }

    fn shutdown(&self, mut session: ActiveSession) {
        session.gate.close();
        // Dropping the sender wakes the sampler's wait immediately
        drop(session.cancel);

        if let Some(handle) = session.handle.take()
            && handle.join().is_err()
        {
            log_pipe!();
            log_warning!("Session {} sampler thread panicked", session.id);
        }

        if self.debug_enabled {
            log_pipe!();
            log_debug!("Session {} stopped", session.id);
        }
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.stop_monitoring();
    }
}
