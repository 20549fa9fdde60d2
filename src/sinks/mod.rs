//! Consumers of the event bus.
//!
//! Each sink runs on its own thread with its own subscription, so a slow
//! notification daemon never delays the display or the sampler.

pub mod desktop;
pub mod display;
pub mod notification;

use crossbeam_channel::Sender;
use std::thread::JoinHandle;

pub use desktop::DesktopNotifier;
pub use display::DisplaySink;
pub use notification::{LogNotifier, NotificationSink, Notifier, message_for};

/// Handle to a running sink thread. Stops and joins the thread on drop.
pub struct SinkHandle {
    name: &'static str,
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl SinkHandle {
    pub(crate) fn new(name: &'static str, stop: Sender<()>, handle: JoinHandle<()>) -> Self {
        Self {
            name,
            stop: Some(stop),
            handle: Some(handle),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Stop the sink after it has handled whatever is already queued.
    pub fn stop(&mut self) {
        // Disconnecting the stop channel wakes the thread's select
        self.stop.take();
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            log_warning!("{} sink thread panicked", self.name);
        }
    }
}

impl Drop for SinkHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
