//! Unix signal handling for the daemon.
//!
//! A dedicated thread turns process signals into [`SignalMessage`]s on a
//! crossbeam channel that the main loop selects on alongside session events.
//! The config watcher sends into the same channel.

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender, unbounded};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM, SIGUSR2},
    iterator::Signals,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalMessage {
    /// Re-read the configuration (SIGUSR2 or a config file change).
    Reload,
    /// Stop monitoring and exit (SIGTERM, SIGINT, SIGHUP).
    Shutdown,
}

pub struct SignalState {
    /// Cleared once a shutdown signal has been received.
    pub running: Arc<AtomicBool>,
    pub signal_receiver: Receiver<SignalMessage>,
    /// Extra producers (config watcher) send through a clone of this.
    pub signal_sender: Sender<SignalMessage>,
}

impl SignalState {
    /// A state with no signal thread attached, driven only through
    /// `signal_sender`.
    pub fn detached() -> Self {
        let (signal_sender, signal_receiver) = unbounded();
        Self {
            running: Arc::new(AtomicBool::new(true)),
            signal_receiver,
            signal_sender,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Register signal handlers and spawn the forwarding thread.
pub fn setup_signal_handler(debug_enabled: bool) -> Result<SignalState> {
    let state = SignalState::detached();

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP, SIGUSR2])
        .context("failed to register signal handlers")?;

    let running = Arc::clone(&state.running);
    let sender = state.signal_sender.clone();

    std::thread::Builder::new()
        .name("geofencer-signals".to_string())
        .spawn(move || {
            for sig in signals.forever() {
                let message = match sig {
                    SIGUSR2 => {
                        if debug_enabled {
                            log_pipe!();
                            log_debug!("Received SIGUSR2, reloading configuration");
                        }
                        SignalMessage::Reload
                    }
                    _ => {
                        log_pipe!();
                        log_info!("Received {}, shutting down", signal_name(sig));
                        running.store(false, Ordering::SeqCst);
                        SignalMessage::Shutdown
                    }
                };

                if sender.send(message).is_err() {
                    break;
                }
            }
        })
        .context("failed to spawn signal handler thread")?;

    Ok(state)
}

fn signal_name(sig: i32) -> &'static str {
    match sig {
        SIGINT => "SIGINT",
        SIGTERM => "SIGTERM",
        SIGHUP => "SIGHUP",
        SIGUSR2 => "SIGUSR2",
        _ => "signal",
    }
}
