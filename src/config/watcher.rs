//! Hot reload of the configuration file.
//!
//! The watcher observes the directory holding `geofencer.toml` rather than the
//! file itself, because most editors save by writing a temporary file and
//! renaming it over the original.

use anyhow::{Context, Result};
use crossbeam_channel::Sender;
use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::common::utils::private_path;
use crate::io::signals::SignalMessage;

/// Editors often write a file in several steps
const DEBOUNCE_MS: u64 = 500;

pub struct ConfigWatcher {
    config_path: PathBuf,
    signal_sender: Sender<SignalMessage>,
    debug_enabled: bool,
}

impl ConfigWatcher {
    pub fn new(config_path: PathBuf, signal_sender: Sender<SignalMessage>, debug_enabled: bool) -> Self {
        Self {
            config_path,
            signal_sender,
            debug_enabled,
        }
    }

    /// Spawn the watcher thread. It runs until the signal channel closes.
    pub fn start(self) -> Result<()> {
        let Some(config_dir) = self.config_path.parent().map(Path::to_path_buf) else {
            anyhow::bail!(
                "Config path {} has no parent directory",
                private_path(&self.config_path)
            );
        };

        let (tx, rx) = crossbeam_channel::unbounded();
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res
                    && matches!(
                        event.kind,
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                    )
                {
                    let _ = tx.send(event);
                }
            },
            NotifyConfig::default(),
        )
        .context("Failed to create file watcher")?;

        watcher
            .watch(&config_dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch directory: {}", private_path(&config_dir)))?;

        if self.debug_enabled {
            log_pipe!();
            log_debug!("Watching {} for changes", private_path(&self.config_path));
        }

        std::thread::Builder::new()
            .name("geofencer-config-watch".to_string())
            .spawn(move || {
                // The watcher stops when dropped
                let _watcher = watcher;
                let mut last_reload: Option<Instant> = None;

                for event in rx {
                    if !affects_config(&event, &self.config_path) {
                        continue;
                    }

                    if last_reload.is_some_and(|t| t.elapsed() < Duration::from_millis(DEBOUNCE_MS)) {
                        continue;
                    }

                    if self.debug_enabled {
                        log_pipe!();
                        log_info!("Configuration file change detected");
                    }

                    if self.signal_sender.send(SignalMessage::Reload).is_err() {
                        break;
                    }
                    last_reload = Some(Instant::now());
                }
            })
            .context("Failed to spawn config watcher thread")?;

        Ok(())
    }
}

/// Whether `event` touches the config file or an editor's temp copy of it.
fn affects_config(event: &Event, config_path: &Path) -> bool {
    let Some(config_name) = config_path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    event.paths.iter().any(|path| {
        path.parent() == config_path.parent()
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| name == config_name || name.starts_with(config_name))
    })
}

pub fn start_config_watcher(
    config_path: PathBuf,
    signal_sender: Sender<SignalMessage>,
    debug_enabled: bool,
) -> Result<()> {
    ConfigWatcher::new(config_path, signal_sender, debug_enabled).start()
}
