//! Single-instance lock file.
//!
//! The lock lives at `$XDG_RUNTIME_DIR/geofencer.lock` (falling back to
//! `/tmp`) and holds the owner's PID on the first line and its custom config
//! directory, if any, on the second.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::PathBuf;

use super::instance::{InstanceInfo, is_instance_running};
use crate::common::constants::LOCK_FILE_NAME;
use crate::config::loading::get_custom_config_dir;

pub fn get_lock_path() -> PathBuf {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(runtime_dir).join(LOCK_FILE_NAME)
}

/// Held for the lifetime of the daemon. Removes the lock file on drop.
pub struct LockGuard {
    file: File,
    path: PathBuf,
}

impl LockGuard {
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Take the instance lock.
///
/// Returns `Ok(None)` when another live instance holds it. A lock left behind
/// by a dead process is cleared and taken over.
pub fn acquire_lock() -> Result<Option<LockGuard>> {
    let path = get_lock_path();

    if let Some(guard) = try_lock(&path)? {
        return Ok(Some(guard));
    }

    let owner = std::fs::read_to_string(&path)
        .ok()
        .and_then(|content| InstanceInfo::from_lock_contents(&content).ok());

    match owner {
        Some(info) if is_instance_running(info.pid) => {
            log_pipe!();
            log_error!("geofencer is already running (PID: {})", info.pid);
            log_block_start!("Did you mean to:");
            log_indented!("• Reload configuration: geofencer reload");
            log_indented!("• Stop the running instance: geofencer stop");
            Ok(None)
        }
        _ => {
            log_warning!("Removing stale lock file");
            let _ = std::fs::remove_file(&path);
            try_lock(&path)?
                .map(Some)
                .context("Failed to acquire lock after removing stale lock file")
        }
    }
}

fn try_lock(path: &PathBuf) -> Result<Option<LockGuard>> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .with_context(|| format!("Failed to open lock file {}", path.display()))?;

    if file.try_lock_exclusive().is_err() {
        return Ok(None);
    }

    let info = InstanceInfo {
        pid: std::process::id(),
        config_dir: get_custom_config_dir(),
    };
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(info.to_lock_contents().as_bytes())?;
    file.flush()?;

    Ok(Some(LockGuard {
        file,
        path: path.clone(),
    }))
}
