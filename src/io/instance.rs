//! Finding and signalling a running instance.

use anyhow::{Context, Result};
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use std::path::PathBuf;

use super::lock::get_lock_path;

/// What the lock file says about its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceInfo {
    pub pid: u32,
    pub config_dir: Option<PathBuf>,
}

impl InstanceInfo {
    pub fn from_lock_contents(contents: &str) -> Result<Self> {
        let mut lines = contents.lines();
        let pid = lines
            .next()
            .context("Lock file is empty")?
            .trim()
            .parse::<u32>()
            .context("Lock file contains an invalid PID")?;
        let config_dir = lines
            .next()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from);

        Ok(Self { pid, config_dir })
    }

    pub fn to_lock_contents(&self) -> String {
        match &self.config_dir {
            Some(dir) => format!("{}\n{}\n", self.pid, dir.display()),
            None => format!("{}\n\n", self.pid),
        }
    }
}

/// The live instance recorded in the lock file, if any.
pub fn get_running_instance() -> Result<Option<InstanceInfo>> {
    let Ok(content) = std::fs::read_to_string(get_lock_path()) else {
        return Ok(None);
    };

    let info = InstanceInfo::from_lock_contents(&content)?;
    Ok(is_instance_running(info.pid).then_some(info))
}

pub fn get_running_instance_pid() -> Result<u32> {
    get_running_instance()?
        .map(|info| info.pid)
        .ok_or_else(|| anyhow::anyhow!("No geofencer instance running"))
}

pub fn is_instance_running(pid: u32) -> bool {
    std::path::Path::new(&format!("/proc/{pid}")).exists()
}

pub fn terminate_instance(pid: u32) -> Result<()> {
    kill(Pid::from_raw(pid as i32), Signal::SIGTERM)
        .map_err(|e| anyhow::anyhow!("Failed to send SIGTERM to process: {}", e))
}

pub fn send_reload_signal(pid: u32) -> Result<()> {
    kill(Pid::from_raw(pid as i32), Signal::SIGUSR2)
        .map_err(|e| anyhow::anyhow!("Failed to send reload signal: {}", e))
}
