//! `geofencer stop`: terminate the running instance.

use anyhow::Result;
use std::time::Duration;

use crate::io::instance::{get_running_instance_pid, is_instance_running, terminate_instance};

const STOP_TIMEOUT: Duration = Duration::from_secs(3);
const STOP_POLL: Duration = Duration::from_millis(100);

pub fn handle_stop_command(debug_enabled: bool) -> Result<()> {
    log_version!();

    let pid = match get_running_instance_pid() {
        Ok(pid) => pid,
        Err(_) => {
            log_pipe!();
            log_warning!("No geofencer instance is running");
            log_end!();
            return Ok(());
        }
    };

    log_block_start!("Stopping geofencer instance (PID: {})...", pid);
    terminate_instance(pid)?;

    if debug_enabled {
        log_pipe!();
        log_debug!("SIGTERM sent to process {}", pid);
    }

    let mut waited = Duration::ZERO;
    while waited < STOP_TIMEOUT {
        if !is_instance_running(pid) {
            log_pipe!();
            log_info!("Process terminated successfully");
            log_end!();
            return Ok(());
        }
        std::thread::sleep(STOP_POLL);
        waited += STOP_POLL;
    }

    log_pipe!();
    log_error!("Process {} did not exit within {}s", pid, STOP_TIMEOUT.as_secs());
    log_end!();
    anyhow::bail!("geofencer instance {} is still running", pid)
}

pub fn display_help() {
    log_version!();
    super::help::show_command_usage("stop");
    log_block_start!("Sends SIGTERM to the running instance and waits for it to exit.");
    log_indented!("Monitoring stops and the position source is released first.");
    log_end!();
}
