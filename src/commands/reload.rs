//! `geofencer reload`: ask the running instance to re-read its config.

use anyhow::{Context, Result};

use crate::config::Config;
use crate::io::instance::{get_running_instance, send_reload_signal};

pub fn handle_reload_command(debug_enabled: bool) -> Result<()> {
    log_version!();

    let Some(instance) = get_running_instance()? else {
        log_pipe!();
        log_warning!("No geofencer instance is running");
        log_indented!("Start one with: geofencer");
        log_end!();
        return Ok(());
    };

    // Validate first so a broken file is reported here, not in the daemon log
    let config_path = match &instance.config_dir {
        Some(dir) => dir.join(crate::common::constants::CONFIG_FILE_NAME),
        None => Config::get_config_path()?,
    };
    Config::load_from_path(&config_path).context("Configuration is invalid, not reloading")?;

    send_reload_signal(instance.pid)?;

    if debug_enabled {
        log_pipe!();
        log_debug!("SIGUSR2 sent to process {}", instance.pid);
    }

    log_block_start!("Reload requested (PID: {})", instance.pid);
    log_indented!("Monitoring restarts with the new region and sampling settings");
    log_end!();
    Ok(())
}

pub fn display_help() {
    log_version!();
    super::help::show_command_usage("reload");
    log_block_start!("Validates the configuration, then signals the running instance");
    log_indented!("to reload it. The geofence state starts over after a reload.");
    log_end!();
}
