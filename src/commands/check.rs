//! `geofencer check`: validate and print the configuration.

use anyhow::{Context, Result};

use crate::config::Config;

pub fn handle_check_command(debug_enabled: bool) -> Result<()> {
    log_version!();

    let config_path = Config::get_config_path()?;
    let config = Config::load_from_path(&config_path).context("Configuration failed")?;
    config.log_config(Some(&config_path));

    let region = config.region()?;
    let bus = config.bus();
    if debug_enabled {
        log_pipe!();
        log_debug!("Region: {:?}", region);
        log_debug!("Transition queue: {} per subscriber", bus.transition_capacity);
        log_debug!(
            "Retry policy: {} attempt(s), {}s apart",
            config.retry_attempts(),
            config.retry_delay().as_secs()
        );
    }

    log_pipe!();
    log_info!("Configuration is valid");
    log_end!();
    Ok(())
}

pub fn display_help() {
    log_version!();
    super::help::show_command_usage("check");
    log_block_start!("Loads and validates the configuration file, then prints the");
    log_indented!("region, sampling and source settings without starting monitoring.");
    log_end!();
}
