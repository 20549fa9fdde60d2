//! CLI entry point: parse arguments and dispatch.

use anyhow::Result;

use geofencer::args::{CliAction, ParsedArgs, display_help, display_version_info};
use geofencer::commands;
use geofencer::common::constants::EXIT_FAILURE;
use geofencer::common::logger::Log;
use geofencer::config::loading::set_config_dir;
use geofencer::{Geofencer, log_end, log_error_exit, log_indented};

fn main() {
    if let Err(e) = run() {
        log_error_exit!("{}", e);
        for cause in e.chain().skip(1) {
            log_indented!("{}", cause);
        }
        log_end!();
        std::process::exit(EXIT_FAILURE);
    }
}

fn run() -> Result<()> {
    match ParsedArgs::from_env().action {
        CliAction::ShowVersion => display_version_info(),
        CliAction::ShowHelp => display_help(),
        CliAction::ShowHelpDueToError => {
            display_help();
            std::process::exit(EXIT_FAILURE);
        }
        CliAction::Help { command } => commands::help::run_help_command(command.as_deref())?,
        CliAction::Run {
            debug_enabled,
            config_dir,
            log_file,
        } => {
            set_config_dir(config_dir)?;
            let _log_guard = match log_file {
                Some(path) => Some(Log::start_file_logging(path.display().to_string())?),
                None => None,
            };
            Geofencer::new(debug_enabled).run()?;
            log_end!();
        }
        CliAction::Check {
            debug_enabled,
            config_dir,
        } => {
            set_config_dir(config_dir)?;
            commands::check::handle_check_command(debug_enabled)?;
        }
        CliAction::Simulate {
            debug_enabled,
            config_dir,
            track,
            interval_ms,
            log_file,
        } => {
            set_config_dir(config_dir)?;
            commands::simulate::handle_simulate_command(debug_enabled, track, interval_ms, log_file)?;
        }
        CliAction::Stop { debug_enabled } => commands::stop::handle_stop_command(debug_enabled)?,
        CliAction::Reload { debug_enabled } => {
            commands::reload::handle_reload_command(debug_enabled)?
        }
    }
    Ok(())
}
