//! `geofencer help [command]`.

use anyhow::Result;

pub fn show_command_usage(command: &str) {
    match command {
        "check" | "c" => log_block_start!("Usage: geofencer check"),
        "reload" | "r" => log_block_start!("Usage: geofencer reload"),
        "simulate" | "S" => {
            log_block_start!("Usage: geofencer simulate <track-file> [--interval <ms>] [--log <file>]")
        }
        "stop" => log_block_start!("Usage: geofencer stop"),
        _ => log_block_start!("Usage: geofencer [OPTIONS] [COMMAND]"),
    }
}

pub fn run_help_command(command: Option<&str>) -> Result<()> {
    match command {
        None => display_general_help(),
        Some("check") | Some("c") => super::check::display_help(),
        Some("reload") | Some("r") => super::reload::display_help(),
        Some("simulate") | Some("S") => super::simulate::display_help(),
        Some("stop") => super::stop::display_help(),
        Some("help") | Some("h") => display_help_help(),
        Some(unknown) => {
            log_warning_standalone!("Unknown command: {}", unknown);
            display_general_help();
        }
    }
    Ok(())
}

fn display_general_help() {
    log_version!();
    log_block_start!("Available Commands:");
    log_indented!("check, c                Validate the configuration and print it");
    log_indented!("help, h [COMMAND]       Show detailed help for a command");
    log_indented!("reload, r               Reload configuration of the running instance");
    log_indented!("simulate, S <file>      Replay a track file through the monitor");
    log_indented!("stop                    Stop the running instance");
    log_pipe!();
    log_info!("Use 'geofencer help <command>' to see detailed help for a specific command.");
    log_indented!("Use 'geofencer --help' to see all options and general usage.");
    log_end!();
}

fn display_help_help() {
    log_version!();
    show_command_usage("help");
    log_indented!("geofencer help [COMMAND]");
    log_block_start!("Shows detailed help for COMMAND, or lists all commands.");
    log_end!();
}
