//! `geofencer simulate <track>`: replay a recorded or hand-written track.

use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;

use crate::Geofencer;
use crate::common::logger::Log;

pub fn handle_simulate_command(
    debug_enabled: bool,
    track: PathBuf,
    interval_ms: u64,
    log_file: Option<PathBuf>,
) -> Result<()> {
    let _log_guard = match log_file {
        Some(path) => {
            println!("Writing simulation output to {}", path.display());
            Some(Log::start_file_logging(path.display().to_string())?)
        }
        None => None,
    };

    Geofencer::new(debug_enabled)
        .simulate(track, Duration::from_millis(interval_ms))
        .run()?;

    log_end!();
    Ok(())
}

pub fn display_help() {
    log_version!();
    super::help::show_command_usage("simulate");
    log_block_start!("Feeds positions from a track file through the full pipeline:");
    log_indented!("containment, transitions, display and notifications.");
    log_block_start!("Track format:");
    log_indented!("One 'latitude,longitude' pair per line; '#' starts a comment");
    log_block_start!("Options:");
    log_indented!("-i, --interval <ms>    Time between positions (default 250)");
    log_indented!("-l, --log <file>       Write output to a file");
    log_end!();
}
