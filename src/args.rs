//! Command-line argument parsing.
//!
//! Options may appear before or after the command:
//!
//! ```text
//! geofencer [OPTIONS] [COMMAND] [ARGS]
//! ```

use std::path::PathBuf;

use crate::common::constants::DEFAULT_SIMULATION_INTERVAL_MS;

/// What the process should do.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the monitoring daemon.
    Run {
        debug_enabled: bool,
        config_dir: Option<String>,
        log_file: Option<PathBuf>,
    },
    /// Load and validate the configuration, then print it.
    Check {
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    /// Replay a track file through the full pipeline.
    Simulate {
        debug_enabled: bool,
        config_dir: Option<String>,
        track: PathBuf,
        interval_ms: u64,
        log_file: Option<PathBuf>,
    },
    Stop {
        debug_enabled: bool,
    },
    Reload {
        debug_enabled: bool,
    },
    Help {
        command: Option<String>,
    },
    ShowHelp,
    ShowVersion,
    /// Unknown or malformed arguments; usage is shown and the process fails.
    ShowHelpDueToError,
}

pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse arguments, including the program name in first position.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|arg| arg.as_ref().to_string())
            .collect();

        let mut debug_enabled = false;
        let mut display_help = false;
        let mut display_version = false;
        let mut unknown_arg_found = false;
        let mut config_dir: Option<String> = None;
        let mut log_file: Option<PathBuf> = None;
        let mut interval_ms: Option<u64> = None;
        let mut positional: Vec<String> = Vec::new();

        let mut i = 0;
        while i < args.len() {
            let arg = args[i].as_str();
            match arg {
                "--help" | "-h" => display_help = true,
                "--version" | "-V" | "-v" => display_version = true,
                "--debug" | "-d" => debug_enabled = true,
                "--config" | "-c" | "--log" | "-l" | "--interval" | "-i" => {
                    let Some(value) = args.get(i + 1).filter(|v| !v.starts_with('-')) else {
                        log_warning_standalone!("Missing value for {}", arg);
                        unknown_arg_found = true;
                        i += 1;
                        continue;
                    };

                    match arg {
                        "--config" | "-c" => config_dir = Some(value.clone()),
                        "--log" | "-l" => log_file = Some(PathBuf::from(value)),
                        _ => match value.parse::<u64>() {
                            Ok(ms) if ms > 0 => interval_ms = Some(ms),
                            _ => {
                                log_warning_standalone!(
                                    "Invalid interval '{}': expected milliseconds greater than 0",
                                    value
                                );
                                unknown_arg_found = true;
                            }
                        },
                    }
                    i += 1;
                }
                _ if arg.starts_with('-') => {
                    log_warning_standalone!("Unknown option: {}", arg);
                    unknown_arg_found = true;
                }
                _ => positional.push(arg.to_string()),
            }
            i += 1;
        }

        if display_version {
            return ParsedArgs {
                action: CliAction::ShowVersion,
            };
        }
        if unknown_arg_found {
            return ParsedArgs {
                action: CliAction::ShowHelpDueToError,
            };
        }

        let command = positional.first().map(String::as_str);
        let rest = positional.get(1..).unwrap_or(&[]);

        let action = match command {
            _ if display_help && command != Some("help") => CliAction::ShowHelp,
            None => CliAction::Run {
                debug_enabled,
                config_dir,
                log_file,
            },
            Some("help") | Some("h") => CliAction::Help {
                command: rest.first().cloned(),
            },
            Some("check") | Some("c") if rest.is_empty() => CliAction::Check {
                debug_enabled,
                config_dir,
            },
            Some("simulate") | Some("S") => match rest {
                [track] => CliAction::Simulate {
                    debug_enabled,
                    config_dir,
                    track: PathBuf::from(track),
                    interval_ms: interval_ms.unwrap_or(DEFAULT_SIMULATION_INTERVAL_MS),
                    log_file,
                },
                _ => {
                    log_warning_standalone!(
                        "Usage: geofencer simulate <track-file> [--interval <ms>] [--log <file>]"
                    );
                    CliAction::ShowHelpDueToError
                }
            },
            Some("stop") if rest.is_empty() => CliAction::Stop { debug_enabled },
            Some("reload") | Some("r") if rest.is_empty() => CliAction::Reload { debug_enabled },
            Some(other) => {
                log_warning_standalone!("Unknown command or extra arguments: {}", other);
                CliAction::ShowHelpDueToError
            }
        };

        ParsedArgs { action }
    }

    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

pub fn display_version_info() {
    log_version!();
    log_pipe!();
    crate::common::logger::write_output(&format!("┗ {}\n", env!("CARGO_PKG_DESCRIPTION")));
}

pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("geofencer [OPTIONS] [COMMAND]");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>     Use custom configuration directory");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("-h, --help             Print help information");
    log_indented!("-i, --interval <ms>    Replay interval for 'simulate'");
    log_indented!("-l, --log <file>       Write output to a file instead of stdout");
    log_indented!("-V, --version          Print version information");
    log_block_start!("Commands:");
    log_indented!("check, c               Validate the configuration and print it");
    log_indented!("help, h [COMMAND]      Show detailed help for a command");
    log_indented!("reload, r              Reload configuration of the running instance");
    log_indented!("simulate, S <file>     Replay a track file through the monitor");
    log_indented!("stop                   Stop the running instance");
    log_end!();
}
