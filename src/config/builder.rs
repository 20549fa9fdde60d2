//! Generation of the commented default configuration file.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::common::constants::*;
use crate::common::utils::private_path;

/// Write a default configuration to `path`, creating parent directories.
pub fn create_default_config(path: &PathBuf) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
    }

    fs::write(path, default_config_content())
        .with_context(|| format!("Failed to write default config to {}", private_path(path)))?;

    log_block_start!("Created default configuration: {}", private_path(path));
    log_indented!("Edit latitude, longitude and radius to choose the region");

    Ok(())
}

pub(crate) fn default_config_content() -> String {
    let mut content = ConfigBuilder::new()
        .add_section("Region")
        .add_setting(
            "latitude",
            &DEFAULT_LATITUDE.to_string(),
            "Center latitude in degrees (-90 to 90)",
        )
        .add_setting(
            "longitude",
            &DEFAULT_LONGITUDE.to_string(),
            "Center longitude in degrees (-180 to 180)",
        )
        .add_setting(
            "radius",
            &format!("{DEFAULT_RADIUS_METERS:.1}"),
            &format!("Region radius in meters (up to {MAXIMUM_RADIUS_METERS})"),
        )
        .add_section("Sampling")
        .add_setting(
            "poll_interval",
            &DEFAULT_POLL_INTERVAL_MS.to_string(),
            "Target time between samples in milliseconds",
        )
        .add_setting(
            "fastest_interval",
            &DEFAULT_FASTEST_INTERVAL_MS.to_string(),
            &format!("Samples never come faster than this (ms, >= {MINIMUM_FASTEST_INTERVAL_MS})"),
        )
        .add_setting(
            "accuracy",
            &format!("\"{}\"", DEFAULT_ACCURACY.as_str()),
            "Fix quality: \"high\", \"balanced\" or \"low\"",
        )
        .add_section("Source")
        .add_setting(
            "source",
            &format!("\"{DEFAULT_SOURCE}\""),
            "Position source: \"gpsd\" or \"replay\"",
        )
        .add_setting(
            "gpsd_address",
            &format!("\"{DEFAULT_GPSD_ADDRESS}\""),
            "gpsd host:port",
        )
        .add_section("Alerts")
        .add_setting(
            "notifications",
            &format!("\"{DEFAULT_NOTIFICATIONS}\""),
            "Alert delivery: \"desktop\", \"log\" or \"none\"",
        )
        .add_setting(
            "transition_capacity",
            &DEFAULT_TRANSITION_CAPACITY.to_string(),
            "Queued alerts per consumer before the oldest is dropped",
        )
        .add_section("Recovery")
        .add_setting(
            "retry_attempts",
            &DEFAULT_RETRY_ATTEMPTS.to_string(),
            "Restarts after the source becomes unavailable (0 = never)",
        )
        .add_setting(
            "retry_delay",
            &DEFAULT_RETRY_DELAY_SECS.to_string(),
            &format!(
                "Seconds to wait before a restart ({MINIMUM_RETRY_DELAY_SECS}-{MAXIMUM_RETRY_DELAY_SECS})"
            ),
        )
        .build();
    content.push('\n');
    content
}

/// Builds config text with comments aligned to one column.
struct ConfigBuilder {
    lines: Vec<Line>,
}

enum Line {
    Section(String),
    Setting { assignment: String, comment: String },
}

impl ConfigBuilder {
    fn new() -> Self {
        Self { lines: Vec::new() }
    }

    fn add_section(mut self, title: &str) -> Self {
        self.lines.push(Line::Section(format!("#[{title}]")));
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.lines.push(Line::Setting {
            assignment: format!("{key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    fn build(self) -> String {
        let column = self
            .lines
            .iter()
            .filter_map(|line| match line {
                Line::Setting { assignment, .. } => Some(assignment.len()),
                Line::Section(_) => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        let mut output: Vec<String> = Vec::new();
        for line in self.lines {
            match line {
                Line::Section(header) => {
                    if !output.is_empty() {
                        output.push(String::new());
                    }
                    output.push(header);
                }
                Line::Setting {
                    assignment,
                    comment,
                } => {
                    let padding = " ".repeat(column - assignment.len());
                    output.push(format!("{assignment}{padding}{comment}"));
                }
            }
        }

        output.join("\n")
    }
}
