//! Locating, creating and parsing the configuration file.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use super::Config;
use super::validation::validate_config;
use crate::common::constants::CONFIG_FILE_NAME;
use crate::common::utils::private_path;

// Set once from --config at startup
static CONFIG_DIR: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Use `dir` instead of the XDG config directory for this process.
pub fn set_config_dir(dir: Option<String>) -> Result<()> {
    CONFIG_DIR
        .set(dir.map(PathBuf::from))
        .map_err(|_| anyhow::anyhow!("Configuration directory already set"))
}

pub fn get_custom_config_dir() -> Option<PathBuf> {
    CONFIG_DIR.get().and_then(|d| d.clone())
}

pub fn get_config_path() -> Result<PathBuf> {
    if let Some(dir) = get_custom_config_dir() {
        return Ok(dir.join(CONFIG_FILE_NAME));
    }

    let base = dirs::config_dir().context("Could not determine config directory")?;
    Ok(base.join("geofencer").join(CONFIG_FILE_NAME))
}

/// Load the configuration, writing a default file first if none exists.
pub fn load() -> Result<Config> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        super::builder::create_default_config(&config_path)
            .context("Failed to create default config during load")?;
    }

    load_from_path(&config_path)
}

/// Load and validate a specific file. Never creates one.
pub fn load_from_path(path: &PathBuf) -> Result<Config> {
    if !path.exists() {
        anyhow::bail!("Configuration file not found: {}", private_path(path));
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", private_path(path)))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", private_path(path)))?;

    resolve_replay_path(&mut config, path);
    validate_config(&config)?;

    Ok(config)
}

/// Relative replay files are taken relative to the config directory.
fn resolve_replay_path(config: &mut Config, config_path: &PathBuf) {
    let Some(file) = config.replay_file.as_ref() else {
        return;
    };

    let expanded = if let Some(rest) = file.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        home.join(rest)
    } else {
        PathBuf::from(file)
    };

    let resolved = if expanded.is_relative()
        && let Some(dir) = config_path.parent()
    {
        dir.join(expanded)
    } else {
        expanded
    };

    config.replay_file = Some(resolved.to_string_lossy().into_owned());
}
