//! Range and consistency checks for loaded configuration.

use anyhow::Result;

use super::{Config, SourceKind};
use crate::common::constants::*;

pub fn validate_config(config: &Config) -> Result<()> {
    if let Some(lat) = config.latitude
        && !(-90.0..=90.0).contains(&lat)
    {
        anyhow::bail!("latitude must be between -90 and 90 degrees (got {})", lat);
    }

    if let Some(lon) = config.longitude
        && !(-180.0..=180.0).contains(&lon)
    {
        anyhow::bail!(
            "longitude must be between -180 and 180 degrees (got {})",
            lon
        );
    }

    if let Some(radius) = config.radius
        && (!radius.is_finite() || radius <= 0.0 || radius > MAXIMUM_RADIUS_METERS)
    {
        anyhow::bail!(
            "radius must be greater than 0 and at most {} meters (got {})",
            MAXIMUM_RADIUS_METERS,
            radius
        );
    }

    validate_intervals(config)?;

    if config.transition_capacity == Some(0) {
        anyhow::bail!(
            "transition_capacity must be at least 1; a zero-length queue would overflow on every transition"
        );
    }

    if config.source_kind() == SourceKind::Replay && config.replay_file.is_none() {
        anyhow::bail!("source = \"replay\" requires replay_file to be set");
    }

    if let Some(address) = config.gpsd_address.as_deref()
        && !address.contains(':')
    {
        anyhow::bail!(
            "gpsd_address must be in host:port form (got '{}')",
            address
        );
    }

    if let Some(delay) = config.retry_delay
        && !(MINIMUM_RETRY_DELAY_SECS..=MAXIMUM_RETRY_DELAY_SECS).contains(&delay)
    {
        anyhow::bail!(
            "retry_delay ({} s) must be between {} and {} seconds",
            delay,
            MINIMUM_RETRY_DELAY_SECS,
            MAXIMUM_RETRY_DELAY_SECS
        );
    }

    Ok(())
}

fn validate_intervals(config: &Config) -> Result<()> {
    let poll = config.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL_MS);
    let fastest = config
        .fastest_interval
        .unwrap_or(DEFAULT_FASTEST_INTERVAL_MS);

    if fastest < MINIMUM_FASTEST_INTERVAL_MS {
        anyhow::bail!(
            "fastest_interval ({} ms) must be at least {} milliseconds",
            fastest,
            MINIMUM_FASTEST_INTERVAL_MS
        );
    }

    if poll > MAXIMUM_POLL_INTERVAL_MS {
        anyhow::bail!(
            "poll_interval ({} ms) must be at most {} milliseconds",
            poll,
            MAXIMUM_POLL_INTERVAL_MS
        );
    }

    if fastest > poll {
        anyhow::bail!(
            "fastest_interval ({} ms) cannot be longer than poll_interval ({} ms)",
            fastest,
            poll
        );
    }

    Ok(())
}
