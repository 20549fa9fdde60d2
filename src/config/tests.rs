use super::*;
use crate::config::builder::default_config_content;
use crate::config::validation::validate_config;
use std::fs;
use tempfile::tempdir;

fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("geofencer.toml");
    fs::write(&path, content).unwrap();
    (dir, path)
}

#[test]
fn test_default_config_parses_and_validates() {
    let (_dir, path) = write_config(&default_config_content());
    let config = Config::load_from_path(&path).unwrap();

    assert_eq!(config.latitude, Some(DEFAULT_LATITUDE));
    assert_eq!(config.longitude, Some(DEFAULT_LONGITUDE));
    assert_eq!(config.radius, Some(DEFAULT_RADIUS_METERS));
    assert_eq!(config.accuracy, Some(AccuracyTier::High));
    assert_eq!(config.source_kind(), SourceKind::Gpsd);
    assert_eq!(config.notification_mode(), NotificationMode::Desktop);
}

#[test]
fn test_default_config_comments_are_aligned() {
    let content = default_config_content();
    let columns: Vec<usize> = content
        .lines()
        .filter(|line| !line.starts_with('#') && line.contains(" # "))
        .map(|line| line.find(" # ").unwrap())
        .collect();

    assert!(!columns.is_empty());
    assert!(columns.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn test_empty_config_uses_defaults() {
    let (_dir, path) = write_config("");
    let config = Config::load_from_path(&path).unwrap();

    let region = config.region().unwrap();
    assert_eq!(region.radius_meters(), DEFAULT_RADIUS_METERS);

    let sampling = config.sampling();
    assert_eq!(sampling.poll_interval, Duration::from_millis(3000));
    assert_eq!(sampling.fastest_interval, Duration::from_millis(2000));
    assert_eq!(sampling.effective_interval(), Duration::from_millis(3000));
    assert_eq!(config.bus().transition_capacity, DEFAULT_TRANSITION_CAPACITY);
    assert_eq!(config.retry_delay(), Duration::from_secs(DEFAULT_RETRY_DELAY_SECS));
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    assert!(Config::load_from_path(&path).is_err());
}

#[test]
fn test_unparseable_file_is_an_error() {
    let (_dir, path) = write_config("latitude = \"north\"\n");
    let err = Config::load_from_path(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config"));
}

#[test]
fn test_coordinate_ranges() {
    let config = Config {
        latitude: Some(91.0),
        ..Default::default()
    };
    assert!(validate_config(&config).is_err());

    let config = Config {
        longitude: Some(-180.5),
        ..Default::default()
    };
    assert!(validate_config(&config).is_err());
}

#[test]
fn test_radius_must_be_positive_and_bounded() {
    for radius in [0.0, -5.0, MAXIMUM_RADIUS_METERS + 1.0] {
        let config = Config {
            radius: Some(radius),
            ..Default::default()
        };
        assert!(validate_config(&config).is_err(), "radius {radius} accepted");
    }
}

#[test]
fn test_interval_rules() {
    let too_fast = Config {
        fastest_interval: Some(500),
        ..Default::default()
    };
    assert!(validate_config(&too_fast).is_err());

    let inverted = Config {
        poll_interval: Some(1500),
        fastest_interval: Some(2000),
        ..Default::default()
    };
    assert!(validate_config(&inverted).is_err());

    let too_slow = Config {
        poll_interval: Some(MAXIMUM_POLL_INTERVAL_MS + 1),
        ..Default::default()
    };
    assert!(validate_config(&too_slow).is_err());

    let equal = Config {
        poll_interval: Some(2000),
        fastest_interval: Some(2000),
        ..Default::default()
    };
    assert!(validate_config(&equal).is_ok());
}

#[test]
fn test_zero_transition_capacity_rejected() {
    let config = Config {
        transition_capacity: Some(0),
        ..Default::default()
    };
    assert!(validate_config(&config).is_err());
}

#[test]
fn test_replay_source_needs_file() {
    let config = Config {
        source: Some(SourceKind::Replay),
        ..Default::default()
    };
    assert!(validate_config(&config).is_err());
}

#[test]
fn test_retry_delay_range() {
    let config = Config {
        retry_delay: Some(0),
        ..Default::default()
    };
    assert!(validate_config(&config).is_err());
}

#[test]
fn test_relative_replay_file_resolves_against_config_dir() {
    let (dir, path) = write_config("source = \"replay\"\nreplay_file = \"walk.csv\"\n");
    let config = Config::load_from_path(&path).unwrap();
    assert_eq!(
        config.replay_file.as_deref(),
        Some(dir.path().join("walk.csv").to_string_lossy().as_ref())
    );
}

#[test]
fn test_enums_parse_lowercase() {
    let (_dir, path) = write_config(
        "accuracy = \"low\"\nnotifications = \"none\"\ngpsd_address = \"localhost:2947\"\n",
    );
    let config = Config::load_from_path(&path).unwrap();
    assert_eq!(config.sampling().accuracy, AccuracyTier::Low);
    assert_eq!(config.notification_mode(), NotificationMode::None);
    assert_eq!(config.gpsd_address(), "localhost:2947");
}
