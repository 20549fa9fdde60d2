//! Small helpers shared across modules.

use std::path::Path;

/// Display a path with the home directory collapsed to `~`.
///
/// Keeps usernames out of logs that users paste into bug reports.
pub fn private_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(rest) = path.strip_prefix(&home)
    {
        return format!("~/{}", rest.display());
    }
    path.display().to_string()
}

/// Format a coordinate pair with hemisphere letters.
pub fn format_coordinates(latitude: f64, longitude: f64) -> String {
    let lat_dir = if latitude >= 0.0 { "N" } else { "S" };
    let lon_dir = if longitude >= 0.0 { "E" } else { "W" };
    format!(
        "{:.6}°{}, {:.6}°{}",
        latitude.abs(),
        lat_dir,
        longitude.abs(),
        lon_dir
    )
}

/// Human readable distance in meters or kilometers.
pub fn format_distance(meters: f64) -> String {
    if !meters.is_finite() {
        "unknown".to_string()
    } else if meters >= 1000.0 {
        format!("{:.2} km", meters / 1000.0)
    } else {
        format!("{meters:.0} m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_format_coordinates_hemispheres() {
        assert_eq!(
            format_coordinates(28.5782472, 77.3596155),
            "28.578247°N, 77.359616°E"
        );
        assert_eq!(format_coordinates(-33.8688, -70.0), "33.868800°S, 70.000000°W");
    }

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(0.0), "0 m");
        assert_eq!(format_distance(499.6), "500 m");
        assert_eq!(format_distance(1500.0), "1.50 km");
        assert_eq!(format_distance(f64::INFINITY), "unknown");
    }

    #[test]
    fn test_private_path_outside_home() {
        let path = PathBuf::from("/etc/geofencer/geofencer.toml");
        assert_eq!(private_path(&path), "/etc/geofencer/geofencer.toml");
    }
}
