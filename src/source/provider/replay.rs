//! Scripted positions for simulation runs and tests.

use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::VecDeque;
use std::path::Path;

use super::PositionProvider;
use crate::error::SourceError;
use crate::geo::Position;
use crate::source::AccuracyTier;

/// Replays a fixed list of positions, one per sample.
///
/// Positions loaded from a file are stamped with the time they are handed
/// out; positions given directly keep their own timestamps. Once the list is
/// used up every call fails with [`SourceError::Exhausted`].
pub struct ReplayProvider {
    label: String,
    positions: VecDeque<Position>,
    restamp: bool,
}

impl ReplayProvider {
    pub fn from_positions(positions: Vec<Position>) -> Self {
        Self {
            label: "replay".to_string(),
            positions: positions.into(),
            restamp: false,
        }
    }

    /// Load a track file with one `latitude,longitude` pair per line.
    ///
    /// Blank lines and lines starting with `#` are ignored. Whitespace may be
    /// used instead of a comma.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read track file {}", path.display()))?;
        let positions = parse_track(&content)
            .with_context(|| format!("Failed to parse track file {}", path.display()))?;

        if positions.is_empty() {
            anyhow::bail!("Track file {} contains no positions", path.display());
        }

        Ok(Self {
            label: format!("replay:{}", file_label(path)),
            positions: positions.into(),
            restamp: true,
        })
    }

    pub fn remaining(&self) -> usize {
        self.positions.len()
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "track".to_string())
}

fn parse_track(content: &str) -> Result<Vec<Position>> {
    let mut positions = Vec::new();

    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|field| !field.is_empty())
            .collect();
        if fields.len() != 2 {
            anyhow::bail!(
                "line {}: expected 'latitude,longitude', got '{}'",
                index + 1,
                line
            );
        }

        let latitude: f64 = fields[0]
            .parse()
            .with_context(|| format!("line {}: invalid latitude '{}'", index + 1, fields[0]))?;
        let longitude: f64 = fields[1]
            .parse()
            .with_context(|| format!("line {}: invalid longitude '{}'", index + 1, fields[1]))?;

        let position = Position::now(latitude, longitude)
            .map_err(|e| anyhow::anyhow!("line {}: {}", index + 1, e))?;
        positions.push(position);
    }

    Ok(positions)
}

impl PositionProvider for ReplayProvider {
    fn name(&self) -> &str {
        &self.label
    }

    fn current_fix(&mut self, _accuracy: AccuracyTier) -> Result<Option<Position>, SourceError> {
        match self.positions.pop_front() {
            Some(mut position) => {
                if self.restamp {
                    position.timestamp = Utc::now();
                }
                Ok(Some(position))
            }
            None => Err(SourceError::Exhausted {
                provider: self.label.clone(),
            }),
        }
    }
}
