use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::audio::{DEFAULT_DURATION, Instrument};
use crate::error::{Error, Result};
use crate::grid::{COLUMN_INCREMENT, DEFAULT_COLUMNS, DEFAULT_ROWS};
use crate::pitch::{C4_HZ, PitchTable};
use crate::timing::{TempoPolicy, TempoRange, validate_bpm};

/// Session settings. Every field has a default, so a config file only needs
/// the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub rows: usize,
    pub columns: usize,
    pub column_increment: usize,
    pub bpm: f64,
    /// Seconds each triggered note lasts.
    pub note_duration: f64,
    pub default_instrument: Instrument,
    pub tempo_policy: TempoPolicy,
    /// Frequency of row 0; each following row is one semitone higher.
    pub base_frequency: f32,
    pub tempo_range: TempoRange,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            columns: DEFAULT_COLUMNS,
            column_increment: COLUMN_INCREMENT,
            bpm: 240.0,
            note_duration: DEFAULT_DURATION,
            default_instrument: Instrument::default(),
            tempo_policy: TempoPolicy::default(),
            base_frequency: C4_HZ,
            tempo_range: TempoRange::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Config = ron::from_str(&text)?;
        config.validate()?;
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.columns == 0 {
            return Err(Error::InvalidConfig(format!(
                "grid must be at least 1x1, got {}x{}",
                self.rows, self.columns
            )));
        }
        if self.column_increment == 0 {
            return Err(Error::InvalidConfig("column_increment must be positive".into()));
        }
        if !(self.note_duration.is_finite() && self.note_duration > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "note_duration must be positive, got {}",
                self.note_duration
            )));
        }
        if !(self.tempo_range.min > 0.0 && self.tempo_range.min <= self.tempo_range.max) {
            return Err(Error::InvalidConfig(format!(
                "tempo range {}..{} is empty",
                self.tempo_range.min, self.tempo_range.max
            )));
        }
        validate_bpm(self.bpm)?;
        Ok(())
    }

    /// The row-to-frequency table for this grid, checked against `rows`.
    pub fn pitch_table(&self) -> Result<PitchTable> {
        let table = PitchTable::equal_tempered(self.base_frequency, self.rows)?;
        table.ensure_rows(self.rows)?;
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pitch_table().unwrap().len(), 24);
        assert_eq!(config.default_instrument, Instrument::Sine);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config =
            ron::from_str("(rows: 12, bpm: 120.0, tempo_policy: preserve_position)").unwrap();
        assert_eq!(config.rows, 12);
        assert_eq!(config.columns, 48);
        assert_eq!(config.tempo_policy, TempoPolicy::PreservePosition);
        assert_eq!(config.pitch_table().unwrap().len(), 12);
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad = [
            Config {
                rows: 0,
                ..Config::default()
            },
            Config {
                column_increment: 0,
                ..Config::default()
            },
            Config {
                note_duration: 0.0,
                ..Config::default()
            },
            Config {
                bpm: -5.0,
                ..Config::default()
            },
        ];
        for config in bad {
            assert!(config.validate().is_err(), "{config:?}");
        }
    }

    #[test]
    fn test_load_from_file() {
        let dir = std::env::temp_dir().join(format!("stepgrid-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.ron");
        fs::write(&path, "(default_instrument: marimba, columns: 16)").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.default_instrument, Instrument::Marimba);
        assert_eq!(config.columns, 16);

        fs::remove_dir_all(&dir).unwrap();
    }
}
