use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};

/// Accepts a finite positive tempo whose step interval is a non-zero
/// [`Duration`].
pub fn validate_bpm(bpm: f64) -> Result<f64> {
    if !(bpm.is_finite() && bpm > 0.0) {
        return Err(Error::InvalidTempo(bpm));
    }
    match Duration::try_from_secs_f64(60.0 / bpm) {
        Ok(interval) if !interval.is_zero() => Ok(bpm),
        _ => Err(Error::InvalidTempo(bpm)),
    }
}

/// One step per beat: `60000 / bpm` milliseconds. Saturates for tempos
/// [`validate_bpm`] rejects.
pub fn tick_interval(bpm: f64) -> Duration {
    Duration::try_from_secs_f64(60.0 / bpm).unwrap_or(Duration::MAX)
}

/// The span a tempo control sweeps over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoRange {
    pub min: f64,
    pub max: f64,
}

impl Default for TempoRange {
    fn default() -> Self {
        Self {
            min: 60.0,
            max: 560.0,
        }
    }
}

impl TempoRange {
    /// Maps a control position in `[0, 1]` to a whole BPM value.
    pub fn bpm_at(&self, fraction: f64) -> f64 {
        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        (self.min + fraction * (self.max - self.min)).round()
    }

    pub fn contains(&self, bpm: f64) -> bool {
        (self.min..=self.max).contains(&bpm)
    }
}
