use crate::error::{Error, Result};

/// Middle C.
pub const C4_HZ: f32 = 261.63;

/// Row index to frequency. Strictly increasing, one entry per grid row.
#[derive(Debug, Clone, PartialEq)]
pub struct PitchTable {
    frequencies: Vec<f32>,
}

impl PitchTable {
    pub fn new(frequencies: Vec<f32>) -> Result<Self> {
        if frequencies.is_empty() {
            return Err(Error::InvalidPitchTable("table is empty".into()));
        }
        if let Some(bad) = frequencies.iter().find(|f| !f.is_finite() || **f <= 0.0) {
            return Err(Error::InvalidPitchTable(format!(
                "{bad} is not a positive frequency"
            )));
        }
        if let Some(i) = frequencies.windows(2).position(|w| w[1] <= w[0]) {
            return Err(Error::InvalidPitchTable(format!(
                "entry {} ({} Hz) does not rise above entry {} ({} Hz)",
                i + 1,
                frequencies[i + 1],
                i,
                frequencies[i]
            )));
        }
        Ok(Self { frequencies })
    }

    /// `len` equal-tempered semitones upward from `base_hz`.
    pub fn equal_tempered(base_hz: f32, len: usize) -> Result<Self> {
        Self::new(
            (0..len)
                .map(|i| base_hz * 2.0_f32.powf(i as f32 / 12.0))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    pub fn frequency(&self, row: usize) -> Option<f32> {
        self.frequencies.get(row).copied()
    }

    pub fn frequencies(&self) -> &[f32] {
        &self.frequencies
    }

    /// Startup check: a misaligned table must halt initialization.
    pub fn ensure_rows(&self, rows: usize) -> Result<()> {
        if self.len() != rows {
            return Err(Error::PitchTableMismatch {
                rows,
                pitches: self.len(),
            });
        }
        Ok(())
    }
}

impl Default for PitchTable {
    /// Two octaves from middle C, one row per semitone.
    fn default() -> Self {
        Self {
            frequencies: (0..crate::grid::DEFAULT_ROWS)
                .map(|i| C4_HZ * 2.0_f32.powf(i as f32 / 12.0))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_covers_default_rows() {
        let table = PitchTable::default();
        assert_eq!(table.len(), 24);
        assert_relative_eq!(table.frequency(0).unwrap(), 261.63);
        assert_relative_eq!(table.frequency(12).unwrap(), 523.26, epsilon = 1e-2);
        assert!(table.frequencies().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_rejects_non_increasing() {
        assert!(matches!(
            PitchTable::new(vec![220.0, 220.0]),
            Err(Error::InvalidPitchTable(_))
        ));
        assert!(matches!(
            PitchTable::new(vec![440.0, 220.0]),
            Err(Error::InvalidPitchTable(_))
        ));
        assert!(matches!(
            PitchTable::new(vec![0.0, 220.0]),
            Err(Error::InvalidPitchTable(_))
        ));
        assert!(PitchTable::new(vec![]).is_err());
    }

    #[test]
    fn test_row_count_mismatch_is_fatal() {
        let table = PitchTable::new(vec![220.0, 440.0]).unwrap();
        assert!(table.ensure_rows(2).is_ok());
        assert!(matches!(
            table.ensure_rows(3),
            Err(Error::PitchTableMismatch { rows: 3, pitches: 2 })
        ));
    }

    #[test]
    fn test_out_of_range_row() {
        let table = PitchTable::new(vec![220.0, 440.0]).unwrap();
        assert_eq!(table.frequency(1), Some(440.0));
        assert_eq!(table.frequency(2), None);
    }
}
