use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A grid coordinate outside the current bounds. The grid is left untouched.
    #[error("cell ({row}, {col}) is outside the {rows}x{cols} grid")]
    IndexOutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// The pitch table does not cover the grid's rows one-to-one.
    #[error("pitch table has {pitches} entries but the grid has {rows} rows")]
    PitchTableMismatch { rows: usize, pitches: usize },

    #[error("invalid pitch table: {0}")]
    InvalidPitchTable(String),

    /// A deserialized grid that breaks the rectangular shape invariant.
    #[error("malformed grid: {0}")]
    MalformedGrid(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid tempo: {0} BPM")]
    InvalidTempo(f64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse RON: {0}")]
    RonParse(#[from] ron::error::SpannedError),

    #[error("failed to write RON: {0}")]
    RonWrite(#[from] ron::Error),

    #[error("audio output error: {0}")]
    Audio(String),
}
