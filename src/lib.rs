//! A grid step sequencer.
//!
//! Rows are pitches, columns are time steps. A [`PlaybackScheduler`] walks the
//! columns at a fixed tempo and asks a [`Synth`] to sound every active cell,
//! each with the timbre stored in the cell.
//!
//! Step timing comes from a wall-clock timer on the engine thread, not from
//! the audio clock, so onsets carry scheduler jitter.

pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod grid;
pub mod pitch;
pub mod project;
pub mod timing;

pub use audio::{
    AudioOutput, Category, Instrument, RecordingSynth, SilentSynth, Synth, SynthesisEngine,
};
pub use config::Config;
pub use engine::{Engine, EngineCommand, EngineHandle, EngineUpdate, spawn_engine};
pub use error::{Error, Result};
pub use events::Trigger;
pub use grid::{Cell, Grid};
pub use pitch::PitchTable;
pub use project::Project;
pub use timing::{PlaybackScheduler, PlaybackState, TempoPolicy, TempoRange};
