mod scheduler;
mod tempo;

pub use scheduler::{PlaybackScheduler, PlaybackState, TempoPolicy, Transport};
pub use tempo::{TempoRange, tick_interval, validate_bpm};
