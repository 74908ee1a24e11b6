use crate::audio::Instrument;

/// One note event as handed to a synth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trigger {
    pub frequency: f32,
    pub instrument: Instrument,
    /// Audio-clock start time, seconds.
    pub t0: f64,
    pub duration: f64,
}
