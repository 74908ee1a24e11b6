use parking_lot::Mutex;
use ringbuf::traits::{Consumer, Producer};
use std::sync::Arc;
use std::time::Instant;
use tracing::{trace, warn};

use super::mixer::{
    AudioClock, Mixer, VOICE_QUEUE_CAPACITY, VoiceConsumer, VoiceProducer, voice_queue,
};
use super::{Instrument, Voice};
use crate::events::Trigger;

/// Note length used when the caller does not give one, in seconds.
pub const DEFAULT_DURATION: f64 = 0.2;

/// Anything that can sound a note on an audio clock.
pub trait Synth {
    /// The synth's clock reading, in seconds.
    fn now(&self) -> f64;

    /// Builds and starts one note at `t0`. Fire-and-forget.
    fn trigger(&mut self, frequency: f32, instrument: Instrument, t0: f64, duration: f64);

    /// Triggers at the current clock reading.
    fn play(&mut self, frequency: f32, instrument: Instrument, duration: Option<f64>) {
        let t0 = self.now();
        self.trigger(
            frequency,
            instrument,
            t0,
            duration.unwrap_or(DEFAULT_DURATION),
        );
    }
}

/// Builds a fresh [`Voice`] per trigger and hands it to the audio thread.
/// There is no voice limit and no stealing; every note plays out.
pub struct SynthesisEngine {
    clock: AudioClock,
    voices: VoiceProducer,
    retired: VoiceConsumer,
    dropped: u64,
}

impl SynthesisEngine {
    pub fn new(clock: AudioClock, voices: VoiceProducer, retired: VoiceConsumer) -> Self {
        Self {
            clock,
            voices,
            retired,
            dropped: 0,
        }
    }

    /// An engine and the mixer that renders it, connected by a voice queue
    /// and a queue of finished voices coming back.
    pub fn with_mixer(sample_rate: u32) -> (Self, Mixer) {
        let clock = AudioClock::new(sample_rate);
        let (producer, consumer) = voice_queue(VOICE_QUEUE_CAPACITY);
        let (retired_tx, retired_rx) = voice_queue(VOICE_QUEUE_CAPACITY);
        (
            Self::new(clock.clone(), producer, retired_rx),
            Mixer::new(clock, consumer, retired_tx),
        )
    }

    /// Frees voices the mixer has finished with. Returns how many.
    pub fn reclaim(&mut self) -> usize {
        let mut freed = 0;
        while self.retired.try_pop().is_some() {
            freed += 1;
        }
        freed
    }

    pub fn clock(&self) -> &AudioClock {
        &self.clock
    }

    /// Voices that could not be queued because the audio thread fell behind.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl Synth for SynthesisEngine {
    fn now(&self) -> f64 {
        self.clock.now()
    }

    fn trigger(&mut self, frequency: f32, instrument: Instrument, t0: f64, duration: f64) {
        self.reclaim();
        let voice = Voice::build(instrument, frequency, t0, duration);
        if self.voices.try_push(voice).is_err() {
            self.dropped += 1;
            warn!(
                %instrument,
                frequency,
                dropped = self.dropped,
                "voice queue full, note dropped"
            );
        }
    }
}

/// Discards every note. Stands in for [`SynthesisEngine`] when no output
/// device is available; its clock is wall time since creation.
#[derive(Debug, Clone, Copy)]
pub struct SilentSynth {
    started: Instant,
}

impl SilentSynth {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for SilentSynth {
    fn default() -> Self {
        Self::new()
    }
}

impl Synth for SilentSynth {
    fn now(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    fn trigger(&mut self, frequency: f32, instrument: Instrument, t0: f64, duration: f64) {
        trace!(%instrument, frequency, t0, duration, "note discarded");
    }
}

/// A silent synth that logs every trigger, for tests. The log and clock are
/// shared, so clones observe each other.
#[derive(Debug, Clone, Default)]
pub struct RecordingSynth {
    log: Arc<Mutex<Vec<Trigger>>>,
    time: Arc<Mutex<f64>>,
}

impl RecordingSynth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_time(&self, t: f64) {
        *self.time.lock() = t;
    }

    pub fn advance(&self, secs: f64) {
        *self.time.lock() += secs;
    }

    pub fn triggers(&self) -> Vec<Trigger> {
        self.log.lock().clone()
    }

    pub fn take(&self) -> Vec<Trigger> {
        std::mem::take(&mut *self.log.lock())
    }
}

impl Synth for RecordingSynth {
    fn now(&self) -> f64 {
        *self.time.lock()
    }

    fn trigger(&mut self, frequency: f32, instrument: Instrument, t0: f64, duration: f64) {
        self.log.lock().push(Trigger {
            frequency,
            instrument,
            t0,
            duration,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_uses_clock_and_default_duration() {
        let mut synth = RecordingSynth::new();
        synth.set_time(1.5);
        synth.play(440.0, Instrument::Flute, None);
        synth.advance(0.5);
        synth.play(220.0, Instrument::Bass, Some(0.4));

        assert_eq!(
            synth.take(),
            vec![
                Trigger {
                    frequency: 440.0,
                    instrument: Instrument::Flute,
                    t0: 1.5,
                    duration: DEFAULT_DURATION,
                },
                Trigger {
                    frequency: 220.0,
                    instrument: Instrument::Bass,
                    t0: 2.0,
                    duration: 0.4,
                },
            ]
        );
        assert!(synth.triggers().is_empty());
    }

    #[test]
    fn test_clones_share_the_log() {
        let synth = RecordingSynth::new();
        let mut handle = synth.clone();
        handle.play(330.0, Instrument::Organ, None);
        assert_eq!(synth.triggers().len(), 1);
    }

    #[test]
    fn test_silent_synth_keeps_time() {
        let mut synth = SilentSynth::new();
        let before = synth.now();
        synth.play(440.0, Instrument::Bell, None);
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(synth.now() > before);
    }

    #[test]
    fn test_full_queue_drops_without_panicking() {
        let clock = AudioClock::new(48_000);
        let (producer, _consumer) = voice_queue(2);
        let (_retired_tx, retired_rx) = voice_queue(2);
        let mut engine = SynthesisEngine::new(clock, producer, retired_rx);
        for _ in 0..5 {
            engine.play(440.0, Instrument::Sine, None);
        }
        assert_eq!(engine.dropped(), 3);
    }
}
