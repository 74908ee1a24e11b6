use ringbuf::{
    HeapCons, HeapProd, HeapRb,
    traits::{Consumer, Observer, Producer, Split},
};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use super::Voice;

pub type VoiceProducer = HeapProd<Voice>;
pub type VoiceConsumer = HeapCons<Voice>;

pub const VOICE_QUEUE_CAPACITY: usize = 1024;

/// Voices the mixer renders at once. Anything beyond waits in the queue.
pub const MAX_ACTIVE_VOICES: usize = VOICE_QUEUE_CAPACITY;

pub fn voice_queue(capacity: usize) -> (VoiceProducer, VoiceConsumer) {
    HeapRb::<Voice>::new(capacity).split()
}

/// Frames rendered so far, shared between the audio callback (writer) and
/// whoever needs the current audio time.
#[derive(Debug, Clone)]
pub struct AudioClock {
    frames: Arc<AtomicU64>,
    sample_rate: u32,
}

impl AudioClock {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            frames: Arc::new(AtomicU64::new(0)),
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    /// Seconds since the output started.
    pub fn now(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    fn advance(&self, frames: u64) {
        self.frames.fetch_add(frames, Ordering::Relaxed);
    }
}

/// Audio-thread side of the synth: sums every live voice into the output.
/// Finished voices go back through `retired` so they are freed off the
/// audio thread.
pub struct Mixer {
    voices: Vec<Voice>,
    consumer: VoiceConsumer,
    retired: VoiceProducer,
    clock: AudioClock,
}

impl Mixer {
    pub fn new(clock: AudioClock, consumer: VoiceConsumer, retired: VoiceProducer) -> Self {
        Self {
            voices: Vec::with_capacity(MAX_ACTIVE_VOICES),
            consumer,
            retired,
            clock,
        }
    }

    pub fn clock(&self) -> &AudioClock {
        &self.clock
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Fills an interleaved buffer, writing the same mono mix to every channel.
    pub fn process(&mut self, data: &mut [f32], channels: usize) {
        while self.voices.len() < MAX_ACTIVE_VOICES {
            match self.consumer.try_pop() {
                Some(voice) => self.voices.push(voice),
                None => break,
            }
        }

        let channels = channels.max(1);
        let start = self.clock.frames();
        let sample_rate = self.clock.sample_rate() as f32;
        let rate = self.clock.sample_rate() as f64;

        let mut frames = 0;
        for frame in data.chunks_mut(channels) {
            let t = (start + frames) as f64 / rate;
            let sample: f32 = self
                .voices
                .iter_mut()
                .map(|voice| voice.render_sample(t, sample_rate))
                .sum();
            frame.fill(sample.clamp(-1.0, 1.0));
            frames += 1;
        }

        let end = (start + frames) as f64 / rate;
        self.retire_finished(end);
        self.clock.advance(frames);
    }

    /// A finished voice stays put while the retire queue is full; it renders
    /// silence until there is room.
    fn retire_finished(&mut self, t: f64) {
        let mut i = 0;
        while i < self.voices.len() {
            if self.voices[i].is_finished(t) && !self.retired.is_full() {
                let voice = self.voices.swap_remove(i);
                let _ = self.retired.try_push(voice);
            } else {
                i += 1;
            }
        }
    }

    /// Renders `frames` mono samples without an audio device.
    pub fn render(&mut self, frames: usize) -> Vec<f32> {
        let mut buffer = vec![0.0; frames];
        self.process(&mut buffer, 1);
        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{Instrument, Synth, SynthesisEngine};

    const SR: u32 = 8_000;

    fn rig() -> (SynthesisEngine, Mixer) {
        SynthesisEngine::with_mixer(SR)
    }

    #[test]
    fn test_clock_tracks_rendered_frames() {
        let (engine, mut mixer) = rig();
        assert_eq!(engine.now(), 0.0);
        mixer.render(4_000);
        assert_eq!(engine.now(), 0.5);
        assert_eq!(mixer.clock().frames(), 4_000);
    }

    #[test]
    fn test_voice_sounds_from_trigger_time() {
        let (mut engine, mut mixer) = rig();
        let t0 = engine.now() + 0.1;
        engine.trigger(440.0, Instrument::Square, t0, 0.2);

        let out = mixer.render(SR as usize);
        let before = &out[..790];
        let during = &out[810..2_390];
        let after = &out[2_410..];
        assert!(before.iter().all(|s| *s == 0.0));
        assert!(during.iter().any(|s| s.abs() > 0.1));
        assert!(after.iter().all(|s| *s == 0.0));
        assert_eq!(mixer.active_voices(), 0);
    }

    #[test]
    fn test_overlapping_voices_mix() {
        let (mut engine, mut mixer) = rig();
        engine.trigger(220.0, Instrument::Square, 0.0, 0.2);
        engine.trigger(220.0, Instrument::Square, 0.0, 0.2);
        let doubled = mixer.render(1);

        let (mut engine, mut mixer) = rig();
        engine.trigger(220.0, Instrument::Square, 0.0, 0.2);
        let single = mixer.render(1);

        assert_eq!(doubled[0], 2.0 * single[0]);
    }

    #[test]
    fn test_long_voices_survive_buffer_boundaries() {
        let (mut engine, mut mixer) = rig();
        engine.trigger(330.0, Instrument::Bell, 0.0, 0.2);
        mixer.render(1_600);
        assert_eq!(mixer.active_voices(), 1);
        mixer.render(1_600);
        assert_eq!(mixer.active_voices(), 0);
    }

    #[test]
    fn test_finished_voices_return_to_the_engine() {
        let (mut engine, mut mixer) = rig();
        engine.trigger(440.0, Instrument::Sine, 0.0, 0.1);
        engine.trigger(550.0, Instrument::Pluck, 0.0, 0.1);
        engine.trigger(660.0, Instrument::Marimba, 0.0, 0.3);

        mixer.render(1_200);
        assert_eq!(mixer.active_voices(), 1);
        assert_eq!(engine.reclaim(), 2);

        mixer.render(1_600);
        assert_eq!(mixer.active_voices(), 0);
        assert_eq!(engine.reclaim(), 1);
        assert_eq!(engine.reclaim(), 0);
    }

    #[test]
    fn test_active_voices_are_bounded() {
        let clock = AudioClock::new(SR);
        let (producer, consumer) = voice_queue(MAX_ACTIVE_VOICES + 16);
        let (retired_tx, retired_rx) = voice_queue(MAX_ACTIVE_VOICES);
        let mut engine = SynthesisEngine::new(clock.clone(), producer, retired_rx);
        let mut mixer = Mixer::new(clock, consumer, retired_tx);
        let capacity = mixer.voices.capacity();

        for _ in 0..MAX_ACTIVE_VOICES {
            engine.trigger(220.0, Instrument::Sine, 0.0, 1.0);
        }
        for _ in 0..16 {
            engine.trigger(330.0, Instrument::Sine, 0.0, 5.0);
        }
        mixer.render(8);
        assert_eq!(mixer.active_voices(), MAX_ACTIVE_VOICES);
        assert_eq!(mixer.voices.capacity(), capacity);
        assert_eq!(engine.dropped(), 0);

        mixer.render(SR as usize);
        assert_eq!(mixer.active_voices(), 0);
        assert_eq!(engine.reclaim(), MAX_ACTIVE_VOICES);

        // The queued voices join on the next callback.
        mixer.render(8);
        assert_eq!(mixer.active_voices(), 16);
        assert_eq!(mixer.voices.capacity(), capacity);
    }

    #[test]
    fn test_interleaved_channels_match() {
        let (mut engine, mut mixer) = rig();
        engine.trigger(440.0, Instrument::Organ, 0.0, 0.2);
        let mut data = vec![0.0; 64];
        mixer.process(&mut data, 2);
        for frame in data.chunks(2) {
            assert_eq!(frame[0], frame[1]);
        }
        assert_eq!(mixer.clock().frames(), 32);
    }
}
