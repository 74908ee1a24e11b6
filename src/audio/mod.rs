mod instrument;
mod mixer;
mod output;
mod param;
pub mod recipe;
mod synth;
mod voice;

pub use instrument::{Category, Instrument, UnknownInstrument, Wave};
pub use mixer::{
    AudioClock, MAX_ACTIVE_VOICES, Mixer, VOICE_QUEUE_CAPACITY, VoiceConsumer, VoiceProducer,
    voice_queue,
};
pub use output::AudioOutput;
pub use param::{AudioParam, Automation, EXP_FLOOR};
pub use recipe::Recipe;
pub use synth::{DEFAULT_DURATION, RecordingSynth, SilentSynth, Synth, SynthesisEngine};
pub use voice::{Filter, Oscillator, Voice};
