use std::f32::consts::{PI, TAU};

use super::param::{AudioParam, EXP_FLOOR};
use super::recipe::{FilterKind, Recipe};
use super::{Instrument, Wave};

const MIN_CUTOFF: f32 = 20.0;
/// Upper cutoff bound as a fraction of the sample rate; keeps the state
/// variable filter stable for every Q the recipes use.
const MAX_CUTOFF_RATIO: f32 = 0.125;

#[derive(Debug, Clone, PartialEq)]
pub struct Oscillator {
    wave: Wave,
    frequency: f32,
    phase: f32,
}

impl Oscillator {
    pub fn new(wave: Wave, frequency: f32) -> Self {
        Self {
            wave,
            frequency,
            phase: 0.0,
        }
    }

    pub fn wave(&self) -> Wave {
        self.wave
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn next_sample(&mut self, sample_rate: f32) -> f32 {
        let phase = self.phase;
        let sample = match self.wave {
            Wave::Sine => (phase * TAU).sin(),
            Wave::Square => {
                if phase < 0.5 {
                    -1.0
                } else {
                    1.0
                }
            }
            Wave::Sawtooth => phase * 2.0 - 1.0,
            Wave::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
        };

        self.phase += self.frequency / sample_rate;
        if !(0.0..1.0).contains(&self.phase) {
            self.phase -= self.phase.floor();
        }
        sample
    }
}

/// Chamberlin state variable filter; one structure gives all three responses.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    kind: FilterKind,
    cutoff: AudioParam,
    q: f32,
    low: f32,
    band: f32,
}

impl Filter {
    pub fn new(kind: FilterKind, cutoff: AudioParam, q: f32) -> Self {
        Self {
            kind,
            cutoff,
            q,
            low: 0.0,
            band: 0.0,
        }
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    pub fn cutoff(&self) -> &AudioParam {
        &self.cutoff
    }

    pub fn q(&self) -> f32 {
        self.q
    }

    pub fn process(&mut self, input: f32, t: f64, sample_rate: f32) -> f32 {
        let fc = self
            .cutoff
            .value_at(t)
            .clamp(MIN_CUTOFF, sample_rate * MAX_CUTOFF_RATIO);
        let f = 2.0 * (PI * fc / sample_rate).sin();
        let damp = 1.0 / self.q.max(0.5);

        let high = input - self.low - damp * self.band;
        self.band += f * high;
        self.low += f * self.band;

        match self.kind {
            FilterKind::Lowpass => self.low,
            FilterKind::Highpass => high,
            FilterKind::Bandpass => self.band * damp,
        }
    }
}

/// One note's signal graph: oscillators summed into an optional filter, then
/// a gain envelope. Built fresh for every trigger and dropped once stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    instrument: Instrument,
    frequency: f32,
    oscillators: Vec<Oscillator>,
    filter: Option<Filter>,
    gain: AudioParam,
    start: f64,
    stop: f64,
}

impl Voice {
    pub fn build(instrument: Instrument, frequency: f32, t0: f64, duration: f64) -> Self {
        Self::from_recipe(
            Recipe::for_instrument(instrument),
            instrument,
            frequency,
            t0,
            duration,
        )
    }

    pub fn from_recipe(
        recipe: &Recipe,
        instrument: Instrument,
        frequency: f32,
        t0: f64,
        duration: f64,
    ) -> Self {
        let oscillators = recipe
            .oscillators
            .iter()
            .map(|p| Oscillator::new(p.wave, frequency * p.ratio))
            .collect();

        let filter = recipe.filter.map(|shape| {
            let start = frequency * shape.cutoff;
            let mut cutoff = AudioParam::new(start);
            cutoff.set_value_at_time(start, t0);
            if let Some(end) = shape.sweep_to {
                cutoff.exponential_ramp_to_value_at_time(frequency * end, t0 + duration);
            }
            Filter::new(shape.kind, cutoff, shape.q)
        });

        let env = &recipe.envelope;
        let mut gain = AudioParam::new(1.0);
        match env.attack {
            Some(attack) => {
                gain.set_value_at_time(0.0, t0)
                    .linear_ramp_to_value_at_time(env.peak, t0 + attack);
            }
            None => {
                gain.set_value_at_time(env.peak, t0);
            }
        }
        gain.exponential_ramp_to_value_at_time(EXP_FLOOR, env.decay_end.at(t0, duration));

        Self {
            instrument,
            frequency,
            oscillators,
            filter,
            gain,
            start: t0,
            stop: recipe.stop.at(t0, duration),
        }
    }

    pub fn instrument(&self) -> Instrument {
        self.instrument
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn oscillators(&self) -> &[Oscillator] {
        &self.oscillators
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    pub fn gain(&self) -> &AudioParam {
        &self.gain
    }

    pub fn start_time(&self) -> f64 {
        self.start
    }

    pub fn stop_time(&self) -> f64 {
        self.stop
    }

    pub fn is_finished(&self, t: f64) -> bool {
        t >= self.stop
    }

    /// Output at audio-clock time `t`. Silent outside `[start, stop)`;
    /// oscillators only advance while sounding.
    pub fn render_sample(&mut self, t: f64, sample_rate: f32) -> f32 {
        if t < self.start || t >= self.stop {
            return 0.0;
        }

        let mut sample: f32 = self
            .oscillators
            .iter_mut()
            .map(|osc| osc.next_sample(sample_rate))
            .sum();

        if let Some(filter) = &mut self.filter {
            sample = filter.process(sample, t, sample_rate);
        }

        sample * self.gain.value_at(t)
    }
}
