//! Per-timbre synthesis recipes.
//!
//! Each instrument maps to a plain descriptor: which oscillators to run, an
//! optional filter, and the shape of the gain envelope. [`Voice::build`]
//! interprets any recipe, so adding a timbre means adding a row here.
//!
//! All frequencies are ratios of the note frequency `f`; all times are either
//! fixed seconds or multiples of the note duration `D`.
//!
//! [`Voice::build`]: super::Voice::build

use super::{Instrument, Wave};

/// A point in time relative to the note start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Span {
    /// Seconds after `t0`, independent of the note duration.
    Fixed(f64),
    /// A multiple of the note duration after `t0`.
    Duration(f64),
}

impl Span {
    pub fn at(self, t0: f64, duration: f64) -> f64 {
        match self {
            Span::Fixed(secs) => t0 + secs,
            Span::Duration(mult) => t0 + mult * duration,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Partial {
    pub wave: Wave,
    pub ratio: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Lowpass,
    Highpass,
    Bandpass,
}

/// Q used when a recipe names a filter without one.
pub const DEFAULT_Q: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterRecipe {
    pub kind: FilterKind,
    pub cutoff: f32,
    pub q: f32,
    /// Cutoff ratio reached at `t0 + D` by an exponential sweep.
    pub sweep_to: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeRecipe {
    pub peak: f32,
    /// Linear rise from silence to `peak`, in seconds. `None` starts at `peak`.
    pub attack: Option<f64>,
    /// When the exponential decay reaches the floor.
    pub decay_end: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Recipe {
    pub oscillators: &'static [Partial],
    pub filter: Option<FilterRecipe>,
    pub envelope: EnvelopeRecipe,
    pub stop: Span,
}

const ATTACK: f64 = 0.1;

const fn partial(wave: Wave, ratio: f32) -> Partial {
    Partial { wave, ratio }
}

const fn flat(peak: f32, decay_end: Span) -> EnvelopeRecipe {
    EnvelopeRecipe {
        peak,
        attack: None,
        decay_end,
    }
}

const fn swell(peak: f32) -> EnvelopeRecipe {
    EnvelopeRecipe {
        peak,
        attack: Some(ATTACK),
        decay_end: Span::Duration(1.0),
    }
}

const fn filter(kind: FilterKind, cutoff: f32, q: f32) -> Option<FilterRecipe> {
    Some(FilterRecipe {
        kind,
        cutoff,
        q,
        sweep_to: None,
    })
}

const FULL: Span = Span::Duration(1.0);

const SINE_OSC: [Partial; 1] = [partial(Wave::Sine, 1.0)];
const SQUARE_OSC: [Partial; 1] = [partial(Wave::Square, 1.0)];
const SAWTOOTH_OSC: [Partial; 1] = [partial(Wave::Sawtooth, 1.0)];
const TRIANGLE_OSC: [Partial; 1] = [partial(Wave::Triangle, 1.0)];

const SINE: Recipe = basic(&SINE_OSC);
const SQUARE: Recipe = basic(&SQUARE_OSC);
const SAWTOOTH: Recipe = basic(&SAWTOOTH_OSC);
const TRIANGLE: Recipe = basic(&TRIANGLE_OSC);

const fn basic(oscillators: &'static [Partial]) -> Recipe {
    Recipe {
        oscillators,
        filter: None,
        envelope: flat(0.3, FULL),
        stop: FULL,
    }
}

const BRASS: Recipe = Recipe {
    oscillators: &[partial(Wave::Sawtooth, 1.0)],
    filter: filter(FilterKind::Lowpass, 3.0, 5.0),
    envelope: swell(0.3),
    stop: FULL,
};

const FLUTE: Recipe = Recipe {
    oscillators: &[partial(Wave::Sine, 1.0)],
    filter: filter(FilterKind::Bandpass, 1.0, 1.0),
    envelope: swell(0.2),
    stop: FULL,
};

const ORGAN: Recipe = Recipe {
    oscillators: &[partial(Wave::Sine, 1.0), partial(Wave::Square, 2.0)],
    filter: None,
    envelope: flat(0.2, FULL),
    stop: FULL,
};

const STRINGS: Recipe = Recipe {
    oscillators: &[
        partial(Wave::Sine, 0.998),
        partial(Wave::Sine, 1.0),
        partial(Wave::Sine, 1.002),
    ],
    filter: None,
    envelope: swell(0.1),
    stop: FULL,
};

const BASS: Recipe = Recipe {
    oscillators: &[partial(Wave::Triangle, 0.5)],
    filter: filter(FilterKind::Lowpass, 2.0, DEFAULT_Q),
    envelope: flat(0.4, FULL),
    stop: FULL,
};

const PLUCK: Recipe = Recipe {
    oscillators: &[partial(Wave::Triangle, 1.0)],
    filter: None,
    envelope: flat(0.3, Span::Fixed(0.1)),
    stop: FULL,
};

const BELL: Recipe = Recipe {
    oscillators: &[partial(Wave::Sine, 1.0)],
    filter: filter(FilterKind::Highpass, 1.0, DEFAULT_Q),
    envelope: flat(0.3, Span::Duration(2.0)),
    stop: Span::Duration(2.0),
};

const MARIMBA: Recipe = Recipe {
    oscillators: &[partial(Wave::Sine, 1.0)],
    filter: None,
    envelope: flat(0.3, Span::Duration(0.5)),
    stop: FULL,
};

const SYNTH1: Recipe = Recipe {
    oscillators: &[partial(Wave::Sawtooth, 1.0), partial(Wave::Square, 1.01)],
    filter: None,
    envelope: flat(0.15, FULL),
    stop: FULL,
};

const SYNTH2: Recipe = Recipe {
    oscillators: &[partial(Wave::Sawtooth, 1.0)],
    filter: Some(FilterRecipe {
        kind: FilterKind::Lowpass,
        cutoff: 4.0,
        q: 8.0,
        sweep_to: Some(1.0),
    }),
    envelope: flat(0.3, FULL),
    stop: FULL,
};

const SYNTH3: Recipe = Recipe {
    oscillators: &[partial(Wave::Square, 1.0), partial(Wave::Triangle, 2.0)],
    filter: filter(FilterKind::Bandpass, 2.0, 4.0),
    envelope: flat(0.2, FULL),
    stop: FULL,
};

impl Recipe {
    pub fn for_instrument(instrument: Instrument) -> &'static Recipe {
        match instrument {
            Instrument::Sine => Self::plain(Wave::Sine),
            Instrument::Square => Self::plain(Wave::Square),
            Instrument::Sawtooth => Self::plain(Wave::Sawtooth),
            Instrument::Triangle => Self::plain(Wave::Triangle),
            Instrument::Brass => &BRASS,
            Instrument::Flute => &FLUTE,
            Instrument::Organ => &ORGAN,
            Instrument::Strings => &STRINGS,
            Instrument::Bass => &BASS,
            Instrument::Pluck => &PLUCK,
            Instrument::Bell => &BELL,
            Instrument::Marimba => &MARIMBA,
            Instrument::Synth1 => &SYNTH1,
            Instrument::Synth2 => &SYNTH2,
            Instrument::Synth3 => &SYNTH3,
        }
    }

    /// The plain single-oscillator recipe that the basic timbres resolve to.
    pub fn plain(wave: Wave) -> &'static Recipe {
        match wave {
            Wave::Sine => &SINE,
            Wave::Square => &SQUARE,
            Wave::Sawtooth => &SAWTOOTH,
            Wave::Triangle => &TRIANGLE,
        }
    }
}
