use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Wave {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// A named timbre. The set is closed and shared by the whole process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Instrument {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,

    Brass,
    Flute,
    Organ,
    Strings,

    Bass,
    Pluck,
    Bell,
    Marimba,

    Synth1,
    Synth2,
    Synth3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Basic,
    Orchestral,
    Melodic,
    Synthetic,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Basic,
        Category::Orchestral,
        Category::Melodic,
        Category::Synthetic,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::Basic => "Basic",
            Category::Orchestral => "Orchestral",
            Category::Melodic => "Melodic",
            Category::Synthetic => "Synthetic",
        }
    }

    pub fn instruments(self) -> &'static [Instrument] {
        use Instrument::*;
        match self {
            Category::Basic => &[Sine, Square, Sawtooth, Triangle],
            Category::Orchestral => &[Brass, Flute, Organ, Strings],
            Category::Melodic => &[Bass, Pluck, Bell, Marimba],
            Category::Synthetic => &[Synth1, Synth2, Synth3],
        }
    }

    pub fn by_name(name: &str) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(name))
    }
}

impl Instrument {
    /// Catalog order: categories in turn, instruments in their listed order.
    pub const ALL: [Instrument; 15] = [
        Instrument::Sine,
        Instrument::Square,
        Instrument::Sawtooth,
        Instrument::Triangle,
        Instrument::Brass,
        Instrument::Flute,
        Instrument::Organ,
        Instrument::Strings,
        Instrument::Bass,
        Instrument::Pluck,
        Instrument::Bell,
        Instrument::Marimba,
        Instrument::Synth1,
        Instrument::Synth2,
        Instrument::Synth3,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Instrument::Sine => "sine",
            Instrument::Square => "square",
            Instrument::Sawtooth => "sawtooth",
            Instrument::Triangle => "triangle",
            Instrument::Brass => "brass",
            Instrument::Flute => "flute",
            Instrument::Organ => "organ",
            Instrument::Strings => "strings",
            Instrument::Bass => "bass",
            Instrument::Pluck => "pluck",
            Instrument::Bell => "bell",
            Instrument::Marimba => "marimba",
            Instrument::Synth1 => "synth1",
            Instrument::Synth2 => "synth2",
            Instrument::Synth3 => "synth3",
        }
    }

    pub fn category(self) -> Category {
        Category::ALL
            .into_iter()
            .find(|c| c.instruments().contains(&self))
            .unwrap_or(Category::Basic)
    }

    /// The raw oscillator shape for the basic timbres.
    pub fn waveform(self) -> Option<Wave> {
        match self {
            Instrument::Sine => Some(Wave::Sine),
            Instrument::Square => Some(Wave::Square),
            Instrument::Sawtooth => Some(Wave::Sawtooth),
            Instrument::Triangle => Some(Wave::Triangle),
            _ => None,
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownInstrument(pub String);

impl fmt::Display for UnknownInstrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown instrument '{}'", self.0)
    }
}

impl std::error::Error for UnknownInstrument {}

impl FromStr for Instrument {
    type Err = UnknownInstrument;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Instrument::ALL
            .into_iter()
            .find(|i| i.id().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownInstrument(s.to_string()))
    }
}
