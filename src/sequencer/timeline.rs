// Timeline - Musical time representation
// Time signatures, tempo and the delays derived from them

use crate::error::{MetronomeError, MetronomeResult};
use std::fmt;
use std::time::Duration;

/// Time signature (beats per measure / beat type)
/// Example: 6/8 time = TimeSignature { beats_per_measure: 6, beat_type: 8 }
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct TimeSignature {
    pub beats_per_measure: u8, // Beats per measure (2, 3, 4, 6, 9...)
    pub beat_type: u8,         // Note value of one beat (4 = quarter note, 8 = eighth note)
}

impl TimeSignature {
    /// Common 4/4 time signature
    pub const COMMON_TIME: Self = Self::new(4, 4);

    /// Time signatures offered by the selector, in display order
    pub const PRESETS: [Self; 6] = [
        Self::COMMON_TIME,
        Self::new(3, 4),
        Self::new(2, 4),
        Self::new(6, 8),
        Self::new(3, 8),
        Self::new(9, 8),
    ];

    /// Creates a time signature without validation.
    /// Use [`TimeSignature::try_new`] for values coming from outside the crate.
    pub const fn new(beats_per_measure: u8, beat_type: u8) -> Self {
        Self {
            beats_per_measure,
            beat_type,
        }
    }

    /// Creates a validated time signature
    /// Both values must be positive and the beat type a power of two
    pub fn try_new(beats_per_measure: u8, beat_type: u8) -> MetronomeResult<Self> {
        let signature = Self::new(beats_per_measure, beat_type);
        if signature.is_valid() {
            Ok(signature)
        } else {
            Err(MetronomeError::InvalidTimeSignature {
                beats_per_measure,
                beat_type,
            })
        }
    }

    pub fn is_valid(&self) -> bool {
        self.beats_per_measure > 0 && self.beat_type.is_power_of_two()
    }

    /// Position of this signature in [`TimeSignature::PRESETS`]
    pub fn preset_index(&self) -> Option<usize> {
        Self::PRESETS.iter().position(|preset| preset == self)
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::COMMON_TIME
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.beats_per_measure, self.beat_type)
    }
}

impl std::str::FromStr for TimeSignature {
    type Err = MetronomeError;

    /// Parses "6/8" style strings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MetronomeError::InvalidTimeSignature {
            beats_per_measure: 0,
            beat_type: 0,
        };
        let (beats, beat_type) = s.trim().split_once('/').ok_or_else(invalid)?;
        let beats = beats.trim().parse().map_err(|_| invalid())?;
        let beat_type = beat_type.trim().parse().map_err(|_| invalid())?;
        Self::try_new(beats, beat_type)
    }
}

/// Number of ticks each beat is divided into
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Subdivision {
    One = 1,
    Two = 2,
    Four = 4,
}

impl Subdivision {
    const ALL: [Self; 3] = [Self::One, Self::Two, Self::Four];

    pub fn count(self) -> u32 {
        self as u32
    }

    /// Subdivisions available for a beat type.
    /// Quarter notes (or longer) split up to sixteenths, eighth notes up to
    /// sixteenths, anything shorter is not subdivided.
    pub fn options_for(beat_type: u8) -> &'static [Subdivision] {
        if beat_type <= 4 {
            &Self::ALL
        } else if beat_type <= 8 {
            &Self::ALL[..2]
        } else {
            &Self::ALL[..1]
        }
    }

    /// Resolves a selector index against the options for `beat_type`.
    /// An index past the end clamps to the last valid option.
    pub fn select(beat_type: u8, index: usize) -> (usize, Subdivision) {
        let options = Self::options_for(beat_type);
        let index = index.min(options.len() - 1);
        (index, options[index])
    }
}

impl Default for Subdivision {
    fn default() -> Self {
        Self::One
    }
}

impl fmt::Display for Subdivision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.count())
    }
}

/// Tempo in BPM (Beats Per Minute)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tempo {
    bpm: u32,
}

impl Tempo {
    /// Lowest tempo; zero would mean an infinite delay between beats
    pub const MIN_BPM: u32 = 1;
    /// Highest tempo accepted from the UI, the CLI or a config file
    pub const MAX_BPM: u32 = 1000;

    /// Creates a new tempo, clamped to [`Tempo::MIN_BPM`]..=[`Tempo::MAX_BPM`]
    pub fn new(bpm: u32) -> Self {
        Self {
            bpm: bpm.clamp(Self::MIN_BPM, Self::MAX_BPM),
        }
    }

    /// Get BPM value
    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    /// Delay between two beat sounds: 60000 / BPM milliseconds
    pub fn sound_delay(&self) -> Duration {
        Duration::from_secs(60) / self.bpm
    }

    /// Delay between two ticks (graphic updates): (60000 / BPM) / subdivision milliseconds
    pub fn tick_delay(&self, subdivision: Subdivision) -> Duration {
        // Floor division twice equals dividing by BPM * subdivision
        self.sound_delay() / subdivision.count()
    }

    /// Duration of one full measure
    pub fn measure_duration(&self, time_signature: &TimeSignature) -> Duration {
        self.sound_delay() * u32::from(time_signature.beats_per_measure)
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self::new(120)
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} BPM", self.bpm)
    }
}
