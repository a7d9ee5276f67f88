// Display model - What the note row and spark indicator should show
// Frames are plain snapshots so front ends never touch playback state

use super::timeline::{Subdivision, Tempo, TimeSignature};
use std::time::{Duration, Instant};

/// Highlight state of a single note marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoteHighlight {
    #[default]
    Inactive,
    /// Active note that falls on a main beat
    Beat,
    /// Active note between two beats
    Subdivision,
}

impl NoteHighlight {
    pub fn is_active(self) -> bool {
        !matches!(self, NoteHighlight::Inactive)
    }
}

/// Note value drawn for every marker of the row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteValue {
    Quarter,
    Eighth,
    Sixteenth,
}

impl NoteValue {
    /// Glyph for a beat type split into `subdivision` parts.
    /// Beat types without a glyph return `None`.
    pub fn for_beat(beat_type: u8, subdivision: Subdivision) -> Option<Self> {
        match (beat_type, subdivision) {
            (4, Subdivision::One) => Some(NoteValue::Quarter),
            (4, Subdivision::Two) => Some(NoteValue::Eighth),
            (4, Subdivision::Four) => Some(NoteValue::Sixteenth),
            (8, Subdivision::Two) => Some(NoteValue::Sixteenth),
            (8, _) => Some(NoteValue::Eighth),
            (16, _) => Some(NoteValue::Sixteenth),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            NoteValue::Quarter => "\u{2669}",
            NoteValue::Eighth => "\u{266A}",
            NoteValue::Sixteenth => "\u{266C}",
        }
    }

    /// Number of flags on the note stem
    pub fn flags(self) -> usize {
        match self {
            NoteValue::Quarter => 0,
            NoteValue::Eighth => 1,
            NoteValue::Sixteenth => 2,
        }
    }
}

/// Linear sweep of the spark indicator across the note row.
/// One sweep lasts one measure; the scheduler restarts it on every downbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SparkAnimation {
    duration: Duration,
    started_at: Option<Instant>,
}

impl SparkAnimation {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            started_at: None,
        }
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Restart from the left edge
    pub fn restart(&mut self, now: Instant) {
        self.started_at = Some(now);
    }

    /// Halt and hide the spark
    pub fn cancel(&mut self) {
        self.started_at = None;
    }

    pub fn is_visible(&self) -> bool {
        self.started_at.is_some()
    }

    /// Position across the row in [0, 1], or `None` when hidden.
    /// Holds at 1.0 once the sweep is complete.
    pub fn progress(&self, now: Instant) -> Option<f32> {
        let started_at = self.started_at?;
        if self.duration.is_zero() {
            return Some(1.0);
        }
        let elapsed = now.saturating_duration_since(started_at);
        Some((elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0))
    }
}

/// Snapshot published by the scheduler after every change
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayFrame {
    pub notes: Vec<NoteHighlight>,
    pub note_value: Option<NoteValue>,
    pub spark: SparkAnimation,
    pub running: bool,
    pub tempo: Tempo,
    pub time_signature: TimeSignature,
    pub subdivision: Subdivision,
    pub subdivision_index: usize,
}

impl DisplayFrame {
    /// Index of the highlighted note, if any
    pub fn active_note(&self) -> Option<usize> {
        self.notes.iter().position(|note| note.is_active())
    }

    pub fn subdivision_options(&self) -> &'static [Subdivision] {
        Subdivision::options_for(self.time_signature.beat_type)
    }

    /// Text rendering of the row, e.g. `[X . o .]`
    pub fn note_row(&self) -> String {
        let cells: Vec<&str> = self
            .notes
            .iter()
            .map(|note| match note {
                NoteHighlight::Inactive => ".",
                NoteHighlight::Beat => "X",
                NoteHighlight::Subdivision => "o",
            })
            .collect();
        format!("[{}]", cells.join(" "))
    }
}

impl Default for DisplayFrame {
    fn default() -> Self {
        let time_signature = TimeSignature::default();
        let tempo = Tempo::default();
        Self {
            notes: vec![NoteHighlight::Inactive; usize::from(time_signature.beats_per_measure)],
            note_value: NoteValue::for_beat(time_signature.beat_type, Subdivision::One),
            spark: SparkAnimation::new(tempo.measure_duration(&time_signature)),
            running: false,
            tempo,
            time_signature,
            subdivision: Subdivision::One,
            subdivision_index: 0,
        }
    }
}
