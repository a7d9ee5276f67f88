// Metronome - Playback state machine
// Advances the note index on every tick and decides highlighting, clicks and spark restarts

use super::display::{DisplayFrame, NoteHighlight, NoteValue, SparkAnimation};
use super::timeline::{Subdivision, Tempo, TimeSignature};
use std::time::{Duration, Instant};

/// Metronome click type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickType {
    /// Click on the first beat of a measure (accent/downbeat)
    Emphasis,
    /// Click on the other beats
    Tick,
}

/// Everything that happened during one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub index: usize,
    pub highlight: NoteHighlight,
    /// Sound to trigger, `None` on subdivision notes
    pub click: Option<ClickType>,
    /// True on the downbeat, where the spark sweep starts over
    pub restarted_spark: bool,
    /// Delay until the next tick
    pub next_delay: Duration,
}

/// Mutable playback fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackState {
    /// Note being played, `None` before the first tick
    pub note_index: Option<usize>,
    pub tempo: Tempo,
    pub time_signature: TimeSignature,
    /// Selector position in [`Subdivision::options_for`]
    pub subdivision_index: usize,
    pub subdivision: Subdivision,
    pub running: bool,
}

impl PlaybackState {
    /// An invalid time signature is replaced by common time
    pub fn new(tempo: Tempo, time_signature: TimeSignature, subdivision_index: usize) -> Self {
        let time_signature = if time_signature.is_valid() {
            time_signature
        } else {
            log::warn!(
                "Invalid time signature {}, using {}",
                time_signature,
                TimeSignature::COMMON_TIME
            );
            TimeSignature::COMMON_TIME
        };
        let (subdivision_index, subdivision) =
            Subdivision::select(time_signature.beat_type, subdivision_index);
        Self {
            note_index: None,
            tempo,
            time_signature,
            subdivision_index,
            subdivision,
            running: false,
        }
    }

    /// beats_per_measure * subdivision
    pub fn note_count(&self) -> usize {
        usize::from(self.time_signature.beats_per_measure) * self.subdivision.count() as usize
    }

    pub fn tick_delay(&self) -> Duration {
        self.tempo.tick_delay(self.subdivision)
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new(Tempo::default(), TimeSignature::default(), 0)
    }
}

/// Metronome state owned by the scheduler loop
#[derive(Debug, Clone)]
pub struct Metronome {
    state: PlaybackState,
    notes: Vec<NoteHighlight>,
    spark: SparkAnimation,
}

impl Metronome {
    pub fn new(tempo: Tempo, time_signature: TimeSignature, subdivision_index: usize) -> Self {
        let state = PlaybackState::new(tempo, time_signature, subdivision_index);
        let mut metronome = Self {
            state,
            notes: Vec::new(),
            spark: SparkAnimation::default(),
        };
        metronome.rebuild_notes();
        metronome
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn notes(&self) -> &[NoteHighlight] {
        &self.notes
    }

    pub fn spark(&self) -> &SparkAnimation {
        &self.spark
    }

    /// Reset to the beginning of the measure and start playing.
    /// Returns the delay before the first tick, which is always zero.
    pub fn start(&mut self, now: Instant) -> Duration {
        self.state.note_index = None;
        self.state.running = true;
        self.spark.restart(now);
        Duration::ZERO
    }

    /// Stop playing, clear all highlighting and hide the spark
    pub fn stop(&mut self) {
        self.state.running = false;
        self.spark.cancel();
        self.notes.fill(NoteHighlight::Inactive);
    }

    /// Advance to the next note. Returns `None` when stopped.
    pub fn tick(&mut self, now: Instant) -> Option<Tick> {
        if !self.state.running {
            return None;
        }

        if self.notes.is_empty() {
            return None;
        }

        if let Some(previous) = self.state.note_index {
            self.notes[previous] = NoteHighlight::Inactive;
        }

        let index = match self.state.note_index {
            Some(previous) if previous + 1 < self.notes.len() => previous + 1,
            _ => 0,
        };
        self.state.note_index = Some(index);

        let mut click = None;
        let restarted_spark = index == 0;
        if restarted_spark {
            self.spark.restart(now);
            click = Some(ClickType::Emphasis);
        }

        let highlight = if index % self.state.subdivision.count() as usize == 0 {
            if index != 0 {
                click = Some(ClickType::Tick);
            }
            NoteHighlight::Beat
        } else {
            NoteHighlight::Subdivision
        };
        self.notes[index] = highlight;

        Some(Tick {
            index,
            highlight,
            click,
            restarted_spark,
            next_delay: self.state.tick_delay(),
        })
    }

    /// Returns true when the tempo actually changed
    pub fn set_tempo(&mut self, tempo: Tempo) -> bool {
        if self.state.tempo == tempo {
            return false;
        }
        self.state.tempo = tempo;
        self.update_spark_duration();
        true
    }

    /// Switch time signature, re-deriving subdivision options and the note row.
    /// Returns true when the signature actually changed.
    pub fn set_time_signature(&mut self, time_signature: TimeSignature) -> bool {
        if self.state.time_signature == time_signature {
            return false;
        }
        if !time_signature.is_valid() {
            log::warn!("Ignoring invalid time signature {}", time_signature);
            return false;
        }
        self.state.time_signature = time_signature;
        self.apply_subdivision(self.state.subdivision_index);
        true
    }

    /// Select a subdivision by selector index (clamped to the valid options).
    /// Returns true when the effective subdivision changed.
    pub fn set_subdivision(&mut self, index: usize) -> bool {
        let before = (self.state.subdivision_index, self.state.subdivision);
        self.apply_subdivision(index);
        before != (self.state.subdivision_index, self.state.subdivision)
    }

    pub fn frame(&self) -> DisplayFrame {
        DisplayFrame {
            notes: self.notes.clone(),
            note_value: NoteValue::for_beat(
                self.state.time_signature.beat_type,
                self.state.subdivision,
            ),
            spark: self.spark,
            running: self.state.running,
            tempo: self.state.tempo,
            time_signature: self.state.time_signature,
            subdivision: self.state.subdivision,
            subdivision_index: self.state.subdivision_index,
        }
    }

    fn apply_subdivision(&mut self, index: usize) {
        let (index, subdivision) = Subdivision::select(self.state.time_signature.beat_type, index);
        self.state.subdivision_index = index;
        self.state.subdivision = subdivision;
        self.rebuild_notes();
    }

    fn rebuild_notes(&mut self) {
        let count = self.state.note_count();
        self.notes.clear();
        self.notes.resize(count, NoteHighlight::Inactive);
        if self
            .state
            .note_index
            .is_some_and(|index| index >= count)
        {
            self.state.note_index = None;
        }
        self.update_spark_duration();
    }

    fn update_spark_duration(&mut self) {
        self.spark
            .set_duration(self.state.tempo.measure_duration(&self.state.time_signature));
    }
}

impl Default for Metronome {
    fn default() -> Self {
        Self::new(Tempo::default(), TimeSignature::default(), 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_ticks(metronome: &mut Metronome, count: usize) -> Vec<Tick> {
        let now = Instant::now();
        (0..count).filter_map(|_| metronome.tick(now)).collect()
    }

    #[test]
    fn test_common_time_accent_pattern() {
        let mut metronome = Metronome::new(Tempo::new(120), TimeSignature::COMMON_TIME, 0);
        assert_eq!(metronome.notes().len(), 4);

        let delay = metronome.start(Instant::now());
        assert_eq!(delay, Duration::ZERO);

        let ticks = run_ticks(&mut metronome, 8);
        let clicks: Vec<_> = ticks.iter().map(|t| t.click).collect();
        assert_eq!(
            clicks,
            vec![
                Some(ClickType::Emphasis),
                Some(ClickType::Tick),
                Some(ClickType::Tick),
                Some(ClickType::Tick),
                Some(ClickType::Emphasis),
                Some(ClickType::Tick),
                Some(ClickType::Tick),
                Some(ClickType::Tick),
            ]
        );
        assert!(ticks.iter().all(|t| t.next_delay == Duration::from_millis(500)));
        assert!(ticks[0].restarted_spark);
        assert!(ticks[4].restarted_spark);
        assert!(!ticks[1].restarted_spark);
    }

    #[test]
    fn test_first_tick_is_index_zero_regardless_of_prior_state() {
        let mut metronome = Metronome::default();
        metronome.start(Instant::now());
        run_ticks(&mut metronome, 3);
        assert_eq!(metronome.state().note_index, Some(2));

        metronome.stop();
        metronome.start(Instant::now());
        assert_eq!(metronome.state().note_index, None);
        let tick = metronome.tick(Instant::now()).unwrap();
        assert_eq!(tick.index, 0);
        assert_eq!(tick.click, Some(ClickType::Emphasis));
    }

    #[test]
    fn test_six_eight_with_subdivision() {
        let mut metronome = Metronome::new(Tempo::new(90), TimeSignature::new(6, 8), 1);
        assert_eq!(metronome.state().subdivision, Subdivision::Two);
        assert_eq!(metronome.notes().len(), 12);

        metronome.start(Instant::now());
        let ticks = run_ticks(&mut metronome, 13);
        assert_eq!(ticks[0].next_delay.as_millis(), 333);

        let indices: Vec<_> = ticks.iter().map(|t| t.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 0]);

        assert_eq!(ticks[1].highlight, NoteHighlight::Subdivision);
        assert_eq!(ticks[1].click, None);
        assert_eq!(ticks[2].highlight, NoteHighlight::Beat);
        assert_eq!(ticks[2].click, Some(ClickType::Tick));
        assert_eq!(ticks[12].click, Some(ClickType::Emphasis));
    }

    #[test]
    fn test_exactly_one_note_active() {
        let mut metronome = Metronome::new(Tempo::new(200), TimeSignature::new(3, 4), 2);
        metronome.start(Instant::now());

        for _ in 0..30 {
            metronome.tick(Instant::now());
            let active = metronome.notes().iter().filter(|n| n.is_active()).count();
            assert_eq!(active, 1);
        }
    }

    #[test]
    fn test_stop_clears_highlighting() {
        let mut metronome = Metronome::default();
        metronome.start(Instant::now());
        run_ticks(&mut metronome, 2);
        assert!(metronome.spark().is_visible());

        metronome.stop();
        assert!(!metronome.is_running());
        assert!(metronome.notes().iter().all(|n| !n.is_active()));
        assert!(!metronome.spark().is_visible());
        assert!(metronome.tick(Instant::now()).is_none());
    }

    #[test]
    fn test_time_signature_change_clamps_subdivision() {
        let mut metronome = Metronome::new(Tempo::new(120), TimeSignature::COMMON_TIME, 2);
        assert_eq!(metronome.state().subdivision, Subdivision::Four);
        assert_eq!(metronome.notes().len(), 16);

        assert!(metronome.set_time_signature(TimeSignature::new(6, 8)));
        assert_eq!(metronome.state().subdivision_index, 1);
        assert_eq!(metronome.state().subdivision, Subdivision::Two);
        assert_eq!(metronome.notes().len(), 12);

        assert!(!metronome.set_time_signature(TimeSignature::new(6, 8)));
    }

    #[test]
    fn test_invalid_time_signature_falls_back_to_common_time() {
        let mut metronome = Metronome::new(Tempo::new(120), TimeSignature::new(0, 4), 0);
        assert_eq!(metronome.state().time_signature, TimeSignature::COMMON_TIME);
        assert_eq!(metronome.notes().len(), 4);

        metronome.start(Instant::now());
        let tick = metronome.tick(Instant::now()).unwrap();
        assert_eq!(tick.index, 0);

        assert!(!metronome.set_time_signature(TimeSignature::new(0, 8)));
        assert!(!metronome.set_time_signature(TimeSignature::new(3, 6)));
        assert_eq!(metronome.notes().len(), 4);
    }

    #[test]
    fn test_time_signature_change_keeps_valid_index() {
        let mut metronome = Metronome::new(Tempo::new(120), TimeSignature::COMMON_TIME, 1);
        metronome.set_time_signature(TimeSignature::new(9, 8));
        assert_eq!(metronome.state().subdivision_index, 1);
        assert_eq!(metronome.state().subdivision, Subdivision::Two);
        assert_eq!(metronome.notes().len(), 18);
    }

    #[test]
    fn test_subdivision_change() {
        let mut metronome = Metronome::default();
        assert!(metronome.set_subdivision(1));
        assert_eq!(metronome.notes().len(), 8);
        assert!(!metronome.set_subdivision(1));

        // Out of range for quarter notes: clamps to sixteenths
        assert!(metronome.set_subdivision(7));
        assert_eq!(metronome.state().subdivision, Subdivision::Four);
    }

    #[test]
    fn test_spark_follows_measure_duration() {
        let mut metronome = Metronome::new(Tempo::new(120), TimeSignature::new(3, 4), 0);
        assert_eq!(metronome.spark().duration(), Duration::from_millis(1500));

        metronome.set_tempo(Tempo::new(60));
        assert_eq!(metronome.spark().duration(), Duration::from_secs(3));

        metronome.set_time_signature(TimeSignature::new(2, 4));
        assert_eq!(metronome.spark().duration(), Duration::from_secs(2));
    }

    #[test]
    fn test_frame_snapshot() {
        let mut metronome = Metronome::new(Tempo::new(100), TimeSignature::new(3, 8), 1);
        metronome.start(Instant::now());
        metronome.tick(Instant::now());

        let frame = metronome.frame();
        assert!(frame.running);
        assert_eq!(frame.active_note(), Some(0));
        assert_eq!(frame.notes.len(), 6);
        assert_eq!(frame.note_value, Some(NoteValue::Sixteenth));
        assert_eq!(frame.subdivision_options(), &[Subdivision::One, Subdivision::Two]);
        assert_eq!(frame.tempo.bpm(), 100);
    }
}
