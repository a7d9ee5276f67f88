// Control events - Front end → scheduler loop

use crate::sequencer::timeline::TimeSignature;

/// User input handled by the scheduler loop.
/// Each event is applied to the playback state it owns; changes made while
/// running restart playback so the new timing takes effect at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// Start from the downbeat; restarts the measure when already running
    Start,
    Stop,
    /// Start when stopped, stop when running
    Toggle,
    /// New tempo in BPM (zero is clamped to the minimum)
    SetTempo(u32),
    SetTimeSignature(TimeSignature),
    /// Selector index into the subdivision options of the current beat type
    SetSubdivision(usize),
    Shutdown,
}
