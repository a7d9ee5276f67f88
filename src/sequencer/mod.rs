// Sequencer module
// Musical time, the metronome state machine and the tempo scheduler loop

pub mod display;
pub mod metronome;
pub mod scheduler;
pub mod timeline;
pub mod timer;

pub use display::{DisplayFrame, NoteHighlight, NoteValue, SparkAnimation};
pub use metronome::{ClickType, Metronome, PlaybackState, Tick};
pub use scheduler::{ClickSounds, FrameObserver, SchedulerHandle, TempoScheduler};
pub use timeline::{Subdivision, Tempo, TimeSignature};
pub use timer::TickTimer;
