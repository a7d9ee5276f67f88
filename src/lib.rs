// Beatty Metronome - Library exports for the GUI, the CLI and tests

pub mod audio;
pub mod config;
pub mod error;
pub mod messaging;
pub mod runtime;
pub mod sequencer;
pub mod ui;

// Re-export commonly used types for convenience
pub use audio::dispatch::{SilentPlayer, SoundDispatcher, SoundPlayer, SoundQueue, SoundRequest};
pub use audio::engine::AudioEngine;
pub use audio::sound_bank::{SoundBank, SoundId};
pub use config::MetronomeConfig;
pub use error::{MetronomeError, MetronomeResult};
pub use messaging::channels::{ControlSender, create_control_channel};
pub use messaging::command::ControlEvent;
pub use runtime::MetronomeRuntime;
pub use sequencer::{
    ClickSounds, ClickType, DisplayFrame, FrameObserver, Metronome, NoteHighlight, NoteValue,
    SchedulerHandle, SparkAnimation, Subdivision, Tempo, TempoScheduler, TimeSignature,
};
