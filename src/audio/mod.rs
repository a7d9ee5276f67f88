// Audio module - Sound loading, dispatch worker and CPAL output

pub mod dispatch;
pub mod engine;
pub mod format_conversion;
pub mod mixer;
pub mod parameters;
pub mod sound_bank;

pub use dispatch::{SilentPlayer, SoundDispatcher, SoundPlayer, SoundQueue, SoundRequest};
pub use engine::{AudioEngine, ClickPlayer};
pub use parameters::AtomicF32;
pub use sound_bank::{SoundBank, SoundId};
