// Messaging module - Channels between the front end, the scheduler and the audio thread

pub mod channels;
pub mod command;

pub use channels::{create_control_channel, create_voice_channel};
pub use command::ControlEvent;
