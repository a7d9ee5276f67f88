// Error types shared by the audio, configuration and timing layers

use std::path::PathBuf;

/// Metronome error types
#[derive(Debug, thiserror::Error)]
pub enum MetronomeError {
    #[error("No audio output device found")]
    NoOutputDevice,

    #[error("Audio configuration error: {0}")]
    AudioConfig(String),

    #[error("Unsupported sample format: {0}. Supported formats: F32, I16, U16")]
    UnsupportedSampleFormat(String),

    #[error("Audio stream error: {0}")]
    Stream(String),

    #[error("Failed to load sound {}: {reason}", path.display())]
    SoundLoad { path: PathBuf, reason: String },

    #[error("Invalid time signature {beats_per_measure}/{beat_type}")]
    InvalidTimeSignature {
        beats_per_measure: u8,
        beat_type: u8,
    },

    #[error("Failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

pub type MetronomeResult<T> = Result<T, MetronomeError>;
