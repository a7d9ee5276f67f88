// Sound bank - Preloaded click sounds shared with the audio callback

use crate::error::{MetronomeError, MetronomeResult};
use hound::{SampleFormat, WavReader};
use std::f32::consts::PI;
use std::path::Path;

/// Handle to a sound in the bank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SoundId(pub u32);

/// Mono sample data ready for playback
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSound {
    pub name: String,
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Sounds indexed by [`SoundId`]. Built once at startup, then read-only.
/// A slot may be empty when loading failed: playing it produces silence.
#[derive(Debug, Default)]
pub struct SoundBank {
    slots: Vec<Option<LoadedSound>>,
}

impl SoundBank {
    /// Duration of the synthesized click
    const CLICK_DURATION_MS: f32 = 30.0;
    const CLICK_FREQUENCY: f32 = 1000.0;

    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Load a WAV file. Always hands back an id; if decoding failed the
    /// failure is logged and the id stays silent.
    pub fn load(&mut self, path: &Path) -> SoundId {
        let sound = match load_wav(path) {
            Ok(sound) => {
                log::info!(
                    "Loaded sound {} ({} samples @ {} Hz)",
                    sound.name,
                    sound.samples.len(),
                    sound.sample_rate
                );
                Some(sound)
            }
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        };
        self.push(sound)
    }

    /// Generate a short click (sine wave with exponential decay)
    pub fn synthesize_click(&mut self, sample_rate: u32) -> SoundId {
        let num_samples = ((Self::CLICK_DURATION_MS / 1000.0) * sample_rate as f32) as usize;
        let phase_increment = 2.0 * PI * Self::CLICK_FREQUENCY / sample_rate as f32;

        let samples = (0..num_samples)
            .map(|i| {
                let t = i as f32 / num_samples as f32;
                let envelope = (-t * 8.0).exp(); // Fast decay
                (i as f32 * phase_increment).sin() * envelope
            })
            .collect();

        self.push(Some(LoadedSound {
            name: "click".to_string(),
            samples,
            sample_rate,
        }))
    }

    pub fn insert(&mut self, sound: LoadedSound) -> SoundId {
        self.push(Some(sound))
    }

    pub fn get(&self, id: SoundId) -> Option<&LoadedSound> {
        self.slots.get(id.0 as usize).and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn push(&mut self, sound: Option<LoadedSound>) -> SoundId {
        let id = SoundId(self.slots.len() as u32);
        self.slots.push(sound);
        id
    }
}

/// Decode a WAV file to mono f32
pub fn load_wav(path: &Path) -> MetronomeResult<LoadedSound> {
    let load_error = |reason: String| MetronomeError::SoundLoad {
        path: path.to_path_buf(),
        reason,
    };

    let reader = WavReader::open(path).map_err(|e| load_error(e.to_string()))?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| load_error(e.to_string()))?,
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|s| s as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(|e| load_error(e.to_string()))?
        }
    };

    if interleaved.is_empty() {
        return Err(load_error("file contains no samples".to_string()));
    }

    let samples = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();

    Ok(LoadedSound {
        name: path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string(),
        samples,
        sample_rate: spec.sample_rate,
    })
}
