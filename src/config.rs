// Configuration - Startup settings read from a RON file
// The file is optional and never written back; missing fields take their defaults.

use crate::error::MetronomeResult;
use crate::sequencer::timeline::{Subdivision, Tempo, TimeSignature};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "beatty-metronome";
const CONFIG_FILE: &str = "config.ron";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetronomeConfig {
    /// Tempo when the app opens
    pub initial_bpm: u32,
    /// Slider range
    pub min_bpm: u32,
    pub max_bpm: u32,
    pub time_signature: TimeSignature,
    /// Index into the subdivision options of the time signature's beat type
    pub subdivision_index: usize,
    /// Volume of the downbeat click
    pub emphasis_volume: f32,
    /// Volume of the other beat clicks
    pub tick_volume: f32,
    pub master_volume: f32,
    /// WAV file used for clicks; a synthesized click is used when unset
    pub click_sample: Option<PathBuf>,
    /// Capacity of the ring buffer feeding the audio callback
    pub voice_queue_capacity: usize,
}

impl Default for MetronomeConfig {
    fn default() -> Self {
        Self {
            initial_bpm: 120,
            min_bpm: Tempo::MIN_BPM,
            max_bpm: 240,
            time_signature: TimeSignature::COMMON_TIME,
            subdivision_index: 0,
            emphasis_volume: 1.0,
            tick_volume: 0.8,
            master_volume: 0.8,
            click_sample: None,
            voice_queue_capacity: 64,
        }
    }
}

impl MetronomeConfig {
    /// `<config dir>/beatty-metronome/config.ron`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Parse and sanitize a config file
    pub fn load_from(path: &Path) -> MetronomeResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = ron::from_str(&text)?;
        Ok(config.sanitized())
    }

    /// Load from `path` (or the default location). Any failure falls back to
    /// the defaults; only a file that exists but cannot be used is reported.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) => path,
                None => return Self::default(),
            },
        };

        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Ignoring config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Clamp every value into a usable range
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        self.min_bpm = self.min_bpm.clamp(Tempo::MIN_BPM, Tempo::MAX_BPM);
        self.max_bpm = self.max_bpm.clamp(self.min_bpm, Tempo::MAX_BPM);
        self.initial_bpm = self.initial_bpm.clamp(self.min_bpm, self.max_bpm);

        if !self.time_signature.is_valid() {
            log::warn!(
                "Invalid time signature {} in config, using {}",
                self.time_signature,
                defaults.time_signature
            );
            self.time_signature = defaults.time_signature;
        }
        self.subdivision_index =
            Subdivision::select(self.time_signature.beat_type, self.subdivision_index).0;

        self.emphasis_volume = self.emphasis_volume.clamp(0.0, 1.0);
        self.tick_volume = self.tick_volume.clamp(0.0, 1.0);
        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        self.voice_queue_capacity = self.voice_queue_capacity.max(1);
        self
    }

    pub fn initial_tempo(&self) -> Tempo {
        Tempo::new(self.initial_bpm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MetronomeConfig::default();
        assert_eq!(config.initial_tempo(), Tempo::new(120));
        assert_eq!(config.time_signature, TimeSignature::COMMON_TIME);
        assert_eq!(config.tick_volume, 0.8);
        assert_eq!(config.emphasis_volume, 1.0);
        assert_eq!(config.clone().sanitized(), config);
    }

    #[test]
    fn test_sanitize_clamps_values() {
        let config = MetronomeConfig {
            initial_bpm: 0,
            min_bpm: 0,
            max_bpm: 0,
            time_signature: TimeSignature::new(3, 8),
            subdivision_index: 2,
            tick_volume: 3.0,
            voice_queue_capacity: 0,
            ..MetronomeConfig::default()
        }
        .sanitized();

        assert_eq!(config.min_bpm, 1);
        assert_eq!(config.max_bpm, 1);
        assert_eq!(config.initial_bpm, 1);
        assert_eq!(config.subdivision_index, 1);
        assert_eq!(config.tick_volume, 1.0);
        assert_eq!(config.voice_queue_capacity, 1);
    }

    #[test]
    fn test_sanitize_caps_tempo_range() {
        let config = MetronomeConfig {
            initial_bpm: 2_147_483_648,
            min_bpm: u32::MAX,
            max_bpm: u32::MAX,
            ..MetronomeConfig::default()
        }
        .sanitized();

        assert_eq!(config.min_bpm, Tempo::MAX_BPM);
        assert_eq!(config.max_bpm, Tempo::MAX_BPM);
        assert_eq!(config.initial_bpm, Tempo::MAX_BPM);
    }

    #[test]
    fn test_invalid_time_signature_falls_back() {
        let config = MetronomeConfig {
            time_signature: TimeSignature::new(4, 5),
            ..MetronomeConfig::default()
        }
        .sanitized();
        assert_eq!(config.time_signature, TimeSignature::COMMON_TIME);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = MetronomeConfig::load_or_default(Some(Path::new("/nonexistent/config.ron")));
        assert_eq!(config, MetronomeConfig::default());
    }
}
