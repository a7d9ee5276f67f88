// Click mixer - Renders triggered sounds inside the audio callback
// Pre-allocated voice pool: no allocations, no locks while rendering

use crate::audio::sound_bank::{SoundBank, SoundId};

/// Request to start a voice, sent from the dispatch worker to the callback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceTrigger {
    pub sound_id: SoundId,
    pub gain: f32,
}

/// Active voice playback state
#[derive(Debug, Clone, Copy)]
struct Voice {
    sound_id: SoundId,
    gain: f32,
    position: f64, // Current position in the sound buffer (fractional)
    step: f64,     // Source samples advanced per output sample
    age: u64,
}

/// Mixes overlapping clicks into a mono signal
#[derive(Debug)]
pub struct ClickMixer {
    voices: Vec<Option<Voice>>,
    output_rate: f64,
    triggered: u64,
}

impl ClickMixer {
    pub const DEFAULT_VOICES: usize = 8;

    pub fn new(output_rate: u32, max_voices: usize) -> Self {
        Self {
            voices: vec![None; max_voices.max(1)],
            output_rate: f64::from(output_rate.max(1)),
            triggered: 0,
        }
    }

    /// Start a voice. Triggers for sounds that are not loaded are ignored.
    /// When every voice is busy the oldest one is replaced.
    pub fn trigger(&mut self, bank: &SoundBank, trigger: VoiceTrigger) {
        let Some(sound) = bank.get(trigger.sound_id) else {
            return;
        };

        self.triggered += 1;
        let voice = Voice {
            sound_id: trigger.sound_id,
            gain: trigger.gain,
            position: 0.0,
            step: f64::from(sound.sample_rate) / self.output_rate,
            age: self.triggered,
        };

        let slot = match self.voices.iter().position(Option::is_none) {
            Some(free) => free,
            None => self
                .voices
                .iter()
                .enumerate()
                .min_by_key(|(_, v)| v.map_or(0, |v| v.age))
                .map_or(0, |(i, _)| i),
        };
        self.voices[slot] = Some(voice);
    }

    /// Process one sample of output (0.0 when nothing is playing)
    pub fn next_sample(&mut self, bank: &SoundBank) -> f32 {
        let mut sum = 0.0;

        for slot in self.voices.iter_mut() {
            let Some(voice) = slot else { continue };
            let samples = bank.get(voice.sound_id).map_or(&[][..], |s| &s.samples[..]);

            let index = voice.position as usize;
            if index < samples.len() {
                sum += samples[index] * voice.gain;
                voice.position += voice.step;
            } else {
                // Click finished
                *slot = None;
            }
        }

        sum
    }

    /// Process a buffer of output
    pub fn process_buffer(&mut self, bank: &SoundBank, output: &mut [f32]) {
        for sample in output.iter_mut() {
            *sample = self.next_sample(bank);
        }
    }

    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.is_some()).count()
    }

    /// Silence every voice
    pub fn reset(&mut self) {
        self.voices.fill(None);
    }
}
