// Audio engine - CPAL real-time callback
//
// # Format Support
//
// The stream is opened in the device's preferred sample format (F32, I16 or
// U16). Clicks are mixed in f32 and converted when written to the output
// buffer, without allocating.
//
// # Threading
//
// The stream is not Send on every platform (CoreAudio), so the engine stays on
// the thread that created it. The dispatch worker talks to the callback through
// a [`ClickPlayer`], which only owns the producer end of a ring buffer.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use ringbuf::traits::{Consumer, Producer};
use std::sync::Arc;

use crate::audio::dispatch::{SoundPlayer, SoundRequest};
use crate::audio::format_conversion::write_mono_to_interleaved_frame;
use crate::audio::mixer::{ClickMixer, VoiceTrigger};
use crate::audio::parameters::AtomicF32;
use crate::audio::sound_bank::SoundBank;
use crate::error::{MetronomeError, MetronomeResult};
use crate::messaging::channels::{VoiceConsumer, VoiceProducer, create_voice_channel};

pub struct AudioEngine {
    _device: Device,
    _stream: Stream,
    sample_rate: u32,
    channels: usize,
}

impl AudioEngine {
    /// Open the default output device and start rendering clicks.
    /// Returns the engine (keep it alive) and the player for the dispatch worker.
    pub fn start(
        bank: Arc<SoundBank>,
        master_volume: AtomicF32,
        voice_queue_capacity: usize,
    ) -> MetronomeResult<(Self, ClickPlayer)> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(MetronomeError::NoOutputDevice)?;

        log::info!(
            "Audio device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let supported_config = device
            .default_output_config()
            .map_err(|e| MetronomeError::AudioConfig(e.to_string()))?;

        let sample_format = supported_config.sample_format();
        log::debug!("Audio config: {:?}", supported_config);

        let sample_rate = supported_config.sample_rate().0;
        let channels = usize::from(supported_config.channels());
        let config: StreamConfig = supported_config.into();

        let (voice_tx, voice_rx) = create_voice_channel(voice_queue_capacity.max(1));
        let mixer = ClickMixer::new(sample_rate, ClickMixer::DEFAULT_VOICES);

        let stream = match sample_format {
            SampleFormat::F32 => {
                Self::build_stream::<f32>(&device, &config, channels, bank, mixer, voice_rx, master_volume)
            }
            SampleFormat::I16 => {
                Self::build_stream::<i16>(&device, &config, channels, bank, mixer, voice_rx, master_volume)
            }
            SampleFormat::U16 => {
                Self::build_stream::<u16>(&device, &config, channels, bank, mixer, voice_rx, master_volume)
            }
            other => {
                return Err(MetronomeError::UnsupportedSampleFormat(format!("{:?}", other)));
            }
        }?;

        stream
            .play()
            .map_err(|e| MetronomeError::Stream(e.to_string()))?;

        log::info!("Audio engine started: {} Hz, {} channels", sample_rate, channels);

        Ok((
            Self {
                _device: device,
                _stream: stream,
                sample_rate,
                channels,
            },
            ClickPlayer { voice_tx },
        ))
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Build an output stream for any sample type (f32, i16, u16)
    fn build_stream<T>(
        device: &Device,
        config: &StreamConfig,
        channels: usize,
        bank: Arc<SoundBank>,
        mut mixer: ClickMixer,
        mut voice_rx: VoiceConsumer,
        master_volume: AtomicF32,
    ) -> MetronomeResult<Stream>
    where
        T: SizedSample + FromSample<f32> + Send + 'static,
    {
        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    // No allocations, no I/O, no blocking locks past this point
                    while let Some(trigger) = voice_rx.try_pop() {
                        mixer.trigger(&bank, trigger);
                    }

                    let volume = master_volume.get();
                    for frame in data.chunks_mut(channels) {
                        let sample = (mixer.next_sample(&bank) * volume).clamp(-1.0, 1.0);
                        write_mono_to_interleaved_frame(sample, frame);
                    }
                },
                move |err| {
                    // Runs outside the audio callback
                    log::warn!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| MetronomeError::Stream(e.to_string()))
    }
}

/// Plays sound requests by handing voice triggers to the audio callback
pub struct ClickPlayer {
    voice_tx: VoiceProducer,
}

impl ClickPlayer {
    pub fn new(voice_tx: VoiceProducer) -> Self {
        Self { voice_tx }
    }
}

impl SoundPlayer for ClickPlayer {
    fn play(&mut self, request: SoundRequest) {
        let trigger = VoiceTrigger {
            sound_id: request.sound_id,
            gain: request.volume,
        };
        if self.voice_tx.try_push(trigger).is_err() {
            log::warn!("Voice queue full, dropping {:?}", request);
        }
    }
}
