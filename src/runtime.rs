// Runtime - Wires sound bank, audio output, dispatch worker and scheduler together
// Shared by the GUI and the command line front ends

use crate::audio::dispatch::{SilentPlayer, SoundDispatcher, SoundRequest};
use crate::audio::engine::AudioEngine;
use crate::audio::parameters::AtomicF32;
use crate::audio::sound_bank::{SoundBank, SoundId};
use crate::config::MetronomeConfig;
use crate::error::{MetronomeError, MetronomeResult};
use crate::messaging::command::ControlEvent;
use crate::sequencer::metronome::Metronome;
use crate::sequencer::scheduler::{ClickSounds, FrameObserver, SchedulerHandle, TempoScheduler};
use std::sync::Arc;

/// Rate of the synthesized click; the mixer resamples to the device rate
const SYNTH_SAMPLE_RATE: u32 = 48_000;

pub struct MetronomeRuntime {
    scheduler: SchedulerHandle,
    dispatcher: SoundDispatcher,
    master_volume: AtomicF32,
    // Dropped last: the stream must outlive the worker feeding it
    engine: Option<AudioEngine>,
}

impl MetronomeRuntime {
    /// Load sounds, open the audio device and start the worker threads.
    /// A missing audio device is not fatal: the metronome runs silently.
    pub fn start<O>(config: &MetronomeConfig, observer: O) -> MetronomeResult<Self>
    where
        O: FrameObserver + 'static,
    {
        let mut bank = SoundBank::new();
        let sound_id = load_click(&mut bank, config);
        let bank = Arc::new(bank);

        let master_volume = AtomicF32::new(config.master_volume);

        let (engine, dispatcher) = match AudioEngine::start(
            Arc::clone(&bank),
            master_volume.clone(),
            config.voice_queue_capacity,
        ) {
            Ok((engine, player)) => {
                log::info!(
                    "Clicks rendered at {} Hz on {} channel(s)",
                    engine.sample_rate(),
                    engine.channels()
                );
                (Some(engine), SoundDispatcher::spawn(player)?)
            }
            Err(e) => {
                log::warn!("Audio output unavailable, running silently: {}", e);
                (None, SoundDispatcher::spawn(SilentPlayer)?)
            }
        };

        let sounds = ClickSounds {
            emphasis: SoundRequest::new(sound_id, config.emphasis_volume),
            tick: SoundRequest::new(sound_id, config.tick_volume),
        };

        let metronome = Metronome::new(
            config.initial_tempo(),
            config.time_signature,
            config.subdivision_index,
        );

        let queue = dispatcher
            .queue()
            .ok_or_else(|| MetronomeError::Stream("sound dispatch queue closed".to_string()))?;
        let scheduler = TempoScheduler::spawn(metronome, sounds, queue, observer)?;

        Ok(Self {
            scheduler,
            dispatcher,
            master_volume,
            engine,
        })
    }

    /// Forward a control event to the scheduler
    pub fn send(&self, event: ControlEvent) {
        if self.scheduler.send(event).is_err() {
            log::warn!("Scheduler is gone, {:?} ignored", event);
        }
    }

    pub fn scheduler(&self) -> &SchedulerHandle {
        &self.scheduler
    }

    pub fn master_volume(&self) -> &AtomicF32 {
        &self.master_volume
    }

    pub fn has_audio(&self) -> bool {
        self.engine.is_some()
    }

    /// Stop the scheduler first (it holds a queue handle), then the worker
    pub fn shutdown(self) {
        let Self {
            scheduler,
            dispatcher,
            engine,
            ..
        } = self;
        scheduler.shutdown();
        dispatcher.shutdown();
        drop(engine);
        log::info!("Metronome runtime stopped");
    }
}

fn load_click(bank: &mut SoundBank, config: &MetronomeConfig) -> SoundId {
    match &config.click_sample {
        Some(path) => bank.load(path),
        None => bank.synthesize_click(SYNTH_SAMPLE_RATE),
    }
}
