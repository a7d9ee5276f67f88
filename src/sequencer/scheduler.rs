// Tempo scheduler - Single-threaded event loop driving the metronome
// Control events and timer ticks are handled one at a time, each to completion

use super::display::DisplayFrame;
use super::metronome::{ClickType, Metronome};
use super::timer::TickTimer;
use crate::audio::dispatch::{SoundQueue, SoundRequest};
use crate::error::{MetronomeError, MetronomeResult};
use crate::messaging::channels::{ControlReceiver, ControlSender, create_control_channel};
use crate::messaging::command::ControlEvent;
use crate::sequencer::timeline::Tempo;
use crossbeam::channel::SendError;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Receives a snapshot after every tick and every handled control event
pub trait FrameObserver: Send {
    fn on_frame(&mut self, frame: &DisplayFrame);
}

/// The two click variants: same sound, different volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickSounds {
    pub emphasis: SoundRequest,
    pub tick: SoundRequest,
}

impl ClickSounds {
    pub fn request(&self, click: ClickType) -> SoundRequest {
        match click {
            ClickType::Emphasis => self.emphasis,
            ClickType::Tick => self.tick,
        }
    }
}

pub struct TempoScheduler<O> {
    metronome: Metronome,
    timer: TickTimer,
    control_rx: ControlReceiver,
    sounds: ClickSounds,
    queue: SoundQueue,
    observer: O,
}

impl<O: FrameObserver + 'static> TempoScheduler<O> {
    /// Spawn the scheduler thread. The metronome starts stopped.
    pub fn spawn(
        metronome: Metronome,
        sounds: ClickSounds,
        queue: SoundQueue,
        observer: O,
    ) -> MetronomeResult<SchedulerHandle> {
        let (control_tx, control_rx) = create_control_channel();
        let scheduler = Self::new(metronome, sounds, queue, observer, control_rx);

        let thread = thread::Builder::new()
            .name("tempo-scheduler".into())
            .spawn(move || scheduler.run())
            .map_err(|source| MetronomeError::Spawn {
                name: "tempo-scheduler",
                source,
            })?;

        Ok(SchedulerHandle {
            control_tx,
            thread: Some(thread),
        })
    }
}

impl<O: FrameObserver> TempoScheduler<O> {
    fn new(
        mut metronome: Metronome,
        sounds: ClickSounds,
        queue: SoundQueue,
        observer: O,
        control_rx: ControlReceiver,
    ) -> Self {
        metronome.stop();
        Self {
            metronome,
            timer: TickTimer::new(),
            control_rx,
            sounds,
            queue,
            observer,
        }
    }

    /// Main loop
    fn run(mut self) {
        log::info!("Tempo scheduler started");
        self.publish();

        // Local clone keeps the select borrow apart from `&mut self` in the handlers
        let control_rx = self.control_rx.clone();
        loop {
            // Rebuilt every iteration so a cancelled or replaced tick never fires
            let tick_due = self.timer.wait();

            crossbeam::select! {
                recv(control_rx) -> event => match event {
                    Ok(ControlEvent::Shutdown) => break,
                    Ok(event) => self.handle_event(event, Instant::now()),
                    Err(_) => {
                        log::info!("Control channel closed, shutting down");
                        break;
                    }
                },
                recv(tick_due) -> _ => self.on_timer(Instant::now()),
            }
        }

        self.timer.cancel();
        self.metronome.stop();
        log::info!("Tempo scheduler stopped");
    }

    fn handle_event(&mut self, event: ControlEvent, now: Instant) {
        match event {
            ControlEvent::Start => {
                if self.metronome.is_running() {
                    self.stop();
                }
                self.start(now);
            }
            ControlEvent::Stop => {
                if self.metronome.is_running() {
                    self.stop();
                }
            }
            ControlEvent::Toggle => {
                if self.metronome.is_running() {
                    self.stop();
                } else {
                    self.start(now);
                }
            }
            ControlEvent::SetTempo(bpm) => {
                let changed = self.metronome.set_tempo(Tempo::new(bpm));
                self.restart_if_running(changed, now);
            }
            ControlEvent::SetTimeSignature(time_signature) => {
                if !time_signature.is_valid() {
                    log::warn!("Ignoring invalid time signature {}", time_signature);
                    return;
                }
                let changed = self.metronome.set_time_signature(time_signature);
                self.restart_if_running(changed, now);
            }
            ControlEvent::SetSubdivision(index) => {
                let changed = self.metronome.set_subdivision(index);
                self.restart_if_running(changed, now);
            }
            ControlEvent::Shutdown => {}
        }

        self.publish();
    }

    fn on_timer(&mut self, now: Instant) {
        let Some(deadline) = self.timer.fire() else {
            return;
        };
        let Some(tick) = self.metronome.tick(now) else {
            return;
        };

        if let Some(click) = tick.click {
            self.queue.enqueue(self.sounds.request(click));
        }
        log::trace!("Tick {} ({:?})", tick.index, tick.highlight);

        self.timer.schedule_after(deadline, now, tick.next_delay);
        self.publish();
    }

    fn start(&mut self, now: Instant) {
        let delay = self.metronome.start(now);
        self.timer.schedule(now, delay);

        let state = self.metronome.state();
        log::info!(
            "Metronome started: {}, {}, subdivision {}",
            state.tempo,
            state.time_signature,
            state.subdivision
        );
    }

    fn stop(&mut self) {
        self.timer.cancel();
        self.metronome.stop();
        log::info!("Metronome stopped");
    }

    /// Settings changed while playing: start over so the new timing applies now
    fn restart_if_running(&mut self, changed: bool, now: Instant) {
        if changed && self.metronome.is_running() {
            self.stop();
            self.start(now);
        }
    }

    fn publish(&mut self) {
        let frame = self.metronome.frame();
        self.observer.on_frame(&frame);
    }
}

/// Handle to the scheduler thread
pub struct SchedulerHandle {
    control_tx: ControlSender,
    thread: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    pub fn send(&self, event: ControlEvent) -> Result<(), SendError<ControlEvent>> {
        self.control_tx.send(event)
    }

    /// A sender for front ends that outlive borrows of the handle
    pub fn sender(&self) -> ControlSender {
        self.control_tx.clone()
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop playback and wait for the scheduler thread to exit
    pub fn shutdown(mut self) {
        self.join();
    }

    fn join(&mut self) {
        let _ = self.control_tx.send(ControlEvent::Shutdown);
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            log::warn!("Tempo scheduler thread panicked");
        }
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::dispatch::{SoundDispatcher, SoundPlayer};
    use crate::audio::sound_bank::SoundId;
    use crate::sequencer::display::NoteHighlight;
    use crate::sequencer::timeline::{Subdivision, TimeSignature};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    type Frames = Arc<Mutex<Vec<DisplayFrame>>>;

    struct NullPlayer;

    impl SoundPlayer for NullPlayer {
        fn play(&mut self, _request: SoundRequest) {}
    }

    #[derive(Clone, Default)]
    struct RecordingObserver {
        frames: Frames,
    }

    impl FrameObserver for RecordingObserver {
        fn on_frame(&mut self, frame: &DisplayFrame) {
            self.frames.lock().unwrap().push(frame.clone());
        }
    }

    fn sounds() -> ClickSounds {
        ClickSounds {
            emphasis: SoundRequest::new(SoundId(0), 1.0),
            tick: SoundRequest::new(SoundId(0), 0.8),
        }
    }

    /// Scheduler driven by hand: no thread, explicit clock
    fn manual_scheduler(
        metronome: Metronome,
    ) -> (TempoScheduler<RecordingObserver>, Frames, SoundDispatcher) {
        let observer = RecordingObserver::default();
        let frames = Arc::clone(&observer.frames);

        let dispatcher = SoundDispatcher::spawn(NullPlayer).unwrap();
        let (_tx, rx) = create_control_channel();
        let scheduler = TempoScheduler::new(
            metronome,
            sounds(),
            dispatcher.queue().unwrap(),
            observer,
            rx,
        );
        (scheduler, frames, dispatcher)
    }

    #[test]
    fn test_start_fires_immediately() {
        let (mut scheduler, frames, _dispatcher) = manual_scheduler(Metronome::default());
        let now = Instant::now();

        scheduler.handle_event(ControlEvent::Start, now);
        assert_eq!(scheduler.timer.deadline(), Some(now));

        scheduler.on_timer(now);
        let last = frames.lock().unwrap().last().cloned().unwrap();
        assert_eq!(last.active_note(), Some(0));
        assert_eq!(last.notes[0], NoteHighlight::Beat);
        assert_eq!(
            scheduler.timer.deadline(),
            Some(now + Duration::from_millis(500))
        );
    }

    #[test]
    fn test_stop_cancels_pending_tick() {
        let (mut scheduler, frames, _dispatcher) = manual_scheduler(Metronome::default());
        let now = Instant::now();

        scheduler.handle_event(ControlEvent::Start, now);
        scheduler.on_timer(now);
        scheduler.handle_event(ControlEvent::Stop, now);

        assert!(!scheduler.timer.is_armed());
        let last = frames.lock().unwrap().last().cloned().unwrap();
        assert!(!last.running);
        assert_eq!(last.active_note(), None);

        // A late timer wake-up does nothing
        let published = frames.lock().unwrap().len();
        scheduler.on_timer(now + Duration::from_secs(1));
        assert_eq!(frames.lock().unwrap().len(), published);
    }

    #[test]
    fn test_start_while_running_restarts_measure() {
        let (mut scheduler, _frames, _dispatcher) = manual_scheduler(Metronome::default());
        let start = Instant::now();

        scheduler.handle_event(ControlEvent::Start, start);
        scheduler.on_timer(start);
        scheduler.on_timer(start + Duration::from_millis(500));
        assert_eq!(scheduler.metronome.state().note_index, Some(1));

        let again = start + Duration::from_millis(700);
        scheduler.handle_event(ControlEvent::Start, again);
        assert!(scheduler.metronome.is_running());
        assert_eq!(scheduler.metronome.state().note_index, None);
        assert_eq!(scheduler.timer.deadline(), Some(again));

        scheduler.on_timer(again);
        assert_eq!(scheduler.metronome.state().note_index, Some(0));
    }

    #[test]
    fn test_toggle() {
        let (mut scheduler, _frames, _dispatcher) = manual_scheduler(Metronome::default());
        let now = Instant::now();

        scheduler.handle_event(ControlEvent::Toggle, now);
        assert!(scheduler.metronome.is_running());
        scheduler.handle_event(ControlEvent::Toggle, now);
        assert!(!scheduler.metronome.is_running());
    }

    #[test]
    fn test_tempo_change_while_running_restarts() {
        let (mut scheduler, _frames, _dispatcher) = manual_scheduler(Metronome::default());
        let start = Instant::now();

        scheduler.handle_event(ControlEvent::Start, start);
        scheduler.on_timer(start);
        let second = start + Duration::from_millis(500);
        scheduler.on_timer(second);
        assert_eq!(scheduler.metronome.state().note_index, Some(1));

        let change = second + Duration::from_millis(100);
        scheduler.handle_event(ControlEvent::SetTempo(60), change);
        assert_eq!(scheduler.metronome.state().note_index, None);
        assert_eq!(scheduler.timer.deadline(), Some(change));

        scheduler.on_timer(change);
        assert_eq!(scheduler.metronome.state().note_index, Some(0));
        assert_eq!(
            scheduler.timer.deadline(),
            Some(change + Duration::from_secs(1))
        );
    }

    #[test]
    fn test_settings_change_while_stopped_does_not_start() {
        let (mut scheduler, frames, _dispatcher) = manual_scheduler(Metronome::default());
        let now = Instant::now();

        scheduler.handle_event(ControlEvent::SetSubdivision(2), now);
        scheduler.handle_event(ControlEvent::SetTimeSignature(TimeSignature::new(6, 8)), now);

        assert!(!scheduler.timer.is_armed());
        let last = frames.lock().unwrap().last().cloned().unwrap();
        assert!(!last.running);
        assert_eq!(last.subdivision, Subdivision::Two);
        assert_eq!(last.subdivision_index, 1);
        assert_eq!(last.notes.len(), 12);
    }

    #[test]
    fn test_invalid_time_signature_is_ignored() {
        let (mut scheduler, _frames, _dispatcher) = manual_scheduler(Metronome::default());
        scheduler.handle_event(
            ControlEvent::SetTimeSignature(TimeSignature::new(4, 3)),
            Instant::now(),
        );
        assert_eq!(
            scheduler.metronome.state().time_signature,
            TimeSignature::COMMON_TIME
        );
    }

    #[test]
    fn test_zero_tempo_is_clamped() {
        let (mut scheduler, _frames, _dispatcher) = manual_scheduler(Metronome::default());
        scheduler.handle_event(ControlEvent::SetTempo(0), Instant::now());
        assert_eq!(scheduler.metronome.state().tempo.bpm(), Tempo::MIN_BPM);
    }

    #[test]
    fn test_spawned_scheduler_shuts_down() {
        let dispatcher = SoundDispatcher::spawn(NullPlayer).unwrap();
        let handle = TempoScheduler::spawn(
            Metronome::default(),
            sounds(),
            dispatcher.queue().unwrap(),
            RecordingObserver::default(),
        )
        .unwrap();

        handle.send(ControlEvent::Start).unwrap();
        thread::sleep(Duration::from_millis(20));
        assert!(handle.is_running());
        handle.shutdown();
        dispatcher.shutdown();
    }
}
