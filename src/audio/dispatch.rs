// Sound dispatch - Plays sound requests on a dedicated worker thread
// so the scheduler never waits on the audio layer

use crate::audio::sound_bank::SoundId;
use crate::error::{MetronomeError, MetronomeResult};
use crossbeam::channel::{Receiver, Sender};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

/// A sound to play at a given volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundRequest {
    pub sound_id: SoundId,
    pub volume: f32,
}

impl SoundRequest {
    pub fn new(sound_id: SoundId, volume: f32) -> Self {
        Self {
            sound_id,
            volume: volume.clamp(0.0, 1.0),
        }
    }
}

/// Something that can play a sound request synchronously
pub trait SoundPlayer: Send {
    fn play(&mut self, request: SoundRequest);
}

/// Player used when no output device is available: requests go nowhere
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentPlayer;

impl SoundPlayer for SilentPlayer {
    fn play(&mut self, request: SoundRequest) {
        log::debug!("Dropping {:?}: no audio output", request);
    }
}

/// Producer side of the dispatch queue. Cheap to clone, never blocks.
#[derive(Debug, Clone)]
pub struct SoundQueue {
    tx: Sender<SoundRequest>,
}

impl SoundQueue {
    /// Enqueue a request; silently ignored once the worker is gone
    pub fn enqueue(&self, request: SoundRequest) {
        if self.tx.send(request).is_err() {
            log::debug!("Sound worker stopped, {:?} discarded", request);
        }
    }
}

/// Handle to the sound worker thread
pub struct SoundDispatcher {
    queue: Option<SoundQueue>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl SoundDispatcher {
    /// Spawn the worker; it plays requests one at a time, in enqueue order
    pub fn spawn<P>(player: P) -> MetronomeResult<Self>
    where
        P: SoundPlayer + 'static,
    {
        let (tx, rx) = crossbeam::channel::unbounded();
        let running = Arc::new(AtomicBool::new(true));
        let worker_running = Arc::clone(&running);

        let worker = thread::Builder::new()
            .name("sound-dispatch".into())
            .spawn(move || run_worker(rx, player, worker_running))
            .map_err(|source| MetronomeError::Spawn {
                name: "sound-dispatch",
                source,
            })?;

        Ok(Self {
            queue: Some(SoundQueue { tx }),
            running,
            worker: Some(worker),
        })
    }

    /// A producer handle for the scheduler
    pub fn queue(&self) -> Option<SoundQueue> {
        self.queue.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Ask the worker to stop after the request it is handling.
    /// A worker blocked on an empty queue plays the next request it receives,
    /// then exits; with no further request it waits until the queue is torn down.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Stop, disconnect the queue and wait for the worker to exit.
    /// Every [`SoundQueue`] clone must be dropped first, otherwise an idle
    /// worker stays blocked. Requests still queued are discarded.
    pub fn shutdown(mut self) {
        self.stop();
        self.queue = None;
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            log::warn!("Sound dispatch worker panicked");
        }
    }
}

impl Drop for SoundDispatcher {
    /// Detaches the worker; it exits on its own once the queue disconnects
    fn drop(&mut self) {
        self.stop();
        self.queue = None;
    }
}

fn run_worker<P: SoundPlayer>(rx: Receiver<SoundRequest>, mut player: P, running: Arc<AtomicBool>) {
    log::debug!("Sound dispatch worker started");
    while running.load(Ordering::Acquire) {
        match rx.recv() {
            // A request already taken is always played; the flag is checked before the next one
            Ok(request) => player.play(request),
            Err(_) => break,
        }
    }
    log::debug!("Sound dispatch worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct RecordingPlayer {
        played: Arc<Mutex<Vec<SoundRequest>>>,
    }

    impl SoundPlayer for RecordingPlayer {
        fn play(&mut self, request: SoundRequest) {
            self.played.lock().unwrap().push(request);
        }
    }

    fn wait_for(played: &Arc<Mutex<Vec<SoundRequest>>>, count: usize) {
        for _ in 0..200 {
            if played.lock().unwrap().len() >= count {
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_requests_play_in_enqueue_order() {
        let player = RecordingPlayer::default();
        let played = Arc::clone(&player.played);
        let dispatcher = SoundDispatcher::spawn(player).unwrap();
        let queue = dispatcher.queue().unwrap();

        for i in 0..50 {
            queue.enqueue(SoundRequest::new(SoundId(i), 0.5));
        }
        wait_for(&played, 50);

        let ids: Vec<u32> = played.lock().unwrap().iter().map(|r| r.sound_id.0).collect();
        assert_eq!(ids, (0..50).collect::<Vec<_>>());

        drop(queue);
        dispatcher.shutdown();
    }

    #[test]
    fn test_shutdown_joins_worker() {
        let dispatcher = SoundDispatcher::spawn(SilentPlayer).unwrap();
        assert!(dispatcher.is_running());
        dispatcher.shutdown();
    }

    #[test]
    fn test_enqueue_after_shutdown_is_ignored() {
        let dispatcher = SoundDispatcher::spawn(SilentPlayer).unwrap();
        let queue = dispatcher.queue().unwrap();
        dispatcher.stop();
        assert!(!dispatcher.is_running());

        // The worker wakes on this request, plays it and exits
        queue.enqueue(SoundRequest::new(SoundId(0), 1.0));
        drop(dispatcher);
        queue.enqueue(SoundRequest::new(SoundId(1), 1.0));
    }

    #[test]
    fn test_request_taken_after_stop_still_plays() {
        let player = RecordingPlayer::default();
        let played = Arc::clone(&player.played);
        let dispatcher = SoundDispatcher::spawn(player).unwrap();
        let queue = dispatcher.queue().unwrap();

        queue.enqueue(SoundRequest::new(SoundId(0), 1.0));
        wait_for(&played, 1);
        // Let the worker go back to waiting on the queue
        thread::sleep(Duration::from_millis(50));

        dispatcher.stop();
        queue.enqueue(SoundRequest::new(SoundId(1), 1.0));
        wait_for(&played, 2);

        let ids: Vec<u32> = played.lock().unwrap().iter().map(|r| r.sound_id.0).collect();
        assert_eq!(ids, vec![0, 1]);

        // Stopped: later requests are not played
        queue.enqueue(SoundRequest::new(SoundId(2), 1.0));
        thread::sleep(Duration::from_millis(50));
        assert_eq!(played.lock().unwrap().len(), 2);

        drop(queue);
        dispatcher.shutdown();
    }

    #[test]
    fn test_request_volume_is_clamped() {
        assert_eq!(SoundRequest::new(SoundId(0), 1.5).volume, 1.0);
        assert_eq!(SoundRequest::new(SoundId(0), -0.2).volume, 0.0);
    }
}
