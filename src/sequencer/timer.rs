// Tick timer - Cancellable delayed task for the scheduler loop
// Holds at most one pending deadline: scheduling again replaces it, never stacks

use crossbeam::channel::{self, Receiver};
use std::time::{Duration, Instant};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickTimer {
    deadline: Option<Instant>,
}

impl TickTimer {
    pub fn new() -> Self {
        Self { deadline: None }
    }

    /// Arm the timer `delay` from `now`, replacing any pending tick
    pub fn schedule(&mut self, now: Instant, delay: Duration) {
        self.deadline = Some(now + delay);
    }

    /// Arm the timer `delay` after the tick that just fired.
    /// Anchoring on the previous deadline keeps long runs free of drift;
    /// if that moment has already passed, fall back to `now + delay`.
    pub fn schedule_after(&mut self, previous: Instant, now: Instant, delay: Duration) {
        let next = previous + delay;
        self.deadline = Some(if next < now { now + delay } else { next });
    }

    /// Drop the pending tick, if any
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Disarm and return the deadline that was pending
    pub fn fire(&mut self) -> Option<Instant> {
        self.deadline.take()
    }

    /// Channel that delivers once the deadline is reached (never when disarmed).
    /// Meant to be re-created on every loop iteration.
    pub fn wait(&self) -> Receiver<Instant> {
        match self.deadline {
            Some(deadline) => channel::at(deadline),
            None => channel::never(),
        }
    }
}
