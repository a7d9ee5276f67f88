// Shared display - Latest frame from the scheduler, read by the egui app

use crate::sequencer::display::DisplayFrame;
use crate::sequencer::scheduler::FrameObserver;
use eframe::egui;
use std::sync::{Arc, Mutex, OnceLock};

/// Observer that keeps the most recent frame and wakes the UI
#[derive(Clone, Default)]
pub struct SharedDisplay {
    frame: Arc<Mutex<DisplayFrame>>,
    ctx: Arc<OnceLock<egui::Context>>,
}

impl SharedDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a repaint of `ctx` whenever a frame arrives
    pub fn attach(&self, ctx: egui::Context) {
        let _ = self.ctx.set(ctx);
    }

    pub fn latest(&self) -> DisplayFrame {
        match self.frame.lock() {
            Ok(frame) => frame.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl FrameObserver for SharedDisplay {
    fn on_frame(&mut self, frame: &DisplayFrame) {
        match self.frame.lock() {
            Ok(mut latest) => latest.clone_from(frame),
            Err(poisoned) => poisoned.into_inner().clone_from(frame),
        }
        if let Some(ctx) = self.ctx.get() {
            ctx.request_repaint();
        }
    }
}
