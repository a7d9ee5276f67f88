// Main UI App - Single-screen metronome

use crate::audio::parameters::AtomicF32;
use crate::config::MetronomeConfig;
use crate::messaging::channels::ControlSender;
use crate::messaging::command::ControlEvent;
use crate::sequencer::display::{DisplayFrame, NoteHighlight, NoteValue};
use crate::sequencer::timeline::TimeSignature;
use crate::ui::display::SharedDisplay;
use eframe::egui;
use std::time::Instant;

const NOTE_RADIUS: f32 = 14.0;
const NOTE_SPACING: f32 = 44.0;
const ROW_HEIGHT: f32 = 110.0;

const BEAT_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 140, 40);
const SUBDIVISION_COLOR: egui::Color32 = egui::Color32::from_rgb(120, 170, 255);
const INACTIVE_COLOR: egui::Color32 = egui::Color32::from_gray(90);
const SPARK_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 230, 120);

pub struct MetronomeApp {
    control_tx: ControlSender,
    display: SharedDisplay,
    volume_atomic: AtomicF32,
    volume_ui: f32,
    bpm_ui: u32,
    min_bpm: u32,
    max_bpm: u32,
    has_audio: bool,
}

impl MetronomeApp {
    /// The slider starts at the configured tempo; the scheduler may not
    /// have published its first frame yet.
    pub fn new(
        control_tx: ControlSender,
        display: SharedDisplay,
        volume_atomic: AtomicF32,
        config: &MetronomeConfig,
        has_audio: bool,
    ) -> Self {
        let volume_ui = volume_atomic.get();
        let (min_bpm, max_bpm) = (config.min_bpm, config.max_bpm);
        let bpm_ui = config.initial_bpm.max(min_bpm).min(max_bpm);

        Self {
            control_tx,
            display,
            volume_atomic,
            volume_ui,
            bpm_ui,
            min_bpm,
            max_bpm,
            has_audio,
        }
    }

    fn send(&self, event: ControlEvent) {
        if self.control_tx.send(event).is_err() {
            log::warn!("Scheduler is gone, {:?} ignored", event);
        }
    }

    fn draw_controls(&mut self, ui: &mut egui::Ui, frame: &DisplayFrame) {
        ui.horizontal(|ui| {
            ui.label("Tempo:");
            let slider = egui::Slider::new(&mut self.bpm_ui, self.min_bpm..=self.max_bpm)
                .suffix(" BPM");
            if ui.add(slider).changed() {
                self.send(ControlEvent::SetTempo(self.bpm_ui));
            }
        });

        ui.horizontal(|ui| {
            ui.label("Time signature:");
            let mut selected = frame.time_signature;
            egui::ComboBox::from_id_salt("time_signature_selector")
                .selected_text(selected.to_string())
                .show_ui(ui, |ui| {
                    for preset in TimeSignature::PRESETS {
                        ui.selectable_value(&mut selected, preset, preset.to_string());
                    }
                });
            if selected != frame.time_signature {
                self.send(ControlEvent::SetTimeSignature(selected));
            }

            ui.add_space(20.0);

            ui.label("Subdivision:");
            let mut index = frame.subdivision_index;
            egui::ComboBox::from_id_salt("subdivision_selector")
                .selected_text(frame.subdivision.to_string())
                .show_ui(ui, |ui| {
                    for (i, option) in frame.subdivision_options().iter().enumerate() {
                        ui.selectable_value(&mut index, i, option.to_string());
                    }
                });
            if index != frame.subdivision_index {
                self.send(ControlEvent::SetSubdivision(index));
            }
            if let Some(value) = frame.note_value {
                ui.label(egui::RichText::new(value.symbol()).size(22.0));
            }
        });

        ui.horizontal(|ui| {
            ui.label("Volume:");
            if ui
                .add(egui::Slider::new(&mut self.volume_ui, 0.0..=1.0))
                .changed()
            {
                self.volume_atomic.set(self.volume_ui);
            }
            if !self.has_audio {
                ui.colored_label(egui::Color32::from_rgb(255, 165, 0), "No audio output");
            }
        });
    }

    fn draw_notes(&self, ui: &mut egui::Ui, frame: &DisplayFrame) {
        let width = ui.available_width();
        let (response, painter) =
            ui.allocate_painter(egui::vec2(width, ROW_HEIGHT), egui::Sense::hover());
        let rect = response.rect;

        let count = frame.notes.len().max(1);
        // Shrink the spacing when the row would not fit
        let spacing = NOTE_SPACING.min(rect.width() / count as f32);
        let radius = NOTE_RADIUS.min(spacing * 0.35);
        let row_width = spacing * count as f32;
        let left = rect.center().x - row_width / 2.0;
        let y = rect.center().y + 10.0;

        for (i, note) in frame.notes.iter().enumerate() {
            let color = match note {
                NoteHighlight::Beat => BEAT_COLOR,
                NoteHighlight::Subdivision => SUBDIVISION_COLOR,
                NoteHighlight::Inactive => INACTIVE_COLOR,
            };
            let center = egui::pos2(left + spacing * (i as f32 + 0.5), y);
            draw_note(&painter, center, radius, frame.note_value, color);
        }

        if let Some(progress) = frame.spark.progress(Instant::now()) {
            let x = left + row_width * progress;
            let top = rect.top() + 6.0;
            painter.circle_filled(egui::pos2(x, top), 5.0, SPARK_COLOR);
            painter.line_segment(
                [egui::pos2(x, top), egui::pos2(x, rect.bottom() - 4.0)],
                egui::Stroke::new(1.0, SPARK_COLOR.gamma_multiply(0.4)),
            );
        }
    }
}

/// Note head with a stem and one flag per subdivision level
fn draw_note(
    painter: &egui::Painter,
    center: egui::Pos2,
    radius: f32,
    value: Option<NoteValue>,
    color: egui::Color32,
) {
    painter.circle_filled(center, radius, color);

    let Some(value) = value else { return };
    let stroke = egui::Stroke::new(2.0, color);
    let stem_x = center.x + radius * 0.9;
    let stem_top = center.y - radius * 3.2;
    painter.line_segment([egui::pos2(stem_x, center.y), egui::pos2(stem_x, stem_top)], stroke);

    for flag in 0..value.flags() {
        let y = stem_top + flag as f32 * radius * 0.6;
        painter.line_segment(
            [egui::pos2(stem_x, y), egui::pos2(stem_x + radius * 0.8, y + radius * 0.8)],
            stroke,
        );
    }
}

impl eframe::App for MetronomeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let frame = self.display.latest();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Metronome");
            ui.separator();

            self.draw_controls(ui, &frame);

            ui.add_space(10.0);
            self.draw_notes(ui, &frame);
            ui.add_space(10.0);

            let label = if frame.running { "Stop" } else { "Start" };
            let button = egui::Button::new(label).min_size(egui::vec2(120.0, 40.0));
            if ui.add(button).clicked() {
                self.send(ControlEvent::Toggle);
            }
        });

        // Keep the spark moving between scheduler frames
        if frame.running {
            ctx.request_repaint();
        }
    }
}
