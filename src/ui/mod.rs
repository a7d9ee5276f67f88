// UI module - egui front end

pub mod app;
pub mod display;

pub use app::MetronomeApp;
pub use display::SharedDisplay;
