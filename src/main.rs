use beatty_metronome::ui::{MetronomeApp, SharedDisplay};
use beatty_metronome::{MetronomeConfig, MetronomeRuntime};
use std::path::PathBuf;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    // Optional config path as the only argument
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = MetronomeConfig::load_or_default(config_path.as_deref());

    let display = SharedDisplay::new();
    let runtime = match MetronomeRuntime::start(&config, display.clone()) {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("Failed to start metronome: {}", e);
            std::process::exit(1);
        }
    };

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([520.0, 340.0])
            .with_title("Beatty Metronome"),
        ..Default::default()
    };

    let control_tx = runtime.scheduler().sender();
    let volume = runtime.master_volume().clone();
    let has_audio = runtime.has_audio();

    let result = eframe::run_native(
        "Beatty Metronome",
        native_options,
        Box::new(move |cc| {
            display.attach(cc.egui_ctx.clone());
            Ok(Box::new(MetronomeApp::new(
                control_tx, display, volume, &config, has_audio,
            )))
        }),
    );

    if let Err(e) = result {
        log::error!("UI error: {}", e);
    }

    runtime.shutdown();
}
