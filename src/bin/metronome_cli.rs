//! Headless metronome
//!
//! Plays a number of measures through the default output device and prints
//! the note row of every frame.
//!
//! Usage: metronome_cli [--bpm N] [--signature B/T] [--subdivision S]
//!                      [--measures M] [--config PATH]

use beatty_metronome::{
    ControlEvent, DisplayFrame, FrameObserver, MetronomeConfig, MetronomeRuntime, NoteValue,
    Subdivision, Tempo,
};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

#[derive(Debug, Default)]
struct CliArgs {
    bpm: Option<u32>,
    signature: Option<String>,
    subdivision: Option<u32>,
    measures: u32,
    config: Option<PathBuf>,
}

fn parse_args() -> Result<CliArgs, String> {
    let mut parsed = CliArgs {
        measures: 4,
        ..Default::default()
    };
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        let mut value = || args.next().ok_or_else(|| format!("missing value for {}", arg));
        match arg.as_str() {
            "--bpm" => parsed.bpm = Some(parse_number(&value()?)?),
            "--signature" => parsed.signature = Some(value()?),
            "--subdivision" => parsed.subdivision = Some(parse_number(&value()?)?),
            "--measures" => parsed.measures = parse_number(&value()?)?,
            "--config" => parsed.config = Some(PathBuf::from(value()?)),
            "-h" | "--help" => return Err(String::new()),
            other => return Err(format!("unknown argument: {}", other)),
        }
    }
    Ok(parsed)
}

fn parse_number(text: &str) -> Result<u32, String> {
    text.parse().map_err(|_| format!("not a number: {}", text))
}

fn print_usage() {
    eprintln!(
        "Usage: metronome_cli [--bpm N] [--signature B/T] [--subdivision S] [--measures M] [--config PATH]"
    );
}

/// Prints one line per highlighted note
struct PrintObserver;

impl FrameObserver for PrintObserver {
    fn on_frame(&mut self, frame: &DisplayFrame) {
        if let Some(index) = frame.active_note() {
            println!("{:>3}  {}", index, frame.note_row());
        }
    }
}

fn apply_args(config: &mut MetronomeConfig, args: &CliArgs) -> Result<(), String> {
    if let Some(bpm) = args.bpm {
        if !(Tempo::MIN_BPM..=Tempo::MAX_BPM).contains(&bpm) {
            return Err(format!(
                "bpm must be between {} and {}",
                Tempo::MIN_BPM,
                Tempo::MAX_BPM
            ));
        }
        config.initial_bpm = bpm;
        config.max_bpm = config.max_bpm.max(bpm);
    }
    if let Some(signature) = &args.signature {
        config.time_signature = signature
            .parse()
            .map_err(|e| format!("bad signature {}: {}", signature, e))?;
    }
    if let Some(count) = args.subdivision {
        let options = Subdivision::options_for(config.time_signature.beat_type);
        config.subdivision_index = options
            .iter()
            .position(|option| option.count() == count)
            .ok_or_else(|| {
                format!(
                    "subdivision {} not available for {}",
                    count, config.time_signature
                )
            })?;
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            if !message.is_empty() {
                eprintln!("{}", message);
            }
            print_usage();
            std::process::exit(2);
        }
    };

    let mut config = MetronomeConfig::load_or_default(args.config.as_deref());
    if let Err(message) = apply_args(&mut config, &args) {
        eprintln!("{}", message);
        std::process::exit(2);
    }
    let config = config.sanitized();

    let tempo = config.initial_tempo();
    let length = tempo.measure_duration(&config.time_signature) * args.measures;
    let subdivision =
        Subdivision::select(config.time_signature.beat_type, config.subdivision_index).1;
    let glyph = NoteValue::for_beat(config.time_signature.beat_type, subdivision)
        .map_or("", NoteValue::symbol);
    println!(
        "{} in {}, subdivision {} {}, {} measure(s)",
        tempo, config.time_signature, subdivision, glyph, args.measures
    );

    let runtime = match MetronomeRuntime::start(&config, PrintObserver) {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start metronome: {}", e);
            std::process::exit(1);
        }
    };
    if !runtime.has_audio() {
        println!("(no audio output, running silently)");
    }

    runtime.send(ControlEvent::Start);
    // Let the last click ring out
    thread::sleep(length + Duration::from_millis(100));
    runtime.send(ControlEvent::Stop);
    runtime.shutdown();
}
