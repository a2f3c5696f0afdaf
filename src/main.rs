use clap::Parser;
use mtcsyncrs::{
    cli::{Args, Command},
    engine::{Mode, SyncEngine},
    event_log::EventLog,
    generator::MtcGenerator,
    midi::{list_input_ports, list_output_ports, MidirEngine},
    timecode::{FrameRate, Timecode},
    ui::create_status_spinner,
};
use mtcsyncrs::logging;
use std::path::Path;
use std::time::Duration;

fn main() {
    initialize_logging();
    let args = Args::parse();

    match args.command {
        Command::ListPorts => list_available_ports(),
        Command::Follow {
            port,
            mtc,
            record,
            config,
        } => run_follow(port, mtc, record, &config),
        Command::Generate {
            port,
            fps,
            start,
            duration,
        } => run_generate(port, &fps, &start, duration),
    }
}

fn initialize_logging() {
    logging::init_logger().expect("Logger initialization failed");
    log::info!("Application starting");
}

fn list_available_ports() {
    println!("Available INPUT ports");
    println!("---------------------");
    for port in list_input_ports() {
        println!("  - {}", port);
    }
    println!("Available OUTPUT ports");
    println!("----------------------");
    for port in list_output_ports() {
        println!("  - {}", port);
    }
}

/// Missing required port names: list what is available and exit non-zero.
fn require_port(port: Option<String>) -> String {
    match port {
        Some(name) => name,
        None => {
            eprintln!("You must specify a port name.");
            list_available_ports();
            std::process::exit(1);
        }
    }
}

fn fatal(message: &str) -> ! {
    log::error!("{}", message);
    eprintln!("{}", message);
    std::process::exit(1);
}

fn run_follow(port: Option<String>, mtc: Option<String>, record: bool, config: &Path) {
    let midi_port = require_port(port);
    let mtc_port = mtc.unwrap_or_else(|| midi_port.clone());

    if record && config.exists() {
        let overwrite = dialoguer::Confirm::new()
            .with_prompt(format!("FILE EXISTS: {}\nOverwrite?", config.display()))
            .default(false)
            .interact()
            .unwrap_or(false);
        if !overwrite {
            println!("Aborted");
            return;
        }
    }
    if !record && !config.exists() {
        fatal("Configuration file not found. Aborting.");
    }

    let log = if record {
        EventLog::new()
    } else {
        match EventLog::load(config, FrameRate::Fps24) {
            Ok(log) => log,
            Err(e) => fatal(&format!("Error reading {}: {}", config.display(), e)),
        }
    };
    if !record {
        if log.is_empty() {
            println!("No events found in configuration file: {}", config.display());
            return;
        }
        let first = &log.events()[0].timecode;
        let last = &log.events()[log.len() - 1].timecode;
        println!(
            "Found {} MIDI events in range {} - {}",
            log.len(),
            first,
            last
        );
    }

    let verb = if record { "record" } else { "playback" };
    println!("MTC -> MIDI ({})", verb);
    println!("  MTC on [{}]", mtc_port);
    println!("  MIDI on [{}]", midi_port);
    println!("  config file: [{}]", config.display());
    println!("\nSTOP with ^C (Ctrl+C)\n");

    let mtc_in = match MidirEngine::open_input(&mtc_port) {
        Ok(engine) => engine,
        Err(e) => fatal(&format!("Error opening MTC port: {}", e)),
    };

    let mode = if record { Mode::Record } else { Mode::Playback };
    let mut engine = SyncEngine::new(mtc_in, mode, log, config);

    // In playback the event port is always an output. In record a second
    // input is only needed when it differs from the MTC port.
    if !record {
        match MidirEngine::open_output(&midi_port) {
            Ok(out) => engine = engine.with_midi(out),
            Err(e) => fatal(&format!("Error opening MIDI output: {}", e)),
        }
    } else if midi_port != mtc_port {
        match MidirEngine::open_input(&midi_port) {
            Ok(input) => engine = engine.with_midi(input),
            Err(e) => fatal(&format!("Error opening MIDI input: {}", e)),
        }
    }

    let spinner = create_status_spinner();
    engine = engine.with_status(spinner);

    install_ctrlc_handler(engine.shutdown_flag());

    if let Err(e) = engine.run() {
        fatal(&format!("Engine error: {}", e));
    }
}

fn run_generate(port: Option<String>, fps: &str, start: &str, duration: f64) {
    let port = require_port(port);

    let rate: FrameRate = match fps.parse() {
        Ok(rate) => rate,
        Err(e) => fatal(&format!("{}", e)),
    };
    let start = match Timecode::parse(start, rate) {
        Ok(tc) => tc,
        Err(e) => fatal(&format!("{}", e)),
    };

    let out = match MidirEngine::open_output(&port) {
        Ok(engine) => engine,
        Err(e) => fatal(&format!("Error opening MIDI output: {}", e)),
    };

    let mut generator = MtcGenerator::new(out, start);
    install_ctrlc_handler(generator.shutdown_flag());

    println!("Generating MTC on [{}] from {} at {}", port, start, rate);
    if let Err(e) = generator.run(Duration::from_secs_f64(duration)) {
        fatal(&format!("Generator error: {}", e));
    }
}

fn install_ctrlc_handler(flag: std::sync::Arc<std::sync::atomic::AtomicBool>) {
    if let Err(e) = ctrlc::set_handler(move || {
        flag.store(true, std::sync::atomic::Ordering::SeqCst);
    }) {
        log::error!("Failed to install Ctrl+C handler: {}", e);
    }
}
