use clap::Parser;
use midiclockrs::{
    cli::{format_port_listing, validate_device, Args},
    config::Settings,
    console::{run_console, LineSource, PromptLines, ReaderLines},
    control::run_listener,
    create_shared_state, create_spawner,
    logging,
    midi::{list_ports, MidirInput, MidirOutput, PulseScheduler},
    warmup::run_warmup,
    CancellationToken, ControlInterpreter, SharedState, Spawner,
};
use std::io::{self, IsTerminal};
use std::process;
use std::sync::Arc;
use std::thread::JoinHandle;

/// Capacity of the queue between the MIDI input callback and the listener.
const CONTROL_QUEUE: usize = 256;

fn main() {
    initialize_logging();
    let args = Args::parse();

    if args.list {
        list_available_ports();
        return;
    }

    let settings = load_settings(&args);
    let shared_state = create_shared_state(settings.bpm);
    let interpreter = Arc::new(ControlInterpreter::new(settings.binding(), shared_state.clone()));
    let cancel = CancellationToken::new();
    let spawner = create_spawner();

    let output = MidirOutput::open(&args.port_name).unwrap_or_else(|e| {
        fail(&format!("Error creating MIDI output port '{}': {}", args.port_name, e))
    });
    println!("Created virtual MIDI port: {}", output.port_name());

    let mut handles = Vec::new();
    let input = args
        .input
        .as_deref()
        .map(|name| start_listener(name, &spawner, &interpreter, &cancel, &mut handles));

    run_warmup(settings.warmup(), &cancel);
    handles.push(start_pulse_scheduler(output, &spawner, shared_state, &cancel));

    let mut lines: Box<dyn LineSource> = if io::stdin().is_terminal() {
        Box::new(PromptLines::default())
    } else {
        Box::new(ReaderLines::new(io::stdin().lock()))
    };
    run_console(&mut lines, &interpreter, &cancel);

    cancel.cancel();
    for handle in handles {
        if handle.join().is_err() {
            log::error!("A worker thread panicked during shutdown");
        }
    }
    if let Some(input) = input {
        input.close();
    }
    log::info!("Application exiting");
}

fn initialize_logging() {
    if let Err(e) = logging::init_logger() {
        logging::init_stderr_logger();
        log::warn!("File logging unavailable ({}), logging to stderr", e);
    }
    log::info!("Application starting");
}

fn fail(message: &str) -> ! {
    log::error!("{}", message);
    eprintln!("{}", message);
    process::exit(1);
}

fn list_available_ports() {
    match list_ports() {
        Ok(ports) => print!("{}", format_port_listing(&ports.inputs, &ports.outputs)),
        Err(e) => fail(&format!("Error listing MIDI ports: {}", e)),
    }
}

fn load_settings(args: &Args) -> Settings {
    let mut settings = Settings::load(&args.config).unwrap_or_else(|e| {
        log::warn!("{}", e);
        println!("Error loading config: {}", e);
        Settings::default()
    });
    settings.apply_overrides(args);

    if let Err(e) = settings.validate() {
        fail(&format!("Error: {}", e));
    }

    if !args.no_save {
        if let Err(e) = settings.save(&args.config) {
            log::warn!("{}", e);
            eprintln!("Error saving config: {}", e);
        }
    }
    settings
}

fn start_listener(
    device_name: &str,
    spawner: &impl Spawner,
    interpreter: &Arc<ControlInterpreter>,
    cancel: &CancellationToken,
    handles: &mut Vec<JoinHandle<()>>,
) -> MidirInput {
    let available = list_ports().map(|p| p.inputs).unwrap_or_default();
    if let Err(error_msg) = validate_device(device_name, &available) {
        fail(&error_msg);
    }

    let (tx, rx) = crossbeam::channel::bounded(CONTROL_QUEUE);
    let input = MidirInput::open(device_name, tx)
        .unwrap_or_else(|e| fail(&format!("Error opening MIDI input: {}", e)));
    println!("Opened input port: {}", input.port_name());

    let interpreter = interpreter.clone();
    let cancel = cancel.clone();
    let handle = spawner
        .spawn("midi-listener", move || run_listener(&interpreter, &rx, &cancel))
        .unwrap_or_else(|e| fail(&format!("Error starting MIDI listener: {}", e)));
    handles.push(handle);
    input
}

fn start_pulse_scheduler(
    output: MidirOutput,
    spawner: &impl Spawner,
    shared_state: SharedState,
    cancel: &CancellationToken,
) -> JoinHandle<()> {
    let cancel = cancel.clone();
    spawner
        .spawn("pulse-scheduler", move || {
            let mut scheduler = PulseScheduler::new(shared_state, output);
            scheduler.run(&cancel);
        })
        .unwrap_or_else(|e| fail(&format!("Error starting pulse scheduler: {}", e)))
}
