//! # Cryo Control Unit
//!
//! Runs the control core against the built-in chiller plant model.
//!
//! Configuration comes from a TOML file (defaults when it is missing).
//! Text commands are read from stdin, one per line, and answered on
//! stdout. Ctrl-C stops the loop.

use std::io::BufRead;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use cryo_common::config::{ConfigLoader, LogLevel};
use cryo_common::consts::DEFAULT_CONFIG_PATH;
use cryo_common::control_unit::config::ControlConfiguration;
use cryo_common::control_unit::status::{DisplayRegisters, StatusSnapshot};
use cryo_control_unit::command::{CommandContext, handle_line};
use cryo_control_unit::cycle::{ActuatorCommand, ControlCore, PassIo};
use cryo_control_unit::io::{ConfigStore, StatusSink, TomlConfigStore, TracingEventLog};
use cryo_control_unit::sim::SimulatedChiller;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Cryo Control Unit: chiller return-water regulation
#[derive(Parser, Debug)]
#[command(name = "cryo_control_unit")]
#[command(version)]
#[command(about = "Return-water temperature control with safety interlocks")]
struct Args {
    /// Path to the control configuration TOML.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Stop after this many wall-clock seconds (default: run until Ctrl-C).
    #[arg(long)]
    duration_s: Option<u64>,

    /// Main loop period [ms].
    #[arg(long, default_value_t = 100)]
    tick_ms: u64,

    /// Simulated seconds per wall-clock second.
    #[arg(long, default_value_t = 1)]
    speed: u64,

    /// Plant ambient temperature [°C].
    #[arg(long, default_value_t = 35.0)]
    ambient: f64,

    /// Initial loop return-water temperature [°C].
    #[arg(long, default_value_t = 14.0)]
    return_water: f64,

    /// Write the running configuration back on exit.
    #[arg(long)]
    save_on_exit: bool,

    /// Enable verbose logging (at least DEBUG, whatever the config says).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    // Read before the subscriber exists; load problems are reported later by the store.
    let config_level = ControlConfiguration::load(&args.config)
        .map(|c| c.log_level)
        .unwrap_or_default();
    setup_tracing(&args, config_level);

    info!("Cryo Control Unit v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Cryo Control Unit shutdown complete");
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    if args.tick_ms == 0 || args.speed == 0 {
        return Err("tick-ms and speed must be > 0".into());
    }

    let mut store = TomlConfigStore::new(&args.config);
    let mut core = ControlCore::from_store(&mut store, 0)?;
    info!(
        "Config OK: setpoint={:.1}°C, algorithm={}, compressors={}",
        core.config().setpoint,
        core.config().algorithm.name(),
        core.config().compressor_count,
    );

    let mut plant = SimulatedChiller::new(
        args.return_water,
        args.ambient,
        core.config().compressor_count,
    );

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    let commands = spawn_command_reader();
    let mut events = TracingEventLog;
    let mut status = LogStatus;
    let tick = Duration::from_millis(args.tick_ms);
    let step_s = tick.as_secs_f64() * args.speed as f64;
    let limit = args.duration_s.map(Duration::from_secs);
    let start = Instant::now();
    let mut last = ActuatorCommand::default();

    info!("Entering control loop (tick={} ms, speed={}x)", args.tick_ms, args.speed);
    while running.load(Ordering::SeqCst) {
        let elapsed = start.elapsed();
        if limit.is_some_and(|l| elapsed >= l) {
            break;
        }
        let now = (elapsed.as_millis() as u64).saturating_mul(args.speed);

        plant.step(&last, step_s);
        let mut io = PassIo {
            sensors: &mut plant,
            events: &mut events,
            status: &mut status,
        };
        last = core.run_pass(&mut io, now);

        while let Ok(line) = commands.try_recv() {
            let mut ctx = CommandContext {
                events: &mut events,
                store: &mut store,
            };
            match handle_line(&mut core, &line, &mut ctx, now) {
                Ok(reply) => println!("{reply}"),
                Err(e) => {
                    warn!("command '{}' rejected: {e}", line.trim());
                    println!("error: {e}");
                }
            }
        }

        thread::sleep(tick);
    }

    let stats = core.stats();
    info!(
        "Loop stopped after {} passes ({} control updates, max pass {} ns)",
        stats.passes, stats.control_updates, stats.max_pass_ns
    );

    if args.save_on_exit && !store.save(core.config()) {
        warn!("Configuration was not saved");
    }
    Ok(())
}

/// Forward stdin lines to the control loop.
fn spawn_command_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Status display stand-in: one log line per status push.
struct LogStatus;

impl StatusSink for LogStatus {
    fn push(&mut self, s: &StatusSnapshot, _registers: &DisplayRegisters) {
        info!(
            return_water = ?s.return_water,
            setpoint = s.effective_setpoint,
            output = s.output,
            efficiency = s.efficiency,
            safety = ?s.safety_state,
            mode = ?s.mode,
            "status"
        );
    }
}

/// Setup tracing subscriber. `RUST_LOG` wins; otherwise the configured
/// level, raised by `--verbose`.
fn setup_tracing(args: &Args, config_level: LogLevel) {
    let directive = config_level.with_verbose(args.verbose).as_directive();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
