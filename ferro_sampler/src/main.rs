//! # Ferro Sampler
//!
//! Runs the sampling-and-dispatch pipeline against the simulated board and
//! reports per-axis health. The control callbacks hold every power stage at
//! neutral duty, which exercises the full interrupt timing without a
//! control law attached.

use clap::Parser;
use ferro_common::config::{ConfigLoader, LogLevel, SamplerConfig};
use ferro_common::consts::{AXIS_COUNT, DEFAULT_CONFIG_PATH};
use ferro_common::hal::driver::CarrierTimer;
use ferro_common::hal::types::TimerId;
use ferro_hal::SimBoard;
use ferro_hal::drivers::simulation::create_board;
use ferro_sampler::config::load_config_or_default;
use ferro_sampler::rt::ThreadPlacement;
use ferro_sampler::{ControlHooks, InterruptRunner, PhaseCurrents, SamplingHook};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Events fired between two shutdown-flag checks.
const CHUNK_HALF_CYCLES: u64 = 1000;

/// Ferro Sampler: simulated interrupt pipeline
#[derive(Parser, Debug)]
#[command(name = "ferro_sampler")]
#[command(version)]
#[command(about = "Phase-current sampling and control dispatch on a simulated board")]
struct Args {
    /// Path to the sampler configuration TOML.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Number of carrier half-cycles to simulate.
    #[arg(long, default_value_t = 20_000)]
    half_cycles: u64,

    /// CPU core to pin the runner thread to (needs the `rt` feature).
    #[arg(long)]
    cpu_core: Option<usize>,

    /// SCHED_FIFO priority 1..=99 (needs the `rt` feature).
    #[arg(long)]
    rt_priority: Option<i32>,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

// ─── Callbacks ──────────────────────────────────────────────────────

/// Counts trough sampling calls.
#[derive(Debug, Default)]
struct TroughCounter {
    troughs: u64,
}

impl SamplingHook for TroughCounter {
    fn sampling(&mut self) {
        self.troughs += 1;
    }
}

/// Keeps every stage at 50% duty and remembers the last readings.
struct NeutralController<'b> {
    board: &'b SimBoard,
    neutral: u16,
    timers: [TimerId; AXIS_COUNT],
    periods: u64,
    last_current: [Option<PhaseCurrents>; AXIS_COUNT],
}

impl<'b> NeutralController<'b> {
    fn new(board: &'b SimBoard, config: &SamplerConfig) -> Self {
        Self {
            board,
            neutral: config.timing.neutral_compare(),
            timers: config.axes.map(|a| a.timer),
            periods: 0,
            last_current: [None; AXIS_COUNT],
        }
    }
}

impl ControlHooks for NeutralController<'_> {
    fn current_measured(&mut self, axis: usize, _timestamp: u32, current: Option<PhaseCurrents>) {
        self.last_current[axis] = current;
    }

    fn control_loop(&mut self, _timestamp: u32) {
        self.periods += 1;
    }

    fn dc_calibration(&mut self, _axis: usize, _timestamp: u32, _current: Option<PhaseCurrents>) {}

    fn pwm_update(&mut self, axis: usize, _timestamp: u32) {
        self.board.set_compare(self.timers[axis], [self.neutral; 3]);
    }
}

// ─── Entry ──────────────────────────────────────────────────────────

fn main() {
    let args = Args::parse();
    let log_level = SamplerConfig::load(&args.config)
        .map(|c| c.log_level)
        .unwrap_or_default();
    setup_tracing(&args, log_level);

    info!("Ferro Sampler v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Ferro Sampler shutdown complete");
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config_or_default(&args.config)?;

    ThreadPlacement {
        cpu_core: args.cpu_core,
        fifo_priority: args.rt_priority,
    }
    .apply()?;

    let board = create_board(&config);
    let controller = NeutralController::new(&board, &config);
    let mut runner = InterruptRunner::new(&board, &config, TroughCounter::default(), controller)?;
    runner.shared().rearm_all();
    runner.shared().task_timer.arm();

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    let mut remaining = args.half_cycles;
    while remaining > 0 && running.load(Ordering::SeqCst) {
        let chunk = remaining.min(CHUNK_HALF_CYCLES);
        runner.run_half_cycles(chunk);
        remaining -= chunk;
    }

    report(&runner);
    Ok(())
}

fn report(runner: &InterruptRunner<'_, SimBoard, TroughCounter, NeutralController<'_>>) {
    let stats = runner.stats();
    let telemetry = runner.telemetry();
    info!(
        events = runner.events_fired(),
        troughs = runner.sampling().troughs,
        periods = runner.hooks().periods,
        timestamp = runner.shared().clock.now(),
        "Run complete"
    );
    info!(
        avg_ticks = stats.avg_ticks(),
        max_ticks = stats.max_ticks,
        max_latency = stats.max_latency_ticks,
        deadline_misses = stats.deadline_misses,
        bad_windows = stats.bad_windows,
        missed_updates = stats.missed_updates,
        "Dispatch statistics"
    );
    info!(
        vbus = telemetry.vbus,
        brake_duty = telemetry.brake_duty,
        calib_polls_max = telemetry.calibration_wait_polls_max,
        calib_timeouts = telemetry.calibration_wait_timeouts,
        "Telemetry"
    );
    if runner.shared().task_timer.is_armed() {
        warn!("Task timer capture did not complete");
    } else {
        info!(
            control_loop = telemetry.task_times.control_loop,
            dc_calib_wait = telemetry.task_times.dc_calib_wait,
            pwm_update = telemetry.task_times.pwm_update,
            "Task times"
        );
    }
    for axis in &runner.shared().axes {
        let i = axis.index();
        info!(
            axis = i,
            armed = axis.is_armed(),
            error = ?axis.error(),
            current = ?runner.hooks().last_current[i],
            fet_temp = telemetry.aux.fet_temperature[i],
            "Axis summary"
        );
    }
}

/// Setup tracing subscriber based on CLI arguments and the configured level.
fn setup_tracing(args: &Args, level: LogLevel) {
    let directive = if args.verbose {
        LogLevel::Debug.as_directive()
    } else {
        level.as_directive()
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

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
