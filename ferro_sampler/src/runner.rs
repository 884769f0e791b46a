//! Hosted two-level interrupt runner.
//!
//! Emulates the interrupt controller on a host: carrier update events run
//! the half-cycle handler to completion, a pended dispatch request runs the
//! control dispatch handler, and every `PreemptionPoint` checkpoint inside
//! the dispatch handler services whatever update events became due while
//! the preceding stage executed.

use ferro_common::config::SamplerConfig;
use ferro_common::hal::driver::{
    CarrierTimer, HalError, PreemptionPoint, SamplingHardware, SimulatedCarrier, TimerSync,
};
use ferro_common::hal::types::DispatchStage;
use thiserror::Error;
use tracing::{debug, info};

use crate::axis::SharedState;
use crate::dispatch::{ControlDispatch, PeriodReport};
use crate::half_cycle::{HalfCycleEvent, HalfCycleHandler};
use crate::hooks::{ControlHooks, SamplingHook};
use crate::telemetry::Telemetry;
use crate::timers::start_timers;

// ─── Errors ─────────────────────────────────────────────────────────

/// Errors during runner setup.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Timer triplet could not be started.
    #[error("timer start failed: {0}")]
    TimerStart(#[from] HalError),

    /// Runner thread could not be pinned or promoted.
    #[error("Thread placement error: {0}")]
    ThreadPlacement(String),
}

// ─── Dispatch Statistics ────────────────────────────────────────────

/// O(1) per-dispatch timing statistics [simulated ticks].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchStats {
    /// Dispatch periods executed.
    pub dispatch_count: u64,
    /// Last dispatch duration.
    pub last_ticks: u64,
    /// Minimum dispatch duration.
    pub min_ticks: u64,
    /// Maximum dispatch duration.
    pub max_ticks: u64,
    /// Running sum for average computation.
    pub sum_ticks: u64,
    /// Maximum delay between the pending trough and dispatch entry.
    pub max_latency_ticks: u64,
    /// Periods that failed the deadline check.
    pub deadline_misses: u64,
    /// Periods with an incomplete ADC window or aux transfer.
    pub bad_windows: u64,
    /// Half-cycle entries that saw a repeated counter direction.
    pub missed_updates: u64,
}

impl DispatchStats {
    /// Create a new zeroed stats instance.
    pub const fn new() -> Self {
        Self {
            dispatch_count: 0,
            last_ticks: 0,
            min_ticks: u64::MAX,
            max_ticks: 0,
            sum_ticks: 0,
            max_latency_ticks: 0,
            deadline_misses: 0,
            bad_windows: 0,
            missed_updates: 0,
        }
    }

    /// Record a dispatch duration. O(1), no allocation.
    #[inline]
    pub fn record(&mut self, duration: u64, latency: u64) {
        self.dispatch_count += 1;
        self.last_ticks = duration;
        self.min_ticks = self.min_ticks.min(duration);
        self.max_ticks = self.max_ticks.max(duration);
        self.sum_ticks += duration;
        self.max_latency_ticks = self.max_latency_ticks.max(latency);
    }

    fn record_report(&mut self, report: &PeriodReport) {
        if !report.deadline_met {
            self.deadline_misses += 1;
        }
        if !(report.true_current_read && report.calibration_read && report.aux_complete) {
            self.bad_windows += 1;
        }
    }

    /// Average dispatch duration (0 if none ran).
    #[inline]
    pub fn avg_ticks(&self) -> u64 {
        if self.dispatch_count == 0 {
            0
        } else {
            self.sum_ticks / self.dispatch_count
        }
    }
}

impl Default for DispatchStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── High Priority Level ────────────────────────────────────────────

/// Everything the half-cycle level owns.
struct HighPriority<S> {
    half_cycle: HalfCycleHandler,
    sampling: S,
    fired: u64,
    missed: u64,
    last_trough_at: u64,
}

impl<S: SamplingHook> HighPriority<S> {
    fn fire<B>(&mut self, board: &B, shared: &SharedState)
    where
        B: CarrierTimer + SimulatedCarrier + ?Sized,
    {
        board.fire_update();
        self.fired += 1;
        match self.half_cycle.on_update(board, shared, &mut self.sampling) {
            HalfCycleEvent::Trough { .. } => self.last_trough_at = board.now(),
            HalfCycleEvent::Missed => self.missed += 1,
            HalfCycleEvent::Peak { .. } => {}
        }
    }
}

/// Preemption seen by the dispatch handler: stage cost, then every update
/// event that became due. The event budget of a run never applies here.
struct Preemption<'a, B: ?Sized, S> {
    board: &'a B,
    shared: &'a SharedState,
    level: &'a mut HighPriority<S>,
}

impl<B, S> PreemptionPoint for Preemption<'_, B, S>
where
    B: CarrierTimer + SimulatedCarrier + ?Sized,
    S: SamplingHook,
{
    fn checkpoint(&mut self, stage: DispatchStage) {
        self.board.elapse(stage);
        while self.board.update_due() {
            self.level.fire(self.board, self.shared);
        }
    }
}

// ─── Runner ─────────────────────────────────────────────────────────

/// Deterministic two-priority interrupt emulation over a simulated board.
pub struct InterruptRunner<'b, B, S, C> {
    board: &'b B,
    shared: SharedState,
    high: HighPriority<S>,
    dispatch: ControlDispatch,
    hooks: C,
    stats: DispatchStats,
    last_report: Option<PeriodReport>,
}

impl<'b, B, S, C> InterruptRunner<'b, B, S, C>
where
    B: CarrierTimer + SamplingHardware + TimerSync + SimulatedCarrier,
    S: SamplingHook,
    C: ControlHooks,
{
    /// Build the handlers and start the board's timers.
    ///
    /// # Errors
    /// Returns `RunnerError::TimerStart` if the board refuses to start.
    pub fn new(
        board: &'b B,
        config: &SamplerConfig,
        sampling: S,
        hooks: C,
    ) -> Result<Self, RunnerError> {
        let shared = SharedState::from_config(config);
        start_timers(board, config)?;
        info!(
            half_period = config.timing.half_period_ticks(),
            max_polls = config.timing.calibration_wait_max_polls,
            "Interrupt runner ready"
        );
        Ok(Self {
            board,
            shared,
            high: HighPriority {
                half_cycle: HalfCycleHandler::from_config(config),
                sampling,
                fired: 0,
                missed: 0,
                last_trough_at: 0,
            },
            dispatch: ControlDispatch::from_config(config),
            hooks,
            stats: DispatchStats::new(),
            last_report: None,
        })
    }

    /// Fire at least `n` carrier update events, running every dispatch they
    /// request.
    ///
    /// Dispatches are only started while the budget is not used up. One that
    /// is already running completes, together with every update event it
    /// overlaps, so the run may end a few events past `n`. A dispatch pended
    /// at or after the budget stays pending until the next call. Returns the
    /// number of dispatches run.
    pub fn run_half_cycles(&mut self, n: u64) -> u64 {
        let limit = self.high.fired + n;
        let mut dispatches = 0;
        loop {
            while self.high.fired < limit && self.board.take_control_request() {
                self.run_dispatch();
                dispatches += 1;
            }
            if self.high.fired >= limit {
                break;
            }
            self.board.advance_to_next_update();
            self.high.fire(self.board, &self.shared);
        }
        self.stats.missed_updates = self.high.missed;
        self.shared.log_new_errors();
        debug!(
            events = n,
            dispatches,
            timestamp = self.shared.clock.now(),
            "Half-cycles complete"
        );
        dispatches
    }

    fn run_dispatch(&mut self) {
        let start = self.board.now();
        let latency = start.saturating_sub(self.high.last_trough_at);
        let mut preempt = Preemption {
            board: self.board,
            shared: &self.shared,
            level: &mut self.high,
        };
        let report = self
            .dispatch
            .run_period(self.board, &self.shared, &mut self.hooks, &mut preempt);
        self.stats.record(self.board.now() - start, latency);
        self.stats.record_report(&report);
        self.last_report = Some(report);
        self.shared.log_new_errors();
    }

    // ─── Accessors ──────────────────────────────────────────────────

    /// State shared by both levels (errors, clock, task timer).
    pub fn shared(&self) -> &SharedState {
        &self.shared
    }

    /// Published dispatch values.
    pub fn telemetry(&self) -> &Telemetry {
        self.dispatch.telemetry()
    }

    /// Dispatch statistics.
    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }

    /// Report of the most recent dispatch.
    pub fn last_report(&self) -> Option<&PeriodReport> {
        self.last_report.as_ref()
    }

    /// Input-capture snapshot from the last trough.
    pub fn captures(&self) -> &[u32] {
        self.high.half_cycle.captures()
    }

    /// Total update events fired.
    pub fn events_fired(&self) -> u64 {
        self.high.fired
    }

    /// The board under simulation.
    pub fn board(&self) -> &'b B {
        self.board
    }

    /// Control hooks.
    pub fn hooks(&self) -> &C {
        &self.hooks
    }

    /// Control hooks, mutably.
    pub fn hooks_mut(&mut self) -> &mut C {
        &mut self.hooks
    }

    /// Sampling hook.
    pub fn sampling(&self) -> &S {
        &self.high.sampling
    }
}
