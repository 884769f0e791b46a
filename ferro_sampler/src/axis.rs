//! Per-axis state and the state shared between both interrupt levels.
//!
//! Everything here is reachable through `&SharedState` from both handlers,
//! so all mutable fields are atomics.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use ferro_common::config::{AxisConfig, SamplerConfig};
use ferro_common::consts::AXIS_COUNT;
use ferro_common::error::AxisError;
use ferro_common::hal::types::{AdcSlot, TimerId};
use static_assertions::assert_impl_all;
use tracing::warn;

use crate::clock::PhaseClock;
use crate::current::{CurrentSense, PhaseCurrents, reconstruct_triple};

// ─── Error Latch ────────────────────────────────────────────────────

/// Sticky, OR-accumulated error bitmask.
///
/// The pipeline only ever adds bits. Clearing is reserved to the
/// supervisor through [`ErrorLatch::rearm`].
#[derive(Debug, Default)]
pub struct ErrorLatch(AtomicU32);

impl ErrorLatch {
    /// Empty latch.
    pub const fn new() -> Self {
        Self(AtomicU32::new(0))
    }

    /// OR `error` into the latch. Returns the bits that were not set before.
    #[inline]
    pub fn add(&self, error: AxisError) -> AxisError {
        let prev = self.0.fetch_or(error.bits(), Ordering::AcqRel);
        AxisError::from_bits_truncate(error.bits() & !prev)
    }

    /// Current flags.
    #[inline]
    pub fn get(&self) -> AxisError {
        AxisError::from_bits_truncate(self.0.load(Ordering::Acquire))
    }

    /// Clear all flags, returning the ones that were set.
    pub fn rearm(&self) -> AxisError {
        AxisError::from_bits_truncate(self.0.swap(0, Ordering::AcqRel))
    }
}

// ─── Axis State ─────────────────────────────────────────────────────

/// One power stage: hardware association, calibration and error state.
#[derive(Debug)]
pub struct AxisState {
    index: usize,
    /// PWM timer driving this stage.
    pub timer: TimerId,
    /// ADC2/ADC3 result slot holding this stage's phase samples.
    pub sample_slot: AdcSlot,
    /// Trigger phase offset relative to the shared timestamp [ticks].
    pub trigger_offset: u32,
    /// Reciprocal amplifier gain.
    pub phase_current_rev_gain: f32,
    /// Shunt conductance [S].
    pub shunt_conductance: f32,
    errors: ErrorLatch,
    reported: AtomicU32,
    armed: AtomicBool,
}

impl AxisState {
    /// Build a disarmed axis without errors.
    pub fn new(index: usize, cfg: &AxisConfig) -> Self {
        Self {
            index,
            timer: cfg.timer,
            sample_slot: cfg.sample_slot,
            trigger_offset: cfg.trigger_offset_ticks,
            phase_current_rev_gain: cfg.phase_current_rev_gain,
            shunt_conductance: cfg.shunt_conductance(),
            errors: ErrorLatch::new(),
            reported: AtomicU32::new(0),
            armed: AtomicBool::new(false),
        }
    }

    /// Axis number.
    #[inline]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Accumulated error flags.
    #[inline]
    pub fn error(&self) -> AxisError {
        self.errors.get()
    }

    /// Whether the power stage may switch.
    #[inline]
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    /// OR an error into the latch without touching the armed state.
    ///
    /// Called from both handlers: no logging here, see
    /// [`SharedState::log_new_errors`].
    #[inline]
    pub fn record_error(&self, error: AxisError) {
        self.errors.add(error);
    }

    /// Flags latched since the previous call (or since the last rearm).
    pub fn take_unreported(&self) -> AxisError {
        let current = self.errors.get().bits();
        let prev = self.reported.fetch_or(current, Ordering::AcqRel);
        AxisError::from_bits_truncate(current & !prev)
    }

    /// Latch `error` and disarm.
    pub fn disarm(&self, error: AxisError) {
        self.record_error(error);
        self.armed.store(false, Ordering::Release);
    }

    /// Supervisor entry point: clear all errors and arm the axis.
    ///
    /// Returns the flags that were cleared. The interrupt handlers never
    /// call this.
    pub fn rearm(&self) -> AxisError {
        let cleared = self.errors.rearm();
        self.reported.store(0, Ordering::Release);
        self.armed.store(true, Ordering::Release);
        cleared
    }

    /// Convert one phase code, latching `CURRENT_SENSE_SATURATION` on this
    /// axis when it is outside the linear range.
    #[inline]
    pub fn phase_current(&self, sense: &CurrentSense, raw: u16) -> Option<f32> {
        let current = sense.convert(raw, self.phase_current_rev_gain, self.shunt_conductance);
        if current.is_none() {
            self.record_error(AxisError::CURRENT_SENSE_SATURATION);
        }
        current
    }

    /// Convert both measured phases and reconstruct the triple.
    pub fn phase_currents(&self, sense: &CurrentSense, raw: [u16; 2]) -> Option<PhaseCurrents> {
        let b = self.phase_current(sense, raw[0]);
        let c = self.phase_current(sense, raw[1]);
        reconstruct_triple(b, c)
    }
}

// ─── Task Timer ─────────────────────────────────────────────────────

/// One-shot task timing capture.
///
/// The supervisor arms it; the trough handler latches `enabled = armed`;
/// the dispatch handler measures while enabled and consumes the arm.
#[derive(Debug, Default)]
pub struct TaskTimerArm {
    armed: AtomicBool,
    enabled: AtomicBool,
}

impl TaskTimerArm {
    /// Request a capture for the next full dispatch.
    pub fn arm(&self) {
        self.armed.store(true, Ordering::Release);
    }

    /// Whether a capture is requested.
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    /// Trough handler: start capturing if armed.
    #[inline]
    pub fn latch(&self) {
        self.enabled
            .store(self.armed.load(Ordering::Acquire), Ordering::Release);
    }

    /// Whether the current dispatch measures its stages.
    #[inline]
    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Dispatch end: `armed &= !enabled; enabled = false`.
    #[inline]
    pub fn finish(&self) {
        if self.enabled.swap(false, Ordering::AcqRel) {
            self.armed.store(false, Ordering::Release);
        }
    }
}

// ─── Shared State ───────────────────────────────────────────────────

/// State visible to both interrupt levels and to the supervisor.
#[derive(Debug)]
pub struct SharedState {
    /// Timestamp and direction tracker.
    pub clock: PhaseClock,
    /// Power stages.
    pub axes: [AxisState; AXIS_COUNT],
    /// Task timing capture control.
    pub task_timer: TaskTimerArm,
}

assert_impl_all!(SharedState: Sync, Send);

impl SharedState {
    /// Build from configuration. Axes start disarmed.
    pub fn from_config(config: &SamplerConfig) -> Self {
        Self {
            clock: PhaseClock::new(config.timing.half_period_ticks()),
            axes: std::array::from_fn(|i| AxisState::new(i, &config.axes[i])),
            task_timer: TaskTimerArm::default(),
        }
    }

    /// Disarm every axis with `error`, notifying `notify` per axis.
    pub fn disarm_all(&self, error: AxisError, mut notify: impl FnMut(usize, AxisError)) {
        for axis in &self.axes {
            axis.disarm(error);
            notify(axis.index(), error);
        }
    }

    /// Rearm every axis.
    pub fn rearm_all(&self) {
        for axis in &self.axes {
            axis.rearm();
        }
    }

    /// Log each flag once, the first time it is seen latched. Runs at the
    /// supervisor level, never inside a handler.
    pub fn log_new_errors(&self) {
        for axis in &self.axes {
            let new = axis.take_unreported();
            if new.is_empty() {
                continue;
            }
            if new.has_disarming() {
                warn!(axis = axis.index(), error = ?new, "Axis disarmed");
            } else {
                warn!(axis = axis.index(), error = ?new, "Axis error latched");
            }
        }
    }
}
