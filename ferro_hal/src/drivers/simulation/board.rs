//! Simulated dual-axis board.
//!
//! The `SimBoard` implements every register trait consumed by the sampling
//! core plus the `SimulatedCarrier` time model, so the interrupt pipeline
//! can run on a host with deterministic timing and injectable faults.

use super::adc::{AdcBank, SampleWindow};
use super::faults::FaultPlan;
use super::timing::{CarrierModel, StageCosts};
use ferro_common::config::SamplerConfig;
use ferro_common::consts::{AXIS_COUNT, MAX_CAPTURE_CHANNELS};
use ferro_common::hal::driver::{
    CarrierTimer, HalError, SamplingHardware, SimulatedCarrier, TimerSync,
};
use ferro_common::hal::types::{AdcSlot, AdcStatus, AdcUnit, DispatchStage, TimerId};
use std::cell::Cell;
use tracing::{debug, info};

/// Bus voltage presented by a freshly built board [V].
pub const NOMINAL_VBUS: f32 = 24.0;

/// Simulated board implementing all hardware traits.
#[derive(Debug)]
pub struct SimBoard {
    carrier: CarrierModel,
    costs: StageCosts,
    adc: AdcBank,
    faults: FaultPlan,
    axis_timers: [TimerId; AXIS_COUNT],
    compare: [Cell<[u16; 3]>; 3],
    outputs_enabled: [Cell<bool>; AXIS_COUNT],
    gate_ready: [Cell<bool>; AXIS_COUNT],
    captures: [Cell<u32>; MAX_CAPTURE_CHANNELS],
    brake: Cell<(f32, u32)>,
    brake_writes: Cell<u64>,
    vbus_scale: f32,
    full_scale: u32,
}

const fn compare_slot(timer: TimerId) -> usize {
    match timer {
        TimerId::Pwm0 => 0,
        TimerId::Pwm1 => 1,
        TimerId::Loop => 2,
    }
}

impl SimBoard {
    /// Build a board matching the configured timing, slots and scaling.
    ///
    /// All phase codes start at half scale (zero current), outputs are
    /// enabled and both gate drivers report ready.
    pub fn from_config(config: &SamplerConfig) -> Self {
        let cs = &config.current_sense;
        let vbus_scale = cs.adc_max_voltage * config.analog.vbus_divider_ratio;
        let full_scale = cs.adc_full_scale;
        let idle = (full_scale / 2) as u16;
        let board = Self {
            carrier: CarrierModel::new(config.timing.half_period_ticks()),
            costs: StageCosts::default(),
            adc: AdcBank::new(config.axes.map(|a| a.sample_slot), idle, 0),
            faults: FaultPlan::default(),
            axis_timers: config.axes.map(|a| a.timer),
            compare: Default::default(),
            outputs_enabled: std::array::from_fn(|_| Cell::new(true)),
            gate_ready: std::array::from_fn(|_| Cell::new(true)),
            captures: Default::default(),
            brake: Cell::new((0.0, 0)),
            brake_writes: Cell::new(0),
            vbus_scale,
            full_scale,
        };
        board.set_vbus(NOMINAL_VBUS);
        board
    }

    /// Replace the per-stage execution costs.
    pub fn with_stage_costs(mut self, costs: StageCosts) -> Self {
        self.costs = costs;
        self
    }

    /// Current stage costs.
    pub fn stage_costs(&self) -> &StageCosts {
        &self.costs
    }

    // ─── Analog inputs ──────────────────────────────────────────────

    /// Program the phase B / phase C codes an axis presents in a window.
    pub fn set_phase_codes(&self, axis: usize, window: SampleWindow, b: u16, c: u16) {
        self.adc.set_phase_codes(window, axis, [b, c]);
    }

    /// Program the same code on every phase of every axis in both windows.
    pub fn set_all_phase_codes(&self, code: u16) {
        for axis in 0..AXIS_COUNT {
            for window in [SampleWindow::TrueCurrent, SampleWindow::Calibration] {
                self.adc.set_phase_codes(window, axis, [code, code]);
            }
        }
    }

    /// Program the raw bus-voltage code.
    pub fn set_vbus_code(&self, code: u16) {
        self.adc.set_vbus_code(code);
    }

    /// Program the bus voltage [V] through the configured divider.
    pub fn set_vbus(&self, volts: f32) {
        let code = volts / self.vbus_scale * self.full_scale as f32;
        self.adc.set_vbus_code(code.round().clamp(0.0, u16::MAX as f32) as u16);
    }

    /// Program the aux DMA sequence (GPIO inputs first, then thermistors).
    ///
    /// # Errors
    /// Returns `HalError::ConfigError` if the sequence exceeds the DMA buffer.
    pub fn set_aux_samples(&self, samples: &[u16]) -> Result<(), HalError> {
        self.adc.set_aux(samples).map_err(|cap| {
            HalError::ConfigError(format!(
                "aux sequence of {} samples exceeds capacity {cap}",
                samples.len()
            ))
        })
    }

    /// Set the value latched by an input-capture channel.
    pub fn set_input_capture(&self, channel: usize, value: u32) {
        if let Some(cell) = self.captures.get(channel) {
            cell.set(value);
        }
    }

    // ─── Power stage ────────────────────────────────────────────────

    /// Set the main output enable of an axis' PWM timer.
    pub fn set_outputs_enabled(&self, axis: usize, enabled: bool) {
        if let Some(cell) = self.outputs_enabled.get(axis) {
            cell.set(enabled);
        }
    }

    /// Set the readiness of an axis' gate driver.
    pub fn set_gate_ready(&self, axis: usize, ready: bool) {
        if let Some(cell) = self.gate_ready.get(axis) {
            cell.set(ready);
        }
    }

    /// Last values written to a timer's compare channels.
    pub fn compare(&self, timer: TimerId) -> [u16; 3] {
        self.compare[compare_slot(timer)].get()
    }

    /// Last brake duty and its effective timestamp.
    pub fn brake(&self) -> (f32, u32) {
        self.brake.get()
    }

    /// Number of brake duty writes.
    pub fn brake_writes(&self) -> u64 {
        self.brake_writes.get()
    }

    // ─── Fault injection ────────────────────────────────────────────

    /// Suppress the direction flip of the given 1-based update event.
    pub fn glitch_direction_at(&self, event: u64) {
        self.faults.glitch_at(event);
    }

    /// Keep an ADC unit's completion flags low for the next `windows`
    /// true-current windows.
    pub fn hold_adc(&self, unit: AdcUnit, windows: u32) {
        self.faults.hold(unit, windows);
    }

    /// Withhold the next `transfers` aux DMA completions.
    pub fn stall_dma(&self, transfers: u32) {
        self.faults.stall_dma(transfers);
    }

    /// Add `ticks` to the next execution of a dispatch stage.
    pub fn inject_delay(&self, stage: DispatchStage, ticks: u64) {
        self.faults.delay(stage, ticks);
    }

    // ─── Inspection ─────────────────────────────────────────────────

    /// Number of update events fired so far.
    pub fn events_fired(&self) -> u64 {
        self.carrier.events()
    }

    /// Whether the timer triplet has been started.
    pub fn timers_running(&self) -> bool {
        self.carrier.running()
    }

    /// Initial count a timer was started with.
    pub fn initial_count(&self, timer: TimerId) -> Option<u32> {
        self.carrier.initial_count(timer)
    }

    /// Whether external ADC triggers are enabled.
    pub fn adc_triggers_enabled(&self) -> bool {
        self.adc.triggers()
    }

    /// Whether the carrier update interrupt is enabled.
    pub fn update_interrupt_enabled(&self) -> bool {
        self.carrier.update_irq_enabled()
    }

    /// Whether an update event is waiting to be acknowledged.
    pub fn update_flag_pending(&self) -> bool {
        self.carrier.update_flag()
    }

    /// Whether a dispatch request is pending.
    pub fn control_pending(&self) -> bool {
        self.carrier.control_pending()
    }
}

impl CarrierTimer for SimBoard {
    fn ack_update(&self) {
        self.carrier.set_update_flag(false);
    }

    fn counting_down(&self) -> bool {
        self.carrier.counting_down()
    }

    fn set_compare(&self, timer: TimerId, values: [u16; 3]) {
        self.compare[compare_slot(timer)].set(values);
    }

    fn input_capture(&self, channel: usize) -> u32 {
        self.captures.get(channel).map_or(0, Cell::get)
    }

    fn pend_control_interrupt(&self) {
        self.carrier.pend_control();
    }
}

impl SamplingHardware for SimBoard {
    fn adc_status(&self, unit: AdcUnit) -> AdcStatus {
        self.adc.status(unit)
    }

    fn clear_adc_status(&self, unit: AdcUnit, flags: AdcStatus) {
        self.adc.clear(unit, flags);
    }

    fn adc_sample(&self, unit: AdcUnit, slot: AdcSlot) -> u16 {
        self.adc.sample(unit, slot)
    }

    fn aux_transfer_complete(&self) -> bool {
        self.adc.aux_complete()
    }

    fn clear_aux_transfer_flag(&self) {
        self.adc.clear_aux_complete();
    }

    fn aux_sample(&self, index: usize) -> u16 {
        self.adc.aux_sample(index)
    }

    fn outputs_enabled(&self, timer: TimerId) -> bool {
        self.axis_timers
            .iter()
            .position(|t| *t == timer)
            .is_some_and(|axis| self.outputs_enabled[axis].get())
    }

    fn gate_driver_ready(&self, axis: usize) -> bool {
        self.gate_ready.get(axis).is_some_and(Cell::get)
    }

    fn set_brake_duty(&self, duty: f32, timestamp: u32) {
        self.brake.set((duty, timestamp));
        self.brake_writes.set(self.brake_writes.get() + 1);
    }

    fn cycle_counter(&self) -> u32 {
        // Wraps like the hardware counter.
        self.carrier.now() as u32
    }
}

impl TimerSync for SimBoard {
    fn set_adc_triggers(&self, enabled: bool) {
        self.adc.set_triggers(enabled);
    }

    fn start_synchronously(&self, timers: &[(TimerId, u32)]) -> Result<(), HalError> {
        if !self.carrier.start(timers) {
            return Err(HalError::TimerStart(
                "timer triplet already running".to_string(),
            ));
        }
        info!(?timers, "Simulated timer triplet started");
        Ok(())
    }

    fn clear_update_flag(&self) {
        self.carrier.set_update_flag(false);
    }

    fn enable_update_interrupt(&self) {
        self.carrier.enable_update_irq();
    }
}

impl SimulatedCarrier for SimBoard {
    fn now(&self) -> u64 {
        self.carrier.now()
    }

    fn elapse(&self, stage: DispatchStage) {
        self.carrier
            .elapse(self.costs.get(stage) + self.faults.take_delay(stage));
    }

    fn update_due(&self) -> bool {
        self.carrier.update_due()
    }

    fn advance_to_next_update(&self) {
        self.carrier.advance_to_next_update();
    }

    fn fire_update(&self) {
        let event = self.carrier.next_event_index();
        if self.faults.take_glitch(event) {
            debug!(event, "Update event with stale direction");
            self.carrier.fire(false);
            return;
        }
        self.carrier.fire(true);
        let window = if self.carrier.counting_down() {
            SampleWindow::Calibration
        } else {
            SampleWindow::TrueCurrent
        };
        self.adc.convert(window, &self.faults);
    }

    fn take_control_request(&self) -> bool {
        self.carrier.take_control()
    }
}
