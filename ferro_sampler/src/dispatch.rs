//! Control dispatch handler.
//!
//! Software-triggered by the trough half-cycle, runs once per PWM period at
//! the lower priority level. Each period:
//!
//! ```text
//!  trough                        peak                          trough
//!    │ fetch ─ aux ─ measured ─ control ─ wait ┆ calib ─ pwm ─ brake │
//!    ▼                                         ▼                      ▼
//!    ts                                      ts + H                 ts + 2H
//! ```
//!
//! Every stage runs every period, also when an axis is disarmed. Errors are
//! latched per axis; nothing is returned to the caller except a report.

use ferro_common::config::SamplerConfig;
use ferro_common::consts::{ADC_UNIT_COUNT, AXIS_COUNT};
use ferro_common::error::AxisError;
use ferro_common::hal::driver::{PreemptionPoint, SamplingHardware};
use ferro_common::hal::types::{AdcSlot, AdcStatus, AdcUnit, DispatchStage};

use crate::analog::AnalogFrontEnd;
use crate::axis::SharedState;
use crate::brake::BrakeResistor;
use crate::current::{CurrentSense, PhaseCurrents};
use crate::hooks::ControlHooks;
use crate::telemetry::{TaskTimes, Telemetry};

// ─── Period Context ─────────────────────────────────────────────────

/// Raw and converted samples of one ADC window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WindowSnapshot {
    /// All units were complete and the results were consumed.
    pub read: bool,
    /// ADC1 injected code.
    pub vbus_raw: u16,
    /// `[axis] -> [phase B, phase C]` codes.
    pub raw: [[u16; 2]; AXIS_COUNT],
    /// Converted currents per axis.
    pub currents: [Option<PhaseCurrents>; AXIS_COUNT],
}

/// Stack-local state of one dispatch invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControlPeriodContext {
    /// Timestamp captured on entry.
    pub reference: u32,
    /// Trough window.
    pub true_current: WindowSnapshot,
    /// Peak window.
    pub calibration: WindowSnapshot,
}

/// Summary of one dispatch invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodReport {
    /// Timestamp captured on entry.
    pub reference: u32,
    /// Timestamp seen by the deadline check.
    pub end_timestamp: u32,
    /// `end_timestamp == reference + half_period`.
    pub deadline_met: bool,
    /// True-current window was complete.
    pub true_current_read: bool,
    /// Calibration window was complete.
    pub calibration_read: bool,
    /// Aux DMA transfer was complete.
    pub aux_complete: bool,
    /// Calibration-window polls.
    pub calibration_polls: u32,
    /// Calibration wait hit its poll limit.
    pub calibration_timed_out: bool,
}

// ─── Dispatch Handler ───────────────────────────────────────────────

/// Lower-priority per-period measurement, control and actuation sequence.
#[derive(Debug)]
pub struct ControlDispatch {
    sense: CurrentSense,
    analog: AnalogFrontEnd,
    brake: BrakeResistor,
    half_period: u32,
    max_polls: u32,
    /// Completion flags a window must raise, per unit.
    required: [AdcStatus; ADC_UNIT_COUNT],
    telemetry: Telemetry,
}

impl ControlDispatch {
    /// Build from configuration.
    pub fn from_config(config: &SamplerConfig) -> Self {
        let phase_flags = config
            .axes
            .iter()
            .fold(AdcStatus::empty(), |acc, a| acc | a.sample_slot.completion_flag());
        Self {
            sense: CurrentSense::from_config(&config.current_sense),
            analog: AnalogFrontEnd::from_config(config),
            brake: BrakeResistor::from_config(&config.brake),
            half_period: config.timing.half_period_ticks(),
            max_polls: config.timing.calibration_wait_max_polls,
            required: [AdcStatus::JEOC, phase_flags, phase_flags],
            telemetry: Telemetry::default(),
        }
    }

    /// Published values.
    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    /// Current conversion in use.
    pub fn current_sense(&self) -> &CurrentSense {
        &self.sense
    }

    /// Run one full period (steps 1-12). Never returns early.
    pub fn run_period<H, C, P>(
        &mut self,
        hw: &H,
        shared: &SharedState,
        hooks: &mut C,
        preempt: &mut P,
    ) -> PeriodReport
    where
        H: SamplingHardware + ?Sized,
        C: ControlHooks + ?Sized,
        P: PreemptionPoint + ?Sized,
    {
        let h = self.half_period;

        // 1. Period reference.
        let reference = shared.clock.now();
        let timing = shared.task_timer.enabled();
        let mut ctx = ControlPeriodContext {
            reference,
            ..Default::default()
        };

        // 2. True-current window.
        self.fetch_window(hw, shared, hooks, &mut ctx.true_current);
        preempt.checkpoint(DispatchStage::Fetch);

        // 3. Aux DMA.
        let aux_complete = hw.aux_transfer_complete();
        if aux_complete {
            hw.clear_aux_transfer_flag();
        } else {
            shared.disarm_all(AxisError::BAD_TIMING, |axis, err| {
                hooks.disarm_with_error(axis, err)
            });
        }
        self.analog.convert(hw, &mut self.telemetry.aux);
        preempt.checkpoint(DispatchStage::AuxConvert);

        // 4-5. Convert and publish true currents.
        self.convert_window(hw, shared, &mut ctx.true_current);
        for axis in &shared.axes {
            let i = axis.index();
            let current = ctx.true_current.currents[i];
            self.telemetry.axes[i].current = current;
            hooks.current_measured(i, reference.wrapping_sub(axis.trigger_offset), current);
        }
        preempt.checkpoint(DispatchStage::CurrentMeasured);

        // 6. Control.
        let t0 = hw.cycle_counter();
        hooks.control_loop(reference);
        preempt.checkpoint(DispatchStage::ControlLoop);
        let control_ticks = hw.cycle_counter().wrapping_sub(t0);

        // 7. Calibration window wait.
        let t0 = hw.cycle_counter();
        let mut polls = 0;
        let mut timed_out = false;
        while !self.window_complete(hw) {
            if polls >= self.max_polls {
                timed_out = true;
                break;
            }
            polls += 1;
            preempt.checkpoint(DispatchStage::CalibrationPoll);
        }
        let wait_ticks = hw.cycle_counter().wrapping_sub(t0);
        self.telemetry.record_calibration_wait(polls, timed_out);

        // 8. Calibration window.
        self.fetch_window(hw, shared, hooks, &mut ctx.calibration);
        self.convert_window(hw, shared, &mut ctx.calibration);
        for axis in &shared.axes {
            let i = axis.index();
            let current = ctx.calibration.currents[i];
            self.telemetry.axes[i].dc_calib = current;
            let ts = reference.wrapping_add(h).wrapping_sub(axis.trigger_offset);
            hooks.dc_calibration(i, ts, current);
        }
        preempt.checkpoint(DispatchStage::Calibration);

        // 9. Actuation.
        let t0 = hw.cycle_counter();
        for axis in &shared.axes {
            let ts = reference.wrapping_add(h.wrapping_mul(3)).wrapping_sub(axis.trigger_offset);
            hooks.pwm_update(axis.index(), ts);
        }
        preempt.checkpoint(DispatchStage::PwmUpdate);
        let pwm_ticks = hw.cycle_counter().wrapping_sub(t0);

        // 10. Brake resistor, refreshed power estimate from step 9.
        let duty = self.brake.duty(hooks.regen_power(), self.telemetry.vbus);
        let brake_ts = reference
            .wrapping_add(h.wrapping_mul(3))
            .wrapping_sub(shared.axes[0].trigger_offset);
        hw.set_brake_duty(duty, brake_ts);
        self.telemetry.brake_duty = duty;
        preempt.checkpoint(DispatchStage::BrakeUpdate);

        // 11. Exactly one half-cycle since entry.
        let end_timestamp = shared.clock.now();
        let deadline_met = end_timestamp == reference.wrapping_add(h);
        if !deadline_met {
            shared.disarm_all(AxisError::CONTROL_DEADLINE_MISSED, |axis, err| {
                hooks.disarm_with_error(axis, err)
            });
        }

        // 12. Task timing.
        if timing {
            self.telemetry.task_times = TaskTimes {
                control_loop: control_ticks,
                dc_calib_wait: wait_ticks,
                pwm_update: pwm_ticks,
            };
        }
        shared.task_timer.finish();
        self.telemetry.periods += 1;

        PeriodReport {
            reference,
            end_timestamp,
            deadline_met,
            true_current_read: ctx.true_current.read,
            calibration_read: ctx.calibration.read,
            aux_complete,
            calibration_polls: polls,
            calibration_timed_out: timed_out,
        }
    }

    fn window_complete<H: SamplingHardware + ?Sized>(&self, hw: &H) -> bool {
        AdcUnit::ALL
            .iter()
            .all(|unit| hw.adc_status(*unit).contains(self.required[unit.index()]))
    }

    /// Non-blocking window read. Incomplete disarms both axes.
    fn fetch_window<H, C>(
        &mut self,
        hw: &H,
        shared: &SharedState,
        hooks: &mut C,
        window: &mut WindowSnapshot,
    ) where
        H: SamplingHardware + ?Sized,
        C: ControlHooks + ?Sized,
    {
        if !self.window_complete(hw) {
            shared.disarm_all(AxisError::BAD_TIMING, |axis, err| {
                hooks.disarm_with_error(axis, err)
            });
            window.read = false;
            return;
        }

        window.vbus_raw = hw.adc_sample(AdcUnit::Adc1, AdcSlot::Injected);
        for axis in &shared.axes {
            window.raw[axis.index()] = [
                hw.adc_sample(AdcUnit::Adc2, axis.sample_slot),
                hw.adc_sample(AdcUnit::Adc3, axis.sample_slot),
            ];
        }
        hw.clear_adc_status(AdcUnit::Adc1, self.required[AdcUnit::Adc1.index()]);
        for unit in [AdcUnit::Adc2, AdcUnit::Adc3] {
            hw.clear_adc_status(unit, self.required[unit.index()] | AdcStatus::OVR);
        }
        window.read = true;
        self.telemetry.vbus = self.analog.bus_voltage(window.vbus_raw);
    }

    /// Per-axis conversion: disabled outputs read as zero, otherwise convert
    /// when the gate driver is ready and the window was read.
    fn convert_window<H: SamplingHardware + ?Sized>(
        &self,
        hw: &H,
        shared: &SharedState,
        window: &mut WindowSnapshot,
    ) {
        for axis in &shared.axes {
            let i = axis.index();
            window.currents[i] = if !hw.outputs_enabled(axis.timer) {
                Some(PhaseCurrents::ZERO)
            } else if hw.gate_driver_ready(i) && window.read {
                axis.phase_currents(&self.sense, window.raw[i])
            } else {
                None
            };
        }
    }
}
