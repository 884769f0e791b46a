//! Values published by the dispatch handler.

use ferro_common::consts::AXIS_COUNT;

use crate::analog::AuxReadings;
use crate::current::PhaseCurrents;

/// Durations of the last captured dispatch [cycle-counter ticks].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskTimes {
    /// `control_loop` callback.
    pub control_loop: u32,
    /// Busy wait for the calibration window.
    pub dc_calib_wait: u32,
    /// All `pwm_update` callbacks.
    pub pwm_update: u32,
}

/// Last readings of one axis.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AxisReadings {
    /// True-current window.
    pub current: Option<PhaseCurrents>,
    /// Calibration window.
    pub dc_calib: Option<PhaseCurrents>,
}

/// Published measurements and dispatch health counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Telemetry {
    /// Bus voltage [V].
    pub vbus: f32,
    /// GPIO analog inputs and FET temperatures.
    pub aux: AuxReadings,
    /// Per-axis readings.
    pub axes: [AxisReadings; AXIS_COUNT],
    /// Brake duty written in the last period.
    pub brake_duty: f32,
    /// Last task-timer capture.
    pub task_times: TaskTimes,
    /// Polls spent waiting for the calibration window, last period.
    pub calibration_wait_polls: u32,
    /// Largest `calibration_wait_polls` seen.
    pub calibration_wait_polls_max: u32,
    /// Periods in which the calibration wait hit its poll limit.
    pub calibration_wait_timeouts: u64,
    /// Completed dispatch periods.
    pub periods: u64,
}

impl Telemetry {
    pub(crate) fn record_calibration_wait(&mut self, polls: u32, timed_out: bool) {
        self.calibration_wait_polls = polls;
        self.calibration_wait_polls_max = self.calibration_wait_polls_max.max(polls);
        if timed_out {
            self.calibration_wait_timeouts += 1;
        }
    }
}
