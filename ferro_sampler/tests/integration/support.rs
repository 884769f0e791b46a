//! Recording callbacks and runner construction shared by the scenarios.

use ferro_common::prelude::*;
use ferro_hal::SimBoard;
use ferro_sampler::{ControlHooks, InterruptRunner, PhaseCurrents, SamplingHook};

/// Half period of the default configuration [ticks].
pub const H: u32 = 3500;

/// Trigger offset of axis 0 in the default configuration [ticks].
pub const AXIS0_OFFSET: u32 = 1749;

/// Counts troughs and remembers half-cycle disarm notifications.
#[derive(Debug, Default)]
pub struct TroughLog {
    pub troughs: u64,
    pub disarms: Vec<(usize, AxisError)>,
}

impl SamplingHook for TroughLog {
    fn sampling(&mut self) {
        self.troughs += 1;
    }

    fn disarm_with_error(&mut self, axis: usize, error: AxisError) {
        self.disarms.push((axis, error));
    }
}

/// Records every dispatch callback with its timestamp.
#[derive(Debug, Default)]
pub struct Recorder {
    pub measured: Vec<(usize, u32, Option<PhaseCurrents>)>,
    pub calibrations: Vec<(usize, u32, Option<PhaseCurrents>)>,
    pub control: Vec<u32>,
    pub pwm: Vec<(usize, u32)>,
    pub disarms: Vec<(usize, AxisError)>,
    pub regen_power: f32,
}

impl Recorder {
    /// True-current readings of one axis, in dispatch order.
    pub fn measured_for(&self, axis: usize) -> Vec<Option<PhaseCurrents>> {
        self.measured
            .iter()
            .filter(|(a, _, _)| *a == axis)
            .map(|(_, _, c)| *c)
            .collect()
    }

    /// Calibration readings of one axis, in dispatch order.
    pub fn calibrations_for(&self, axis: usize) -> Vec<Option<PhaseCurrents>> {
        self.calibrations
            .iter()
            .filter(|(a, _, _)| *a == axis)
            .map(|(_, _, c)| *c)
            .collect()
    }
}

impl ControlHooks for Recorder {
    fn current_measured(&mut self, axis: usize, timestamp: u32, current: Option<PhaseCurrents>) {
        self.measured.push((axis, timestamp, current));
    }

    fn control_loop(&mut self, timestamp: u32) {
        self.control.push(timestamp);
    }

    fn dc_calibration(&mut self, axis: usize, timestamp: u32, current: Option<PhaseCurrents>) {
        self.calibrations.push((axis, timestamp, current));
    }

    fn pwm_update(&mut self, axis: usize, timestamp: u32) {
        self.pwm.push((axis, timestamp));
    }

    fn regen_power(&self) -> f32 {
        self.regen_power
    }

    fn disarm_with_error(&mut self, axis: usize, error: AxisError) {
        self.disarms.push((axis, error));
    }
}

pub type Runner<'b> = InterruptRunner<'b, SimBoard, TroughLog, Recorder>;

/// Start the board's timers. Both axes stay disarmed.
pub fn unarmed_runner<'b>(board: &'b SimBoard, config: &SamplerConfig) -> Runner<'b> {
    InterruptRunner::new(board, config, TroughLog::default(), Recorder::default())
        .expect("timers start on a fresh board")
}

/// Start the board's timers and arm both axes.
pub fn armed_runner<'b>(board: &'b SimBoard, config: &SamplerConfig) -> Runner<'b> {
    let runner = unarmed_runner(board, config);
    runner.shared().rearm_all();
    runner
}

/// Latched errors of both axes.
pub fn errors(runner: &Runner<'_>) -> [AxisError; 2] {
    [runner.shared().axes[0].error(), runner.shared().axes[1].error()]
}
