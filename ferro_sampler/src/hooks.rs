//! Callbacks consumed by the interrupt handlers.
//!
//! The control law, estimators and encoder handling live outside this crate
//! and are reached only through these traits. Implementations run in
//! interrupt context: no blocking, no allocation.

use ferro_common::error::AxisError;

use crate::current::PhaseCurrents;

/// Hook run by the half-cycle handler at every trough.
pub trait SamplingHook {
    /// Sample encoders and other trough-synchronous inputs.
    fn sampling(&mut self);

    /// An axis was disarmed at half-cycle level.
    fn disarm_with_error(&mut self, _axis: usize, _error: AxisError) {}
}

impl SamplingHook for () {
    #[inline]
    fn sampling(&mut self) {}
}

/// Hooks run by the control dispatch handler once per PWM period.
///
/// Timestamps are in the shared carrier time base, already corrected by the
/// axis' trigger offset.
pub trait ControlHooks {
    /// Phase currents of the true-current window. `None` if unavailable.
    fn current_measured(&mut self, axis: usize, timestamp: u32, current: Option<PhaseCurrents>);

    /// Top-level control computation for all axes.
    fn control_loop(&mut self, timestamp: u32);

    /// Zero-vector currents for offset calibration. `None` if unavailable.
    fn dc_calibration(&mut self, axis: usize, timestamp: u32, current: Option<PhaseCurrents>);

    /// Write the next compare values. `timestamp` is when they take effect.
    fn pwm_update(&mut self, axis: usize, timestamp: u32);

    /// Regenerated electrical power to dump into the brake resistor [W].
    fn regen_power(&self) -> f32 {
        0.0
    }

    /// An axis was disarmed at dispatch level.
    fn disarm_with_error(&mut self, _axis: usize, _error: AxisError) {}
}
