//! Brake-resistor actuator.

use ferro_common::config::BrakeConfig;

/// Maps a regenerative power estimate to a brake PWM duty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrakeResistor {
    enabled: bool,
    resistance: f32,
    max_duty: f32,
}

impl BrakeResistor {
    /// Build from configuration.
    pub fn from_config(cfg: &BrakeConfig) -> Self {
        Self {
            enabled: cfg.enabled,
            resistance: cfg.resistance,
            max_duty: cfg.max_duty,
        }
    }

    /// Duty that dissipates `regen_power` [W] at bus voltage `vbus` [V].
    ///
    /// `P = D * V^2 / R`, clamped to `0..=max_duty`. Zero when disabled,
    /// when the bus is not powered or for non-finite inputs.
    pub fn duty(&self, regen_power: f32, vbus: f32) -> f32 {
        if !self.enabled || !(vbus > 0.0) {
            return 0.0;
        }
        let duty = regen_power * self.resistance / (vbus * vbus);
        if !(duty > 0.0) {
            return 0.0;
        }
        duty.min(self.max_duty)
    }
}
