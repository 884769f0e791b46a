//! Phase-current conversion.

use ferro_common::config::CurrentSenseConfig;

/// Three phase currents [A]. Phase A is reconstructed from B and C.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhaseCurrents {
    /// Phase A.
    pub a: f32,
    /// Phase B.
    pub b: f32,
    /// Phase C.
    pub c: f32,
}

impl PhaseCurrents {
    /// All phases at 0 A.
    pub const ZERO: Self = Self {
        a: 0.0,
        b: 0.0,
        c: 0.0,
    };

    /// Build a triple from the measured phases using Kirchhoff's current law.
    #[inline]
    pub fn from_bc(b: f32, c: f32) -> Self {
        Self { a: -b - c, b, c }
    }

    /// Sum of all phases, grouped as `a + (b + c)` so it is exactly zero.
    #[inline]
    pub fn sum(&self) -> f32 {
        self.a + (self.b + self.c)
    }
}

/// Combine two phase readings. Absent if either is.
#[inline]
pub fn reconstruct_triple(b: Option<f32>, c: Option<f32>) -> Option<PhaseCurrents> {
    Some(PhaseCurrents::from_bc(b?, c?))
}

/// ADC code to current conversion for one amplifier type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentSense {
    lower_bound: u16,
    upper_bound: u16,
    half_scale: f32,
    volts_per_code: f32,
}

fn code_at(full_scale: u32, volts: f32, vref: f32) -> u16 {
    let code = (f64::from(full_scale) * f64::from(volts) / f64::from(vref)).floor();
    code.clamp(0.0, f64::from(u16::MAX)) as u16
}

impl CurrentSense {
    /// Derive the valid code window and scaling from the amplifier config.
    pub fn from_config(cfg: &CurrentSenseConfig) -> Self {
        Self {
            lower_bound: code_at(cfg.adc_full_scale, cfg.linear_min_volt, cfg.adc_max_voltage),
            upper_bound: code_at(cfg.adc_full_scale, cfg.linear_max_volt, cfg.adc_max_voltage),
            half_scale: (cfg.adc_full_scale / 2) as f32,
            volts_per_code: cfg.adc_max_voltage / cfg.adc_full_scale as f32,
        }
    }

    /// Inclusive `(lower, upper)` code window of the linear range.
    #[inline]
    pub const fn bounds(&self) -> (u16, u16) {
        (self.lower_bound, self.upper_bound)
    }

    /// Convert one raw code to amperes. Absent outside the linear range.
    #[inline]
    pub fn convert(&self, raw: u16, reverse_gain: f32, shunt_conductance: f32) -> Option<f32> {
        if raw < self.lower_bound || raw > self.upper_bound {
            return None;
        }
        let amp_out_volt = self.volts_per_code * (f32::from(raw) - self.half_scale);
        let shunt_volt = amp_out_volt * reverse_gain;
        Some(shunt_volt * shunt_conductance)
    }
}
