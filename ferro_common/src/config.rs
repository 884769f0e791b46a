//! Configuration loading traits and types.
//!
//! This module provides the TOML configuration of the sampling core and a
//! standardized way to load it.
//!
//! # Usage
//!
//! ```rust,no_run
//! use ferro_common::config::{ConfigError, ConfigLoader, SamplerConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = SamplerConfig::load(Path::new("config/sampler.toml"))?;
//!     config.validate()?;
//!     println!("half period: {} ticks", config.timing.half_period_ticks());
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::consts::{
    ADC_FULL_SCALE, AXIS_COUNT, MAX_CAPTURE_CHANNELS, MAX_GPIO_ADC_CHANNELS, MAX_POLY_COEFFS,
};
use crate::hal::types::{AdcSlot, TimerId};

/// Error type for configuration loading operations.
///
/// This enum represents all possible errors that can occur when loading
/// configuration files.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

// ─── Sections ───────────────────────────────────────────────────────

/// PWM carrier timing.
///
/// # TOML Example
///
/// ```toml
/// [timing]
/// period_ticks = 3500
/// repetition_counter = 0
/// calibration_wait_max_polls = 2000
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Carrier auto-reload value: ticks from trough to peak.
    pub period_ticks: u32,
    /// Repetition counter: update events are generated every `n + 1` half-periods.
    pub repetition_counter: u32,
    /// Upper bound on calibration-window status polls in one dispatch.
    pub calibration_wait_max_polls: u32,
}

impl TimingConfig {
    /// Timestamp increment per half-cycle handler firing.
    ///
    /// Saturates at `u32::MAX`; `SamplerConfig::validate` rejects timings
    /// where that happens.
    #[inline]
    pub const fn half_period_ticks(&self) -> u32 {
        self.period_ticks
            .saturating_mul(self.repetition_counter.saturating_add(1))
    }

    /// Compare value producing a 50% duty cycle.
    #[inline]
    pub const fn neutral_compare(&self) -> u16 {
        (self.period_ticks / 2) as u16
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            period_ticks: 3500,
            repetition_counter: 0,
            calibration_wait_max_polls: 2000,
        }
    }
}

/// Current-sense amplifier and ADC reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentSenseConfig {
    /// Number of ADC codes (2^bits).
    pub adc_full_scale: u32,
    /// ADC reference voltage [V].
    pub adc_max_voltage: f32,
    /// Lower end of the amplifier's linear output range [V].
    pub linear_min_volt: f32,
    /// Upper end of the amplifier's linear output range [V].
    pub linear_max_volt: f32,
}

impl Default for CurrentSenseConfig {
    fn default() -> Self {
        // Amplifier is linear from 0.3V; the upper limit is kept symmetric
        // around the 1.65V center point.
        Self {
            adc_full_scale: ADC_FULL_SCALE,
            adc_max_voltage: 3.3,
            linear_min_volt: 0.3,
            linear_max_volt: 3.0,
        }
    }
}

/// Default FET thermistor polynomial, highest order first, over the normalized code.
pub const DEFAULT_THERMISTOR_COEFFS: [f32; 4] =
    [363.939_1, -462.153_7, 307.551_3, -27.725_695];

/// Auxiliary analog channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalogConfig {
    /// Bus voltage divider ratio.
    pub vbus_divider_ratio: f32,
    /// Number of GPIO analog inputs at the head of the aux DMA sequence.
    pub gpio_channels: usize,
    /// Number of input-capture channels snapshotted at each trough.
    pub capture_channels: usize,
    /// FET thermistor polynomial coefficients, highest order first.
    pub thermistor_coeffs: heapless::Vec<f32, MAX_POLY_COEFFS>,
}

impl Default for AnalogConfig {
    fn default() -> Self {
        Self {
            vbus_divider_ratio: 19.0,
            gpio_channels: 5,
            capture_channels: 4,
            thermistor_coeffs: DEFAULT_THERMISTOR_COEFFS.iter().copied().collect(),
        }
    }
}

/// Brake-resistor actuator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrakeConfig {
    /// Whether the brake resistor is fitted and may be driven.
    pub enabled: bool,
    /// Brake resistance [Ω].
    pub resistance: f32,
    /// Duty ceiling (leaves time for the low-side bootstrap).
    pub max_duty: f32,
}

impl Default for BrakeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            resistance: 2.0,
            max_duty: 0.95,
        }
    }
}

/// One power stage: its timer, sample slot and current-sense calibration.
///
/// # TOML Example
///
/// ```toml
/// [[axes]]
/// timer = "pwm0"
/// sample_slot = "injected"
/// trigger_offset_ticks = 1749
/// shunt_resistance = 0.0005
/// phase_current_rev_gain = 0.025
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    /// PWM timer driving this power stage.
    pub timer: TimerId,
    /// Result register holding this axis' phase samples on ADC2/ADC3.
    pub sample_slot: AdcSlot,
    /// Phase offset of this axis' ADC trigger relative to the shared timestamp.
    pub trigger_offset_ticks: u32,
    /// Shunt resistance [Ω].
    pub shunt_resistance: f32,
    /// Reciprocal of the current-sense amplifier gain [1/(V/V)].
    pub phase_current_rev_gain: f32,
}

impl AxisConfig {
    /// Shunt conductance [S].
    #[inline]
    pub fn shunt_conductance(&self) -> f32 {
        1.0 / self.shunt_resistance
    }
}

/// Reference-board axes: stage 0 leads stage 1 by a quarter carrier period.
pub fn default_axes() -> [AxisConfig; AXIS_COUNT] {
    let timing = TimingConfig::default();
    [
        AxisConfig {
            timer: TimerId::Pwm0,
            sample_slot: AdcSlot::Injected,
            trigger_offset_ticks: timing.period_ticks / 2 - 1,
            shunt_resistance: 0.0005,
            phase_current_rev_gain: 1.0 / 40.0,
        },
        AxisConfig {
            timer: TimerId::Pwm1,
            sample_slot: AdcSlot::Regular,
            trigger_offset_ticks: 0,
            shunt_resistance: 0.0005,
            phase_current_rev_gain: 1.0 / 40.0,
        },
    ]
}

/// Complete sampling-core configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,
    /// Carrier timing.
    #[serde(default)]
    pub timing: TimingConfig,
    /// Current sensing.
    #[serde(default)]
    pub current_sense: CurrentSenseConfig,
    /// Aux channels.
    #[serde(default)]
    pub analog: AnalogConfig,
    /// Brake resistor.
    #[serde(default)]
    pub brake: BrakeConfig,
    /// Power stages.
    #[serde(default = "default_axes")]
    pub axes: [AxisConfig; AXIS_COUNT],
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            timing: TimingConfig::default(),
            current_sense: CurrentSenseConfig::default(),
            analog: AnalogConfig::default(),
            brake: BrakeConfig::default(),
            axes: default_axes(),
        }
    }
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(msg.into())
}

/// Finite and strictly positive. NaN fails.
#[inline]
fn positive(x: f32) -> bool {
    x.is_finite() && x > 0.0
}

impl SamplerConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` describing the first violated bound.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.timing;
        if t.period_ticks < 2 || t.period_ticks > u16::MAX as u32 {
            return Err(invalid(format!(
                "timing.period_ticks must be in 2..={}, got {}",
                u16::MAX,
                t.period_ticks
            )));
        }
        let half_period = t
            .repetition_counter
            .checked_add(1)
            .and_then(|n| t.period_ticks.checked_mul(n));
        if half_period.is_none() {
            return Err(invalid("timing.repetition_counter overflows the half period"));
        }
        if t.calibration_wait_max_polls == 0 {
            return Err(invalid("timing.calibration_wait_max_polls must be > 0"));
        }

        let cs = &self.current_sense;
        if cs.adc_full_scale < 2 || cs.adc_full_scale > u16::MAX as u32 + 1 {
            return Err(invalid(format!(
                "current_sense.adc_full_scale out of range: {}",
                cs.adc_full_scale
            )));
        }
        if !positive(cs.adc_max_voltage) {
            return Err(invalid("current_sense.adc_max_voltage must be > 0"));
        }
        if !(0.0 <= cs.linear_min_volt
            && cs.linear_min_volt < cs.linear_max_volt
            && cs.linear_max_volt <= cs.adc_max_voltage)
        {
            return Err(invalid(format!(
                "current_sense linear range {}..{} V must lie inside 0..{} V",
                cs.linear_min_volt, cs.linear_max_volt, cs.adc_max_voltage
            )));
        }
        let mid = cs.linear_min_volt.midpoint(cs.linear_max_volt);
        if (mid - cs.adc_max_voltage / 2.0).abs() > 0.5 * (cs.linear_max_volt - cs.linear_min_volt)
        {
            return Err(invalid("current_sense linear range does not contain half scale"));
        }

        let a = &self.analog;
        if !positive(a.vbus_divider_ratio) {
            return Err(invalid("analog.vbus_divider_ratio must be > 0"));
        }
        if a.gpio_channels > MAX_GPIO_ADC_CHANNELS {
            return Err(invalid(format!(
                "analog.gpio_channels {} exceeds {}",
                a.gpio_channels, MAX_GPIO_ADC_CHANNELS
            )));
        }
        if a.capture_channels > MAX_CAPTURE_CHANNELS {
            return Err(invalid(format!(
                "analog.capture_channels {} exceeds {}",
                a.capture_channels, MAX_CAPTURE_CHANNELS
            )));
        }
        if a.thermistor_coeffs.is_empty() {
            return Err(invalid("analog.thermistor_coeffs cannot be empty"));
        }
        if !a.thermistor_coeffs.iter().all(|c| c.is_finite()) {
            return Err(invalid("analog.thermistor_coeffs must be finite"));
        }

        let b = &self.brake;
        if !positive(b.resistance) {
            return Err(invalid("brake.resistance must be > 0"));
        }
        if !(0.0..=1.0).contains(&b.max_duty) {
            return Err(invalid("brake.max_duty must be in 0..=1"));
        }

        let half = t.half_period_ticks();
        for (i, ax) in self.axes.iter().enumerate() {
            if ax.timer == TimerId::Loop {
                return Err(invalid(format!("axes[{i}].timer cannot be the loop counter")));
            }
            if ax.trigger_offset_ticks >= half {
                return Err(invalid(format!(
                    "axes[{i}].trigger_offset_ticks {} must be < half period {half}",
                    ax.trigger_offset_ticks
                )));
            }
            if !positive(ax.shunt_resistance) {
                return Err(invalid(format!("axes[{i}].shunt_resistance must be > 0")));
            }
            if !positive(ax.phase_current_rev_gain) {
                return Err(invalid(format!("axes[{i}].phase_current_rev_gain must be > 0")));
            }
        }
        if self.axes[0].timer == self.axes[1].timer {
            return Err(invalid("axes must use distinct PWM timers"));
        }
        if self.axes[0].sample_slot == self.axes[1].sample_slot {
            return Err(invalid("axes must use distinct ADC sample slots"));
        }
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// This trait provides a default implementation that works with any type
/// implementing `serde::de::DeserializeOwned`.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
