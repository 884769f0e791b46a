//! Prelude module for common re-exports.
//!
//! This module provides convenient re-exports of commonly used types
//! so that consumers can do `use ferro_common::prelude::*;` and get
//! the most important types without listing individual paths.
//!
//! # Usage
//!
//! ```rust
//! use ferro_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    AnalogConfig, AxisConfig, BrakeConfig, ConfigError, ConfigLoader, CurrentSenseConfig,
    SamplerConfig, TimingConfig,
};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{ADC_FULL_SCALE, AXIS_COUNT, MAX_AUX_CHANNELS};

// ─── Errors ─────────────────────────────────────────────────────────
pub use crate::error::AxisError;

// ─── Hardware ───────────────────────────────────────────────────────
pub use crate::hal::driver::{
    CarrierTimer, HalError, PreemptionPoint, SamplingHardware, SimulatedCarrier, TimerSync,
};
pub use crate::hal::types::{AdcSlot, AdcStatus, AdcUnit, DispatchStage, TimerId};
