//! Board driver implementations.
//!
//! This module contains all driver implementations:
//!
//! - [`simulation`] - Simulated board for development and testing
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement `CarrierTimer`, `SamplingHardware` and `TimerSync` from
//!    `ferro_common::hal::driver`
//! 3. Add export and documentation

pub mod simulation;
