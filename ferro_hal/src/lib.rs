//! # Ferro HAL Library
//!
//! Board drivers for the Ferro sampling core. Drivers implement the register
//! traits defined in `ferro_common::hal::driver`.
//!
//! # Module Structure
//!
//! - [`drivers`] - Driver implementations
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     ferro_sampler                            │
//! │   HalfCycleHandler ──► CarrierTimer                          │
//! │   ControlDispatch  ──► SamplingHardware                      │
//! │   start_timers     ──► TimerSync                             │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                ▼
//!                     ┌────────────────────┐
//!                     │  SimBoard          │ (+ SimulatedCarrier)
//!                     └────────────────────┘
//! ```

#![warn(missing_docs)]

pub mod drivers;

// Re-export key types for convenience
pub use crate::drivers::simulation::{SampleWindow, SimBoard, StageCosts};
