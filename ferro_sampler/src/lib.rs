//! # Ferro Sampler Library
//!
//! Interrupt-driven sampling-and-dispatch core of a dual-axis motor
//! controller. Turns phase-locked timer and ADC events into calibrated
//! phase-current measurements and runs a fixed-rate control computation
//! inside a hard one-period budget.
//!
//! ## Priority Levels
//!
//! 1. **Half-cycle handler** ([`half_cycle`]): every carrier update event.
//!    Direction check, timestamp advance, trough sampling / peak neutral duty.
//! 2. **Control dispatch** ([`dispatch`]): once per PWM period, pended by the
//!    trough. Measure, control, calibrate, actuate, check the deadline.
//!
//! ## Fail-Safe
//!
//! Faults are latched per axis ([`axis::ErrorLatch`]) and disarm the axis;
//! they never change the pipeline cadence and are only cleared by the
//! supervisor.
//!
//! ## Zero-Allocation Handlers
//!
//! Handler state is built once from [`ferro_common::config::SamplerConfig`].
//! Per-channel buffers are fixed-capacity `heapless` vectors.

pub mod analog;
pub mod axis;
pub mod brake;
pub mod clock;
pub mod config;
pub mod current;
pub mod dispatch;
pub mod half_cycle;
pub mod hooks;
pub mod rt;
pub mod runner;
pub mod telemetry;
pub mod timers;

pub use crate::axis::{AxisState, ErrorLatch, SharedState};
pub use crate::current::PhaseCurrents;
pub use crate::dispatch::{ControlDispatch, PeriodReport};
pub use crate::half_cycle::{HalfCycleEvent, HalfCycleHandler};
pub use crate::hooks::{ControlHooks, SamplingHook};
pub use crate::runner::{DispatchStats, InterruptRunner, RunnerError};
