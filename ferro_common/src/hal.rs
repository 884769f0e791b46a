//! Hardware abstraction layer types and traits.
//!
//! The interrupt handlers never touch registers directly; they go through the
//! traits in [`driver`] so the same pipeline runs against silicon or against
//! the simulation driver in `ferro_hal`.

pub mod driver;
pub mod types;
