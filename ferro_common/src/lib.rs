//! Ferro Common Library
//!
//! Shared definitions for all Ferro workspace crates: the sampling core
//! (`ferro_sampler`) and the hardware drivers (`ferro_hal`).
//!
//! # Module Structure
//!
//! - [`consts`] - Compile-time limits and ADC constants
//! - [`error`] - Sticky per-axis error flags
//! - [`config`] - TOML configuration types, loader and validation
//! - [`hal`] - Hardware abstraction traits consumed by the interrupt handlers
//! - [`prelude`] - Common re-exports for convenience

pub mod config;
pub mod consts;
pub mod error;
pub mod hal;
pub mod prelude;
