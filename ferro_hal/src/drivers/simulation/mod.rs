//! Simulation driver module.
//!
//! This module provides a simulated dual-axis board for development and
//! testing without physical hardware.

mod adc;
mod board;
mod faults;
mod timing;

pub use adc::SampleWindow;
pub use board::{NOMINAL_VBUS, SimBoard};
pub use timing::StageCosts;

use ferro_common::config::SamplerConfig;

/// Factory function to create a simulated board for a configuration.
pub fn create_board(config: &SamplerConfig) -> SimBoard {
    SimBoard::from_config(config)
}
