//! System-wide constants for the Ferro workspace.
//!
//! Single source of truth for buffer capacities and default paths.
//! Imported by all crates; no duplication permitted.

use static_assertions::const_assert;

/// Number of power stages driven by one board.
pub const AXIS_COUNT: usize = 2;

/// Number of ADC units taking part in a sampling window.
pub const ADC_UNIT_COUNT: usize = 3;

/// Default ADC resolution [bits].
pub const ADC_BITS: u32 = 12;

/// Default ADC full-scale code count (2^12).
pub const ADC_FULL_SCALE: u32 = 1 << ADC_BITS;

/// Maximum number of general-purpose analog inputs sampled by the aux DMA sequence.
pub const MAX_GPIO_ADC_CHANNELS: usize = 8;

/// Maximum aux DMA sequence length: GPIO inputs + one FET thermistor per axis.
pub const MAX_AUX_CHANNELS: usize = MAX_GPIO_ADC_CHANNELS + AXIS_COUNT;

/// Maximum number of input-capture channels snapshotted at each trough.
pub const MAX_CAPTURE_CHANNELS: usize = 8;

/// Maximum number of thermistor polynomial coefficients.
pub const MAX_POLY_COEFFS: usize = 8;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/sampler.toml";

const_assert!(AXIS_COUNT == 2);
const_assert!(MAX_AUX_CHANNELS <= 16);
const_assert!(ADC_FULL_SCALE <= u16::MAX as u32 + 1);
