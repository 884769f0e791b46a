//! Auxiliary analog channels: GPIO inputs, FET thermistors and bus voltage.

use ferro_common::config::SamplerConfig;
use ferro_common::consts::{AXIS_COUNT, MAX_GPIO_ADC_CHANNELS, MAX_POLY_COEFFS};
use ferro_common::hal::driver::SamplingHardware;

/// Evaluate a polynomial, coefficients highest order first.
#[inline]
pub fn horner(coeffs: &[f32], x: f32) -> f32 {
    coeffs.iter().fold(0.0, |acc, c| acc * x + c)
}

/// Converted aux DMA sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuxReadings {
    /// Normalized GPIO analog inputs (0..1).
    pub gpio: heapless::Vec<f32, MAX_GPIO_ADC_CHANNELS>,
    /// FET temperature per axis [°C].
    pub fet_temperature: [f32; AXIS_COUNT],
}

/// Scaling for every non-phase analog input.
#[derive(Debug, Clone)]
pub struct AnalogFrontEnd {
    gpio_channels: usize,
    full_scale: f32,
    vbus_volts_per_code: f32,
    thermistor: heapless::Vec<f32, MAX_POLY_COEFFS>,
}

impl AnalogFrontEnd {
    /// Build from configuration.
    pub fn from_config(config: &SamplerConfig) -> Self {
        let full_scale = config.current_sense.adc_full_scale as f32;
        Self {
            gpio_channels: config.analog.gpio_channels.min(MAX_GPIO_ADC_CHANNELS),
            full_scale,
            vbus_volts_per_code: config.current_sense.adc_max_voltage
                * config.analog.vbus_divider_ratio
                / full_scale,
            thermistor: config.analog.thermistor_coeffs.clone(),
        }
    }

    /// Raw code as a fraction of full scale.
    #[inline]
    pub fn normalize(&self, raw: u16) -> f32 {
        f32::from(raw) / self.full_scale
    }

    /// Bus voltage [V] from the divided ADC1 injected code.
    #[inline]
    pub fn bus_voltage(&self, raw: u16) -> f32 {
        f32::from(raw) * self.vbus_volts_per_code
    }

    /// FET temperature [°C] from a thermistor divider code.
    #[inline]
    pub fn fet_temperature(&self, raw: u16) -> f32 {
        horner(&self.thermistor, self.normalize(raw))
    }

    /// Convert the aux DMA buffer: GPIO inputs first, then one thermistor per axis.
    pub fn convert<H: SamplingHardware + ?Sized>(&self, hw: &H, out: &mut AuxReadings) {
        out.gpio.clear();
        for i in 0..self.gpio_channels {
            let pushed = out.gpio.push(self.normalize(hw.aux_sample(i)));
            debug_assert!(pushed.is_ok(), "gpio_channels clamped in from_config");
        }
        for (axis, temp) in out.fet_temperature.iter_mut().enumerate() {
            *temp = self.fet_temperature(hw.aux_sample(self.gpio_channels + axis));
        }
    }
}
