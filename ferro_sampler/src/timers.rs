//! Synchronized start of the timer triplet.

use ferro_common::config::SamplerConfig;
use ferro_common::hal::driver::{HalError, SamplingHardware, TimerSync};
use ferro_common::hal::types::{AdcStatus, AdcUnit, TimerId};
use tracing::info;

/// Start both PWM timers and the loop counter in lockstep.
///
/// Each PWM timer starts at its axis' trigger offset so the two power
/// stages sample at different carrier phases. ADC triggers are held off
/// while the counters are loaded, and any conversion flags or update event
/// raised during bring-up are discarded before the update interrupt is
/// enabled.
///
/// # Errors
/// Propagates `HalError::TimerStart` from the driver.
pub fn start_timers<B>(hw: &B, config: &SamplerConfig) -> Result<(), HalError>
where
    B: TimerSync + SamplingHardware + ?Sized,
{
    hw.set_adc_triggers(false);

    let counts = [
        (config.axes[0].timer, config.axes[0].trigger_offset_ticks),
        (config.axes[1].timer, config.axes[1].trigger_offset_ticks),
        (TimerId::Loop, 0),
    ];
    hw.start_synchronously(&counts)?;

    hw.set_adc_triggers(true);
    for unit in AdcUnit::ALL {
        hw.clear_adc_status(unit, AdcStatus::EOC | AdcStatus::JEOC | AdcStatus::OVR);
    }
    hw.clear_update_flag();
    hw.enable_update_interrupt();

    info!(
        pwm0 = counts[0].1,
        pwm1 = counts[1].1,
        half_period = config.timing.half_period_ticks(),
        "Timers started"
    );
    Ok(())
}
