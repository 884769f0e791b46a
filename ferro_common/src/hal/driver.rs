//! HAL driver traits and error types.
//!
//! This module defines:
//! - `HalError` enum - Error types for setup-time HAL operations
//! - `CarrierTimer` - Registers touched by the half-cycle handler
//! - `SamplingHardware` - Registers touched by the dispatch handler
//! - `TimerSync` - Synchronized timer start (setup only)
//! - `PreemptionPoint` - Where the dispatch handler may be preempted
//! - `SimulatedCarrier` - Time model implemented by simulation drivers
//!
//! All register accessors take `&self`: registers are volatile cells and both
//! priority levels hold a shared reference to the same peripheral block.

use crate::hal::types::{AdcSlot, AdcStatus, AdcUnit, DispatchStage, TimerId};
use thiserror::Error;

/// Error types for HAL operations.
///
/// Only setup paths return these; the interrupt handlers record faults in the
/// per-axis error latch instead.
#[derive(Debug, Clone, Error)]
pub enum HalError {
    /// Timer triplet could not be started
    #[error("Timer start failed: {0}")]
    TimerStart(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Carrier timer registers used by the high-priority half-cycle handler.
///
/// # Timing Contracts
///
/// | Operation | Caller | RT Constraint |
/// |-----------|--------|---------------|
/// | `ack_update()` | half-cycle entry | **HARD** |
/// | `set_compare()` | half-cycle peak, `pwm_update` callbacks | **HARD** |
/// | `pend_control_interrupt()` | half-cycle trough | **HARD** |
pub trait CarrierTimer {
    /// Clear the pending update-event flag.
    fn ack_update(&self);

    /// Hardware counter-direction flag (`true` = counting down).
    fn counting_down(&self) -> bool;

    /// Write all three compare channels of a PWM timer.
    fn set_compare(&self, timer: TimerId, values: [u16; 3]);

    /// Latest captured value of an input-capture channel.
    fn input_capture(&self, channel: usize) -> u32;

    /// Raise the software interrupt that runs the dispatch handler.
    fn pend_control_interrupt(&self);
}

/// ADC, DMA and power-stage registers used by the dispatch handler.
pub trait SamplingHardware {
    /// Current status flags of an ADC unit.
    fn adc_status(&self, unit: AdcUnit) -> AdcStatus;

    /// Clear the given status flags of an ADC unit.
    fn clear_adc_status(&self, unit: AdcUnit, flags: AdcStatus);

    /// Raw result of an ADC unit's injected or regular data register.
    fn adc_sample(&self, unit: AdcUnit, slot: AdcSlot) -> u16;

    /// Whether the aux DMA stream signalled transfer-complete.
    fn aux_transfer_complete(&self) -> bool;

    /// Clear the aux DMA transfer-complete flag.
    fn clear_aux_transfer_flag(&self);

    /// Raw aux sequence result at `index` (GPIO inputs first, then thermistors).
    fn aux_sample(&self, index: usize) -> u16;

    /// Main output enable of a PWM timer (power stage switching).
    fn outputs_enabled(&self, timer: TimerId) -> bool;

    /// Whether the gate driver of an axis is configured and ready.
    fn gate_driver_ready(&self, axis: usize) -> bool;

    /// Set the brake-resistor PWM duty. `timestamp` is the time the value
    /// is expected to take effect.
    fn set_brake_duty(&self, duty: f32, timestamp: u32);

    /// Free-running cycle counter used for task timing.
    fn cycle_counter(&self) -> u32;
}

/// Timer triplet bring-up.
///
/// # Timing
/// - No RT constraints (runs before the first update interrupt)
pub trait TimerSync {
    /// Enable or disable external ADC triggers on all units.
    fn set_adc_triggers(&self, enabled: bool);

    /// Start all timers in the same bus cycle with the given initial counts.
    ///
    /// # Errors
    /// Return `HalError::TimerStart` if a timer is already running.
    fn start_synchronously(&self, timers: &[(TimerId, u32)]) -> Result<(), HalError>;

    /// Clear any pending carrier update event.
    fn clear_update_flag(&self);

    /// Enable the carrier update interrupt.
    fn enable_update_interrupt(&self);
}

/// Point inside the dispatch handler where a higher-priority handler may run.
///
/// On silicon the interrupt controller preempts on its own, so `()` is the
/// implementation used there. Simulations fire every due high-priority event
/// to completion before returning.
pub trait PreemptionPoint {
    /// Called after `stage` has executed.
    fn checkpoint(&mut self, stage: DispatchStage);
}

impl PreemptionPoint for () {
    #[inline]
    fn checkpoint(&mut self, _stage: DispatchStage) {}
}

/// Time model of a simulated board.
pub trait SimulatedCarrier {
    /// Simulated time [timer ticks].
    fn now(&self) -> u64;

    /// Account the execution cost of a dispatch stage.
    fn elapse(&self, stage: DispatchStage);

    /// Whether the next carrier update event is due at the current time.
    fn update_due(&self) -> bool;

    /// Idle until the next carrier update event.
    fn advance_to_next_update(&self);

    /// Produce the hardware side of the next update event: flip the counter
    /// direction, trigger conversions and raise the update flag.
    fn fire_update(&self);

    /// Consume a pending dispatch software interrupt.
    fn take_control_request(&self) -> bool;
}
