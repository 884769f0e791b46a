//! High-priority half-cycle handler.
//!
//! Runs on every carrier update event (trough and peak). It owns the phase
//! clock: direction check first, then timestamp advance. Troughs start the
//! sampling window and pend the dispatch handler; peaks park every power
//! stage at 50% duty until `pwm_update` writes fresh values.

use ferro_common::config::SamplerConfig;
use ferro_common::consts::{AXIS_COUNT, MAX_CAPTURE_CHANNELS};
use ferro_common::error::AxisError;
use ferro_common::hal::driver::CarrierTimer;
use ferro_common::hal::types::TimerId;

use crate::axis::SharedState;
use crate::clock::CarrierDirection;
use crate::hooks::SamplingHook;

/// Outcome of one handler invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalfCycleEvent {
    /// Trough: sampling ran and the dispatch handler was pended.
    Trough {
        /// Timestamp after the advance.
        timestamp: u32,
    },
    /// Peak: neutral compare written.
    Peak {
        /// Timestamp after the advance.
        timestamp: u32,
    },
    /// Direction did not alternate; both axes disarmed, nothing else done.
    Missed,
}

/// Half-cycle handler state: static config plus the input-capture snapshot.
#[derive(Debug)]
pub struct HalfCycleHandler {
    neutral_compare: u16,
    timers: [TimerId; AXIS_COUNT],
    capture_channels: usize,
    captures: heapless::Vec<u32, MAX_CAPTURE_CHANNELS>,
}

impl HalfCycleHandler {
    /// Build from configuration.
    pub fn from_config(config: &SamplerConfig) -> Self {
        Self {
            neutral_compare: config.timing.neutral_compare(),
            timers: config.axes.map(|a| a.timer),
            capture_channels: config.analog.capture_channels.min(MAX_CAPTURE_CHANNELS),
            captures: heapless::Vec::new(),
        }
    }

    /// Input-capture values latched at the last trough.
    pub fn captures(&self) -> &[u32] {
        &self.captures
    }

    /// Handle one carrier update event.
    pub fn on_update<T, S>(&mut self, hw: &T, shared: &SharedState, hook: &mut S) -> HalfCycleEvent
    where
        T: CarrierTimer + ?Sized,
        S: SamplingHook + ?Sized,
    {
        hw.ack_update();

        let counting_down = hw.counting_down();
        if !shared.clock.direction_changed(counting_down) {
            shared.disarm_all(AxisError::TIMER_UPDATE_MISSED, |axis, err| {
                hook.disarm_with_error(axis, err)
            });
            return HalfCycleEvent::Missed;
        }

        let timestamp = shared.clock.advance();

        match CarrierDirection::from_counting_down(counting_down) {
            CarrierDirection::Rising => {
                self.captures.clear();
                for ch in 0..self.capture_channels {
                    let pushed = self.captures.push(hw.input_capture(ch));
                    debug_assert!(pushed.is_ok(), "capture_channels clamped in from_config");
                }
                shared.task_timer.latch();
                hook.sampling();
                hw.pend_control_interrupt();
                HalfCycleEvent::Trough { timestamp }
            }
            CarrierDirection::Falling => {
                let neutral = [self.neutral_compare; 3];
                for timer in self.timers {
                    hw.set_compare(timer, neutral);
                }
                HalfCycleEvent::Peak { timestamp }
            }
        }
    }
}
