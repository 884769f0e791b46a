//! Carrier phase tracking.
//!
//! The `PhaseClock` holds the monotonic timestamp and the last observed
//! counter direction. Only the half-cycle handler writes either value; the
//! dispatch handler reads the timestamp.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Carrier half-cycle that just started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarrierDirection {
    /// Counter finished counting down (trough): sampling and dispatch.
    Rising,
    /// Counter finished counting up (peak): neutral compare.
    Falling,
}

impl CarrierDirection {
    /// Decode the hardware counter-direction flag.
    #[inline]
    pub const fn from_counting_down(counting_down: bool) -> Self {
        if counting_down {
            CarrierDirection::Falling
        } else {
            CarrierDirection::Rising
        }
    }
}

/// Monotonic half-cycle timestamp and direction tracker.
#[derive(Debug)]
pub struct PhaseClock {
    half_period_ticks: u32,
    timestamp: AtomicU32,
    counting_down: AtomicBool,
}

impl PhaseClock {
    /// New clock at timestamp 0 that last saw the counter counting up.
    pub const fn new(half_period_ticks: u32) -> Self {
        Self {
            half_period_ticks,
            timestamp: AtomicU32::new(0),
            counting_down: AtomicBool::new(false),
        }
    }

    /// Ticks added per half-cycle.
    #[inline]
    pub const fn half_period_ticks(&self) -> u32 {
        self.half_period_ticks
    }

    /// Current timestamp.
    #[inline]
    pub fn now(&self) -> u32 {
        self.timestamp.load(Ordering::Acquire)
    }

    /// Add one half period (wrapping) and return the new timestamp.
    ///
    /// Single writer: the half-cycle handler.
    #[inline]
    pub fn advance(&self) -> u32 {
        let next = self
            .timestamp
            .load(Ordering::Relaxed)
            .wrapping_add(self.half_period_ticks);
        self.timestamp.store(next, Ordering::Release);
        next
    }

    /// Store the observed direction. Returns false if it did not change.
    #[inline]
    pub fn direction_changed(&self, counting_down: bool) -> bool {
        self.counting_down.swap(counting_down, Ordering::AcqRel) != counting_down
    }
}
