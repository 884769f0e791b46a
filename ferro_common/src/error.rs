//! Error bitflag types for the sampling core.
//!
//! Errors are recorded as state, never returned from the interrupt handlers.
//! Flags are OR-accumulated into a per-axis latch and stay set until the
//! supervisory layer rearms the axis.

use bitflags::bitflags;

bitflags! {
    /// Per-axis sampling/timing error flags.
    ///
    /// DISARMING flags (→ axis disarmed): TIMER_UPDATE_MISSED, BAD_TIMING,
    /// CONTROL_DEADLINE_MISSED.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AxisError: u32 {
        /// Carrier direction did not alternate between two half-cycle entries.
        /// **DISARMING**.
        const TIMER_UPDATE_MISSED      = 0x0001;
        /// An ADC unit or the aux DMA transfer was not complete when read.
        /// **DISARMING**.
        const BAD_TIMING               = 0x0002;
        /// A phase-current code fell outside the sensor's linear range.
        const CURRENT_SENSE_SATURATION = 0x0004;
        /// The dispatch sequence did not finish within one PWM period.
        /// **DISARMING**.
        const CONTROL_DEADLINE_MISSED  = 0x0008;
    }
}

impl AxisError {
    /// Mask of all flags that disarm the axis when raised.
    pub const DISARM_MASK: Self = Self::from_bits_truncate(
        Self::TIMER_UPDATE_MISSED.bits()
            | Self::BAD_TIMING.bits()
            | Self::CONTROL_DEADLINE_MISSED.bits(),
    );

    /// Returns true if any DISARMING flag is set.
    #[inline]
    pub const fn has_disarming(&self) -> bool {
        self.intersects(Self::DISARM_MASK)
    }
}

impl Default for AxisError {
    fn default() -> Self {
        Self::empty()
    }
}
