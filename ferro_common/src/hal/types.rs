//! HAL identifier and status types.
//!
//! This module defines the register-level vocabulary shared by the handlers
//! and the drivers:
//! - `TimerId` - The synchronized timer triplet
//! - `AdcUnit` / `AdcSlot` - Converter units and result registers
//! - `AdcStatus` - Completion/overrun status flags
//! - `DispatchStage` - Preemption checkpoints inside the dispatch handler

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::consts::ADC_UNIT_COUNT;

/// One timer of the synchronized triplet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerId {
    /// Advanced PWM timer driving power stage 0.
    Pwm0,
    /// Advanced PWM timer driving power stage 1.
    Pwm1,
    /// Free-running control-loop counter, reloaded on every Pwm0 lower update.
    Loop,
}

/// ADC converter unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdcUnit {
    /// Bus voltage (injected) + aux DMA sequence (regular).
    Adc1,
    /// Phase B of both power stages.
    Adc2,
    /// Phase C of both power stages.
    Adc3,
}

impl AdcUnit {
    /// All units in register order.
    pub const ALL: [AdcUnit; ADC_UNIT_COUNT] = [AdcUnit::Adc1, AdcUnit::Adc2, AdcUnit::Adc3];

    /// Zero-based unit index.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            AdcUnit::Adc1 => 0,
            AdcUnit::Adc2 => 1,
            AdcUnit::Adc3 => 2,
        }
    }
}

/// Result register a channel is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdcSlot {
    /// Injected (priority) conversion result.
    Injected,
    /// Regular conversion result.
    Regular,
}

impl AdcSlot {
    /// Completion flag raised when a conversion lands in this slot.
    #[inline]
    pub const fn completion_flag(self) -> AdcStatus {
        match self {
            AdcSlot::Injected => AdcStatus::JEOC,
            AdcSlot::Regular => AdcStatus::EOC,
        }
    }
}

bitflags! {
    /// ADC status register flags (subset used by the sampling core).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AdcStatus: u32 {
        /// Regular channel end of conversion.
        const EOC  = 0x02;
        /// Injected channel end of conversion.
        const JEOC = 0x04;
        /// Regular result overwritten before it was read.
        const OVR  = 0x20;
    }
}

impl Default for AdcStatus {
    fn default() -> Self {
        Self::empty()
    }
}

/// Points inside the dispatch handler where a higher-priority interrupt may
/// be serviced before the handler observes shared state again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchStage {
    /// True-current window fetch (step 2).
    Fetch,
    /// Aux DMA check and conversion (step 3).
    AuxConvert,
    /// Per-axis `current_measured` callbacks (steps 4-5).
    CurrentMeasured,
    /// Top-level control callback (step 6).
    ControlLoop,
    /// One poll of the calibration-window wait (step 7).
    CalibrationPoll,
    /// Calibration-window fetch and `dc_calibration` callbacks (step 8).
    Calibration,
    /// Per-axis `pwm_update` callbacks (step 9).
    PwmUpdate,
    /// Brake-resistor update (step 10).
    BrakeUpdate,
}

impl DispatchStage {
    /// Number of stages.
    pub const COUNT: usize = 8;

    /// All stages in execution order.
    pub const ALL: [DispatchStage; Self::COUNT] = [
        DispatchStage::Fetch,
        DispatchStage::AuxConvert,
        DispatchStage::CurrentMeasured,
        DispatchStage::ControlLoop,
        DispatchStage::CalibrationPoll,
        DispatchStage::Calibration,
        DispatchStage::PwmUpdate,
        DispatchStage::BrakeUpdate,
    ];

    /// Zero-based position in [`DispatchStage::ALL`].
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}
