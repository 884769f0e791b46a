//! Fault injection for the simulated board.

use ferro_common::consts::ADC_UNIT_COUNT;
use ferro_common::hal::types::{AdcUnit, DispatchStage};
use std::cell::{Cell, RefCell};
use tracing::debug;

/// Armed faults. Each one is consumed by the event it perturbs.
#[derive(Debug, Default)]
pub(crate) struct FaultPlan {
    /// 1-based update events whose direction flip is suppressed.
    glitches: RefCell<Vec<u64>>,
    /// Remaining true-current windows for which a unit stays incomplete.
    held: [Cell<u32>; ADC_UNIT_COUNT],
    /// Remaining aux transfers that never complete.
    dma_stalls: Cell<u32>,
    /// One-shot extra cost per dispatch stage.
    delays: [Cell<u64>; DispatchStage::COUNT],
}

impl FaultPlan {
    pub(crate) fn glitch_at(&self, event: u64) {
        debug!(event, "Direction glitch armed");
        self.glitches.borrow_mut().push(event);
    }

    /// Returns true (and disarms the glitch) if `event` must keep the direction.
    pub(crate) fn take_glitch(&self, event: u64) -> bool {
        let mut glitches = self.glitches.borrow_mut();
        match glitches.iter().position(|e| *e == event) {
            Some(pos) => {
                glitches.swap_remove(pos);
                true
            }
            None => false,
        }
    }

    pub(crate) fn hold(&self, unit: AdcUnit, windows: u32) {
        debug!(?unit, windows, "ADC hold armed");
        let cell = &self.held[unit.index()];
        cell.set(cell.get() + windows);
    }

    /// Consume one held window for `unit`.
    pub(crate) fn take_hold(&self, unit: AdcUnit) -> bool {
        let cell = &self.held[unit.index()];
        match cell.get() {
            0 => false,
            n => {
                cell.set(n - 1);
                true
            }
        }
    }

    pub(crate) fn stall_dma(&self, transfers: u32) {
        self.dma_stalls.set(self.dma_stalls.get() + transfers);
    }

    pub(crate) fn take_dma_stall(&self) -> bool {
        match self.dma_stalls.get() {
            0 => false,
            n => {
                self.dma_stalls.set(n - 1);
                true
            }
        }
    }

    pub(crate) fn delay(&self, stage: DispatchStage, ticks: u64) {
        debug!(?stage, ticks, "Stage delay armed");
        let cell = &self.delays[stage.index()];
        cell.set(cell.get() + ticks);
    }

    pub(crate) fn take_delay(&self, stage: DispatchStage) -> u64 {
        self.delays[stage.index()].replace(0)
    }
}
