//! Simulated ADC units and aux DMA stream.
//!
//! ADC1 converts the bus voltage into its injected register, ADC2 and ADC3
//! convert phase B and phase C of both axes. Each axis owns one result slot
//! on ADC2/ADC3 (injected or regular), so one window raises EOC and JEOC on
//! both phase units.

use super::faults::FaultPlan;
use ferro_common::consts::{ADC_UNIT_COUNT, AXIS_COUNT, MAX_AUX_CHANNELS};
use ferro_common::hal::types::{AdcSlot, AdcStatus, AdcUnit};
use std::cell::{Cell, RefCell};

/// Which sampling window a conversion belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleWindow {
    /// Trough-triggered window: true phase currents.
    TrueCurrent,
    /// Peak-triggered window: zero-vector samples for offset calibration.
    Calibration,
}

impl SampleWindow {
    const fn index(self) -> usize {
        match self {
            SampleWindow::TrueCurrent => 0,
            SampleWindow::Calibration => 1,
        }
    }
}

const fn slot_index(slot: AdcSlot) -> usize {
    match slot {
        AdcSlot::Injected => 0,
        AdcSlot::Regular => 1,
    }
}

#[derive(Debug)]
pub(crate) struct AdcBank {
    status: [Cell<AdcStatus>; ADC_UNIT_COUNT],
    results: [[Cell<u16>; 2]; ADC_UNIT_COUNT],
    slots: [AdcSlot; AXIS_COUNT],
    /// `[window][axis] -> [phase B, phase C]`
    phase_codes: [[Cell<[u16; 2]>; AXIS_COUNT]; 2],
    vbus_code: Cell<u16>,
    aux: RefCell<heapless::Vec<u16, MAX_AUX_CHANNELS>>,
    aux_complete: Cell<bool>,
    triggers: Cell<bool>,
}

impl AdcBank {
    pub(crate) fn new(slots: [AdcSlot; AXIS_COUNT], idle_code: u16, vbus_code: u16) -> Self {
        Self {
            status: Default::default(),
            results: Default::default(),
            slots,
            phase_codes: std::array::from_fn(|_| {
                std::array::from_fn(|_| Cell::new([idle_code; 2]))
            }),
            vbus_code: Cell::new(vbus_code),
            aux: RefCell::new(heapless::Vec::new()),
            aux_complete: Cell::new(false),
            triggers: Cell::new(false),
        }
    }

    pub(crate) fn set_triggers(&self, enabled: bool) {
        self.triggers.set(enabled);
    }

    pub(crate) fn triggers(&self) -> bool {
        self.triggers.get()
    }

    pub(crate) fn set_phase_codes(&self, window: SampleWindow, axis: usize, codes: [u16; 2]) {
        self.phase_codes[window.index()][axis].set(codes);
    }

    pub(crate) fn set_vbus_code(&self, code: u16) {
        self.vbus_code.set(code);
    }

    pub(crate) fn set_aux(&self, samples: &[u16]) -> Result<(), usize> {
        let mut aux = self.aux.borrow_mut();
        aux.clear();
        aux.extend_from_slice(samples).map_err(|_| MAX_AUX_CHANNELS)
    }

    pub(crate) fn status(&self, unit: AdcUnit) -> AdcStatus {
        self.status[unit.index()].get()
    }

    pub(crate) fn clear(&self, unit: AdcUnit, flags: AdcStatus) {
        let cell = &self.status[unit.index()];
        cell.set(cell.get().difference(flags));
    }

    pub(crate) fn sample(&self, unit: AdcUnit, slot: AdcSlot) -> u16 {
        self.results[unit.index()][slot_index(slot)].get()
    }

    pub(crate) fn aux_complete(&self) -> bool {
        self.aux_complete.get()
    }

    pub(crate) fn clear_aux_complete(&self) {
        self.aux_complete.set(false);
    }

    pub(crate) fn aux_sample(&self, index: usize) -> u16 {
        self.aux.borrow().get(index).copied().unwrap_or(0)
    }

    /// Run one triggered conversion window.
    pub(crate) fn convert(&self, window: SampleWindow, faults: &FaultPlan) {
        if !self.triggers.get() {
            return;
        }
        let true_current = window == SampleWindow::TrueCurrent;
        for unit in AdcUnit::ALL {
            if true_current && faults.take_hold(unit) {
                continue;
            }
            match unit {
                AdcUnit::Adc1 => self.land(unit, AdcSlot::Injected, self.vbus_code.get()),
                AdcUnit::Adc2 | AdcUnit::Adc3 => {
                    let phase = if unit == AdcUnit::Adc2 { 0 } else { 1 };
                    for (axis, slot) in self.slots.iter().enumerate() {
                        let code = self.phase_codes[window.index()][axis].get()[phase];
                        self.land(unit, *slot, code);
                    }
                }
            }
        }
        if true_current && !faults.take_dma_stall() {
            self.aux_complete.set(true);
        }
    }

    fn land(&self, unit: AdcUnit, slot: AdcSlot, code: u16) {
        let cell = &self.status[unit.index()];
        let mut status = cell.get();
        let flag = slot.completion_flag();
        if slot == AdcSlot::Regular && status.contains(flag) {
            status |= AdcStatus::OVR;
        }
        status |= flag;
        cell.set(status);
        self.results[unit.index()][slot_index(slot)].set(code);
    }
}
