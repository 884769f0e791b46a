//! Carrier time model.
//!
//! The `CarrierModel` tracks simulated time in timer ticks, the next
//! update event of the triangular carrier and the counter-direction flag.
//! Dispatch stages consume time through a `StageCosts` table.

use ferro_common::hal::types::{DispatchStage, TimerId};
use std::cell::Cell;

/// Execution cost of each dispatch stage [timer ticks].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageCosts {
    costs: [u64; DispatchStage::COUNT],
}

impl StageCosts {
    /// All stages free.
    pub const fn zero() -> Self {
        Self {
            costs: [0; DispatchStage::COUNT],
        }
    }

    /// Cost of a stage.
    #[inline]
    pub const fn get(&self, stage: DispatchStage) -> u64 {
        self.costs[stage.index()]
    }

    /// Builder-style cost override.
    pub const fn with(mut self, stage: DispatchStage, ticks: u64) -> Self {
        self.costs[stage.index()] = ticks;
        self
    }

    /// Worst-case cost of one dispatch excluding the calibration wait.
    pub fn busy_total(&self) -> u64 {
        DispatchStage::ALL
            .iter()
            .filter(|s| **s != DispatchStage::CalibrationPoll)
            .map(|s| self.get(*s))
            .sum()
    }
}

impl Default for StageCosts {
    /// Costs of the reference firmware at 168 MHz, scaled to timer ticks.
    fn default() -> Self {
        Self::zero()
            .with(DispatchStage::Fetch, 40)
            .with(DispatchStage::AuxConvert, 60)
            .with(DispatchStage::CurrentMeasured, 80)
            .with(DispatchStage::ControlLoop, 1500)
            .with(DispatchStage::CalibrationPoll, 10)
            .with(DispatchStage::Calibration, 80)
            .with(DispatchStage::PwmUpdate, 200)
            .with(DispatchStage::BrakeUpdate, 30)
    }
}

/// Triangular carrier state.
#[derive(Debug)]
pub(crate) struct CarrierModel {
    half_period: u64,
    now: Cell<u64>,
    next_update: Cell<u64>,
    counting_down: Cell<bool>,
    update_flag: Cell<bool>,
    update_irq_enabled: Cell<bool>,
    control_pending: Cell<bool>,
    events: Cell<u64>,
    running: Cell<bool>,
    initial_counts: Cell<[Option<u32>; 3]>,
}

const fn timer_slot(timer: TimerId) -> usize {
    match timer {
        TimerId::Pwm0 => 0,
        TimerId::Pwm1 => 1,
        TimerId::Loop => 2,
    }
}

impl CarrierModel {
    pub(crate) fn new(half_period: u32) -> Self {
        Self {
            half_period: u64::from(half_period),
            now: Cell::new(0),
            next_update: Cell::new(0),
            counting_down: Cell::new(false),
            update_flag: Cell::new(false),
            update_irq_enabled: Cell::new(false),
            control_pending: Cell::new(false),
            events: Cell::new(0),
            running: Cell::new(false),
            initial_counts: Cell::new([None; 3]),
        }
    }

    #[inline]
    pub(crate) fn now(&self) -> u64 {
        self.now.get()
    }

    #[inline]
    pub(crate) fn elapse(&self, ticks: u64) {
        self.now.set(self.now.get() + ticks);
    }

    #[inline]
    pub(crate) fn update_due(&self) -> bool {
        self.running.get() && self.now.get() >= self.next_update.get()
    }

    pub(crate) fn advance_to_next_update(&self) {
        if self.running.get() && self.now.get() < self.next_update.get() {
            self.now.set(self.next_update.get());
        }
    }

    /// Start the triplet. Returns false if it was already running.
    pub(crate) fn start(&self, timers: &[(TimerId, u32)]) -> bool {
        if self.running.get() {
            return false;
        }
        let mut counts = [None; 3];
        for (timer, count) in timers {
            counts[timer_slot(*timer)] = Some(*count);
        }
        self.initial_counts.set(counts);
        self.running.set(true);
        self.next_update.set(self.now.get() + self.half_period);
        true
    }

    /// Produce the next update event. `flip` is false for an injected
    /// direction glitch. Returns the 1-based event index.
    pub(crate) fn fire(&self, flip: bool) -> u64 {
        let index = self.events.get() + 1;
        self.events.set(index);
        if flip {
            self.counting_down.set(!self.counting_down.get());
        }
        self.update_flag.set(true);
        self.next_update.set(self.next_update.get() + self.half_period);
        index
    }

    #[inline]
    pub(crate) fn counting_down(&self) -> bool {
        self.counting_down.get()
    }

    #[inline]
    pub(crate) fn next_event_index(&self) -> u64 {
        self.events.get() + 1
    }

    pub(crate) fn events(&self) -> u64 {
        self.events.get()
    }

    pub(crate) fn running(&self) -> bool {
        self.running.get()
    }

    pub(crate) fn initial_count(&self, timer: TimerId) -> Option<u32> {
        self.initial_counts.get()[timer_slot(timer)]
    }

    pub(crate) fn set_update_flag(&self, pending: bool) {
        self.update_flag.set(pending);
    }

    pub(crate) fn update_flag(&self) -> bool {
        self.update_flag.get()
    }

    pub(crate) fn enable_update_irq(&self) {
        self.update_irq_enabled.set(true);
    }

    pub(crate) fn update_irq_enabled(&self) -> bool {
        self.update_irq_enabled.get()
    }

    pub(crate) fn pend_control(&self) {
        self.control_pending.set(true);
    }

    pub(crate) fn take_control(&self) -> bool {
        self.control_pending.replace(false)
    }

    pub(crate) fn control_pending(&self) -> bool {
        self.control_pending.get()
    }
}
