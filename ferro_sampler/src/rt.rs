//! Runner thread placement.
//!
//! The emulated interrupt levels share one thread, so the only host knobs
//! that change dispatch jitter are the core it runs on and its scheduling
//! class. Both are opt-in and need the `rt` feature.

use tracing::{info, warn};

use crate::runner::RunnerError;

/// Valid `SCHED_FIFO` priorities on Linux.
pub const FIFO_PRIORITY_RANGE: std::ops::RangeInclusive<i32> = 1..=99;

/// Where and how the runner thread is scheduled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThreadPlacement {
    /// Core to pin to; `None` leaves affinity alone.
    pub cpu_core: Option<usize>,
    /// `SCHED_FIFO` priority; `None` keeps the default policy.
    pub fifo_priority: Option<i32>,
}

impl ThreadPlacement {
    /// Pin and promote the calling thread.
    ///
    /// # Errors
    /// Returns `RunnerError::ThreadPlacement` for an out-of-range priority or
    /// a failed system call.
    pub fn apply(&self) -> Result<(), RunnerError> {
        if let Some(prio) = self.fifo_priority.filter(|p| !FIFO_PRIORITY_RANGE.contains(p)) {
            return Err(RunnerError::ThreadPlacement(format!(
                "SCHED_FIFO priority {prio} outside {FIFO_PRIORITY_RANGE:?}"
            )));
        }
        if *self == Self::default() {
            return Ok(());
        }
        if !cfg!(feature = "rt") {
            warn!(placement = ?self, "Built without the rt feature, placement ignored");
            return Ok(());
        }
        if let Some(cpu) = self.cpu_core {
            pin_to_core(cpu)?;
        }
        if let Some(prio) = self.fifo_priority {
            set_fifo(prio)?;
        }
        info!(placement = ?self, "Runner thread placed");
        Ok(())
    }
}

#[cfg(feature = "rt")]
fn pin_to_core(cpu: usize) -> Result<(), RunnerError> {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| RunnerError::ThreadPlacement(format!("core {cpu}: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| RunnerError::ThreadPlacement(format!("pin to core {cpu}: {e}")))
}

#[cfg(not(feature = "rt"))]
fn pin_to_core(_cpu: usize) -> Result<(), RunnerError> {
    Ok(())
}

#[cfg(feature = "rt")]
fn set_fifo(priority: i32) -> Result<(), RunnerError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    // SAFETY: `param` outlives the call; pid 0 is the calling thread.
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(RunnerError::ThreadPlacement(format!(
            "SCHED_FIFO priority {priority}: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn set_fifo(_priority: i32) -> Result<(), RunnerError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_placement_touches_nothing() {
        assert!(ThreadPlacement::default().apply().is_ok());
    }

    #[test]
    fn priority_out_of_range_is_rejected() {
        for prio in [0, 100, -5] {
            let placement = ThreadPlacement {
                cpu_core: None,
                fifo_priority: Some(prio),
            };
            let err = placement.apply().unwrap_err();
            assert!(matches!(err, RunnerError::ThreadPlacement(_)));
            assert!(err.to_string().contains(&prio.to_string()));
        }
    }

    #[cfg(not(feature = "rt"))]
    #[test]
    fn placement_is_ignored_without_rt_feature() {
        let placement = ThreadPlacement {
            cpu_core: Some(1),
            fifo_priority: Some(80),
        };
        assert!(placement.apply().is_ok());
    }
}
