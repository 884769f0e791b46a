//! Incomplete conversion windows and aux transfers.
//!
//! A window that is not complete when the dispatch reads it disarms both
//! axes with `BAD_TIMING`. The period still runs to the end: callbacks see
//! absent readings, actuation and the brake update happen as usual.

use ferro_common::config::SamplerConfig;
use ferro_common::error::AxisError;
use ferro_common::hal::types::AdcUnit;
use ferro_hal::SimBoard;

use super::support::{armed_runner, errors};

#[test]
fn held_converter_flags_bad_timing_without_stopping_actuation() {
    let config = SamplerConfig::default();
    let board = SimBoard::from_config(&config);
    let mut runner = armed_runner(&board, &config);

    // First period clean, second dispatch pending.
    assert_eq!(runner.run_half_cycles(4), 1);

    // Event 6 is the next true-current window.
    board.hold_adc(AdcUnit::Adc3, 1);
    assert_eq!(runner.run_half_cycles(4), 2);

    assert_eq!(errors(&runner), [AxisError::BAD_TIMING; 2]);
    assert_eq!(
        runner.hooks().disarms,
        vec![(0, AxisError::BAD_TIMING), (1, AxisError::BAD_TIMING)]
    );

    for axis in 0..2 {
        let measured = runner.hooks().measured_for(axis);
        assert_eq!(measured.len(), 3);
        assert!(measured[0].is_some());
        assert!(measured[1].is_some());
        assert!(measured[2].is_none());
        // The calibration window of the held period converts normally.
        assert!(runner.hooks().calibrations_for(axis).iter().all(Option::is_some));
    }

    assert_eq!(runner.hooks().pwm.len(), 6);
    assert_eq!(board.brake_writes(), 3);
    assert_eq!(runner.stats().bad_windows, 1);
    assert_eq!(runner.stats().deadline_misses, 0);

    let report = runner.last_report().unwrap();
    assert!(!report.true_current_read);
    assert!(report.calibration_read);
    assert!(report.deadline_met);
}

#[test]
fn bad_timing_clears_only_on_rearm() {
    let config = SamplerConfig::default();
    let board = SimBoard::from_config(&config);
    let mut runner = armed_runner(&board, &config);

    runner.run_half_cycles(4);
    board.hold_adc(AdcUnit::Adc2, 1);
    runner.run_half_cycles(20);
    assert_eq!(errors(&runner), [AxisError::BAD_TIMING; 2]);
    assert_eq!(runner.stats().bad_windows, 1);

    assert_eq!(runner.shared().axes[0].rearm(), AxisError::BAD_TIMING);
    runner.run_half_cycles(20);
    assert!(errors(&runner)[0].is_empty());
    assert!(runner.shared().axes[0].is_armed());
    assert!(!runner.shared().axes[1].is_armed());
}

#[test]
fn stalled_aux_transfer_flags_bad_timing() {
    let config = SamplerConfig::default();
    let board = SimBoard::from_config(&config);
    board.stall_dma(1);
    let mut runner = armed_runner(&board, &config);

    assert_eq!(runner.run_half_cycles(4), 1);

    assert_eq!(errors(&runner), [AxisError::BAD_TIMING; 2]);
    let report = *runner.last_report().unwrap();
    assert!(!report.aux_complete);
    assert!(report.true_current_read);
    assert!(report.calibration_read);

    // Phase currents are unaffected by the aux transfer.
    assert!(runner.hooks().measured.iter().all(|(_, _, c)| c.is_some()));
}

#[test]
fn calibration_wait_gives_up_after_poll_limit() {
    let mut config = SamplerConfig::default();
    config.timing.calibration_wait_max_polls = 10;
    let board = SimBoard::from_config(&config);
    let mut runner = armed_runner(&board, &config);

    assert_eq!(runner.run_half_cycles(3), 1);

    let telemetry = runner.telemetry();
    assert_eq!(telemetry.calibration_wait_timeouts, 1);
    assert_eq!(telemetry.calibration_wait_polls, 10);

    let report = *runner.last_report().unwrap();
    assert!(report.calibration_timed_out);
    assert!(!report.calibration_read);
    assert!(!report.deadline_met);

    // The window is read before the peak: incomplete, and the period ends early.
    for error in errors(&runner) {
        assert_eq!(
            error,
            AxisError::BAD_TIMING | AxisError::CONTROL_DEADLINE_MISSED
        );
    }
    assert!(runner.hooks().calibrations.iter().all(|(_, _, c)| c.is_none()));
}
