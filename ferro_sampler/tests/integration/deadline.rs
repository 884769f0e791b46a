//! Dispatch deadline.
//!
//! A dispatch must finish after the peak of its period and before the next
//! trough. Overrunning the trough latches `CONTROL_DEADLINE_MISSED` on both
//! axes; stages that run late but still inside the window are absorbed by
//! the calibration wait.

use ferro_common::config::SamplerConfig;
use ferro_common::error::AxisError;
use ferro_common::hal::types::DispatchStage;
use ferro_hal::SimBoard;

use super::support::{H, armed_runner, errors, unarmed_runner};

#[test]
fn overrun_past_next_trough_misses_deadline() {
    let config = SamplerConfig::default();
    let board = SimBoard::from_config(&config);
    board.inject_delay(DispatchStage::PwmUpdate, 4000);
    let mut runner = armed_runner(&board, &config);

    assert_eq!(runner.run_half_cycles(4), 1);

    // The next trough fired inside the late actuation stage.
    let report = *runner.last_report().unwrap();
    assert_eq!(report.reference, 2 * H);
    assert_eq!(report.end_timestamp, 4 * H);
    assert!(!report.deadline_met);
    assert!(board.control_pending());

    assert_eq!(errors(&runner), [AxisError::CONTROL_DEADLINE_MISSED; 2]);
    assert_eq!(
        runner.hooks().disarms,
        vec![
            (0, AxisError::CONTROL_DEADLINE_MISSED),
            (1, AxisError::CONTROL_DEADLINE_MISSED)
        ]
    );
    assert_eq!(runner.stats().deadline_misses, 1);

    // The delayed request runs as soon as the late dispatch returns.
    runner.run_half_cycles(6);
    let report = *runner.last_report().unwrap();
    assert!(report.deadline_met);
    assert_eq!(runner.stats().deadline_misses, 1);
    assert_eq!(runner.stats().bad_windows, 0);
    assert_eq!(
        runner.stats().max_latency_ticks,
        board.stage_costs().get(DispatchStage::BrakeUpdate)
    );
}

#[test]
fn overrun_is_detected_when_run_ends_inside_dispatch() {
    let config = SamplerConfig::default();
    let board = SimBoard::from_config(&config);
    board.inject_delay(DispatchStage::PwmUpdate, 4000);
    let mut runner = armed_runner(&board, &config);

    // The budget runs out while the dispatch is still in its actuation
    // stage; the trough it overlaps fires anyway.
    assert_eq!(runner.run_half_cycles(3), 1);
    assert_eq!(runner.events_fired(), 4);

    let report = *runner.last_report().unwrap();
    assert_eq!(report.reference, 2 * H);
    assert_eq!(report.end_timestamp, 4 * H);
    assert!(!report.deadline_met);
    assert_eq!(errors(&runner), [AxisError::CONTROL_DEADLINE_MISSED; 2]);
    assert_eq!(runner.stats().deadline_misses, 1);
    assert!(board.control_pending());

    // The request pended by that trough runs in the next chunk.
    assert_eq!(runner.run_half_cycles(1), 1);
    let report = *runner.last_report().unwrap();
    assert_eq!(report.reference, 4 * H);
    assert!(report.deadline_met);
    assert_eq!(runner.stats().deadline_misses, 1);
}

#[test]
fn late_control_loop_is_absorbed_by_calibration_wait() {
    let config = SamplerConfig::default();
    let board = SimBoard::from_config(&config);
    // Control ends past the peak, still well before the next trough.
    board.inject_delay(DispatchStage::ControlLoop, 2500);
    let mut runner = armed_runner(&board, &config);

    assert_eq!(runner.run_half_cycles(4), 1);

    let report = *runner.last_report().unwrap();
    assert!(report.deadline_met);
    assert_eq!(report.calibration_polls, 0);
    assert!(report.calibration_read);
    assert!(errors(&runner).iter().all(|e| e.is_empty()));
}

#[test]
fn deadline_miss_is_latched_while_disarmed() {
    let config = SamplerConfig::default();
    let board = SimBoard::from_config(&config);
    let mut runner = unarmed_runner(&board, &config);
    board.inject_delay(DispatchStage::Calibration, 4000);

    runner.run_half_cycles(4);

    // Axes were never armed: the error is still recorded.
    for axis in &runner.shared().axes {
        assert!(!axis.is_armed());
        assert_eq!(axis.error(), AxisError::CONTROL_DEADLINE_MISSED);
    }
}
