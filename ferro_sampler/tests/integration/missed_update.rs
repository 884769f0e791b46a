//! Missed carrier updates.
//!
//! A half-cycle entry that sees the same counter direction as the previous
//! one disarms both axes, does not advance the timestamp and skips the
//! trough work. The pipeline keeps its cadence afterwards.

use ferro_common::config::SamplerConfig;
use ferro_common::error::AxisError;
use ferro_hal::SimBoard;

use super::support::{H, armed_runner, errors};

#[test]
fn stale_direction_at_trough_drops_one_dispatch() {
    let config = SamplerConfig::default();

    let baseline_board = SimBoard::from_config(&config);
    let mut baseline = armed_runner(&baseline_board, &config);
    assert_eq!(baseline.run_half_cycles(21), 10);
    assert_eq!(baseline.shared().clock.now(), 21 * H);

    let board = SimBoard::from_config(&config);
    board.glitch_direction_at(10);
    let mut runner = armed_runner(&board, &config);
    assert_eq!(runner.run_half_cycles(21), 9);

    // One timestamp step is lost with the skipped entry.
    assert_eq!(runner.shared().clock.now(), 20 * H);
    assert_eq!(runner.stats().missed_updates, 1);
    assert_eq!(runner.stats().deadline_misses, 0);
    assert_eq!(runner.stats().bad_windows, 0);

    assert_eq!(errors(&runner), [AxisError::TIMER_UPDATE_MISSED; 2]);
    assert!(runner.shared().axes.iter().all(|a| !a.is_armed()));
    assert_eq!(
        runner.sampling().disarms,
        vec![
            (0, AxisError::TIMER_UPDATE_MISSED),
            (1, AxisError::TIMER_UPDATE_MISSED)
        ]
    );
    assert!(runner.hooks().disarms.is_empty());

    // Dispatches keep running while disarmed, on an unbroken timestamp grid.
    let expected: Vec<u32> = (1..=9).map(|k| 2 * k * H).collect();
    assert_eq!(runner.hooks().control, expected);
}

#[test]
fn stale_direction_at_peak_keeps_dispatch_on_time() {
    let config = SamplerConfig::default();
    let board = SimBoard::from_config(&config);
    board.glitch_direction_at(11);
    let mut runner = armed_runner(&board, &config);

    assert_eq!(runner.run_half_cycles(30), 14);
    assert_eq!(runner.shared().clock.now(), 29 * H);

    // The dispatch pended at event 10 waits through the stale entry and is
    // released by the following peak, one half period after its reference.
    assert_eq!(errors(&runner), [AxisError::TIMER_UPDATE_MISSED; 2]);
    assert_eq!(runner.stats().missed_updates, 1);
    assert_eq!(runner.stats().deadline_misses, 0);
    assert_eq!(runner.stats().bad_windows, 0);
    assert_eq!(runner.telemetry().calibration_wait_timeouts, 0);
    assert_eq!(runner.telemetry().calibration_wait_polls_max, 532);
}

#[test]
fn rearm_after_missed_update_restores_clean_state() {
    let config = SamplerConfig::default();
    let board = SimBoard::from_config(&config);
    board.glitch_direction_at(4);
    let mut runner = armed_runner(&board, &config);

    runner.run_half_cycles(10);
    assert!(errors(&runner)[0].has_disarming());

    runner.shared().rearm_all();
    runner.run_half_cycles(10);
    assert!(errors(&runner).iter().all(|e| e.is_empty()));
    assert!(runner.shared().axes.iter().all(|a| a.is_armed()));
    assert_eq!(runner.stats().missed_updates, 1);
}
