//! Current-sense saturation and output gating.
//!
//! Out-of-range codes latch `CURRENT_SENSE_SATURATION` on the owning axis
//! only and leave it armed. Disabled outputs report zero current; a gate
//! driver that is not ready reports no current at all.

use ferro_common::config::SamplerConfig;
use ferro_common::error::AxisError;
use ferro_hal::{SampleWindow, SimBoard};
use ferro_sampler::PhaseCurrents;

use super::support::{armed_runner, errors};

#[test]
fn saturation_latches_on_affected_axis_only() {
    let config = SamplerConfig::default();
    let board = SimBoard::from_config(&config);
    board.set_phase_codes(1, SampleWindow::TrueCurrent, 2048, 4000);
    let mut runner = armed_runner(&board, &config);

    runner.run_half_cycles(4);

    assert_eq!(
        errors(&runner),
        [AxisError::empty(), AxisError::CURRENT_SENSE_SATURATION]
    );
    assert!(runner.shared().axes[1].is_armed());
    assert!(runner.hooks().disarms.is_empty());

    assert!(runner.hooks().measured_for(0)[0].is_some());
    assert_eq!(runner.hooks().measured_for(1)[0], None);
    // The calibration window of the same axis is in range.
    assert!(runner.hooks().calibrations_for(1)[0].is_some());
}

#[test]
fn saturation_stays_latched_after_codes_recover() {
    let config = SamplerConfig::default();
    let board = SimBoard::from_config(&config);
    board.set_phase_codes(0, SampleWindow::Calibration, 10, 2048);
    let mut runner = armed_runner(&board, &config);

    runner.run_half_cycles(4);
    assert_eq!(runner.hooks().calibrations_for(0)[0], None);

    board.set_phase_codes(0, SampleWindow::Calibration, 2048, 2048);
    runner.run_half_cycles(4);
    assert!(runner.hooks().calibrations_for(0).last().unwrap().is_some());
    assert_eq!(errors(&runner)[0], AxisError::CURRENT_SENSE_SATURATION);

    assert_eq!(
        runner.shared().axes[0].rearm(),
        AxisError::CURRENT_SENSE_SATURATION
    );
    runner.run_half_cycles(4);
    assert!(errors(&runner)[0].is_empty());
}

#[test]
fn disabled_outputs_report_zero_current() {
    let config = SamplerConfig::default();
    let board = SimBoard::from_config(&config);
    board.set_outputs_enabled(0, false);
    // Saturated codes are not even converted.
    board.set_phase_codes(0, SampleWindow::TrueCurrent, 10, 10);
    let mut runner = armed_runner(&board, &config);

    runner.run_half_cycles(4);

    assert_eq!(
        runner.hooks().measured_for(0)[0],
        Some(PhaseCurrents::ZERO)
    );
    assert_eq!(
        runner.hooks().calibrations_for(0)[0],
        Some(PhaseCurrents::ZERO)
    );
    assert!(errors(&runner)[0].is_empty());
}

#[test]
fn gate_not_ready_reports_absent_current_without_error() {
    let config = SamplerConfig::default();
    let board = SimBoard::from_config(&config);
    board.set_gate_ready(1, false);
    let mut runner = armed_runner(&board, &config);

    runner.run_half_cycles(4);

    assert_eq!(runner.hooks().measured_for(1)[0], None);
    assert_eq!(runner.hooks().calibrations_for(1)[0], None);
    assert!(runner.hooks().measured_for(0)[0].is_some());
    assert!(errors(&runner).iter().all(|e| e.is_empty()));
    assert!(runner.shared().axes[1].is_armed());
}
