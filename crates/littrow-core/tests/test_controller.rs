mod common;

use std::time::{Duration, Instant};

use approx::assert_relative_eq;
use littrow_core::calib::persist::SLOPE_FILE;
use littrow_core::config::EngineConfig;
use littrow_core::controller::{CalibrationAction, CalibrationController, FrameOutput};
use littrow_core::frame::FrameView;

use common::{skewed_line_frame, uniform_frame};

const WIDTH: usize = 64;
const HEIGHT: usize = 16;
const STRIDE: usize = 64;

fn process(
    controller: &mut CalibrationController,
    buf: &[u8],
    now: Instant,
) -> FrameOutput {
    let frame = FrameView::new(buf, WIDTH, HEIGHT, STRIDE).unwrap();
    controller.process_frame_at(&frame, now)
}

#[test]
fn actions_are_consumed_exactly_once() {
    let mut controller = CalibrationController::new(EngineConfig::default());
    let buf = uniform_frame(HEIGHT, STRIDE, 120);
    let t0 = Instant::now();

    controller.request(CalibrationAction::CaptureDark);
    assert_eq!(controller.pending(), Some(CalibrationAction::CaptureDark));

    process(&mut controller, &buf, t0);
    assert_eq!(controller.pending(), None, "action must be cleared");
    let dark_after_first = controller.state().dark.clone();
    assert!(dark_after_first.iter().all(|&v| v > 0.0));

    // A second frame without a request leaves the capture untouched.
    let brighter = uniform_frame(HEIGHT, STRIDE, 240);
    process(&mut controller, &brighter, t0);
    for x in 0..WIDTH {
        assert_relative_eq!(controller.state().dark[x], dark_after_first[x]);
    }
}

#[test]
fn dark_capture_zeroes_the_same_frames_display_trace() {
    let mut controller = CalibrationController::new(EngineConfig::default());
    let buf = uniform_frame(HEIGHT, STRIDE, 120);

    controller.request(CalibrationAction::CaptureDark);
    let output = process(&mut controller, &buf, Instant::now());

    // The capture runs against this frame's raw trace before corrections,
    // so the corrected display trace is already floor-clamped to zero.
    assert!(output.trace.data.iter().all(|&v| v == 0.0));
}

#[test]
fn freeze_snapshots_the_display_trace() {
    let mut controller = CalibrationController::new(EngineConfig::default());
    let buf = skewed_line_frame(WIDTH, HEIGHT, STRIDE, 30, 0.0);
    let t0 = Instant::now();

    let before = process(&mut controller, &buf, t0);
    assert!(before.shadow.is_none());
    assert_eq!(before.shadow_opacity, 0.0);

    controller.request(CalibrationAction::Freeze);
    let frozen = process(&mut controller, &buf, t0);
    assert!(frozen.shadow.is_some());
    assert_relative_eq!(frozen.shadow_opacity, 0.5);

    // The shadow fades on later frames without further requests.
    let later = process(&mut controller, &buf, t0 + Duration::from_secs(5));
    assert!(later.shadow.is_some());
    assert_relative_eq!(later.shadow_opacity, 0.25, epsilon = 1e-6);
}

#[test]
fn optimize_slope_updates_the_state() {
    let drift = 0.05;
    let buf = skewed_line_frame(WIDTH, 64, STRIDE, 30, drift);
    let mut config = EngineConfig::default();
    config.reduce.row_stride = 1;
    config.slope.max_iterations = 64;
    let mut controller = CalibrationController::new(config);

    let frame = FrameView::new(&buf, WIDTH, 64, STRIDE).unwrap();
    controller.process_frame_at(&frame, Instant::now());
    assert_eq!(controller.state().slope, 0.0);

    controller.request(CalibrationAction::OptimizeSlope);
    controller.process_frame_at(&frame, Instant::now());
    let found = controller.state().slope;
    assert!(
        (found - drift).abs() < 0.02,
        "optimizer should have moved the slope near {drift}, got {found}"
    );
}

#[test]
fn geometry_change_resets_calibration() {
    let mut controller = CalibrationController::new(EngineConfig::default());
    let buf = uniform_frame(HEIGHT, STRIDE, 100);

    controller.request(CalibrationAction::CaptureDark);
    process(&mut controller, &buf, Instant::now());
    assert_eq!(controller.state().width(), WIDTH);
    assert!(controller.state().dark.iter().any(|&v| v > 0.0));

    // A narrower frame arrives: full reset to defaults for the new width.
    let narrow = uniform_frame(HEIGHT, 32, 100);
    let frame = FrameView::new(&narrow, 32, HEIGHT, 32).unwrap();
    controller.process_frame_at(&frame, Instant::now());

    assert_eq!(controller.state().width(), 32);
    assert!(controller.state().dark.iter().all(|&v| v == 0.0));
}

#[test]
fn labels_pair_wavelengths_with_cached_columns() {
    let mut controller = CalibrationController::new(EngineConfig::default());
    let buf = uniform_frame(HEIGHT, STRIDE, 100);

    let output = process(&mut controller, &buf, Instant::now());

    let config = EngineConfig::default();
    assert_eq!(output.labels.len(), config.label_wavelengths.len());
    // Identity fit on a 64-wide frame: every label clamps to the last column.
    for &(wl, column) in &output.labels {
        assert!(config.label_wavelengths.contains(&wl));
        assert_eq!(column, WIDTH - 1);
    }
}

#[test]
fn save_action_persists_and_a_new_session_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = EngineConfig::default();
    config.calibration_dir = Some(dir.path().to_path_buf());

    let mut controller = CalibrationController::new(config.clone());
    let buf = uniform_frame(HEIGHT, STRIDE, 150);

    controller.request(CalibrationAction::CaptureDark);
    process(&mut controller, &buf, Instant::now());
    controller.request(CalibrationAction::Save);
    process(&mut controller, &buf, Instant::now());
    assert!(dir.path().join(SLOPE_FILE).exists());
    let saved_dark = controller.state().dark.clone();

    // A fresh session picks the artifacts up on its first frame.
    let mut next_session = CalibrationController::new(config);
    process(&mut next_session, &buf, Instant::now());
    for x in 0..WIDTH {
        assert_relative_eq!(next_session.state().dark[x], saved_dark[x]);
    }
}

#[test]
fn requesting_while_pending_replaces_the_action() {
    let mut controller = CalibrationController::new(EngineConfig::default());
    controller.request(CalibrationAction::CaptureDark);
    controller.request(CalibrationAction::Freeze);
    assert_eq!(controller.pending(), Some(CalibrationAction::Freeze));
}
