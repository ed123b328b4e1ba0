use std::time::Instant;

use ndarray::Array1;
use tracing::{info, warn};

use crate::calib::persist;
use crate::calib::store::CalibrationState;
use crate::calib::wavelength::{calibrate_wavelengths, label_positions};
use crate::config::EngineConfig;
use crate::frame::{FrameView, Trace};
use crate::overlay::ShadowOverlay;
use crate::reduce::reduce_into;
use crate::slope::optimize_slope;

/// One-shot calibration request, raised by the external input source and
/// consumed exactly once at the next frame boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CalibrationAction {
    CaptureDark,
    CaptureFlatField,
    CaptureWavelengthPeaks,
    OptimizeSlope,
    Freeze,
    Save,
}

/// Per-frame payload handed to the external display sink.
#[derive(Clone, Debug)]
pub struct FrameOutput {
    /// Dark/flat-field corrected trace, one value per pixel column.
    pub trace: Trace,
    /// `(wavelength nm, pixel column)` pairs for on-screen annotation.
    pub labels: Vec<(f32, usize)>,
    /// Frozen comparison trace, when one is held.
    pub shadow: Option<Array1<f32>>,
    /// Blend opacity for the shadow trace, in `[0, 0.5]`.
    pub shadow_opacity: f32,
}

/// Owns the session's calibration state and sequences one-shot calibration
/// actions through the per-frame boundary.
///
/// All mutation happens on the single processing thread inside
/// [`process_frame`](Self::process_frame); no two actions ever run
/// concurrently, and an action requested mid-frame is deferred to the next
/// frame's trace. The display sink reads the returned [`FrameOutput`]
/// snapshot only.
pub struct CalibrationController {
    config: EngineConfig,
    state: CalibrationState,
    overlay: ShadowOverlay,
    pending: Option<CalibrationAction>,
    raw: Trace,
}

impl CalibrationController {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            state: CalibrationState::new(0),
            overlay: ShadowOverlay::default(),
            pending: None,
            raw: Trace::default(),
        }
    }

    /// Read-only view of the calibration state.
    pub fn state(&self) -> &CalibrationState {
        &self.state
    }

    /// The action waiting for the next frame boundary, if any.
    pub fn pending(&self) -> Option<CalibrationAction> {
        self.pending
    }

    /// Request a one-shot action for the next frame boundary. A request made
    /// while another is still pending replaces it.
    pub fn request(&mut self, action: CalibrationAction) {
        if let Some(previous) = self.pending.replace(action) {
            warn!(?previous, ?action, "pending calibration action replaced");
        }
    }

    /// Reduce one frame, run at most one pending calibration action against
    /// its raw trace, apply the stored corrections, and produce the display
    /// payload. The frame buffer is only borrowed for the duration of this
    /// call.
    pub fn process_frame(&mut self, frame: &FrameView<'_>) -> FrameOutput {
        self.process_frame_at(frame, Instant::now())
    }

    /// [`process_frame`](Self::process_frame) with an explicit clock.
    pub fn process_frame_at(&mut self, frame: &FrameView<'_>, now: Instant) -> FrameOutput {
        if !self.state.matches_width(frame.width()) {
            self.state.reset_geometry(frame.width());
            if let Some(dir) = self.config.calibration_dir.clone() {
                persist::load(&mut self.state, &dir);
            }
            self.refresh_labels();
        }

        reduce_into(frame, self.state.slope, &self.config.reduce, &mut self.raw);

        let mut freeze_requested = false;
        if let Some(action) = self.pending.take() {
            match action {
                CalibrationAction::CaptureDark => {
                    self.state.capture_dark(&self.raw);
                    info!("dark baseline captured");
                }
                CalibrationAction::CaptureFlatField => {
                    self.state
                        .capture_flat_field(&self.raw, &self.config.flat_field);
                    info!("flat-field correction captured");
                }
                CalibrationAction::CaptureWavelengthPeaks => {
                    if let Some(fit) =
                        calibrate_wavelengths(&self.raw, &self.config.lamp, &self.config.peaks)
                    {
                        self.state.fit = fit;
                        self.refresh_labels();
                    }
                }
                CalibrationAction::OptimizeSlope => {
                    self.state.slope = optimize_slope(
                        frame,
                        self.state.slope,
                        &self.config.slope,
                        &self.config.reduce,
                    );
                    // Re-reduce so this frame's display already reflects the
                    // new tilt correction.
                    reduce_into(frame, self.state.slope, &self.config.reduce, &mut self.raw);
                }
                CalibrationAction::Freeze => freeze_requested = true,
                CalibrationAction::Save => match &self.config.calibration_dir {
                    Some(dir) => {
                        if let Err(e) = persist::save(&self.state, dir) {
                            warn!(error = %e, "failed to save calibration");
                        }
                    }
                    None => warn!("save requested but no calibration directory configured"),
                },
            }
        }

        let mut display = self.raw.clone();
        self.state.apply_corrections(&mut display);

        if freeze_requested {
            self.overlay.freeze(&display, now);
        }

        FrameOutput {
            labels: self
                .config
                .label_wavelengths
                .iter()
                .copied()
                .zip(self.state.label_positions.iter().copied())
                .collect(),
            shadow: self.overlay.frozen().cloned(),
            shadow_opacity: self.overlay.opacity(now),
            trace: display,
        }
    }

    fn refresh_labels(&mut self) {
        self.state.label_positions = label_positions(
            &self.state.fit,
            &self.config.label_wavelengths,
            self.state.width(),
        );
    }
}
