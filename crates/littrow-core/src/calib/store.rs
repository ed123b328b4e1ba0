use ndarray::Array1;
use tracing::info;

use crate::config::FlatFieldParams;
use crate::consts::{
    BOLTZMANN_K, FLAT_FIELD_REFERENCE_AMPLITUDE, PLANCK_H, SPEED_OF_LIGHT,
};
use crate::frame::Trace;

/// Linear pixel-to-wavelength mapping: `column = offset + scale * wavelength`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WavelengthFit {
    pub scale: f64,
    pub offset: f64,
}

impl WavelengthFit {
    /// Identity mapping: column N reads as N nanometres.
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        offset: 0.0,
    };

    /// Pixel column for a wavelength in nm.
    pub fn column(&self, wavelength: f64) -> f64 {
        self.offset + self.scale * wavelength
    }

    /// Wavelength in nm at a pixel column. A degenerate zero scale falls
    /// back to the identity reading rather than dividing by zero.
    pub fn wavelength(&self, column: f64) -> f64 {
        if self.scale.abs() < f64::EPSILON {
            return column;
        }
        (column - self.offset) / self.scale
    }
}

/// All calibration owned for one running session.
///
/// Created with defaults at startup (slope 0, dark 0, flat-field 1, identity
/// fit), optionally overwritten from persisted artifacts, and mutated only by
/// the calibration controller from the single processing thread.
#[derive(Clone, Debug)]
pub struct CalibrationState {
    /// Tilt correction, in pixels per row.
    pub slope: f32,
    /// Baseline counts captured with no illumination.
    pub dark: Array1<f32>,
    /// Per-column multiplicative response correction.
    pub flat_field: Array1<f32>,
    /// Pixel-to-wavelength mapping.
    pub fit: WavelengthFit,
    /// Cached pixel columns for the display label wavelengths.
    pub label_positions: Vec<usize>,
}

impl CalibrationState {
    pub fn new(width: usize) -> Self {
        Self {
            slope: 0.0,
            dark: Array1::zeros(width),
            flat_field: Array1::ones(width),
            fit: WavelengthFit::IDENTITY,
            label_positions: Vec::new(),
        }
    }

    /// Width of the frame geometry this state was built for.
    pub fn width(&self) -> usize {
        self.dark.len()
    }

    /// True when the stored traces match the active frame width.
    pub fn matches_width(&self, width: usize) -> bool {
        self.dark.len() == width
    }

    /// Reset to defaults for a new frame width. A geometry change
    /// invalidates every stored trace, so this is a full reset.
    pub fn reset_geometry(&mut self, width: usize) {
        info!(
            old_width = self.width(),
            new_width = width,
            "frame geometry changed, resetting calibration state"
        );
        *self = Self::new(width);
    }

    /// Subtract the dark baseline (clamped at zero, never underflowing) and
    /// apply the flat-field factor, per column.
    pub fn apply_corrections(&self, trace: &mut Trace) {
        for (x, v) in trace.data.iter_mut().enumerate() {
            let dark = self.dark.get(x).copied().unwrap_or(0.0);
            let flat = self.flat_field.get(x).copied().unwrap_or(1.0);
            *v = (*v - dark).max(0.0) * flat;
        }
        trace.recompute_max();
    }

    /// Store the raw trace verbatim as the dark baseline.
    pub fn capture_dark(&mut self, raw: &Trace) {
        self.dark = raw.data.clone();
    }

    /// Derive the per-column flat-field factors from a raw trace of a
    /// blackbody reference source.
    ///
    /// Per column: the theoretical Planck radiance at the wavelength the
    /// current fit implies, divided by the dark-subtracted measured signal.
    /// Columns whose signal sits below the noise floor get a zero factor
    /// instead of a near-infinite one. The non-zero factors are rescaled so
    /// the largest equals `FLAT_FIELD_REFERENCE_AMPLITUDE`.
    pub fn capture_flat_field(&mut self, raw: &Trace, params: &FlatFieldParams) {
        let width = raw.len();
        let floor = params.noise_floor_fraction * raw.max;
        let mut factors = Array1::<f32>::zeros(width);

        for x in 0..width {
            let dark = self.dark.get(x).copied().unwrap_or(0.0);
            let signal = (raw.data[x] - dark).max(0.0);
            if signal <= floor || signal <= f32::EPSILON {
                continue;
            }
            let wavelength_nm = self.fit.wavelength(x as f64);
            let radiance = planck_radiance(wavelength_nm, params.colour_temp_k);
            factors[x] = (radiance / signal as f64) as f32;
        }

        let peak = factors.iter().copied().fold(0.0f32, f32::max);
        if peak > 0.0 {
            factors.mapv_inplace(|f| f / peak * FLAT_FIELD_REFERENCE_AMPLITUDE);
        }
        self.flat_field = factors;
    }
}

/// Spectral radiance of a blackbody at `temp_k` for a wavelength in nm.
///
/// Planck's law: `B(lambda, T) = (2 h c^2 / lambda^5) / (exp(hc / lambda k T) - 1)`.
/// Absolute units are irrelevant here since the flat-field curve is rescaled
/// after the division; only the shape across the sensor matters.
pub fn planck_radiance(wavelength_nm: f64, temp_k: f64) -> f64 {
    if wavelength_nm <= 0.0 || temp_k <= 0.0 {
        return 0.0;
    }
    let lambda = wavelength_nm * 1e-9;
    let hc = PLANCK_H * SPEED_OF_LIGHT;
    let spectral = 2.0 * hc * SPEED_OF_LIGHT / lambda.powi(5);
    let exponent = hc / (lambda * BOLTZMANN_K * temp_k);
    spectral / (exponent.exp() - 1.0)
}
