use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_CHROMA_U_WEIGHT, DEFAULT_CHROMA_V_WEIGHT, DEFAULT_FLAT_FIELD_NOISE_FLOOR,
    DEFAULT_FLAT_FIELD_TEMP_K, DEFAULT_LUMA_WEIGHT, DEFAULT_PARTITIONS, DEFAULT_PEAK_MIN_FRACTION,
    DEFAULT_PEAK_WINDOW, DEFAULT_ROW_STRIDE, SLOPE_INITIAL_STEP, SLOPE_MAX_ITERATIONS,
    SLOPE_MIN_STEP,
};
use crate::error::Result;

/// Frame reduction parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReduceParams {
    /// Sample every Nth row of the frame (performance/accuracy tradeoff).
    #[serde(default = "default_row_stride")]
    pub row_stride: usize,
    /// Linear weights for the luma and two chroma samples. The default is
    /// luma-dominant and approximates a single perceptual channel.
    #[serde(default = "default_weights")]
    pub weights: [f32; 3],
    /// Number of disjoint column partitions reduced in parallel.
    #[serde(default = "default_partitions")]
    pub partitions: usize,
}

fn default_row_stride() -> usize {
    DEFAULT_ROW_STRIDE
}
fn default_weights() -> [f32; 3] {
    [
        DEFAULT_LUMA_WEIGHT,
        DEFAULT_CHROMA_U_WEIGHT,
        DEFAULT_CHROMA_V_WEIGHT,
    ]
}
fn default_partitions() -> usize {
    DEFAULT_PARTITIONS
}

impl Default for ReduceParams {
    fn default() -> Self {
        Self {
            row_stride: DEFAULT_ROW_STRIDE,
            weights: default_weights(),
            partitions: DEFAULT_PARTITIONS,
        }
    }
}

/// Slope-search parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SlopeParams {
    /// Initial step size, in pixels per row.
    #[serde(default = "default_initial_step")]
    pub initial_step: f32,
    /// Step size below which the search is considered converged.
    #[serde(default = "default_min_step")]
    pub min_step: f32,
    /// Iteration budget; one full frame reduction per iteration.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

fn default_initial_step() -> f32 {
    SLOPE_INITIAL_STEP
}
fn default_min_step() -> f32 {
    SLOPE_MIN_STEP
}
fn default_max_iterations() -> usize {
    SLOPE_MAX_ITERATIONS
}

impl Default for SlopeParams {
    fn default() -> Self {
        Self {
            initial_step: SLOPE_INITIAL_STEP,
            min_step: SLOPE_MIN_STEP,
            max_iterations: SLOPE_MAX_ITERATIONS,
        }
    }
}

/// Reference calibration lamp description.
///
/// Line tables are configuration data so alternate lamps can be used without
/// code changes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LampConfig {
    /// Lamp name, informational only.
    #[serde(default = "default_lamp_name")]
    pub name: String,
    /// Reference line wavelengths in nm, ordered by the lamp's expected
    /// relative line brightness (strongest first).
    #[serde(default = "default_lamp_lines")]
    pub lines: Vec<f32>,
    /// Apply the rank-order swap guard for closely spaced lines.
    #[serde(default = "default_true")]
    pub swap_guard: bool,
}

fn default_lamp_name() -> String {
    "mercury".to_string()
}
fn default_lamp_lines() -> Vec<f32> {
    // Hg emission lines by expected relative brightness: green, blue,
    // violet, then the yellow doublet.
    vec![546.07, 435.83, 404.66, 577.0, 579.07]
}
fn default_true() -> bool {
    true
}

impl Default for LampConfig {
    fn default() -> Self {
        Self {
            name: default_lamp_name(),
            lines: default_lamp_lines(),
            swap_guard: true,
        }
    }
}

/// Flat-field capture parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlatFieldParams {
    /// Colour temperature of the reference source, in kelvin.
    #[serde(default = "default_colour_temp")]
    pub colour_temp_k: f64,
    /// Fraction of the trace maximum below which a column is treated as
    /// noise and given a zero correction factor.
    #[serde(default = "default_noise_floor")]
    pub noise_floor_fraction: f32,
}

fn default_colour_temp() -> f64 {
    DEFAULT_FLAT_FIELD_TEMP_K
}
fn default_noise_floor() -> f32 {
    DEFAULT_FLAT_FIELD_NOISE_FLOOR
}

impl Default for FlatFieldParams {
    fn default() -> Self {
        Self {
            colour_temp_k: DEFAULT_FLAT_FIELD_TEMP_K,
            noise_floor_fraction: DEFAULT_FLAT_FIELD_NOISE_FLOOR,
        }
    }
}

/// Peak detection parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PeakParams {
    /// Half-width of the neighborhood a candidate peak must dominate.
    #[serde(default = "default_peak_window")]
    pub window: usize,
    /// Peaks below this fraction of the trace maximum are ignored.
    #[serde(default = "default_peak_min_fraction")]
    pub min_fraction: f32,
}

fn default_peak_window() -> usize {
    DEFAULT_PEAK_WINDOW
}
fn default_peak_min_fraction() -> f32 {
    DEFAULT_PEAK_MIN_FRACTION
}

impl Default for PeakParams {
    fn default() -> Self {
        Self {
            window: DEFAULT_PEAK_WINDOW,
            min_fraction: DEFAULT_PEAK_MIN_FRACTION,
        }
    }
}

/// Full engine configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub reduce: ReduceParams,
    #[serde(default)]
    pub slope: SlopeParams,
    #[serde(default)]
    pub lamp: LampConfig,
    #[serde(default)]
    pub flat_field: FlatFieldParams,
    #[serde(default)]
    pub peaks: PeakParams,
    /// Wavelengths (nm) annotated on the display.
    #[serde(default = "default_label_wavelengths")]
    pub label_wavelengths: Vec<f32>,
    /// Directory holding the persisted calibration artifacts. `None`
    /// disables persistence.
    #[serde(default)]
    pub calibration_dir: Option<PathBuf>,
}

fn default_label_wavelengths() -> Vec<f32> {
    vec![400.0, 450.0, 500.0, 550.0, 600.0, 650.0, 700.0]
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reduce: ReduceParams::default(),
            slope: SlopeParams::default(),
            lamp: LampConfig::default(),
            flat_field: FlatFieldParams::default(),
            peaks: PeakParams::default(),
            label_wavelengths: default_label_wavelengths(),
            calibration_dir: None,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}
