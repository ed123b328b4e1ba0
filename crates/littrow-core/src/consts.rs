/// Default weight applied to the luma sample during frame reduction.
pub const DEFAULT_LUMA_WEIGHT: f32 = 3.0;

/// Default weight applied to the first (Cb) chroma sample.
pub const DEFAULT_CHROMA_U_WEIGHT: f32 = 0.781;

/// Default weight applied to the second (Cr) chroma sample.
pub const DEFAULT_CHROMA_V_WEIGHT: f32 = 1.63;

/// Rows sampled during reduction: every Nth row of the luma plane.
pub const DEFAULT_ROW_STRIDE: usize = 4;

/// Number of disjoint column partitions reduced in parallel.
pub const DEFAULT_PARTITIONS: usize = 4;

/// Initial slope-search step size, in pixels per row.
pub const SLOPE_INITIAL_STEP: f32 = 0.01;

/// Step size below which the slope search is considered converged.
pub const SLOPE_MIN_STEP: f32 = 1e-4;

/// Iteration budget for the slope search. One full frame reduction per
/// iteration, so this bounds how long a single frame can block.
pub const SLOPE_MAX_ITERATIONS: usize = 20;

/// Planck constant, J·s.
pub const PLANCK_H: f64 = 6.626_070_15e-34;

/// Speed of light in vacuum, m/s.
pub const SPEED_OF_LIGHT: f64 = 2.997_924_58e8;

/// Boltzmann constant, J/K.
pub const BOLTZMANN_K: f64 = 1.380_649e-23;

/// Colour temperature assumed for the flat-field reference source, in kelvin.
/// Matches an incandescent halogen lamp.
pub const DEFAULT_FLAT_FIELD_TEMP_K: f64 = 3200.0;

/// Fraction of the trace maximum below which a column is treated as noise
/// during flat-field capture and given a zero correction factor.
pub const DEFAULT_FLAT_FIELD_NOISE_FLOOR: f32 = 0.02;

/// Non-zero flat-field factors are rescaled so the largest equals this.
pub const FLAT_FIELD_REFERENCE_AMPLITUDE: f32 = 1.0;

/// Half-width of the neighborhood a candidate peak must dominate.
pub const DEFAULT_PEAK_WINDOW: usize = 5;

/// Peaks below this fraction of the trace maximum are ignored.
pub const DEFAULT_PEAK_MIN_FRACTION: f32 = 0.05;

/// Most peaks paired with reference lamp lines during a wavelength fit.
pub const MAX_FIT_PEAKS: usize = 5;

/// Fewest detected peaks required before the wavelength fit is replaced.
pub const MIN_FIT_PEAKS: usize = 3;

/// Shadow overlay linear fade window, in seconds.
pub const SHADOW_DECAY_SECS: f32 = 10.0;

/// Opacity of the shadow overlay immediately after a freeze.
pub const SHADOW_BASE_OPACITY: f32 = 0.5;
