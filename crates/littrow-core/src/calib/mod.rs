pub mod persist;
pub mod store;
pub mod wavelength;

pub use store::{CalibrationState, WavelengthFit};
