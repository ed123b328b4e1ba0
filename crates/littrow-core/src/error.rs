use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LittrowError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid frame geometry: {width}x{height}, stride {stride}, buffer {len} bytes")]
    InvalidGeometry {
        width: usize,
        height: usize,
        stride: usize,
        len: usize,
    },

    #[error("Malformed calibration file {}: {reason}", path.display())]
    MalformedCalibration { path: PathBuf, reason: String },

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, LittrowError>;
