pub mod calib;
pub mod config;
pub mod consts;
pub mod controller;
pub mod error;
pub mod frame;
pub mod overlay;
pub mod reduce;
pub mod slope;
