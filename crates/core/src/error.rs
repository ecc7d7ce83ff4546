//! Configuration errors
//!
//! The per-frame step never fails; the only fallible operations are building
//! a simulation from a configuration and loading/saving configuration files.

use crate::grid::Axis;
use std::fmt;

/// Errors raised while validating or loading a [`crate::SimulationConfig`]
#[derive(Debug)]
pub enum ConfigError {
    /// An active grid axis has fewer than three cells
    GridTooSmall { axis: Axis, cells: usize },
    /// `nz = 2` is neither a 2D grid nor a usable 3D grid
    UnsupportedDepth(usize),
    /// Domain extent is zero, negative or not finite
    InvalidDomain { axis: Axis, value: f32 },
    /// The atmosphere lookup needs a ground and a top layer
    TooFewLayers(usize),
    /// A scalar parameter is NaN or infinite
    NonFinite { name: &'static str, value: f32 },
    /// A scalar parameter is outside its admissible range
    OutOfRange {
        name: &'static str,
        value: f32,
        requirement: &'static str,
    },
    /// A `(min, max)` range has `min > max`
    InvertedRange {
        name: &'static str,
        min: f32,
        max: f32,
    },
    /// Failed to read or write a configuration file
    Io(std::io::Error),
    /// Failed to parse or serialize a configuration
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::GridTooSmall { axis, cells } => {
                write!(f, "grid axis {axis:?} has {cells} cells; at least 3 are required")
            }
            ConfigError::UnsupportedDepth(nz) => write!(
                f,
                "grid depth nz = {nz} is unsupported; use 1 for 2D or at least 3 for 3D"
            ),
            ConfigError::InvalidDomain { axis, value } => write!(
                f,
                "domain size along {axis:?} must be positive and finite, got {value}"
            ),
            ConfigError::TooFewLayers(n) => {
                write!(f, "atmosphere needs at least 2 layers, got {n}")
            }
            ConfigError::NonFinite { name, value } => {
                write!(f, "parameter '{name}' must be finite, got {value}")
            }
            ConfigError::OutOfRange {
                name,
                value,
                requirement,
            } => write!(f, "parameter '{name}' must be {requirement}, got {value}"),
            ConfigError::InvertedRange { name, min, max } => {
                write!(f, "range '{name}' has min {min} greater than max {max}")
            }
            ConfigError::Io(e) => write!(f, "config file I/O failed: {e}"),
            ConfigError::Parse(e) => write!(f, "config JSON is invalid: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}
