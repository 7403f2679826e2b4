//! Error types for the CAM tools crate.

use signcut_core::{EmitError, PackError};
use thiserror::Error;

/// CAM tools error type
#[derive(Error, Debug)]
pub enum CamToolError {
    /// Hot-wire material preset lookup failed
    #[error("Unknown material preset: {0}")]
    UnknownPreset(String),

    /// Failure bubbled up from the shared pipeline
    #[error(transparent)]
    Core(#[from] signcut_core::Error),

    /// Invalid parameter value
    #[error(transparent)]
    Parameter(#[from] ParameterError),
}

impl CamToolError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CamToolError::Core(e) if e.is_cancelled())
    }

    pub fn is_emit_error(&self) -> bool {
        matches!(self, CamToolError::Core(e) if e.is_emit_error())
    }
}

impl From<EmitError> for CamToolError {
    fn from(e: EmitError) -> Self {
        CamToolError::Core(e.into())
    }
}

impl From<PackError> for CamToolError {
    fn from(e: PackError) -> Self {
        CamToolError::Core(e.into())
    }
}

/// Parameter validation error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    /// Parameter value out of range
    #[error("Parameter '{name}' out of range: {value} (valid: {min}..{max})")]
    OutOfRange {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Invalid parameter value
    #[error("Invalid value for '{name}': {reason}")]
    InvalidValue { name: String, reason: String },
}

impl ParameterError {
    /// Fail unless `value` is finite and within `min..=max`.
    pub fn check_range(name: &str, value: f64, min: f64, max: f64) -> Result<(), ParameterError> {
        if value.is_finite() && value >= min && value <= max {
            Ok(())
        } else {
            Err(ParameterError::OutOfRange {
                name: name.to_string(),
                value,
                min,
                max,
            })
        }
    }

    /// Fail unless `value` is finite and strictly positive.
    pub fn check_positive(name: &str, value: f64) -> Result<(), ParameterError> {
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(ParameterError::InvalidValue {
                name: name.to_string(),
                reason: format!("must be positive, got {}", value),
            })
        }
    }
}

/// Result type for CAM tool operations
pub type CamToolResult<T> = Result<T, CamToolError>;
