//! Fluid property errors.

use tm_core::TmError;
use thiserror::Error;

/// Result type for fluid operations.
pub type FluidResult<T> = Result<T, FluidError>;

/// Errors that can occur during fluid property calculations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FluidError {
    /// Non-physical values (negative temperature, pressure, etc.).
    #[error("Non-physical value for {what}")]
    NonPhysical { what: &'static str },

    /// Value out of the model's valid range.
    #[error("Value out of range for {what}")]
    OutOfRange { what: &'static str },

    /// Invalid construction argument.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Backend (CoolProp) error.
    #[error("Backend error: {message}")]
    Backend { message: String },
}

impl From<TmError> for FluidError {
    fn from(err: TmError) -> Self {
        match err {
            TmError::NonFinite { what, .. } | TmError::NonPositive { what, .. } => {
                FluidError::NonPhysical { what }
            }
            TmError::InvalidArg { what } => FluidError::InvalidArg { what },
        }
    }
}
