//! Error types for residual evaluation and operating-point solves.

use thiserror::Error;
use tm_core::TmError;
use tm_fluids::FluidError;
use tm_maps::MapError;

/// Errors that abort a residual evaluation or a solve.
///
/// Non-convergence is not an error; see [`crate::SolverStatus`].
#[derive(Error, Debug)]
pub enum SolverError {
    #[error(
        "Non-positive efficiency {efficiency} at corrected speed {corrected_speed}, axis value {axis_value}"
    )]
    NonPositiveEfficiency {
        efficiency: f64,
        corrected_speed: f64,
        axis_value: f64,
    },

    #[error("Invalid boundary condition: {what}")]
    InvalidBoundary { what: &'static str },

    #[error("Map error: {0}")]
    Map(#[from] MapError),

    #[error("Fluid error: {0}")]
    Fluid(#[from] FluidError),

    #[error("Numeric error: {what}")]
    Numeric { what: String },

    #[error(transparent)]
    Core(#[from] TmError),
}

pub type SolverResult<T> = Result<T, SolverError>;
