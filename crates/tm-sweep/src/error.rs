//! Error types for root finding, backoff and sweeps.

use thiserror::Error;
use tm_fluids::FluidError;
use tm_maps::MapError;
use tm_solver::SolverError;

/// Errors that abort a sweep or one of its building blocks.
///
/// An infeasible speed point is not an error; it is a row with
/// `converged == false`.
#[derive(Error, Debug)]
pub enum SweepError {
    #[error("Invalid sweep configuration: {what}")]
    InvalidConfig { what: String },

    #[error("Backoff range [{min}, {max}] is empty")]
    EmptyBackoffRange { min: f64, max: f64 },

    #[error("Map error: {0}")]
    Map(#[from] MapError),

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    #[error("Fluid error: {0}")]
    Fluid(#[from] FluidError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SweepRunResult<T> = Result<T, SweepError>;

pub(crate) fn invalid<T>(what: impl Into<String>) -> SweepRunResult<T> {
    Err(SweepError::InvalidConfig { what: what.into() })
}
