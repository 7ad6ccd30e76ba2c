//! Operating-point solver for a single turbomachine.
//!
//! Given inlet total pressure and enthalpy, exit total pressure and shaft
//! speed, solves for mass flow, exit enthalpy and shaft torque such that the
//! machine's performance map, energy equation and shaft power balance all
//! hold. The nonlinear system is solved with a damped Newton method on a
//! central finite-difference Jacobian.

pub mod error;
pub mod jacobian;
pub mod newton;
pub mod operating_point;
pub mod residual;

pub use error::{SolverError, SolverResult};
pub use newton::{NewtonConfig, NewtonResult, SolverStatus};
pub use operating_point::{
    EnergyClosure, OperatingPointOptions, OperatingPointResult, close_energy_balance,
    solve_operating_point,
};
pub use residual::{
    BoundaryConditions, ResidualEvaluation, ResidualModel, ResidualScales, Residuals, Unknowns,
};
