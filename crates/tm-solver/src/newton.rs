//! Damped Newton solver with backtracking line search.

use crate::error::SolverResult;
use nalgebra::{DMatrix, DVector};
use std::fmt;
use tracing::debug;

/// Newton solver configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct NewtonConfig {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Absolute tolerance for residual norm
    pub abs_tol: f64,
    /// Relative tolerance against the initial residual norm
    pub rel_tol: f64,
    /// Line search backtracking factor
    pub line_search_beta: f64,
    /// Maximum line search iterations
    pub max_line_search_iters: usize,
    /// Relative step for the finite-difference Jacobian
    pub jacobian_step: f64,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            abs_tol: 1e-10,
            rel_tol: 1e-8,
            line_search_beta: 0.5,
            max_line_search_iters: 20,
            jacobian_step: 1e-7,
        }
    }
}

/// How a Newton iteration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolverStatus {
    Success,
    MaxIterations,
    /// The line search could not reduce the residual norm.
    Stalled,
    SingularJacobian,
    /// The residual or step contained NaN or infinity.
    NonFinite,
}

impl SolverStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::MaxIterations => "max_iterations",
            Self::Stalled => "stalled",
            Self::SingularJacobian => "singular_jacobian",
            Self::NonFinite => "non_finite",
        }
    }
}

impl fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Newton iteration result.
#[derive(Debug, Clone)]
pub struct NewtonResult {
    /// Last iterate (the solution when converged)
    pub x: DVector<f64>,
    /// Residual norm at `x`
    pub residual_norm: f64,
    /// Number of iterations
    pub iterations: usize,
    /// Converged flag
    pub converged: bool,
    pub status: SolverStatus,
}

impl NewtonResult {
    fn finish(x: DVector<f64>, residual_norm: f64, iterations: usize, status: SolverStatus) -> Self {
        Self {
            x,
            residual_norm,
            iterations,
            converged: status == SolverStatus::Success,
            status,
        }
    }
}

/// Newton solver with backtracking line search.
///
/// Converged when `|r| <= abs_tol` or `|r| <= rel_tol * |r0|`. Failing to
/// converge is reported through [`NewtonResult::status`]; only errors raised
/// by `residual_fn` or `jacobian_fn` are returned as `Err`.
pub fn newton_solve<F, J>(
    x0: DVector<f64>,
    residual_fn: F,
    jacobian_fn: J,
    config: &NewtonConfig,
) -> SolverResult<NewtonResult>
where
    F: Fn(&DVector<f64>) -> SolverResult<DVector<f64>>,
    J: Fn(&DVector<f64>) -> SolverResult<DMatrix<f64>>,
{
    let mut x = x0;
    let mut r = residual_fn(&x)?;
    let mut r_norm = r.norm();
    let r0_norm = r_norm;

    if !r_norm.is_finite() {
        return Ok(NewtonResult::finish(x, r_norm, 0, SolverStatus::NonFinite));
    }

    for iter in 0..config.max_iterations {
        if r_norm <= config.abs_tol || r_norm <= config.rel_tol * r0_norm {
            debug!(iter, r_norm, "newton converged");
            return Ok(NewtonResult::finish(x, r_norm, iter, SolverStatus::Success));
        }

        let jac = jacobian_fn(&x)?;

        // Solve J * dx = -r
        let Some(dx) = jac.lu().solve(&(-&r)) else {
            debug!(iter, r_norm, "singular jacobian");
            return Ok(NewtonResult::finish(
                x,
                r_norm,
                iter,
                SolverStatus::SingularJacobian,
            ));
        };
        if dx.iter().any(|v| !v.is_finite()) {
            return Ok(NewtonResult::finish(x, r_norm, iter, SolverStatus::NonFinite));
        }

        let mut alpha = 1.0;
        let mut accepted = None;
        for _ in 0..=config.max_line_search_iters {
            let x_new = &x + alpha * &dx;
            let r_new = residual_fn(&x_new)?;
            let r_new_norm = r_new.norm();
            if r_new_norm.is_finite() && r_new_norm < r_norm {
                accepted = Some((x_new, r_new, r_new_norm));
                break;
            }
            alpha *= config.line_search_beta;
        }

        let Some((x_new, r_new, r_new_norm)) = accepted else {
            debug!(iter, r_norm, "line search stalled");
            return Ok(NewtonResult::finish(x, r_norm, iter, SolverStatus::Stalled));
        };

        debug!(iter, r_norm = r_new_norm, alpha, "newton step");
        x = x_new;
        r = r_new;
        r_norm = r_new_norm;
    }

    if r_norm <= config.abs_tol || r_norm <= config.rel_tol * r0_norm {
        return Ok(NewtonResult::finish(
            x,
            r_norm,
            config.max_iterations,
            SolverStatus::Success,
        ));
    }
    Ok(NewtonResult::finish(
        x,
        r_norm,
        config.max_iterations,
        SolverStatus::MaxIterations,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quadratic_residual(x: &DVector<f64>) -> SolverResult<DVector<f64>> {
        Ok(DVector::from_element(1, x[0] * x[0] - 4.0))
    }

    fn quadratic_jacobian(x: &DVector<f64>) -> SolverResult<DMatrix<f64>> {
        Ok(DMatrix::from_element(1, 1, 2.0 * x[0]))
    }

    #[test]
    fn simple_quadratic() {
        // Solve x^2 - 4 = 0 from x = 3
        let x0 = DVector::from_element(1, 3.0);
        let config = NewtonConfig::default();
        let result = newton_solve(x0, quadratic_residual, quadratic_jacobian, &config).unwrap();

        assert!(result.converged);
        assert_eq!(result.status, SolverStatus::Success);
        assert!((result.x[0] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn iteration_cap_is_a_status_not_an_error() {
        let x0 = DVector::from_element(1, 300.0);
        let config = NewtonConfig {
            max_iterations: 2,
            ..NewtonConfig::default()
        };
        let result = newton_solve(x0, quadratic_residual, quadratic_jacobian, &config).unwrap();

        assert!(!result.converged);
        assert_eq!(result.status, SolverStatus::MaxIterations);
        assert_eq!(result.iterations, 2);
    }

    #[test]
    fn zero_derivative_is_singular() {
        let x0 = DVector::from_element(1, 0.0);
        let result = newton_solve(
            x0,
            quadratic_residual,
            quadratic_jacobian,
            &NewtonConfig::default(),
        )
        .unwrap();

        assert!(!result.converged);
        assert_eq!(result.status, SolverStatus::SingularJacobian);
    }

    #[test]
    fn no_descent_direction_stalls() {
        // x^2 + 1 has no real root; Newton steps overshoot back and forth
        let residual = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
            Ok(DVector::from_element(1, x[0] * x[0] + 1.0))
        };
        let result = newton_solve(
            DVector::from_element(1, 1e-3),
            residual,
            quadratic_jacobian,
            &NewtonConfig::default(),
        )
        .unwrap();

        assert!(!result.converged);
        assert!(matches!(
            result.status,
            SolverStatus::Stalled | SolverStatus::MaxIterations
        ));
    }
}
