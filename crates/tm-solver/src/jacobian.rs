//! Finite difference Jacobian computation.

use crate::error::{SolverError, SolverResult};
use nalgebra::{DMatrix, DVector};

/// Compute Jacobian using central finite differences.
///
/// Column j uses the step `epsilon * max(|x[j]|, 1)`, so unknowns of very
/// different magnitude (kg/s against J/kg) get comparable relative steps.
pub fn central_difference_jacobian<F>(
    x: &DVector<f64>,
    f: F,
    epsilon: f64,
) -> SolverResult<DMatrix<f64>>
where
    F: Fn(&DVector<f64>) -> SolverResult<DVector<f64>>,
{
    let n = x.len();
    let m = f(x)?.len();
    let mut jac = DMatrix::zeros(m, n);

    for j in 0..n {
        let dx = epsilon * x[j].abs().max(1.0);

        let mut x_plus = x.clone();
        x_plus[j] += dx;
        let f_plus = f(&x_plus)?;

        let mut x_minus = x.clone();
        x_minus[j] -= dx;
        let f_minus = f(&x_minus)?;

        if f_plus.len() != m || f_minus.len() != m {
            return Err(SolverError::Numeric {
                what: format!("residual length changed from {m} while perturbing unknown {j}"),
            });
        }
        jac.set_column(j, &((f_plus - f_minus) / (2.0 * dx)));
    }

    Ok(jac)
}
