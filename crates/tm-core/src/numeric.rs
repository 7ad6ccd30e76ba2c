use crate::TmError;

/// Floating point type used throughout the engine.
pub type Real = f64;

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, TmError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(TmError::NonFinite { what, value: v })
    }
}

/// Finite and strictly positive, e.g. reference temperatures and scales.
pub fn ensure_positive(v: Real, what: &'static str) -> Result<Real, TmError> {
    let v = ensure_finite(v, what)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(TmError::NonPositive { what, value: v })
    }
}

/// `n` evenly spaced values from `start` to `end`, endpoints exact.
pub fn linspace(start: Real, end: Real, n: usize) -> Vec<Real> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let delta = (end - start) / (n - 1) as Real;
            let mut points: Vec<Real> = (0..n).map(|i| start + i as Real * delta).collect();
            points[n - 1] = end;
            points
        }
    }
}

/// Strictly increasing check used for grid axes.
pub fn is_strictly_increasing(values: &[Real]) -> bool {
    values.windows(2).all(|w| w[1] > w[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn ensure_positive_rejects_zero() {
        assert!(ensure_positive(1.0, "scale").is_ok());
        assert!(matches!(
            ensure_positive(0.0, "scale"),
            Err(TmError::NonPositive { .. })
        ));
        assert!(ensure_positive(Real::INFINITY, "scale").is_err());
    }

    #[test]
    fn linspace_endpoints() {
        let pts = linspace(1.0, 2.0, 5);
        assert_eq!(pts.len(), 5);
        assert_eq!(pts[0], 1.0);
        assert_eq!(pts[4], 2.0);
        assert!((pts[2] - 1.5).abs() < 1e-15);
        assert_eq!(linspace(3.0, 4.0, 1), vec![3.0]);
        assert!(linspace(3.0, 4.0, 0).is_empty());
    }

    #[test]
    fn strictly_increasing() {
        assert!(is_strictly_increasing(&[0.0, 1.0, 2.5]));
        assert!(!is_strictly_increasing(&[0.0, 1.0, 1.0]));
        assert!(!is_strictly_increasing(&[2.0, 1.0]));
    }
}
