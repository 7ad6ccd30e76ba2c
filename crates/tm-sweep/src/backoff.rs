//! Relaxing an infeasible target toward the feasible envelope.

use crate::error::{SweepError, SweepRunResult, invalid};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Feasibility backoff settings.
///
/// In a sweep the searched value is `target_ratio * inlet_pressure` [Pa],
/// which is the exit pressure of a compressor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub enabled: bool,
    /// `[min, max]` of the searched value; derived from the sweep when unset
    pub bounds: Option<(f64, f64)>,
    /// Coarse probes between the target and `min`
    pub n_probe: usize,
    /// Bisection stops when the feasible/infeasible gap is this small
    pub value_tol: f64,
    pub max_iters: usize,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bounds: None,
            n_probe: 33,
            value_tol: 50.0,
            max_iters: 24,
        }
    }
}

impl BackoffConfig {
    pub fn validate(&self) -> SweepRunResult<()> {
        if self.n_probe == 0 {
            return invalid("backoff n_probe must be positive");
        }
        if !(self.value_tol > 0.0) {
            return invalid("backoff value_tol must be positive");
        }
        if let Some((min, max)) = self.bounds {
            check_range(min, max)?;
        }
        Ok(())
    }
}

fn check_range(min: f64, max: f64) -> SweepRunResult<()> {
    if !(max > min) || !min.is_finite() || !max.is_finite() {
        return Err(SweepError::EmptyBackoffRange { min, max });
    }
    Ok(())
}

/// Outcome of [`feasibility_backoff`].
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffResult<R> {
    /// A feasible value was found (the target itself or a relaxed one).
    pub converged: bool,
    pub used_backoff: bool,
    /// The clamped target was feasible as requested.
    pub target_feasible: bool,
    /// Target after clamping into `[min, max]`
    pub requested: f64,
    /// Value the roots belong to; the clamped target when nothing feasible
    /// was found.
    pub value: f64,
    pub roots: Vec<R>,
}

/// Find the feasible value closest below `target_value`.
///
/// `solve(v)` returns the roots at `v`; an empty vector means `v` is
/// infeasible. The target is clamped into `[min_value, max_value]` and tried
/// first. If it is infeasible and backoff is enabled, `n_probe` values
/// descending toward `min_value` are tried until one is feasible, then the
/// gap to the infeasible value above it is bisected down to `value_tol`,
/// keeping the highest feasible value seen.
///
/// # Errors
/// Returns error if the range is empty or `solve` fails.
pub fn feasibility_backoff<R, F>(
    target_value: f64,
    min_value: f64,
    max_value: f64,
    config: &BackoffConfig,
    mut solve: F,
) -> SweepRunResult<BackoffResult<R>>
where
    F: FnMut(f64) -> SweepRunResult<Vec<R>>,
{
    check_range(min_value, max_value)?;
    let requested = target_value.clamp(min_value, max_value);

    let roots = solve(requested)?;
    if !roots.is_empty() {
        return Ok(BackoffResult {
            converged: true,
            used_backoff: false,
            target_feasible: true,
            requested,
            value: requested,
            roots,
        });
    }

    let infeasible = BackoffResult {
        converged: false,
        used_backoff: false,
        target_feasible: false,
        requested,
        value: requested,
        roots: Vec::new(),
    };
    if !config.enabled || requested <= min_value {
        return Ok(infeasible);
    }

    // Coarse descent: first feasible probe and the infeasible value above it
    let step = (requested - min_value) / config.n_probe as f64;
    let mut upper = requested;
    let mut found = None;
    for i in 1..=config.n_probe {
        let v = if i == config.n_probe {
            min_value
        } else {
            requested - step * i as f64
        };
        let roots = solve(v)?;
        if !roots.is_empty() {
            found = Some((v, roots));
            break;
        }
        upper = v;
    }
    let Some((mut lower, mut best)) = found else {
        debug!(requested, min_value, "no feasible probe");
        return Ok(infeasible);
    };

    for _ in 0..config.max_iters {
        if upper - lower <= config.value_tol {
            break;
        }
        let mid = 0.5 * (lower + upper);
        let roots = solve(mid)?;
        if roots.is_empty() {
            upper = mid;
        } else {
            lower = mid;
            best = roots;
        }
    }

    debug!(requested, value = lower, "backoff relaxed target");
    Ok(BackoffResult {
        converged: true,
        used_backoff: true,
        target_feasible: false,
        requested,
        value: lower,
        roots: best,
    })
}
