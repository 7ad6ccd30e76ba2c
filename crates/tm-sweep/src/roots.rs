//! Multi-root search along a constant-speed line of a performance map.
//!
//! A compressor speed line rises from surge to a peak pressure ratio and
//! falls toward choke, so a target ratio has zero, one or two matching
//! flows. The search scans the whole flow range for sign changes of
//! `PR(m) - target` and bisects every bracket.

use crate::error::{SweepRunResult, invalid};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tm_core::linspace;
use tm_maps::{MachineKind, PerformanceMap};
use tracing::debug;

/// Multi-root finder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootFinderConfig {
    /// Evenly spaced scan points across the flow range
    pub n_scan: usize,
    /// Bracket width at which bisection stops
    pub root_tol: f64,
    pub max_bisect_iters: usize,
    /// Offset of the extra scan points placed around each prior root,
    /// as a fraction of the flow range
    pub prior_neighbor_fraction: f64,
    /// Roots closer than this fraction of the flow range are merged
    pub dedup_fraction: f64,
}

impl Default for RootFinderConfig {
    fn default() -> Self {
        Self {
            n_scan: 401,
            root_tol: 1e-8,
            max_bisect_iters: 60,
            prior_neighbor_fraction: 0.02,
            dedup_fraction: 1e-6,
        }
    }
}

impl RootFinderConfig {
    pub fn validate(&self) -> SweepRunResult<()> {
        if self.n_scan < 2 {
            return invalid("n_scan must be at least 2");
        }
        if !(self.root_tol > 0.0) {
            return invalid("root_tol must be positive");
        }
        if self.max_bisect_iters == 0 {
            return invalid("max_bisect_iters must be positive");
        }
        if !(self.prior_neighbor_fraction >= 0.0) || !(self.dedup_fraction >= 0.0) {
            return invalid("root finder fractions must be non-negative");
        }
        Ok(())
    }
}

/// Corrected flows at which the map's primary output equals `target`.
///
/// For a compressor `target` is the pressure ratio and the roots are the
/// corrected flows where the speed line crosses it, sorted ascending. For a
/// turbine `target` is the expansion ratio and the single root (if the ratio
/// lies on the map) is the corrected flow the map predicts there.
///
/// `prior_roots` are extra scan points, each with two neighbors, that keep a
/// bracket around roots found at a nearby condition.
///
/// # Errors
/// Map evaluation failures propagate.
pub fn find_roots<M: PerformanceMap + ?Sized>(
    map: &M,
    corrected_speed: f64,
    target: f64,
    prior_roots: &[f64],
    config: &RootFinderConfig,
) -> SweepRunResult<Vec<f64>> {
    let (lo, hi) = map.axis_range(corrected_speed);
    if map.kind() == MachineKind::Turbine {
        if target < lo || target > hi {
            return Ok(Vec::new());
        }
        return Ok(vec![map.evaluate(corrected_speed, target)?.value]);
    }

    let width = hi - lo;
    if !(width > 0.0) {
        return Ok(Vec::new());
    }

    let grid = scan_grid(lo, hi, prior_roots, config);
    let values = grid
        .par_iter()
        .map(|&m| {
            map.evaluate(corrected_speed, m)
                .map(|out| out.value - target)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut roots = Vec::new();
    for (i, (&m, &f)) in grid.iter().zip(&values).enumerate() {
        if f == 0.0 {
            roots.push(m);
            continue;
        }
        if let Some(&f_next) = values.get(i + 1) {
            if f_next != 0.0 && f.signum() != f_next.signum() {
                let root = bisect(map, corrected_speed, target, (m, f), grid[i + 1], config)?;
                debug!(corrected_speed, lo = m, hi = grid[i + 1], root, "bracket refined");
                roots.push(root);
            }
        }
    }

    roots.sort_by(f64::total_cmp);
    roots.dedup_by(|a, b| (*a - *b).abs() <= width * config.dedup_fraction);
    Ok(roots)
}

/// Uniform scan points plus each prior root and its two neighbors.
fn scan_grid(lo: f64, hi: f64, prior_roots: &[f64], config: &RootFinderConfig) -> Vec<f64> {
    let mut grid = linspace(lo, hi, config.n_scan);
    let offset = config.prior_neighbor_fraction * (hi - lo);
    for &p in prior_roots.iter().filter(|p| p.is_finite()) {
        for q in [p - offset, p, p + offset] {
            grid.push(q.clamp(lo, hi));
        }
    }
    grid.sort_by(f64::total_cmp);
    grid.dedup();
    grid
}

fn bisect<M: PerformanceMap + ?Sized>(
    map: &M,
    corrected_speed: f64,
    target: f64,
    (mut a, mut fa): (f64, f64),
    mut b: f64,
    config: &RootFinderConfig,
) -> SweepRunResult<f64> {
    for _ in 0..config.max_bisect_iters {
        if (b - a).abs() <= config.root_tol {
            break;
        }
        let mid = 0.5 * (a + b);
        let f_mid = map.evaluate(corrected_speed, mid)?.value - target;
        if f_mid == 0.0 {
            return Ok(mid);
        }
        if f_mid.signum() == fa.signum() {
            a = mid;
            fa = f_mid;
        } else {
            b = mid;
        }
    }
    Ok(0.5 * (a + b))
}
