//! 2-D rectilinear table interpolation.
//!
//! Two kinds are supported:
//!
//! - **Bilinear**: the four corners of the enclosing cell blended with
//!   fractional weights `tx, ty`.
//! - **Bicubic**: a tensor-product cubic Hermite patch built from the corner
//!   values, monotone-limited first derivatives along each axis, and an
//!   averaged cross derivative. Inside a cell whose data is monotone along an
//!   axis, the derivatives that couple into that axis are scaled down until
//!   the whole patch is monotone along it, on grid lines and between them.
//!
//! Both kinds interpolate: evaluating at a node returns the stored value
//! exactly. Queries outside the grid continue linearly from the edge, so
//! evaluation never fails on range.

use crate::error::{MapError, MapResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tm_core::is_strictly_increasing;

/// Interpolation kind, persisted as `bilinear` / `bicubic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    Bilinear,
    Bicubic,
}

impl Interpolation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bilinear => "bilinear",
            Self::Bicubic => "bicubic",
        }
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interpolation {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bilinear" => Ok(Self::Bilinear),
            "bicubic" => Ok(Self::Bicubic),
            other => Err(MapError::InvalidParameter {
                name: "interpolation",
                what: format!("unknown interpolation `{other}` (expected bilinear or bicubic)"),
            }),
        }
    }
}

/// Immutable 2-D lookup table over strictly increasing axes.
///
/// Values are stored row-major: row `i` belongs to `x[i]`, column `j` to `y[j]`.
/// For bicubic tables the derivative fields are precomputed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Table2D {
    interpolation: Interpolation,
    x: Vec<f64>,
    y: Vec<f64>,
    values: Vec<f64>,
    /// ∂f/∂x at each node (bicubic only)
    fx: Vec<f64>,
    /// ∂f/∂y at each node (bicubic only)
    fy: Vec<f64>,
    /// ∂²f/∂x∂y at each node (bicubic only)
    fxy: Vec<f64>,
}

impl Table2D {
    /// Build a table from row-major rows shaped `(x.len(), y.len())`.
    ///
    /// # Errors
    /// Fails on axes shorter than 2, non-finite or non-increasing axes, a
    /// shape mismatch, or non-finite table values.
    pub fn new(
        interpolation: Interpolation,
        x: Vec<f64>,
        y: Vec<f64>,
        rows: Vec<Vec<f64>>,
    ) -> MapResult<Self> {
        validate_axis(&x, "x")?;
        validate_axis(&y, "y")?;

        let cols = rows.first().map_or(0, Vec::len);
        if rows.len() != x.len() || rows.iter().any(|r| r.len() != y.len()) {
            return Err(MapError::ShapeMismatch {
                table: "table",
                expected_rows: x.len(),
                expected_cols: y.len(),
                rows: rows.len(),
                cols,
            });
        }

        let values: Vec<f64> = rows.into_iter().flatten().collect();
        Self::from_flat(interpolation, x, y, values)
    }

    /// Build a table from a flat row-major value vector.
    pub fn from_flat(
        interpolation: Interpolation,
        x: Vec<f64>,
        y: Vec<f64>,
        values: Vec<f64>,
    ) -> MapResult<Self> {
        validate_axis(&x, "x")?;
        validate_axis(&y, "y")?;
        let (nx, ny) = (x.len(), y.len());
        if values.len() != nx * ny {
            return Err(MapError::ShapeMismatch {
                table: "table",
                expected_rows: nx,
                expected_cols: ny,
                rows: values.len() / ny,
                cols: ny,
            });
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(MapError::NonFinite {
                what: "table value",
            });
        }

        let (fx, fy, fxy) = match interpolation {
            Interpolation::Bilinear => (Vec::new(), Vec::new(), Vec::new()),
            Interpolation::Bicubic => derivative_fields(&x, &y, &values),
        };

        Ok(Self {
            interpolation,
            x,
            y,
            values,
            fx,
            fy,
            fxy,
        })
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    pub fn xgrid(&self) -> &[f64] {
        &self.x
    }

    pub fn ygrid(&self) -> &[f64] {
        &self.y
    }

    /// Stored value at node `(i, j)`.
    pub fn value_at(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.y.len() + j]
    }

    /// Table values as rows (one per x node).
    pub fn rows(&self) -> Vec<Vec<f64>> {
        self.values.chunks(self.y.len()).map(<[f64]>::to_vec).collect()
    }

    pub fn x_range(&self) -> (f64, f64) {
        (self.x[0], self.x[self.x.len() - 1])
    }

    pub fn y_range(&self) -> (f64, f64) {
        (self.y[0], self.y[self.y.len() - 1])
    }

    /// Interpolated value at `(x, y)`.
    pub fn eval(&self, x: f64, y: f64) -> f64 {
        self.eval_with_grad(x, y).0
    }

    /// Interpolated value and partial derivatives `(f, ∂f/∂x, ∂f/∂y)`.
    pub fn eval_with_grad(&self, x: f64, y: f64) -> (f64, f64, f64) {
        match self.interpolation {
            Interpolation::Bilinear => self.bilinear(x, y),
            Interpolation::Bicubic => {
                let (x0, x1) = self.x_range();
                let (y0, y1) = self.y_range();
                let xc = x.clamp(x0, x1);
                let yc = y.clamp(y0, y1);
                let (f, gx, gy) = self.bicubic(xc, yc);
                if xc == x && yc == y {
                    (f, gx, gy)
                } else {
                    // Linear continuation from the nearest edge point
                    (f + gx * (x - xc) + gy * (y - yc), gx, gy)
                }
            }
        }
    }

    fn bilinear(&self, x: f64, y: f64) -> (f64, f64, f64) {
        let (i, tx, hx) = locate(&self.x, x);
        let (j, ty, hy) = locate(&self.y, y);
        let f00 = self.value_at(i, j);
        let f10 = self.value_at(i + 1, j);
        let f01 = self.value_at(i, j + 1);
        let f11 = self.value_at(i + 1, j + 1);

        let f = (1.0 - tx) * (1.0 - ty) * f00
            + tx * (1.0 - ty) * f10
            + (1.0 - tx) * ty * f01
            + tx * ty * f11;
        let gx = ((1.0 - ty) * (f10 - f00) + ty * (f11 - f01)) / hx;
        let gy = ((1.0 - tx) * (f01 - f00) + tx * (f11 - f10)) / hy;
        (f, gx, gy)
    }

    fn bicubic(&self, x: f64, y: f64) -> (f64, f64, f64) {
        let (i, tx, hx) = locate(&self.x, x);
        let (j, ty, hy) = locate(&self.y, y);
        let ny = self.y.len();

        let bx = hermite_basis(tx);
        let by = hermite_basis(ty);
        let dbx = hermite_basis_derivative(tx);
        let dby = hermite_basis_derivative(ty);

        let (mut f, mut gx, mut gy) = (0.0, 0.0, 0.0);
        for a in 0..2 {
            for b in 0..2 {
                let idx = (i + a) * ny + (j + b);
                let v = self.values[idx];
                let vx = hx * self.fx[idx];
                let vy = hy * self.fy[idx];
                let vxy = hx * hy * self.fxy[idx];

                // bx[a] weights the value, bx[2 + a] the derivative at corner a
                f += v * bx[a] * by[b]
                    + vx * bx[2 + a] * by[b]
                    + vy * bx[a] * by[2 + b]
                    + vxy * bx[2 + a] * by[2 + b];
                gx += v * dbx[a] * by[b]
                    + vx * dbx[2 + a] * by[b]
                    + vy * dbx[a] * by[2 + b]
                    + vxy * dbx[2 + a] * by[2 + b];
                gy += v * bx[a] * dby[b]
                    + vx * bx[2 + a] * dby[b]
                    + vy * bx[a] * dby[2 + b]
                    + vxy * bx[2 + a] * dby[2 + b];
            }
        }
        (f, gx / hx, gy / hy)
    }
}

fn validate_axis(axis: &[f64], name: &str) -> MapResult<()> {
    if axis.len() < 2 {
        return Err(MapError::InvalidGrid {
            what: format!("{name} axis needs at least 2 points, got {}", axis.len()),
        });
    }
    if axis.iter().any(|v| !v.is_finite()) {
        return Err(MapError::InvalidGrid {
            what: format!("{name} axis contains non-finite values"),
        });
    }
    if !is_strictly_increasing(axis) {
        return Err(MapError::InvalidGrid {
            what: format!("{name} axis must be strictly increasing"),
        });
    }
    Ok(())
}

/// Enclosing cell index, fractional position and cell width.
///
/// Queries outside the axis clamp to the edge cell, so `t` falls outside
/// `[0, 1]` and the caller extrapolates linearly.
fn locate(axis: &[f64], q: f64) -> (usize, f64, f64) {
    let n = axis.len();
    let i = axis.partition_point(|&a| a <= q).saturating_sub(1).min(n - 2);
    let h = axis[i + 1] - axis[i];
    (i, (q - axis[i]) / h, h)
}

/// Cubic Hermite basis `[h00, h01, h10, h11]` at `t`.
///
/// h00/h01 weight the values at t=0/t=1, h10/h11 the scaled slopes.
fn hermite_basis(t: f64) -> [f64; 4] {
    let s = 1.0 - t;
    [
        (1.0 + 2.0 * t) * s * s,
        t * t * (3.0 - 2.0 * t),
        t * s * s,
        t * t * (t - 1.0),
    ]
}

fn hermite_basis_derivative(t: f64) -> [f64; 4] {
    [
        6.0 * t * t - 6.0 * t,
        -6.0 * t * t + 6.0 * t,
        3.0 * t * t - 4.0 * t + 1.0,
        3.0 * t * t - 2.0 * t,
    ]
}

/// Monotone-limited slopes of `y(x)` at every node.
///
/// Interior slopes use the weighted harmonic mean of the adjacent secants
/// and vanish where the secants change sign. End slopes use the one-sided
/// three-point estimate, zeroed on sign mismatch and limited to three times
/// the adjacent secant.
pub fn monotone_slopes(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    if n < 2 {
        return vec![0.0; n];
    }
    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let d: Vec<f64> = (0..n - 1).map(|k| (y[k + 1] - y[k]) / h[k]).collect();

    if n == 2 {
        return vec![d[0], d[0]];
    }

    let mut m = vec![0.0; n];
    for k in 1..n - 1 {
        if d[k - 1] * d[k] > 0.0 {
            let w1 = 2.0 * h[k] + h[k - 1];
            let w2 = h[k] + 2.0 * h[k - 1];
            m[k] = (w1 + w2) / (w1 / d[k - 1] + w2 / d[k]);
        }
    }
    m[0] = end_slope(h[0], h[1], d[0], d[1]);
    m[n - 1] = end_slope(h[n - 2], h[n - 3], d[n - 2], d[n - 3]);
    m
}

fn end_slope(h0: f64, h1: f64, d0: f64, d1: f64) -> f64 {
    let m = ((2.0 * h0 + h1) * d0 - h0 * d1) / (h0 + h1);
    if m * d0 <= 0.0 {
        0.0
    } else if m.abs() > 3.0 * d0.abs() {
        3.0 * d0
    } else {
        m
    }
}

/// Node derivative fields `(fx, fy, fxy)` for a row-major table.
fn derivative_fields(x: &[f64], y: &[f64], values: &[f64]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut fields = DerivativeFields {
        x,
        y,
        values,
        fx: slopes_along_x(x, y.len(), values),
        fy: slopes_along_y(y, values),
        fxy: Vec::new(),
    };

    // Cross derivative: both differentiation orders, averaged
    let fxy_a = slopes_along_y(y, &fields.fx);
    let fxy_b = slopes_along_x(x, y.len(), &fields.fy);
    fields.fxy = fxy_a
        .iter()
        .zip(&fxy_b)
        .map(|(a, b)| 0.5 * (a + b))
        .collect();

    fields.limit_monotone_cells();
    (fields.fx, fields.fy, fields.fxy)
}

/// Rescaling rounds before the limiter falls back to flattening cells.
const MAX_LIMIT_PASSES: usize = 16;
const BISECTION_STEPS: usize = 40;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

/// One edge of a cell along the monotone axis, in units of the cell
/// parameter `t`: end values, end slopes, and the derivatives of the
/// neighbouring axis that ride along it.
struct Edge {
    v: [f64; 2],
    m: [f64; 2],
    cross: [f64; 2],
    cross_twist: [f64; 2],
}

/// Derivative fields under construction, limited cell by cell.
///
/// Along a monotone axis `y`, a bicubic patch is `Σ A_a(tx) P_a(y) + hx Σ A'_a(tx) Q_a(y)`
/// where `P_a` is the monotone Hermite curve on edge `a` and `Q_a` carries the
/// `fx`/`fxy` terms. Since `|A'_a| <= A_a / 3` on `[0, 1]`, the patch is monotone
/// whenever every edge satisfies `s·P_a' >= (hx / 3)·|Q_a'|`. Cells violating this
/// get their corner `fx` and `fxy` scaled down; the mirror condition limits
/// `fy` and `fxy` for cells monotone along `x`.
struct DerivativeFields<'a> {
    x: &'a [f64],
    y: &'a [f64],
    values: &'a [f64],
    fx: Vec<f64>,
    fy: Vec<f64>,
    fxy: Vec<f64>,
}

impl DerivativeFields<'_> {
    fn limit_monotone_cells(&mut self) {
        for _ in 0..MAX_LIMIT_PASSES {
            let along_y = self.scale_cross_terms(Axis::Y);
            let along_x = self.scale_cross_terms(Axis::X);
            if !along_y && !along_x {
                return;
            }
        }

        // Flattening every corner of a cell always satisfies the condition, so
        // this terminates; each round flattens at least one more cell.
        let cells = (self.x.len() - 1) * (self.y.len() - 1);
        for _ in 0..=cells {
            let failing: Vec<(usize, usize)> = self
                .cells()
                .into_iter()
                .filter(|&(i, j)| {
                    [Axis::X, Axis::Y]
                        .into_iter()
                        .any(|axis| self.cell_scale(axis, i, j) < 1.0)
                })
                .collect();
            if failing.is_empty() {
                return;
            }
            for (i, j) in failing {
                for idx in self.corners(i, j) {
                    self.fx[idx] = 0.0;
                    self.fy[idx] = 0.0;
                    self.fxy[idx] = 0.0;
                }
            }
        }
    }

    fn cells(&self) -> Vec<(usize, usize)> {
        let ny = self.y.len();
        (0..self.x.len() - 1)
            .flat_map(|i| (0..ny - 1).map(move |j| (i, j)))
            .collect()
    }

    fn corners(&self, i: usize, j: usize) -> [usize; 4] {
        let ny = self.y.len();
        [i * ny + j, i * ny + j + 1, (i + 1) * ny + j, (i + 1) * ny + j + 1]
    }

    /// Scale the derivatives coupling into `axis` at every node to the
    /// smallest factor its cells require. Returns whether anything changed.
    fn scale_cross_terms(&mut self, axis: Axis) -> bool {
        let mut node_scale = vec![1.0_f64; self.values.len()];
        let mut changed = false;
        for (i, j) in self.cells() {
            let scale = self.cell_scale(axis, i, j);
            if scale < 1.0 {
                changed = true;
                for idx in self.corners(i, j) {
                    node_scale[idx] = node_scale[idx].min(scale);
                }
            }
        }
        if changed {
            let cross = match axis {
                Axis::Y => &mut self.fx,
                Axis::X => &mut self.fy,
            };
            for (c, s) in cross.iter_mut().zip(&node_scale) {
                *c *= s;
            }
            for (c, s) in self.fxy.iter_mut().zip(&node_scale) {
                *c *= s;
            }
        }
        changed
    }

    /// Largest factor in `[0, 1]` for the cross terms of cell `(i, j)` that
    /// keeps it monotone along `axis`. Cells whose data is not monotone along
    /// `axis` are left alone.
    fn cell_scale(&self, axis: Axis, i: usize, j: usize) -> f64 {
        let ny = self.y.len();
        let hx = self.x[i + 1] - self.x[i];
        let hy = self.y[j + 1] - self.y[j];
        let edge = |a: usize| {
            // Node pairs run along `axis`; `a` selects the edge across it
            let (n0, n1, h_along) = match axis {
                Axis::Y => ((i + a) * ny + j, (i + a) * ny + j + 1, hy),
                Axis::X => (i * ny + j + a, (i + 1) * ny + j + a, hx),
            };
            let (slope, cross) = match axis {
                Axis::Y => (&self.fy, &self.fx),
                Axis::X => (&self.fx, &self.fy),
            };
            Edge {
                v: [self.values[n0], self.values[n1]],
                m: [h_along * slope[n0], h_along * slope[n1]],
                cross: [cross[n0], cross[n1]],
                cross_twist: [h_along * self.fxy[n0], h_along * self.fxy[n1]],
            }
        };
        let edges = [edge(0), edge(1)];

        let rise = [edges[0].v[1] - edges[0].v[0], edges[1].v[1] - edges[1].v[0]];
        if rise[0] * rise[1] < 0.0 {
            return 1.0;
        }
        let sign = if rise[0] + rise[1] >= 0.0 { 1.0 } else { -1.0 };
        let weight = match axis {
            Axis::Y => hx,
            Axis::X => hy,
        } / 3.0;

        let admissible = |scale: f64| {
            edges
                .iter()
                .all(|e| e.is_monotone_with(sign, weight * scale))
        };
        if edges
            .iter()
            .all(|e| e.cross.iter().chain(&e.cross_twist).all(|&c| c == 0.0))
            || admissible(1.0)
        {
            return 1.0;
        }
        let (mut lo, mut hi) = (0.0, 1.0);
        for _ in 0..BISECTION_STEPS {
            let mid = 0.5 * (lo + hi);
            if admissible(mid) {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        lo
    }
}

impl Edge {
    /// Whether `sign·P'(t) >= weight·|Q'(t)|` holds on `[0, 1]`.
    fn is_monotone_with(&self, sign: f64, weight: f64) -> bool {
        let [v0, v1] = self.v;
        let [m0, m1] = self.m;
        let [c0, c1] = self.cross;
        let [e0, e1] = self.cross_twist;

        // Quadratics in t as [t², t, 1] coefficients
        let dp = [
            sign * (6.0 * (v0 - v1) + 3.0 * (m0 + m1)),
            sign * (6.0 * (v1 - v0) - 4.0 * m0 - 2.0 * m1),
            sign * m0,
        ];
        let dq = [
            6.0 * (c0 - c1) + 3.0 * (e0 + e1),
            6.0 * (c1 - c0) - 4.0 * e0 - 2.0 * e1,
            e0,
        ];
        let tol = 1e-12 * (v0.abs() + v1.abs() + m0.abs() + m1.abs() + f64::MIN_POSITIVE);
        [1.0, -1.0].into_iter().all(|s| {
            let g = [
                dp[0] - s * weight * dq[0],
                dp[1] - s * weight * dq[1],
                dp[2] - s * weight * dq[2],
            ];
            quadratic_min_on_unit(g) >= -tol
        })
    }
}

fn quadratic_min_on_unit([a, b, c]: [f64; 3]) -> f64 {
    let at = |t: f64| (a * t + b) * t + c;
    let mut min = at(0.0).min(at(1.0));
    if a > 0.0 {
        let t = -b / (2.0 * a);
        if t > 0.0 && t < 1.0 {
            min = min.min(at(t));
        }
    }
    min
}

fn slopes_along_x(x: &[f64], ny: usize, field: &[f64]) -> Vec<f64> {
    let nx = x.len();
    let mut out = vec![0.0; nx * ny];
    let mut column = vec![0.0; nx];
    for j in 0..ny {
        for i in 0..nx {
            column[i] = field[i * ny + j];
        }
        for (i, s) in monotone_slopes(x, &column).into_iter().enumerate() {
            out[i * ny + j] = s;
        }
    }
    out
}

fn slopes_along_y(y: &[f64], field: &[f64]) -> Vec<f64> {
    field
        .chunks(y.len())
        .flat_map(|row| monotone_slopes(y, row))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> (Vec<f64>, Vec<f64>, Vec<Vec<f64>>) {
        let x = vec![0.0, 1.0, 2.5, 4.0];
        let y = vec![10.0, 11.0, 13.0];
        let rows = x
            .iter()
            .map(|&xi| y.iter().map(|&yj| xi * xi + 0.5 * yj - 0.1 * xi * yj).collect())
            .collect();
        (x, y, rows)
    }

    #[test]
    fn rejects_short_or_unsorted_axes() {
        let err = Table2D::new(Interpolation::Bilinear, vec![0.0], vec![0.0, 1.0], vec![vec![
            1.0, 2.0,
        ]]);
        assert!(matches!(err, Err(MapError::InvalidGrid { .. })));

        let err = Table2D::new(
            Interpolation::Bilinear,
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![vec![1.0, 2.0], vec![3.0, 4.0]],
        );
        assert!(matches!(err, Err(MapError::InvalidGrid { .. })));
    }

    #[test]
    fn rejects_shape_mismatch() {
        let err = Table2D::new(
            Interpolation::Bicubic,
            vec![0.0, 1.0],
            vec![0.0, 1.0, 2.0],
            vec![vec![1.0, 2.0, 3.0], vec![3.0, 4.0]],
        );
        assert!(matches!(err, Err(MapError::ShapeMismatch { .. })));
    }

    #[test]
    fn nodes_are_reproduced_exactly() {
        let (x, y, rows) = grid();
        for kind in [Interpolation::Bilinear, Interpolation::Bicubic] {
            let t = Table2D::new(kind, x.clone(), y.clone(), rows.clone()).unwrap();
            for (i, &xi) in x.iter().enumerate() {
                for (j, &yj) in y.iter().enumerate() {
                    assert_eq!(t.eval(xi, yj), rows[i][j], "{kind} at ({i},{j})");
                }
            }
        }
    }

    #[test]
    fn bilinear_is_exact_for_bilinear_data() {
        let x = vec![0.0, 1.0, 3.0];
        let y = vec![0.0, 2.0];
        let f = |a: f64, b: f64| 1.0 + 2.0 * a - 0.5 * b + 0.25 * a * b;
        let rows = x.iter().map(|&a| y.iter().map(|&b| f(a, b)).collect()).collect();
        let t = Table2D::new(Interpolation::Bilinear, x, y, rows).unwrap();
        assert!((t.eval(2.2, 0.7) - f(2.2, 0.7)).abs() < 1e-12);
        // Extrapolation continues the edge cell
        assert!((t.eval(4.0, 3.0) - f(4.0, 3.0)).abs() < 1e-12);
        assert!((t.eval(-1.0, -1.0) - f(-1.0, -1.0)).abs() < 1e-12);
    }

    #[test]
    fn bicubic_reproduces_linear_data() {
        let x = vec![0.0, 0.5, 1.5, 2.0];
        let y = vec![1.0, 2.0, 4.0];
        let f = |a: f64, b: f64| 3.0 - a + 2.0 * b;
        let rows = x.iter().map(|&a| y.iter().map(|&b| f(a, b)).collect()).collect();
        let t = Table2D::new(Interpolation::Bicubic, x, y, rows).unwrap();
        for (a, b) in [(0.3, 1.2), (1.7, 3.9), (1.0, 2.5)] {
            assert!((t.eval(a, b) - f(a, b)).abs() < 1e-12);
        }
    }

    #[test]
    fn bicubic_extrapolates_linearly() {
        let (x, y, rows) = grid();
        let t = Table2D::new(Interpolation::Bicubic, x, y, rows).unwrap();
        let (f_edge, gx, _) = t.eval_with_grad(4.0, 11.5);
        let outside = t.eval(5.0, 11.5);
        assert!((outside - (f_edge + gx * 1.0)).abs() < 1e-12);
    }

    #[test]
    fn slopes_vanish_at_local_extrema() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [0.0, 1.0, 0.5, 2.0];
        let m = monotone_slopes(&x, &y);
        assert_eq!(m[1], 0.0);
        assert_eq!(m[2], 0.0);
    }

    #[test]
    fn end_slope_is_limited() {
        // Steep first secant followed by a reversal: the one-sided estimate overshoots
        let m = monotone_slopes(&[0.0, 1.0, 1.1], &[0.0, 1.0, 0.0]);
        assert!(m[0] >= 0.0 && m[0] <= 3.0);
        let m = monotone_slopes(&[0.0, 1.0, 2.0], &[0.0, 1.0, 1.0]);
        assert!(m[0] > 0.0 && m[0] <= 3.0);
    }

    fn assert_increasing_along(t: &Table2D, fixed: f64, range: (f64, f64), along_y: bool) {
        let n = 400;
        let mut prev = f64::NEG_INFINITY;
        for k in 0..=n {
            let q = range.0 + (range.1 - range.0) * k as f64 / n as f64;
            let v = if along_y { t.eval(fixed, q) } else { t.eval(q, fixed) };
            assert!(v >= prev - 1e-9, "drop to {v} from {prev} at {q}");
            prev = v;
        }
    }

    #[test]
    fn rows_increasing_in_y_stay_increasing_between_x_nodes() {
        // Strong x variation on a weak y trend couples through fx and fxy
        let x = vec![0.0, 1.0, 2.0, 3.0];
        let y = vec![0.0, 0.5, 1.0, 3.0];
        let rows = vec![
            vec![0.0, 0.01, 0.02, 0.03],
            vec![4.0, 4.01, 6.0, 6.01],
            vec![-3.0, 1.0, 1.01, 1.02],
            vec![2.0, 2.001, 2.002, 9.0],
        ];
        let t = Table2D::new(Interpolation::Bicubic, x, y, rows).unwrap();
        for xi in [0.1, 0.5, 0.93, 1.4, 1.77, 2.25, 2.6] {
            assert_increasing_along(&t, xi, (0.0, 3.0), true);
        }
    }

    #[test]
    fn columns_increasing_in_x_stay_increasing_between_y_nodes() {
        let x = vec![0.0, 0.3, 1.0, 2.0];
        let y = vec![0.0, 1.0, 2.0];
        let rows = vec![
            vec![0.0, 5.0, -2.0],
            vec![0.01, 5.5, 3.0],
            vec![0.02, 9.0, 3.01],
            vec![4.0, 9.01, 3.02],
        ];
        let t = Table2D::new(Interpolation::Bicubic, x, y, rows).unwrap();
        for yj in [0.2, 0.5, 0.8, 1.3, 1.9] {
            assert_increasing_along(&t, yj, (0.0, 2.0), false);
        }
    }

    #[test]
    fn limiter_keeps_smooth_data_untouched() {
        let x = vec![0.0, 1.0, 2.0];
        let y = vec![0.0, 1.0, 2.0];
        let rows = vec![vec![0.0, 1.0, 2.0], vec![1.0, 2.0, 3.0], vec![2.0, 3.0, 4.0]];
        let t = Table2D::new(Interpolation::Bicubic, x, y, rows).unwrap();
        assert!(t.fx.iter().chain(&t.fy).all(|&d| (d - 1.0).abs() < 1e-14));
        assert!(t.fxy.iter().all(|&d| d == 0.0));
    }

    #[test]
    fn interpolation_parses() {
        assert_eq!("bicubic".parse::<Interpolation>().unwrap(), Interpolation::Bicubic);
        assert_eq!(Interpolation::Bilinear.to_string(), "bilinear");
        assert!("cubic".parse::<Interpolation>().is_err());
    }
}
