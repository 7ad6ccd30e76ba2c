//! Interpolation properties checked over random monotone grids.

use proptest::prelude::*;
use tm_maps::{Interpolation, Table2D};

/// Strictly increasing axis built from positive steps.
fn axis(n: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.1f64..3.0, n).prop_map(|steps| {
        steps
            .iter()
            .scan(0.0, |acc, s| {
                *acc += s;
                Some(*acc)
            })
            .collect()
    })
}

/// Rows increasing along y for every x.
fn increasing_rows(nx: usize, ny: usize) -> impl Strategy<Value = Vec<Vec<f64>>> {
    prop::collection::vec(prop::collection::vec(0.0f64..2.0, ny), nx).prop_map(|rows| {
        rows.into_iter()
            .map(|r| {
                r.iter()
                    .scan(0.0, |acc, d| {
                        *acc += d;
                        Some(*acc)
                    })
                    .collect()
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn nodes_are_reproduced(
        x in axis(4),
        y in axis(5),
        rows in prop::collection::vec(prop::collection::vec(-5.0f64..5.0, 5), 4),
    ) {
        for kind in [Interpolation::Bilinear, Interpolation::Bicubic] {
            let t = Table2D::new(kind, x.clone(), y.clone(), rows.clone()).unwrap();
            for (i, &xi) in x.iter().enumerate() {
                for (j, &yj) in y.iter().enumerate() {
                    prop_assert!((t.eval(xi, yj) - rows[i][j]).abs() < 1e-9);
                }
            }
        }
    }

    #[test]
    fn bicubic_preserves_monotonicity_along_y(
        x in axis(4),
        y in axis(6),
        rows in increasing_rows(4, 6),
        frac in prop::collection::vec(0.0f64..1.0, 20),
        between in prop::collection::vec(0.01f64..0.99, 3),
    ) {
        let t = Table2D::new(Interpolation::Bicubic, x.clone(), y.clone(), rows).unwrap();
        let (lo, hi) = (y[0], y[y.len() - 1]);
        let mut ys: Vec<f64> = frac.iter().map(|f| lo + f * (hi - lo)).collect();
        ys.extend(y.iter().copied());
        ys.sort_by(|a, b| a.total_cmp(b));

        // Grid lines and lines strictly between neighbouring nodes
        let mut lines = x.clone();
        lines.extend(x.windows(2).zip(&between).map(|(w, f)| w[0] + f * (w[1] - w[0])));
        for &xi in &lines {
            let vals: Vec<f64> = ys.iter().map(|&yv| t.eval(xi, yv)).collect();
            for w in vals.windows(2) {
                prop_assert!(w[1] >= w[0] - 1e-9, "x = {xi}: {} then {}", w[0], w[1]);
            }
        }
    }

    #[test]
    fn bicubic_preserves_monotonicity_along_x(
        x in axis(6),
        y in axis(4),
        cols in increasing_rows(4, 6),
        frac in prop::collection::vec(0.0f64..1.0, 20),
        between in prop::collection::vec(0.01f64..0.99, 3),
    ) {
        // Transpose so every column increases along x
        let rows: Vec<Vec<f64>> = (0..x.len()).map(|i| cols.iter().map(|c| c[i]).collect()).collect();
        let t = Table2D::new(Interpolation::Bicubic, x.clone(), y.clone(), rows).unwrap();
        let (lo, hi) = (x[0], x[x.len() - 1]);
        let mut xs: Vec<f64> = frac.iter().map(|f| lo + f * (hi - lo)).collect();
        xs.sort_by(|a, b| a.total_cmp(b));

        let mut lines = y.clone();
        lines.extend(y.windows(2).zip(&between).map(|(w, f)| w[0] + f * (w[1] - w[0])));
        for &yj in &lines {
            let vals: Vec<f64> = xs.iter().map(|&xv| t.eval(xv, yj)).collect();
            for w in vals.windows(2) {
                prop_assert!(w[1] >= w[0] - 1e-9, "y = {yj}: {} then {}", w[0], w[1]);
            }
        }
    }

    #[test]
    fn bilinear_stays_within_cell_bounds(
        x in axis(3),
        y in axis(3),
        rows in prop::collection::vec(prop::collection::vec(-5.0f64..5.0, 3), 3),
        fx in 0.0f64..1.0,
        fy in 0.0f64..1.0,
    ) {
        let t = Table2D::new(Interpolation::Bilinear, x.clone(), y.clone(), rows.clone()).unwrap();
        let xv = x[0] + fx * (x[1] - x[0]);
        let yv = y[0] + fy * (y[1] - y[0]);
        let corners = [rows[0][0], rows[0][1], rows[1][0], rows[1][1]];
        let min = corners.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = corners.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let v = t.eval(xv, yv);
        prop_assert!(v >= min - 1e-9 && v <= max + 1e-9);
    }
}

#[test]
fn gradient_matches_finite_difference() {
    let x = vec![0.0_f64, 1.0, 2.0, 3.0];
    let y = vec![0.0_f64, 0.5, 1.5, 2.0];
    let rows: Vec<Vec<f64>> = x
        .iter()
        .map(|&xi| y.iter().map(|&yj| (xi * 0.7).sin() + yj * yj * 0.3).collect())
        .collect();
    for kind in [Interpolation::Bilinear, Interpolation::Bicubic] {
        let t = Table2D::new(kind, x.clone(), y.clone(), rows.clone()).unwrap();
        let (xq, yq) = (1.37, 0.81);
        let (v, dx, dy) = t.eval_with_grad(xq, yq);
        let h = 1e-6;
        let fdx = (t.eval(xq + h, yq) - t.eval(xq - h, yq)) / (2.0 * h);
        let fdy = (t.eval(xq, yq + h) - t.eval(xq, yq - h)) / (2.0 * h);
        assert!((v - t.eval(xq, yq)).abs() < 1e-14);
        assert!((dx - fdx).abs() < 1e-6, "{kind}: dx {dx} vs {fdx}");
        assert!((dy - fdy).abs() < 1e-6, "{kind}: dy {dy} vs {fdy}");
    }
}
