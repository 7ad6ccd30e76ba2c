//! Tabulated performance maps.

use crate::error::{MapError, MapResult};
use crate::interp::{Interpolation, Table2D};
use crate::map::{MachineKind, MapOutput, PerformanceMap, checked_output};
use crate::reference::ReferenceState;
use tm_core::linspace;

/// Performance map backed by two 2-D tables over shared axes.
///
/// The x axis is corrected speed; the y axis is corrected flow (compressor)
/// or pressure ratio inlet/exit (turbine). See [`MachineKind`].
#[derive(Debug, Clone, PartialEq)]
pub struct TabulatedMap {
    kind: MachineKind,
    reference: ReferenceState,
    primary: Table2D,
    efficiency: Table2D,
}

impl TabulatedMap {
    /// Create a map from a primary-output table and an efficiency table.
    ///
    /// # Errors
    /// Returns error if the two tables do not share identical axes.
    pub fn new(
        kind: MachineKind,
        reference: ReferenceState,
        primary: Table2D,
        efficiency: Table2D,
    ) -> MapResult<Self> {
        if primary.xgrid() != efficiency.xgrid() || primary.ygrid() != efficiency.ygrid() {
            return Err(MapError::InvalidGrid {
                what: format!(
                    "{} and efficiency tables must share axes",
                    kind.primary_output()
                ),
            });
        }
        Ok(Self {
            kind,
            reference,
            primary,
            efficiency,
        })
    }

    /// Tabulate a function `f(x, y) -> (primary, efficiency)` on the given axes.
    pub fn from_fn<F>(
        kind: MachineKind,
        reference: ReferenceState,
        interpolation: Interpolation,
        x: Vec<f64>,
        y: Vec<f64>,
        f: F,
    ) -> MapResult<Self>
    where
        F: Fn(f64, f64) -> MapResult<(f64, f64)>,
    {
        let mut primary = Vec::with_capacity(x.len() * y.len());
        let mut efficiency = Vec::with_capacity(x.len() * y.len());
        for &xi in &x {
            for &yj in &y {
                let (p, e) = f(xi, yj)?;
                primary.push(p);
                efficiency.push(e);
            }
        }
        let primary = Table2D::from_flat(interpolation, x.clone(), y.clone(), primary)?;
        let efficiency = Table2D::from_flat(interpolation, x, y, efficiency)?;
        Self::new(kind, reference, primary, efficiency)
    }

    /// Sample another map on an `n_speed x n_axis` grid spanning its domain.
    ///
    /// The second axis spans the union of the per-speed ranges, so the table
    /// is rectilinear even when the source domain narrows with speed.
    pub fn sample<M: PerformanceMap + ?Sized>(
        source: &M,
        interpolation: Interpolation,
        n_speed: usize,
        n_axis: usize,
    ) -> MapResult<Self> {
        let (s_lo, s_hi) = source.speed_range();
        let speeds = linspace(s_lo, s_hi, n_speed);
        let (mut a_lo, mut a_hi) = (f64::INFINITY, f64::NEG_INFINITY);
        for &s in &speeds {
            let (lo, hi) = source.axis_range(s);
            a_lo = a_lo.min(lo);
            a_hi = a_hi.max(hi);
        }
        let axis = linspace(a_lo, a_hi, n_axis);
        Self::from_fn(
            source.kind(),
            *source.reference(),
            interpolation,
            speeds,
            axis,
            |s, a| {
                let out = source.evaluate(s, a)?;
                Ok((out.value, out.efficiency))
            },
        )
    }

    /// Table of pressure ratio (compressor) or corrected flow (turbine).
    pub fn primary_table(&self) -> &Table2D {
        &self.primary
    }

    pub fn efficiency_table(&self) -> &Table2D {
        &self.efficiency
    }
}

impl PerformanceMap for TabulatedMap {
    fn kind(&self) -> MachineKind {
        self.kind
    }

    fn reference(&self) -> &ReferenceState {
        &self.reference
    }

    fn evaluate(&self, corrected_speed: f64, axis_value: f64) -> MapResult<MapOutput> {
        let value = self.primary.eval(corrected_speed, axis_value);
        let efficiency = self.efficiency.eval(corrected_speed, axis_value);
        checked_output(corrected_speed, axis_value, value, efficiency)
    }

    fn speed_range(&self) -> (f64, f64) {
        self.primary.x_range()
    }

    fn axis_range(&self, _corrected_speed: f64) -> (f64, f64) {
        self.primary.y_range()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant_map(kind: Interpolation) -> TabulatedMap {
        TabulatedMap::from_fn(
            MachineKind::Compressor,
            ReferenceState::standard(),
            kind,
            vec![500.0, 1000.0],
            vec![1.0, 2.0, 3.0],
            |_, _| Ok((2.0, 0.8)),
        )
        .unwrap()
    }

    #[test]
    fn constant_map_is_constant_everywhere() {
        for kind in [Interpolation::Bilinear, Interpolation::Bicubic] {
            let map = constant_map(kind);
            for (s, m) in [(700.0, 1.5), (100.0, -4.0), (2000.0, 9.0)] {
                let out = map.evaluate(s, m).unwrap();
                assert!((out.value - 2.0).abs() < 1e-14);
                assert!((out.efficiency - 0.8).abs() < 1e-14);
            }
        }
    }

    #[test]
    fn tables_must_share_axes() {
        let a = Table2D::new(
            Interpolation::Bilinear,
            vec![0.0, 1.0],
            vec![0.0, 1.0],
            vec![vec![1.0, 1.0], vec![1.0, 1.0]],
        )
        .unwrap();
        let b = Table2D::new(
            Interpolation::Bilinear,
            vec![0.0, 2.0],
            vec![0.0, 1.0],
            vec![vec![1.0, 1.0], vec![1.0, 1.0]],
        )
        .unwrap();
        let err = TabulatedMap::new(MachineKind::Turbine, ReferenceState::standard(), a, b);
        assert!(matches!(err, Err(MapError::InvalidGrid { .. })));
    }

    #[test]
    fn domain_is_table_extent() {
        let map = constant_map(Interpolation::Bilinear);
        assert_eq!(map.speed_range(), (500.0, 1000.0));
        assert_eq!(map.axis_range(750.0), (1.0, 3.0));
    }

    #[test]
    fn non_finite_query_is_rejected() {
        let map = constant_map(Interpolation::Bicubic);
        assert!(map.evaluate(f64::NAN, 1.0).is_err());
    }
}
