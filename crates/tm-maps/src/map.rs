//! The performance-map capability shared by tabulated and analytic maps.

use crate::analytic::AnalyticMap;
use crate::error::{MapError, MapResult};
use crate::reference::ReferenceState;
use crate::table_map::TabulatedMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which side of the energy exchange the map describes.
///
/// The two kinds use different map axes:
///
/// | kind       | x axis          | y axis                       | primary output            |
/// |------------|-----------------|------------------------------|---------------------------|
/// | Compressor | corrected speed | corrected flow               | pressure ratio (out / in) |
/// | Turbine    | corrected speed | pressure ratio (in / out)    | corrected flow            |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineKind {
    Compressor,
    Turbine,
}

impl MachineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compressor => "compressor",
            Self::Turbine => "turbine",
        }
    }

    /// Name of the primary output table.
    pub fn primary_output(&self) -> &'static str {
        match self {
            Self::Compressor => "pressure_ratio",
            Self::Turbine => "corrected_flow",
        }
    }
}

impl fmt::Display for MachineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MachineKind {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compressor" => Ok(Self::Compressor),
            "turbine" => Ok(Self::Turbine),
            other => Err(MapError::InvalidParameter {
                name: "kind",
                what: format!("unknown machine kind `{other}`"),
            }),
        }
    }
}

/// Map outputs at one query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapOutput {
    /// Pressure ratio (compressor) or corrected flow (turbine).
    pub value: f64,
    /// Isentropic efficiency.
    pub efficiency: f64,
}

/// Anything that predicts turbomachine performance from corrected parameters.
///
/// Implementations are immutable after construction and safe for concurrent
/// read-only evaluation. Evaluation must be smooth enough for a Newton solver
/// with a finite-difference Jacobian.
pub trait PerformanceMap: Send + Sync {
    fn kind(&self) -> MachineKind;

    /// Reference state the corrected axes are expressed against.
    fn reference(&self) -> &ReferenceState;

    /// Evaluate the map.
    ///
    /// `axis_value` is corrected flow for a compressor and pressure ratio
    /// (inlet / exit) for a turbine.
    fn evaluate(&self, corrected_speed: f64, axis_value: f64) -> MapResult<MapOutput>;

    /// Valid corrected-speed range `(low, high)`.
    fn speed_range(&self) -> (f64, f64);

    /// Valid second-axis range at a speed, `low <= high`.
    ///
    /// Surge to choke flow for compressors, pressure-ratio extent for turbines.
    fn axis_range(&self, corrected_speed: f64) -> (f64, f64);
}

/// Check inputs and outputs of a map evaluation for finiteness.
pub(crate) fn checked_output(
    corrected_speed: f64,
    axis_value: f64,
    value: f64,
    efficiency: f64,
) -> MapResult<MapOutput> {
    if !corrected_speed.is_finite() {
        return Err(MapError::NonFinite {
            what: "corrected speed",
        });
    }
    if !axis_value.is_finite() {
        return Err(MapError::NonFinite { what: "map axis value" });
    }
    if !value.is_finite() {
        return Err(MapError::NonFinite { what: "map output" });
    }
    if !efficiency.is_finite() {
        return Err(MapError::NonFinite {
            what: "map efficiency",
        });
    }
    Ok(MapOutput { value, efficiency })
}

/// A map of either variant, as returned by persistence when the caller does
/// not know the stored kind in advance.
#[derive(Debug, Clone)]
pub enum AnyMap {
    Table(TabulatedMap),
    Analytic(AnalyticMap),
}

impl AnyMap {
    fn inner(&self) -> &dyn PerformanceMap {
        match self {
            Self::Table(m) => m,
            Self::Analytic(m) => m,
        }
    }
}

impl From<TabulatedMap> for AnyMap {
    fn from(m: TabulatedMap) -> Self {
        Self::Table(m)
    }
}

impl From<AnalyticMap> for AnyMap {
    fn from(m: AnalyticMap) -> Self {
        Self::Analytic(m)
    }
}

impl PerformanceMap for AnyMap {
    fn kind(&self) -> MachineKind {
        self.inner().kind()
    }

    fn reference(&self) -> &ReferenceState {
        self.inner().reference()
    }

    fn evaluate(&self, corrected_speed: f64, axis_value: f64) -> MapResult<MapOutput> {
        self.inner().evaluate(corrected_speed, axis_value)
    }

    fn speed_range(&self) -> (f64, f64) {
        self.inner().speed_range()
    }

    fn axis_range(&self, corrected_speed: f64) -> (f64, f64) {
        self.inner().axis_range(corrected_speed)
    }
}
