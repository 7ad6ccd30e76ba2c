//! Equation-of-state trait and validation helpers.

use crate::error::{FluidError, FluidResult};
use tm_core::units::{Pressure, SpecEnthalpy, SpecEntropy, Temperature};

/// Property interface consumed by the residual model and the sweep back-out.
///
/// Implementations are pure functions of their arguments: no caching that
/// changes results, no side effects. They must be thread-safe (Send + Sync)
/// so maps and fluids can be shared across parallel sweep points.
pub trait EquationOfState: Send + Sync {
    /// Model name (for debugging/logging).
    fn name(&self) -> &str;

    /// Temperature at (P, h).
    fn temperature(&self, p: Pressure, h: SpecEnthalpy) -> FluidResult<Temperature>;

    /// Specific entropy [J/(kg·K)] at (P, h).
    fn entropy(&self, p: Pressure, h: SpecEnthalpy) -> FluidResult<SpecEntropy>;

    /// Enthalpy reached at `p2` when entropy is held at its value at (`p1`, `h1`).
    fn isentropic_enthalpy(
        &self,
        p1: Pressure,
        h1: SpecEnthalpy,
        p2: Pressure,
    ) -> FluidResult<SpecEnthalpy>;

    /// Specific enthalpy at temperature `t`.
    ///
    /// The pressure is needed by real-fluid models; ideal-gas models ignore it.
    fn enthalpy_from_temperature(&self, p: Pressure, t: Temperature) -> FluidResult<SpecEnthalpy>;
}

/// Validation helpers for fluid properties.
pub(crate) mod validation {
    use super::*;

    /// Ensure pressure is positive and finite.
    pub fn validate_pressure(p: Pressure) -> FluidResult<()> {
        if !p.value.is_finite() || p.value <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "pressure must be positive and finite",
            });
        }
        Ok(())
    }

    /// Ensure temperature is positive and finite.
    pub fn validate_temperature(t: Temperature) -> FluidResult<()> {
        if !t.value.is_finite() || t.value <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "temperature must be positive and finite",
            });
        }
        Ok(())
    }

    /// Ensure enthalpy is finite (can be negative).
    pub fn validate_enthalpy(h: f64) -> FluidResult<()> {
        if !h.is_finite() {
            return Err(FluidError::NonPhysical {
                what: "enthalpy must be finite",
            });
        }
        Ok(())
    }
}
