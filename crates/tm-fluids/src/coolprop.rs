//! CoolProp-based equation of state.

use crate::error::{FluidError, FluidResult};
use crate::model::{EquationOfState, validation};
use rfluids::prelude::*;
use tm_core::units::{Pressure, SpecEnthalpy, SpecEntropy, Temperature, k};

/// Temperature search bounds [K] for the (P,h) and (P,s) inversions.
const T_MIN: f64 = 100.0;
const T_MAX: f64 = 2000.0;
const MAX_ITER: usize = 100;

/// Real-fluid properties for one pure substance via `rfluids`.
///
/// Thread-safe: rfluids `Fluid` instances are created per query and never shared.
pub struct CoolPropEos {
    pure: Pure,
    name: String,
}

impl CoolPropEos {
    /// Create a model for a pure substance.
    pub fn new(pure: Pure) -> Self {
        Self {
            pure,
            name: format!("CoolProp({pure:?})"),
        }
    }

    /// Create a Fluid instance at given P,T state.
    fn fluid_at_pt(&self, p_pa: f64, t_k: f64) -> FluidResult<Fluid> {
        Fluid::from(self.pure)
            .in_state(FluidInput::pressure(p_pa), FluidInput::temperature(t_k))
            .map_err(|e| FluidError::Backend {
                message: format!("rfluids error at P={} Pa, T={} K: {}", p_pa, t_k, e),
            })
    }

    fn h_at_pt(&self, p_pa: f64, t_k: f64) -> FluidResult<f64> {
        let mut fluid = self.fluid_at_pt(p_pa, t_k)?;
        fluid.enthalpy().map_err(|e| FluidError::Backend {
            message: format!("rfluids error getting enthalpy: {}", e),
        })
    }

    fn s_at_pt(&self, p_pa: f64, t_k: f64) -> FluidResult<f64> {
        let mut fluid = self.fluid_at_pt(p_pa, t_k)?;
        fluid.entropy().map_err(|e| FluidError::Backend {
            message: format!("rfluids error getting entropy: {}", e),
        })
    }

    /// Bisect on temperature until `prop(P, T)` matches `target`.
    ///
    /// `prop` must increase with temperature at fixed pressure (true for h and s).
    fn solve_t<F>(&self, p_pa: f64, target: f64, prop: F, what: &'static str) -> FluidResult<f64>
    where
        F: Fn(&Self, f64, f64) -> FluidResult<f64>,
    {
        let mut t_low = T_MIN;
        let mut t_high = T_MAX;

        let v_low = prop(self, p_pa, t_low)?;
        let v_high = prop(self, p_pa, t_high)?;
        if target < v_low || target > v_high {
            return Err(FluidError::OutOfRange { what });
        }

        for _ in 0..MAX_ITER {
            let t_mid = 0.5 * (t_low + t_high);
            let v_mid = prop(self, p_pa, t_mid)?;

            let tol = 1e-9_f64.max(target.abs() * 1e-10);
            if (v_mid - target).abs() < tol || (t_high - t_low) < 1e-9 {
                return Ok(t_mid);
            }

            if v_mid < target {
                t_low = t_mid;
            } else {
                t_high = t_mid;
            }
        }

        // Return best estimate if we hit max iterations
        Ok(0.5 * (t_low + t_high))
    }
}

impl EquationOfState for CoolPropEos {
    fn name(&self) -> &str {
        &self.name
    }

    fn temperature(&self, p: Pressure, h: SpecEnthalpy) -> FluidResult<Temperature> {
        validation::validate_pressure(p)?;
        validation::validate_enthalpy(h)?;
        let t = self.solve_t(
            p.value,
            h,
            Self::h_at_pt,
            "enthalpy outside valid range for given pressure",
        )?;
        Ok(k(t))
    }

    fn entropy(&self, p: Pressure, h: SpecEnthalpy) -> FluidResult<SpecEntropy> {
        let t = self.temperature(p, h)?;
        self.s_at_pt(p.value, t.value)
    }

    fn isentropic_enthalpy(
        &self,
        p1: Pressure,
        h1: SpecEnthalpy,
        p2: Pressure,
    ) -> FluidResult<SpecEnthalpy> {
        validation::validate_pressure(p2)?;
        let s1 = self.entropy(p1, h1)?;
        let t2 = self.solve_t(
            p2.value,
            s1,
            Self::s_at_pt,
            "entropy outside valid range for given pressure",
        )?;
        self.h_at_pt(p2.value, t2)
    }

    fn enthalpy_from_temperature(&self, p: Pressure, t: Temperature) -> FluidResult<SpecEnthalpy> {
        validation::validate_pressure(p)?;
        validation::validate_temperature(t)?;
        self.h_at_pt(p.value, t.value)
    }
}
