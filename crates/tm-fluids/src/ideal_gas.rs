//! Calorically perfect ideal gas.

use crate::error::{FluidError, FluidResult};
use crate::model::{EquationOfState, validation};
use tm_core::ensure_positive;
use tm_core::units::{Pressure, SpecEnthalpy, SpecEntropy, Temperature, k};

/// Ideal gas with constant specific heat.
///
/// ```text
/// h(T)   = h_ref + cp (T - T_ref)
/// s(P,T) = s_ref + cp ln(T / T_ref) - R ln(P / P_ref)
/// T2s    = T1 (P2 / P1)^(R / cp)
/// ```
///
/// Enthalpy is independent of pressure, so `temperature(p, h)` only
/// validates `p`.
#[derive(Clone, Debug, PartialEq)]
pub struct IdealGas {
    /// Specific heat at constant pressure [J/(kg·K)]
    pub cp: f64,
    /// Specific gas constant [J/(kg·K)]
    pub gas_constant: f64,
    /// Temperature where h = h_ref [K]
    pub reference_temperature: f64,
    /// Pressure where s = s_ref at T_ref [Pa]
    pub reference_pressure: f64,
    /// Enthalpy at the reference temperature [J/kg]
    pub reference_enthalpy: f64,
    /// Entropy at the reference state [J/(kg·K)]
    pub reference_entropy: f64,
}

impl IdealGas {
    /// Create a gas from `cp` and `R`, referenced to 298.15 K / 101325 Pa.
    ///
    /// # Errors
    /// Returns error if `cp` or `R` is not positive, or if `R >= cp`
    /// (which would make `cv` non-positive).
    pub fn new(cp: f64, gas_constant: f64) -> FluidResult<Self> {
        ensure_positive(cp, "cp")?;
        ensure_positive(gas_constant, "gas constant")?;
        if gas_constant >= cp {
            return Err(FluidError::InvalidArg {
                what: "gas constant must be smaller than cp",
            });
        }
        Ok(Self {
            cp,
            gas_constant,
            reference_temperature: 298.15,
            reference_pressure: 101_325.0,
            reference_enthalpy: 0.0,
            reference_entropy: 0.0,
        })
    }

    /// Dry air with cp = 1004.5 J/(kg·K), R = 287.05 J/(kg·K).
    pub fn air() -> Self {
        Self {
            cp: 1004.5,
            gas_constant: 287.05,
            reference_temperature: 298.15,
            reference_pressure: 101_325.0,
            reference_enthalpy: 0.0,
            reference_entropy: 0.0,
        }
    }

    /// Move the enthalpy/entropy datum.
    pub fn with_reference(mut self, t: Temperature, p: Pressure, h: f64, s: f64) -> Self {
        self.reference_temperature = t.value;
        self.reference_pressure = p.value;
        self.reference_enthalpy = h;
        self.reference_entropy = s;
        self
    }

    /// Heat capacity ratio cp / cv.
    pub fn gamma(&self) -> f64 {
        self.cp / (self.cp - self.gas_constant)
    }

    fn t_from_h(&self, h: SpecEnthalpy) -> FluidResult<f64> {
        validation::validate_enthalpy(h)?;
        let t = self.reference_temperature + (h - self.reference_enthalpy) / self.cp;
        validation::validate_temperature(k(t))?;
        Ok(t)
    }

    fn h_from_t(&self, t: f64) -> SpecEnthalpy {
        self.reference_enthalpy + self.cp * (t - self.reference_temperature)
    }
}

impl Default for IdealGas {
    fn default() -> Self {
        Self::air()
    }
}

impl EquationOfState for IdealGas {
    fn name(&self) -> &str {
        "IdealGas"
    }

    fn temperature(&self, p: Pressure, h: SpecEnthalpy) -> FluidResult<Temperature> {
        validation::validate_pressure(p)?;
        Ok(k(self.t_from_h(h)?))
    }

    fn entropy(&self, p: Pressure, h: SpecEnthalpy) -> FluidResult<SpecEntropy> {
        validation::validate_pressure(p)?;
        let t = self.t_from_h(h)?;
        Ok(self.reference_entropy + self.cp * (t / self.reference_temperature).ln()
            - self.gas_constant * (p.value / self.reference_pressure).ln())
    }

    fn isentropic_enthalpy(
        &self,
        p1: Pressure,
        h1: SpecEnthalpy,
        p2: Pressure,
    ) -> FluidResult<SpecEnthalpy> {
        validation::validate_pressure(p1)?;
        validation::validate_pressure(p2)?;
        let t1 = self.t_from_h(h1)?;
        let t2 = t1 * (p2.value / p1.value).powf(self.gas_constant / self.cp);
        Ok(self.h_from_t(t2))
    }

    fn enthalpy_from_temperature(&self, p: Pressure, t: Temperature) -> FluidResult<SpecEnthalpy> {
        validation::validate_pressure(p)?;
        validation::validate_temperature(t)?;
        Ok(self.h_from_t(t.value))
    }
}
