//! Reference state and corrected (similarity) parameters.

use crate::error::MapResult;
use tm_core::ensure_positive;
use tm_core::units::{AngularVelocity, MassRate, Pressure, Temperature, k, kgps, pa, rad_per_s};

/// Reference stagnation conditions used to non-dimensionalize speed and flow.
///
/// ```text
/// theta = T_in / T_ref        delta = P_in / P_ref
/// N_c   = omega / sqrt(theta)
/// m_c   = mdot * sqrt(theta) / delta
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReferenceState {
    temperature: Temperature,
    pressure: Pressure,
}

impl ReferenceState {
    /// Create a reference state.
    ///
    /// # Errors
    /// Returns error if either value is non-positive or non-finite.
    pub fn new(temperature: Temperature, pressure: Pressure) -> MapResult<Self> {
        ensure_positive(temperature.value, "reference temperature")?;
        ensure_positive(pressure.value, "reference pressure")?;
        Ok(Self {
            temperature,
            pressure,
        })
    }

    /// ISA sea-level reference: 288.15 K, 101325 Pa.
    pub fn standard() -> Self {
        Self {
            temperature: k(288.15),
            pressure: pa(101_325.0),
        }
    }

    pub fn temperature(&self) -> Temperature {
        self.temperature
    }

    pub fn pressure(&self) -> Pressure {
        self.pressure
    }

    pub fn theta(&self, t_in: Temperature) -> f64 {
        t_in.value / self.temperature.value
    }

    pub fn delta(&self, p_in: Pressure) -> f64 {
        p_in.value / self.pressure.value
    }

    /// Corrected speed [rad/s].
    pub fn corrected_speed(&self, omega: AngularVelocity, t_in: Temperature) -> f64 {
        omega.value / self.theta(t_in).sqrt()
    }

    /// Physical shaft speed for a corrected speed.
    pub fn physical_speed(&self, corrected: f64, t_in: Temperature) -> AngularVelocity {
        rad_per_s(corrected * self.theta(t_in).sqrt())
    }

    /// Corrected mass flow [kg/s].
    pub fn corrected_flow(&self, mdot: MassRate, t_in: Temperature, p_in: Pressure) -> f64 {
        mdot.value * self.theta(t_in).sqrt() / self.delta(p_in)
    }

    /// Physical mass flow for a corrected flow.
    pub fn physical_flow(&self, corrected: f64, t_in: Temperature, p_in: Pressure) -> MassRate {
        kgps(corrected * self.delta(p_in) / self.theta(t_in).sqrt())
    }
}

impl Default for ReferenceState {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_reference() {
        assert!(ReferenceState::new(k(0.0), pa(1.0e5)).is_err());
        assert!(ReferenceState::new(k(288.0), pa(-1.0)).is_err());
        assert!(ReferenceState::new(k(f64::NAN), pa(1.0e5)).is_err());
    }

    #[test]
    fn corrected_equals_physical_at_reference() {
        let r = ReferenceState::standard();
        let nc = r.corrected_speed(rad_per_s(1200.0), r.temperature());
        let mc = r.corrected_flow(kgps(3.5), r.temperature(), r.pressure());
        assert_eq!(nc, 1200.0);
        assert_eq!(mc, 3.5);
    }

    #[test]
    fn flow_correction_round_trip() {
        let r = ReferenceState::standard();
        let (t, p) = (k(350.0), pa(2.5e5));
        let mc = r.corrected_flow(kgps(4.0), t, p);
        let back = r.physical_flow(mc, t, p);
        assert!((back.value - 4.0).abs() < 1e-12);

        let w = r.physical_speed(r.corrected_speed(rad_per_s(900.0), t), t);
        assert!((w.value - 900.0).abs() < 1e-9);
    }
}
