//! Operating-point residuals of a single turbomachine.
//!
//! Fixed boundary values: inlet total pressure and enthalpy, exit total
//! pressure, shaft speed. Unknowns: mass flow, exit enthalpy, shaft torque.
//!
//! ```text
//! compressor  R_p = P_out - PR(N_c, m_c) P_in
//!             R_e = eta (h_out - h_in) - (h_s - h_in)
//! turbine     R_p = mdot - mdot_map(N_c, P_in / P_out)
//!             R_e = (h_in - h_out) - eta (h_in - h_s)
//! both        R_w = tau omega - mdot (h_out - h_in)
//! ```
//!
//! `h_s` is the isentropic enthalpy at `P_out` from the inlet state. Torque
//! is positive when the shaft drives the machine, so a turbine solves to a
//! negative torque.

use crate::error::{SolverError, SolverResult};
use nalgebra::DVector;
use tm_core::units::{
    AngularVelocity, MassRate, Pressure, SpecEnthalpy, Temperature, Torque, kgps, nm,
};
use tm_fluids::EquationOfState;
use tm_maps::{MachineKind, MapOutput, PerformanceMap};

/// Boundary values held fixed during an operating-point solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryConditions {
    pub inlet_pressure: Pressure,
    pub inlet_enthalpy: SpecEnthalpy,
    pub exit_pressure: Pressure,
    pub shaft_speed: AngularVelocity,
}

impl BoundaryConditions {
    pub fn validate(&self) -> SolverResult<()> {
        if !(self.inlet_pressure.value > 0.0 && self.inlet_pressure.value.is_finite()) {
            return Err(SolverError::InvalidBoundary {
                what: "inlet pressure must be positive and finite",
            });
        }
        if !(self.exit_pressure.value > 0.0 && self.exit_pressure.value.is_finite()) {
            return Err(SolverError::InvalidBoundary {
                what: "exit pressure must be positive and finite",
            });
        }
        if !self.inlet_enthalpy.is_finite() {
            return Err(SolverError::InvalidBoundary {
                what: "inlet enthalpy must be finite",
            });
        }
        if !self.shaft_speed.value.is_finite() {
            return Err(SolverError::InvalidBoundary {
                what: "shaft speed must be finite",
            });
        }
        Ok(())
    }
}

/// The three solved quantities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unknowns {
    pub mass_flow: MassRate,
    pub exit_enthalpy: SpecEnthalpy,
    pub shaft_torque: Torque,
}

impl Unknowns {
    /// SI values in solver order `[mdot, h_out, tau]`.
    pub fn to_vector(&self) -> DVector<f64> {
        DVector::from_vec(vec![
            self.mass_flow.value,
            self.exit_enthalpy,
            self.shaft_torque.value,
        ])
    }

    pub fn from_vector(x: &DVector<f64>) -> SolverResult<Self> {
        if x.len() != 3 {
            return Err(SolverError::Numeric {
                what: format!("expected 3 unknowns, got {}", x.len()),
            });
        }
        Ok(Self {
            mass_flow: kgps(x[0]),
            exit_enthalpy: x[1],
            shaft_torque: nm(x[2]),
        })
    }
}

/// One value per residual equation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Residuals {
    pub pressure: f64,
    pub energy: f64,
    pub power: f64,
}

impl Residuals {
    pub fn to_vector(&self) -> DVector<f64> {
        DVector::from_vec(vec![self.pressure, self.energy, self.power])
    }

    pub fn norm(&self) -> f64 {
        self.to_vector().norm()
    }

    pub fn max_abs(&self) -> f64 {
        self.pressure
            .abs()
            .max(self.energy.abs())
            .max(self.power.abs())
    }
}

/// Caller overrides for the residual scales.
///
/// `None` means the scale is derived from the current state:
/// `max(|quantities|, 1)` over the quantities entering each equation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResidualScales {
    pub pressure: Option<f64>,
    pub energy: Option<f64>,
    pub power: Option<f64>,
}

impl ResidualScales {
    fn validate(&self) -> SolverResult<()> {
        for s in [self.pressure, self.energy, self.power].into_iter().flatten() {
            if !(s > 0.0 && s.is_finite()) {
                return Err(SolverError::InvalidBoundary {
                    what: "residual scale overrides must be positive and finite",
                });
            }
        }
        Ok(())
    }
}

/// Everything computed while evaluating the residuals at one state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidualEvaluation {
    pub raw: Residuals,
    /// Scales in effect at this state (overrides or derived).
    pub scales: Residuals,
    pub map_output: MapOutput,
    pub corrected_speed: f64,
    /// Corrected flow (compressor) or pressure ratio in/out (turbine).
    pub map_axis_value: f64,
    pub isentropic_exit_enthalpy: SpecEnthalpy,
    pub inlet_temperature: Temperature,
}

impl ResidualEvaluation {
    pub fn scaled(&self) -> Residuals {
        Residuals {
            pressure: self.raw.pressure / self.scales.pressure,
            energy: self.raw.energy / self.scales.energy,
            power: self.raw.power / self.scales.power,
        }
    }
}

fn scale_of(values: &[f64]) -> f64 {
    values.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()))
}

/// Residual equations of one machine at fixed boundary values.
pub struct ResidualModel<'a> {
    map: &'a dyn PerformanceMap,
    bc: BoundaryConditions,
    scales: ResidualScales,
    inlet_temperature: Temperature,
    isentropic_exit_enthalpy: SpecEnthalpy,
}

impl<'a> ResidualModel<'a> {
    /// Validate the boundary values and precompute the inlet state.
    ///
    /// The inlet temperature and the isentropic exit enthalpy depend only on
    /// boundary values, so they are evaluated once here.
    pub fn new(
        map: &'a dyn PerformanceMap,
        eos: &dyn EquationOfState,
        bc: BoundaryConditions,
        scales: ResidualScales,
    ) -> SolverResult<Self> {
        bc.validate()?;
        scales.validate()?;
        let inlet_temperature = eos.temperature(bc.inlet_pressure, bc.inlet_enthalpy)?;
        let isentropic_exit_enthalpy =
            eos.isentropic_enthalpy(bc.inlet_pressure, bc.inlet_enthalpy, bc.exit_pressure)?;
        Ok(Self {
            map,
            bc,
            scales,
            inlet_temperature,
            isentropic_exit_enthalpy,
        })
    }

    pub fn inlet_temperature(&self) -> Temperature {
        self.inlet_temperature
    }

    pub fn corrected_speed(&self) -> f64 {
        self.map
            .reference()
            .corrected_speed(self.bc.shaft_speed, self.inlet_temperature)
    }

    /// Evaluate raw residuals, scales and intermediate quantities.
    ///
    /// # Errors
    /// Map and equation-of-state failures propagate, and a non-positive map
    /// efficiency is rejected rather than clamped.
    pub fn evaluate(&self, u: &Unknowns) -> SolverResult<ResidualEvaluation> {
        let bc = &self.bc;
        let reference = self.map.reference();
        let corrected_speed = self.corrected_speed();
        let mdot = u.mass_flow.value;
        let h_in = bc.inlet_enthalpy;
        let h_out = u.exit_enthalpy;
        let h_s = self.isentropic_exit_enthalpy;
        let p_in = bc.inlet_pressure.value;
        let p_out = bc.exit_pressure.value;

        let (map_axis_value, map_output, pressure, pressure_scale) = match self.map.kind() {
            MachineKind::Compressor => {
                let flow =
                    reference.corrected_flow(u.mass_flow, self.inlet_temperature, bc.inlet_pressure);
                let out = self.map.evaluate(corrected_speed, flow)?;
                let r = p_out - out.value * p_in;
                (flow, out, r, scale_of(&[p_in, p_out]))
            }
            MachineKind::Turbine => {
                let ratio = p_in / p_out;
                let out = self.map.evaluate(corrected_speed, ratio)?;
                let mdot_map = reference
                    .physical_flow(out.value, self.inlet_temperature, bc.inlet_pressure)
                    .value;
                let r = mdot - mdot_map;
                (ratio, out, r, scale_of(&[mdot, mdot_map]))
            }
        };

        let eta = map_output.efficiency;
        if eta <= 0.0 {
            return Err(SolverError::NonPositiveEfficiency {
                efficiency: eta,
                corrected_speed,
                axis_value: map_axis_value,
            });
        }

        let energy = match self.map.kind() {
            MachineKind::Compressor => eta * (h_out - h_in) - (h_s - h_in),
            MachineKind::Turbine => (h_in - h_out) - eta * (h_in - h_s),
        };
        let shaft_power = u.shaft_torque.value * bc.shaft_speed.value;
        let fluid_power = mdot * (h_out - h_in);
        let power = shaft_power - fluid_power;

        let raw = Residuals {
            pressure,
            energy,
            power,
        };
        let scales = Residuals {
            pressure: self.scales.pressure.unwrap_or(pressure_scale),
            energy: self.scales.energy.unwrap_or_else(|| scale_of(&[h_in, h_out])),
            power: self
                .scales
                .power
                .unwrap_or_else(|| scale_of(&[shaft_power, fluid_power])),
        };

        Ok(ResidualEvaluation {
            raw,
            scales,
            map_output,
            corrected_speed,
            map_axis_value,
            isentropic_exit_enthalpy: h_s,
            inlet_temperature: self.inlet_temperature,
        })
    }

    pub fn raw(&self, u: &Unknowns) -> SolverResult<Residuals> {
        Ok(self.evaluate(u)?.raw)
    }

    pub fn scaled(&self, u: &Unknowns) -> SolverResult<Residuals> {
        Ok(self.evaluate(u)?.scaled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tm_core::units::{k, pa, rad_per_s};
    use tm_fluids::IdealGas;
    use tm_maps::{Interpolation, ReferenceState, TabulatedMap};

    fn constant_map(kind: MachineKind, value: f64, eta: f64) -> TabulatedMap {
        TabulatedMap::from_fn(
            kind,
            ReferenceState::standard(),
            Interpolation::Bilinear,
            vec![100.0, 5000.0],
            vec![0.5, 50.0],
            move |_, _| Ok((value, eta)),
        )
        .unwrap()
    }

    fn bc(eos: &IdealGas, p_out: f64) -> BoundaryConditions {
        BoundaryConditions {
            inlet_pressure: pa(101_325.0),
            inlet_enthalpy: eos.enthalpy_from_temperature(pa(101_325.0), k(288.15)).unwrap(),
            exit_pressure: pa(p_out),
            shaft_speed: rad_per_s(3000.0),
        }
    }

    #[test]
    fn negative_efficiency_is_an_error() {
        let eos = IdealGas::air();
        let map = constant_map(MachineKind::Compressor, 2.0, -0.1);
        let model = ResidualModel::new(&map, &eos, bc(&eos, 202_650.0), ResidualScales::default())
            .unwrap();
        let u = Unknowns {
            mass_flow: kgps(5.0),
            exit_enthalpy: 400_000.0,
            shaft_torque: nm(100.0),
        };
        assert!(matches!(
            model.evaluate(&u),
            Err(SolverError::NonPositiveEfficiency { .. })
        ));
    }

    #[test]
    fn invalid_boundaries_fail_at_construction() {
        let eos = IdealGas::air();
        let map = constant_map(MachineKind::Compressor, 2.0, 0.8);
        assert!(ResidualModel::new(&map, &eos, bc(&eos, 0.0), ResidualScales::default()).is_err());
        let scales = ResidualScales {
            energy: Some(0.0),
            ..ResidualScales::default()
        };
        assert!(ResidualModel::new(&map, &eos, bc(&eos, 2.0e5), scales).is_err());
    }

    #[test]
    fn turbine_flow_residual_uses_physical_flow() {
        let eos = IdealGas::air();
        let map = constant_map(MachineKind::Turbine, 3.0, 0.9);
        let model =
            ResidualModel::new(&map, &eos, bc(&eos, 50_000.0), ResidualScales::default()).unwrap();
        // Inlet at reference conditions: corrected and physical flow coincide
        let u = Unknowns {
            mass_flow: kgps(3.0),
            exit_enthalpy: 0.0,
            shaft_torque: nm(0.0),
        };
        let eval = model.evaluate(&u).unwrap();
        assert!(eval.raw.pressure.abs() < 1e-9);
        assert!((eval.map_axis_value - 101_325.0 / 50_000.0).abs() < 1e-12);
    }

    #[test]
    fn unknown_vector_round_trip() {
        let u = Unknowns {
            mass_flow: kgps(2.0),
            exit_enthalpy: 3.5e5,
            shaft_torque: nm(-40.0),
        };
        assert_eq!(Unknowns::from_vector(&u.to_vector()).unwrap(), u);
        assert!(Unknowns::from_vector(&DVector::zeros(2)).is_err());
    }
}
