//! Operating-point solve and energy-balance closure.

use crate::error::SolverResult;
use crate::jacobian::central_difference_jacobian;
use crate::newton::{NewtonConfig, SolverStatus, newton_solve};
use crate::residual::{BoundaryConditions, ResidualModel, ResidualScales, Residuals, Unknowns};
use nalgebra::DVector;
use tm_core::units::{MassRate, Power, SpecEnthalpy, Torque, nm, watts};
use tm_fluids::EquationOfState;
use tm_maps::{MachineKind, MapOutput, PerformanceMap};
use tracing::debug;

/// Options for [`solve_operating_point`].
#[derive(Debug, Clone, PartialEq)]
pub struct OperatingPointOptions {
    pub newton: NewtonConfig,
    pub scales: ResidualScales,
    /// Iterate on scaled residuals (default) instead of raw ones.
    pub use_scaled: bool,
}

impl Default for OperatingPointOptions {
    fn default() -> Self {
        Self {
            newton: NewtonConfig::default(),
            scales: ResidualScales::default(),
            use_scaled: true,
        }
    }
}

/// Result of one operating-point solve.
///
/// On failure the unknowns hold the solver's last iterate.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatingPointResult {
    pub mass_flow: MassRate,
    pub exit_enthalpy: SpecEnthalpy,
    pub shaft_torque: Torque,
    /// Raw residuals re-evaluated at the returned unknowns.
    pub residuals: Residuals,
    pub map_output: MapOutput,
    pub converged: bool,
    pub status: SolverStatus,
    pub iterations: usize,
}

impl OperatingPointResult {
    pub fn unknowns(&self) -> Unknowns {
        Unknowns {
            mass_flow: self.mass_flow,
            exit_enthalpy: self.exit_enthalpy,
            shaft_torque: self.shaft_torque,
        }
    }
}

/// Solve the three residual equations from an initial guess.
///
/// There is no internal retry: a failed solve returns `converged == false`
/// and the caller chooses whether to try another guess.
///
/// # Errors
/// Returns error for invalid boundary values, and for map or
/// equation-of-state failures (including non-positive efficiency) at any
/// visited state.
pub fn solve_operating_point(
    map: &dyn PerformanceMap,
    eos: &dyn EquationOfState,
    bc: BoundaryConditions,
    guess: Unknowns,
    options: &OperatingPointOptions,
) -> SolverResult<OperatingPointResult> {
    let model = ResidualModel::new(map, eos, bc, options.scales)?;

    let residual_fn = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
        let eval = model.evaluate(&Unknowns::from_vector(x)?)?;
        Ok(if options.use_scaled {
            eval.scaled().to_vector()
        } else {
            eval.raw.to_vector()
        })
    };
    let jacobian_fn = |x: &DVector<f64>| {
        central_difference_jacobian(x, &residual_fn, options.newton.jacobian_step)
    };

    let result = newton_solve(guess.to_vector(), &residual_fn, jacobian_fn, &options.newton)?;
    let solution = Unknowns::from_vector(&result.x)?;
    let eval = model.evaluate(&solution)?;

    debug!(
        kind = %map.kind(),
        converged = result.converged,
        status = %result.status,
        iterations = result.iterations,
        residual_norm = result.residual_norm,
        "operating point solve finished"
    );

    Ok(OperatingPointResult {
        mass_flow: solution.mass_flow,
        exit_enthalpy: solution.exit_enthalpy,
        shaft_torque: solution.shaft_torque,
        residuals: eval.raw,
        map_output: eval.map_output,
        converged: result.converged,
        status: result.status,
        iterations: result.iterations,
    })
}

/// State reached by closing the energy balance at a known mass flow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyClosure {
    pub unknowns: Unknowns,
    pub map_output: MapOutput,
    pub isentropic_exit_enthalpy: SpecEnthalpy,
    /// Power absorbed by the fluid (negative for a turbine).
    pub power: Power,
}

/// Back out exit enthalpy, power and torque from a map evaluation.
///
/// Solves the energy and power equations directly for the given mass flow
/// without touching the pressure equation:
///
/// ```text
/// compressor  dh = (h_s - h_in) / eta
/// turbine     dh = eta (h_s - h_in)
/// power = mdot dh,  torque = power / omega
/// ```
///
/// A zero shaft speed yields zero torque.
pub fn close_energy_balance(
    map: &dyn PerformanceMap,
    eos: &dyn EquationOfState,
    bc: BoundaryConditions,
    mass_flow: MassRate,
) -> SolverResult<EnergyClosure> {
    let model = ResidualModel::new(map, eos, bc, ResidualScales::default())?;
    let trial = Unknowns {
        mass_flow,
        exit_enthalpy: bc.inlet_enthalpy,
        shaft_torque: nm(0.0),
    };
    // Efficiency does not depend on exit enthalpy or torque
    let eval = model.evaluate(&trial)?;
    let eta = eval.map_output.efficiency;
    let ideal = eval.isentropic_exit_enthalpy - bc.inlet_enthalpy;
    let dh = match map.kind() {
        MachineKind::Compressor => ideal / eta,
        MachineKind::Turbine => eta * ideal,
    };
    let power = mass_flow.value * dh;
    let omega = bc.shaft_speed.value;
    let torque = if omega == 0.0 { 0.0 } else { power / omega };

    Ok(EnergyClosure {
        unknowns: Unknowns {
            mass_flow,
            exit_enthalpy: bc.inlet_enthalpy + dh,
            shaft_torque: nm(torque),
        },
        map_output: eval.map_output,
        isentropic_exit_enthalpy: eval.isentropic_exit_enthalpy,
        power: watts(power),
    })
}
