//! Shaft-speed sweeps at a fixed target pressure ratio.

use crate::backoff::{BackoffConfig, BackoffResult, feasibility_backoff};
use crate::error::{SweepError, SweepRunResult, invalid};
use crate::roots::{RootFinderConfig, find_roots};
use crate::tracker::{BranchTracker, TrackerConfig, TrackerEvent};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tm_core::units::{k, pa, rad_per_s};
use tm_core::{BranchId, linspace};
use tm_fluids::EquationOfState;
use tm_maps::{MachineKind, PerformanceMap};
use tm_solver::{BoundaryConditions, close_energy_balance};
use tracing::{info, warn};

/// Which roots a sweep keeps at each speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchPolicy {
    /// Lowest-flow root (surge side)
    Low,
    /// Highest-flow root (choke side)
    High,
    /// Every root, tagged with a tracked branch id
    All,
}

impl BranchPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::High => "high",
            Self::All => "all",
        }
    }
}

impl fmt::Display for BranchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BranchPolicy {
    type Err = SweepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "high" => Ok(Self::High),
            "all" => Ok(Self::All),
            other => invalid(format!(
                "unknown branch policy `{other}` (expected low, high or all)"
            )),
        }
    }
}

/// Sweep definition. All physical values in SI units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Lowest shaft speed [rad/s]
    pub omega_min: f64,
    /// Highest shaft speed [rad/s]
    pub omega_max: f64,
    pub n_points: usize,
    /// Inlet total pressure [Pa]
    pub inlet_pressure: f64,
    /// Inlet total temperature [K]
    pub inlet_temperature: f64,
    /// Exit/inlet for a compressor, inlet/exit for a turbine
    pub target_pressure_ratio: f64,
    pub branch: BranchPolicy,
    pub backoff: BackoffConfig,
    pub roots: RootFinderConfig,
    pub tracker: TrackerConfig,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            omega_min: 1500.0,
            omega_max: 3300.0,
            n_points: 19,
            inlet_pressure: 101_325.0,
            inlet_temperature: 288.15,
            target_pressure_ratio: 3.0,
            branch: BranchPolicy::Low,
            backoff: BackoffConfig::default(),
            roots: RootFinderConfig::default(),
            tracker: TrackerConfig::default(),
        }
    }
}

impl SweepConfig {
    /// Reject configurations that cannot be solved, before any solving.
    pub fn validate(&self) -> SweepRunResult<()> {
        if !(self.target_pressure_ratio > 1.0) || !self.target_pressure_ratio.is_finite() {
            return invalid(format!(
                "target_pressure_ratio must be finite and exceed 1, got {}",
                self.target_pressure_ratio
            ));
        }
        if self.n_points == 0 {
            return invalid("n_points must be positive");
        }
        if !self.omega_min.is_finite() || !self.omega_max.is_finite() {
            return invalid("shaft speed bounds must be finite");
        }
        if self.omega_max < self.omega_min {
            return invalid("omega_max must not be below omega_min");
        }
        if !(self.omega_min > 0.0) {
            return invalid(format!(
                "shaft speeds must be positive, got omega_min {}",
                self.omega_min
            ));
        }
        if !(self.inlet_pressure > 0.0) || !(self.inlet_temperature > 0.0) {
            return invalid("inlet pressure and temperature must be positive");
        }
        if !(self.tracker.max_match_cost > 0.0) {
            return invalid("tracker max_match_cost must be positive");
        }
        self.roots.validate()?;
        self.backoff.validate()?;
        Ok(())
    }

    /// Shaft speeds of the sweep [rad/s].
    pub fn speeds(&self) -> Vec<f64> {
        linspace(self.omega_min, self.omega_max, self.n_points)
    }

    /// Searched value for the target: `PR * P_in` [Pa].
    fn target_value(&self) -> f64 {
        self.target_pressure_ratio * self.inlet_pressure
    }

    /// Backoff search range, defaulting to `[P_in, PR * P_in]`.
    fn backoff_bounds(&self) -> (f64, f64) {
        self.backoff
            .bounds
            .unwrap_or((self.inlet_pressure, self.target_value()))
    }
}

/// One swept speed (or one root of it, in all-branches mode).
///
/// Solution columns are `None` when the point did not converge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepRow {
    /// 0-based index of the swept speed
    pub condition: usize,
    /// [rad/s]
    pub shaft_speed: f64,
    pub corrected_speed: f64,
    pub branch: Option<BranchId>,
    pub converged: bool,
    pub used_backoff: bool,
    pub target_feasible: bool,
    /// Ratio actually solved for, after clamping and backoff
    pub pressure_ratio: f64,
    /// [Pa]
    pub exit_pressure: f64,
    pub corrected_flow: Option<f64>,
    /// [kg/s]
    pub mass_flow: Option<f64>,
    pub efficiency: Option<f64>,
    /// [J/kg]
    pub exit_enthalpy: Option<f64>,
    /// Power absorbed by the fluid [W]
    pub power: Option<f64>,
    /// [N·m]
    pub torque: Option<f64>,
}

/// Result of [`solve_sweep`]: every requested speed has at least one row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SweepOutcome {
    SingleBranch {
        policy: BranchPolicy,
        rows: Vec<SweepRow>,
    },
    AllBranches {
        rows: Vec<SweepRow>,
        branch_ids: Vec<BranchId>,
        events: Vec<TrackerEvent>,
    },
}

impl SweepOutcome {
    pub fn rows(&self) -> &[SweepRow] {
        match self {
            Self::SingleBranch { rows, .. } | Self::AllBranches { rows, .. } => rows,
        }
    }

    pub fn converged_count(&self) -> usize {
        self.rows().iter().filter(|r| r.converged).count()
    }
}

/// Fixed per-sweep state shared by every speed point.
struct SweepContext<'a> {
    map: &'a dyn PerformanceMap,
    eos: &'a dyn EquationOfState,
    config: &'a SweepConfig,
    inlet_enthalpy: f64,
}

impl SweepContext<'_> {
    fn corrected_speed(&self, omega: f64) -> f64 {
        self.map
            .reference()
            .corrected_speed(rad_per_s(omega), k(self.config.inlet_temperature))
    }

    fn exit_pressure(&self, ratio: f64) -> f64 {
        match self.map.kind() {
            MachineKind::Compressor => ratio * self.config.inlet_pressure,
            MachineKind::Turbine => self.config.inlet_pressure / ratio,
        }
    }

    /// Corrected-flow extent of the map at one speed.
    fn flow_extent(&self, corrected_speed: f64) -> SweepRunResult<f64> {
        let (lo, hi) = self.map.axis_range(corrected_speed);
        Ok(match self.map.kind() {
            MachineKind::Compressor => hi - lo,
            MachineKind::Turbine => {
                let low = self.map.evaluate(corrected_speed, lo)?.value;
                let high = self.map.evaluate(corrected_speed, hi)?.value;
                (high - low).abs()
            }
        })
    }

    /// Roots at one speed, relaxing the target when it is infeasible.
    fn roots_at(&self, corrected_speed: f64, prior: &[f64]) -> SweepRunResult<BackoffResult<f64>> {
        let (min, max) = self.config.backoff_bounds();
        let p_in = self.config.inlet_pressure;
        feasibility_backoff(
            self.config.target_value(),
            min,
            max,
            &self.config.backoff,
            |v| find_roots(self.map, corrected_speed, v / p_in, prior, &self.config.roots),
        )
    }

    fn empty_row(
        &self,
        condition: usize,
        omega: f64,
        corrected_speed: f64,
        search: &BackoffResult<f64>,
    ) -> SweepRow {
        let ratio = search.value / self.config.inlet_pressure;
        SweepRow {
            condition,
            shaft_speed: omega,
            corrected_speed,
            branch: None,
            converged: false,
            used_backoff: search.used_backoff,
            target_feasible: search.target_feasible,
            pressure_ratio: ratio,
            exit_pressure: self.exit_pressure(ratio),
            corrected_flow: None,
            mass_flow: None,
            efficiency: None,
            exit_enthalpy: None,
            power: None,
            torque: None,
        }
    }

    /// Convert a corrected-flow root to physical units and close the energy
    /// balance there.
    fn solved_row(
        &self,
        condition: usize,
        omega: f64,
        corrected_speed: f64,
        search: &BackoffResult<f64>,
        root: f64,
    ) -> SweepRunResult<SweepRow> {
        let mut row = self.empty_row(condition, omega, corrected_speed, search);
        let p_in = pa(self.config.inlet_pressure);
        let mass_flow =
            self.map
                .reference()
                .physical_flow(root, k(self.config.inlet_temperature), p_in);
        let bc = BoundaryConditions {
            inlet_pressure: p_in,
            inlet_enthalpy: self.inlet_enthalpy,
            exit_pressure: pa(row.exit_pressure),
            shaft_speed: rad_per_s(omega),
        };
        let closure = close_energy_balance(self.map, self.eos, bc, mass_flow)?;

        row.converged = true;
        row.corrected_flow = Some(root);
        row.mass_flow = Some(mass_flow.value);
        row.efficiency = Some(closure.map_output.efficiency);
        row.exit_enthalpy = Some(closure.unknowns.exit_enthalpy);
        row.power = Some(closure.power.value);
        row.torque = Some(closure.unknowns.shaft_torque.value);
        Ok(row)
    }

    fn report(&self, row: &SweepRow) {
        if !row.converged {
            warn!(
                condition = row.condition,
                shaft_speed = row.shaft_speed,
                "no feasible operating point"
            );
        } else if row.used_backoff {
            warn!(
                condition = row.condition,
                shaft_speed = row.shaft_speed,
                pressure_ratio = row.pressure_ratio,
                requested = self.config.target_pressure_ratio,
                "target relaxed by backoff"
            );
        }
    }
}

/// Sweep shaft speed and solve for the operating point(s) at each speed.
///
/// Single-branch policies keep the lowest- or highest-flow root and pass it
/// on as a continuity hint to the next speed. The `all` policy keeps every
/// root and tags each with a tracked branch id. Infeasible speeds produce a
/// non-converged row and leave the hint unchanged.
///
/// # Errors
/// Returns error for an invalid configuration (before any solving) and for
/// map, fluid or energy-balance failures at any point.
pub fn solve_sweep(
    map: &dyn PerformanceMap,
    eos: &dyn EquationOfState,
    config: &SweepConfig,
) -> SweepRunResult<SweepOutcome> {
    config.validate()?;
    let inlet_enthalpy =
        eos.enthalpy_from_temperature(pa(config.inlet_pressure), k(config.inlet_temperature))?;
    let ctx = SweepContext {
        map,
        eos,
        config,
        inlet_enthalpy,
    };

    let outcome = match config.branch {
        BranchPolicy::Low | BranchPolicy::High => single_branch(&ctx)?,
        BranchPolicy::All => all_branches(&ctx)?,
    };

    info!(
        kind = %map.kind(),
        policy = %config.branch,
        points = config.n_points,
        rows = outcome.rows().len(),
        converged = outcome.converged_count(),
        "sweep finished"
    );
    Ok(outcome)
}

fn single_branch(ctx: &SweepContext<'_>) -> SweepRunResult<SweepOutcome> {
    let policy = ctx.config.branch;
    let mut hint: Option<f64> = None;
    let mut rows = Vec::with_capacity(ctx.config.n_points);

    for (condition, omega) in ctx.config.speeds().into_iter().enumerate() {
        let nc = ctx.corrected_speed(omega);
        let prior: Vec<f64> = hint.into_iter().collect();
        let search = ctx.roots_at(nc, &prior)?;
        let chosen = match policy {
            BranchPolicy::High => search.roots.last(),
            _ => search.roots.first(),
        };
        let row = match chosen {
            Some(&root) => {
                hint = Some(root);
                ctx.solved_row(condition, omega, nc, &search, root)?
            }
            None => ctx.empty_row(condition, omega, nc, &search),
        };
        ctx.report(&row);
        rows.push(row);
    }

    Ok(SweepOutcome::SingleBranch { policy, rows })
}

fn all_branches(ctx: &SweepContext<'_>) -> SweepRunResult<SweepOutcome> {
    let speeds = ctx.config.speeds();
    // Distance between roots as a fraction of the widest flow range swept
    let mut flow_scale = f64::MIN_POSITIVE;
    for &omega in &speeds {
        flow_scale = flow_scale.max(ctx.flow_extent(ctx.corrected_speed(omega))?);
    }
    let distance = |a: &f64, b: &f64| (a - b).abs() / flow_scale;

    let mut tracker = BranchTracker::new(ctx.config.tracker.clone());
    let mut prior: Vec<f64> = Vec::new();
    let mut rows = Vec::new();

    for (condition, omega) in speeds.into_iter().enumerate() {
        let nc = ctx.corrected_speed(omega);
        let search = ctx.roots_at(nc, &prior)?;
        let ids = tracker.step(&search.roots, &distance);

        if search.roots.is_empty() {
            let row = ctx.empty_row(condition, omega, nc, &search);
            ctx.report(&row);
            rows.push(row);
            continue;
        }
        for (&root, id) in search.roots.iter().zip(ids) {
            let mut row = ctx.solved_row(condition, omega, nc, &search, root)?;
            row.branch = id;
            ctx.report(&row);
            rows.push(row);
        }
        prior.clone_from(&search.roots);
    }

    let tracking = tracker.finish();
    Ok(SweepOutcome::AllBranches {
        rows,
        branch_ids: tracking.branch_ids,
        events: tracking.events,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_policy_parses() {
        assert_eq!("low".parse::<BranchPolicy>().unwrap(), BranchPolicy::Low);
        assert_eq!("all".parse::<BranchPolicy>().unwrap(), BranchPolicy::All);
        assert!(matches!(
            "middle".parse::<BranchPolicy>(),
            Err(SweepError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn invalid_configs_fail_fast() {
        let bad_ratio = SweepConfig {
            target_pressure_ratio: 1.0,
            ..SweepConfig::default()
        };
        assert!(bad_ratio.validate().is_err());

        let mut bad_tol = SweepConfig::default();
        bad_tol.backoff.value_tol = 0.0;
        assert!(bad_tol.validate().is_err());

        let mut bad_root_tol = SweepConfig::default();
        bad_root_tol.roots.root_tol = -1.0;
        assert!(bad_root_tol.validate().is_err());

        let standstill = SweepConfig {
            omega_min: 0.0,
            ..SweepConfig::default()
        };
        assert!(matches!(
            standstill.validate(),
            Err(SweepError::InvalidConfig { .. })
        ));

        let mut empty_bounds = SweepConfig::default();
        empty_bounds.backoff.bounds = Some((2.0e5, 2.0e5));
        assert!(matches!(
            empty_bounds.validate(),
            Err(SweepError::EmptyBackoffRange { .. })
        ));

        assert!(SweepConfig::default().validate().is_ok());
    }

    #[test]
    fn default_backoff_bounds_span_inlet_to_target() {
        let config = SweepConfig::default();
        assert_eq!(config.backoff_bounds(), (101_325.0, 3.0 * 101_325.0));
    }
}
