//! YAML sweep definitions.
//!
//! ```yaml
//! map:
//!   path: maps.toml
//!   group: maps.hpc
//! fluid:
//!   model: ideal_gas
//!   cp: 1004.5
//!   gas_constant: 287.05
//! sweep:
//!   omega_min: 1500.0
//!   omega_max: 3300.0
//!   target_pressure_ratio: 3.0
//!   branch: all
//! ```

use crate::error::{CliError, CliResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tm_fluids::{EquationOfState, IdealGas};
use tm_sweep::SweepConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepFile {
    pub map: MapRef,
    #[serde(default)]
    pub fluid: FluidSpec,
    #[serde(default)]
    pub sweep: SweepConfig,
}

/// Location of a stored map. Relative paths resolve against the YAML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapRef {
    pub path: PathBuf,
    pub group: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum FluidSpec {
    IdealGas {
        /// [J/(kg·K)]
        cp: f64,
        /// [J/(kg·K)]
        gas_constant: f64,
    },
    /// Pure substance through CoolProp, e.g. `nitrogen`
    Coolprop { substance: String },
}

impl Default for FluidSpec {
    fn default() -> Self {
        let air = IdealGas::air();
        Self::IdealGas {
            cp: air.cp,
            gas_constant: air.gas_constant,
        }
    }
}

impl FluidSpec {
    pub fn build(&self) -> CliResult<Box<dyn EquationOfState>> {
        match self {
            Self::IdealGas { cp, gas_constant } => Ok(Box::new(IdealGas::new(*cp, *gas_constant)?)),
            Self::Coolprop { substance } => coolprop_model(substance),
        }
    }
}

#[cfg(feature = "coolprop")]
fn coolprop_model(substance: &str) -> CliResult<Box<dyn EquationOfState>> {
    use rfluids::prelude::Pure;

    let pure = match substance.to_ascii_lowercase().as_str() {
        "air" => Pure::Air,
        "nitrogen" | "n2" => Pure::Nitrogen,
        "oxygen" | "o2" => Pure::Oxygen,
        "argon" | "ar" => Pure::Argon,
        "helium" | "he" => Pure::Helium,
        "hydrogen" | "h2" => Pure::Hydrogen,
        "methane" | "ch4" => Pure::Methane,
        "carbon_dioxide" | "co2" => Pure::CarbonDioxide,
        "water" | "h2o" => Pure::Water,
        other => {
            return Err(CliError::Config(format!("unknown substance `{other}`")));
        }
    };
    Ok(Box::new(tm_fluids::CoolPropEos::new(pure)))
}

#[cfg(not(feature = "coolprop"))]
fn coolprop_model(substance: &str) -> CliResult<Box<dyn EquationOfState>> {
    Err(CliError::Config(format!(
        "substance `{substance}` needs a build with the `coolprop` feature"
    )))
}

impl SweepFile {
    pub fn parse(text: &str) -> CliResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Read a sweep file and resolve its map path.
    pub fn load(path: &Path) -> CliResult<Self> {
        let text = fs::read_to_string(path)?;
        let mut file = Self::parse(&text)?;
        if file.map.path.is_relative() {
            if let Some(dir) = path.parent() {
                file.map.path = dir.join(&file.map.path);
            }
        }
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tm_sweep::BranchPolicy;

    #[test]
    fn minimal_file_uses_defaults() {
        let file = SweepFile::parse("map:\n  path: maps.toml\n  group: hpc\n").unwrap();
        assert_eq!(file.map.group, "hpc");
        assert_eq!(file.fluid, FluidSpec::default());
        assert_eq!(file.sweep, SweepConfig::default());
    }

    #[test]
    fn sweep_section_overrides_defaults() {
        let text = "\
map: {path: maps.toml, group: hpc}
fluid: {model: ideal_gas, cp: 1040.0, gas_constant: 296.8}
sweep:
  n_points: 5
  branch: high
  backoff: {enabled: false}
";
        let file = SweepFile::parse(text).unwrap();
        assert_eq!(file.sweep.n_points, 5);
        assert_eq!(file.sweep.branch, BranchPolicy::High);
        assert!(!file.sweep.backoff.enabled);
        assert_eq!(file.sweep.backoff.n_probe, 33);
        assert!(file.fluid.build().is_ok());
    }

    #[test]
    fn unknown_branch_policy_is_rejected() {
        let text = "map: {path: m.toml, group: g}\nsweep: {branch: middle}\n";
        assert!(matches!(SweepFile::parse(text), Err(CliError::Yaml(_))));
    }

    #[test]
    fn invalid_ideal_gas_is_rejected() {
        let fluid = FluidSpec::IdealGas {
            cp: 1000.0,
            gas_constant: 1200.0,
        };
        assert!(matches!(fluid.build(), Err(CliError::Fluid(_))));
    }

    #[test]
    fn relative_map_path_follows_the_sweep_file() {
        let dir = std::env::temp_dir().join(format!("tm_cli_sweep_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("sweep.yaml");
        fs::write(&path, "map: {path: maps.toml, group: hpc}\n").unwrap();
        let file = SweepFile::load(&path).unwrap();
        assert_eq!(file.map.path, dir.join("maps.toml"));
        fs::remove_dir_all(&dir).ok();
    }
}
