//! CLI errors.

use thiserror::Error;
use tm_fluids::FluidError;
use tm_maps::MapError;
use tm_sweep::SweepError;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Map error: {0}")]
    Map(#[from] MapError),

    #[error("Fluid error: {0}")]
    Fluid(#[from] FluidError),

    #[error("Sweep error: {0}")]
    Sweep(#[from] SweepError),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
