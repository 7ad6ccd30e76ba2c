//! Error types for map construction, evaluation and persistence.

use thiserror::Error;
use tm_core::TmError;

/// Errors that can occur while building, evaluating or persisting a map.
#[derive(Error, Debug)]
pub enum MapError {
    #[error("Invalid grid: {what}")]
    InvalidGrid { what: String },

    #[error("Table shape mismatch for {table}: expected {expected_rows}x{expected_cols}, got {rows}x{cols}")]
    ShapeMismatch {
        table: &'static str,
        expected_rows: usize,
        expected_cols: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Invalid parameter {name}: {what}")]
    InvalidParameter { name: &'static str, what: String },

    #[error("Non-finite value for {what}")]
    NonFinite { what: &'static str },

    #[error("Map evaluation undefined: {what}")]
    Undefined { what: String },

    #[error("Missing key `{key}` in group `{group}`")]
    MissingKey { group: String, key: String },

    #[error("Group path `{group}` collides with a non-table value at `{at}`")]
    GroupCollision { group: String, at: String },

    #[error("Format error in group `{group}`: {what}")]
    Format { group: String, what: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error(transparent)]
    Core(#[from] TmError),
}

pub type MapResult<T> = Result<T, MapError>;
