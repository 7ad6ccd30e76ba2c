//! tm-core: shared foundation for the turbomap engine.
//!
//! Contains:
//! - units (uom SI types + constructors)
//! - numeric (Real + validation and grid helpers)
//! - ids (branch identities handed out by the tracker)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

pub use error::{TmError, TmResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
