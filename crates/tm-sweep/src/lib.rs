//! tm-sweep: multi-root search, feasibility backoff, branch tracking and
//! shaft-speed sweeps over a turbomachine performance map.
//!
//! # Example
//!
//! ```
//! use tm_fluids::IdealGas;
//! use tm_maps::{AnalyticMap, AnalyticParams, ReferenceState};
//! use tm_sweep::{BranchPolicy, SweepConfig, solve_sweep};
//!
//! let map = AnalyticMap::new(ReferenceState::standard(), AnalyticParams::default()).unwrap();
//! let config = SweepConfig {
//!     omega_min: 2400.0,
//!     omega_max: 3200.0,
//!     n_points: 5,
//!     target_pressure_ratio: 3.0,
//!     branch: BranchPolicy::High,
//!     ..SweepConfig::default()
//! };
//! let outcome = solve_sweep(&map, &IdealGas::air(), &config).unwrap();
//! assert_eq!(outcome.rows().len(), 5);
//! ```

pub mod backoff;
pub mod error;
pub mod export;
pub mod roots;
pub mod sweep;
pub mod tracker;

pub use backoff::{BackoffConfig, BackoffResult, feasibility_backoff};
pub use error::{SweepError, SweepRunResult};
pub use roots::{RootFinderConfig, find_roots};
pub use sweep::{BranchPolicy, SweepConfig, SweepOutcome, SweepRow, solve_sweep};
pub use tracker::{
    Branch, BranchPoint, BranchTracker, TrackerConfig, TrackerEvent, TrackingResult,
    track_branches,
};
