//! tm-maps: turbomachine performance maps.
//!
//! Provides:
//! - `Table2D`: bilinear and monotone bicubic interpolation on rectilinear grids
//! - `TabulatedMap`: pressure ratio (or corrected flow) and efficiency tables
//! - `AnalyticMap`: smooth closed-form compressor map
//! - `ReferenceState`: corrected speed and flow conversions
//! - persistence of both map kinds in TOML documents
//!
//! # Example
//!
//! ```
//! use tm_maps::{AnalyticMap, AnalyticParams, PerformanceMap, ReferenceState};
//!
//! let map = AnalyticMap::new(ReferenceState::standard(), AnalyticParams::default()).unwrap();
//! let (surge, choke) = map.axis_range(3000.0);
//! let out = map.evaluate(3000.0, 0.5 * (surge + choke)).unwrap();
//! assert!(out.value > 1.0);
//! assert!(out.efficiency > 0.0 && out.efficiency < 1.0);
//! ```

pub mod analytic;
pub mod error;
pub mod interp;
pub mod map;
pub mod persist;
pub mod reference;
pub mod table_map;

pub use analytic::{AnalyticMap, AnalyticParams};
pub use error::{MapError, MapResult};
pub use interp::{Interpolation, Table2D};
pub use map::{AnyMap, MachineKind, MapOutput, PerformanceMap};
pub use persist::{load_map_file, read_map, save_map_file, write_map};
pub use reference::ReferenceState;
pub use table_map::TabulatedMap;
