//! tm-fluids: equation-of-state collaborators for the turbomap engine.
//!
//! Provides:
//! - `EquationOfState` trait: the narrow property interface the map solve
//!   engine consumes (temperature, entropy, isentropic enthalpy, enthalpy
//!   from temperature)
//! - `IdealGas`: calorically perfect gas, no native dependencies
//! - `CoolPropEos` (feature `coolprop`): real-fluid properties via `rfluids`
//!
//! # Example
//!
//! ```
//! use tm_fluids::{EquationOfState, IdealGas};
//! use tm_core::units::{k, pa};
//!
//! let air = IdealGas::air();
//! let h1 = air.enthalpy_from_temperature(pa(101_325.0), k(288.15)).unwrap();
//! let h2s = air.isentropic_enthalpy(pa(101_325.0), h1, pa(202_650.0)).unwrap();
//! assert!(h2s > h1);
//! ```

#[cfg(feature = "coolprop")]
pub mod coolprop;
pub mod error;
pub mod ideal_gas;
pub mod model;

#[cfg(feature = "coolprop")]
pub use coolprop::CoolPropEos;
pub use error::{FluidError, FluidResult};
pub use ideal_gas::IdealGas;
pub use model::EquationOfState;
