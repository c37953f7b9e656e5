//! Units for halo-finder catalogues.
//!
//! Catalogue fields are stored in file-native units (often with a numeric
//! prefactor such as `1e10 Msun`) and may be comoving or scaled by little-h.
//! This crate provides the pieces needed to turn them into physical,
//! self-describing arrays without any global unit registry.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`dimensions`] | [`Dimensions`]: integer exponents of M, L, T, Θ |
//! | [`unit`] | [`Unit`]: named units, expression parsing, plain-text and LaTeX rendering |
//! | [`array`] | [`UnitAwareArray`] and [`Quantity`] with copy and in-place conversion |
//! | [`spec`] | [`UnitSpec`]: native unit plus scale-factor and little-h exponents |
//!
//! # Quick Start
//!
//! ```
//! use velociraptor_units::{Unit, UnitSpec};
//!
//! let spec = UnitSpec::new(Unit::named("Msun").unwrap().scaled(1.0e10));
//! let masses = spec.apply(vec![500.0], 1.0, 1.0);
//! assert_eq!(masses.unit().to_string(), "Msun");
//! ```

pub mod array;
pub mod constants;
pub mod dimensions;
pub mod errors;
pub mod spec;
pub mod unit;

pub use array::{Quantity, UnitAwareArray};
pub use dimensions::Dimensions;
pub use errors::{UnitError, UnitResult};
pub use spec::UnitSpec;
pub use unit::{parse_unit, NamedUnit, Unit};
