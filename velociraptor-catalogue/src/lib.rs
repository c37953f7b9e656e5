//! Lazy, unit-aware access to Velociraptor halo catalogues.
//!
//! Opening a catalogue reads only metadata. Every per-halo dataset is
//! classified by name into a category, given a unit from the file's unit
//! metadata, and read on first access. Values come back as
//! [`UnitAwareArray`](velociraptor_units::UnitAwareArray)s in physical units.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`source`] | [`Source`](source::Source) trait, HDF5 and in-memory implementations |
//! | [`registration`] | Field-name classifier: [`Category`], [`FieldDescriptor`], the ordered rule table |
//! | [`units`] | [`UnitSystem`](units::UnitSystem) from file metadata, per-field [`UnitRegistry`](units::UnitRegistry) |
//! | [`properties`] | [`PropertyGroup`]: lazily resolved fields of one category |
//! | [`catalogue`] | [`Catalogue`] facade, cosmology, box size |
//! | [`labels`] | LaTeX axis labels for fields |
//! | [`particles`] | Groups files: bound and unbound particle ids per halo |
//! | [`swift`] | Spatial regions and snapshot masks around haloes |
//! | [`tools`] | Histograms and [`create_mass_function`](tools::create_mass_function) |
//! | [`plot`] | SVG scatter, 2-D histogram and mass-function charts |
//! | [`autoplotter`] | TOML-configured batch plotting |
//!
//! # Quick Start
//!
//! ```ignore
//! use velociraptor_catalogue::Catalogue;
//!
//! let catalogue = Catalogue::load("halos_0008.properties.0")?;
//! let m200 = catalogue.masses().get("mass_200crit")?;
//! println!("{} haloes at z={:.2}", catalogue.number_of_haloes(), catalogue.redshift());
//! println!("{}", m200.to("Msun")?);
//! ```
//!
//! # Features
//!
//! - **`hdf5`**: reading Velociraptor output from disk.
//! - **`plot`** (default): the [`plot`] module and autoplotter rendering.
//! - **`cli`**: the `velociraptor-plot` binary.

pub mod autoplotter;
pub mod catalogue;
pub mod error;
pub mod labels;
pub mod particles;
#[cfg(feature = "plot")]
pub mod plot;
pub mod properties;
pub mod registration;
pub mod source;
pub mod swift;
pub mod tools;
pub mod units;

pub use catalogue::Catalogue;
pub use error::{Error, Result};
pub use particles::{Binding, GroupsHandle, ParticleSelection};
pub use properties::PropertyGroup;
pub use registration::{classify, Category, FieldDescriptor, UnitKind};
pub use units::UnitRegistry;
