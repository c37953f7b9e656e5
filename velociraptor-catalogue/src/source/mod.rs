//! Read-only access to catalogue, groups and particle files.
//!
//! Everything above this module talks to a [`Source`] rather than to HDF5
//! directly. Two implementations exist:
//!
//! - [`Hdf5Source`] (feature `hdf5`) reads Velociraptor output on disk.
//! - [`MemorySource`] holds datasets in memory and counts reads, for
//!   synthetic catalogues and tests.
//!
//! Velociraptor writes every per-halo property as a top-level dataset and
//! stores unit and cosmology information as attributes on the `UnitInfo` and
//! `SimulationInfo` groups.

#[cfg(feature = "hdf5")]
mod h5;
mod memory;

#[cfg(feature = "hdf5")]
pub use h5::Hdf5Source;
pub use memory::{MemorySource, ReadCounter};

use crate::error::Result;
use std::ops::Range;

pub trait Source {
    /// Human-readable origin, usually the file path.
    fn describe(&self) -> String;

    /// Names of all top-level datasets, in file order.
    fn dataset_names(&self) -> Result<Vec<String>>;

    /// Number of elements in a dataset. Metadata only, no values are read.
    fn dataset_len(&self, name: &str) -> Result<usize>;

    fn read_f64(&self, name: &str) -> Result<Vec<f64>>;

    fn read_u64(&self, name: &str) -> Result<Vec<u64>>;

    /// Reads `range` of a dataset in a single request.
    fn read_u64_range(&self, name: &str, range: Range<usize>) -> Result<Vec<u64>>;

    /// Numeric attribute on a top-level group, e.g. `UnitInfo/Length_unit_to_kpc`.
    fn header_attribute(&self, group: &str, name: &str) -> Result<Option<f64>>;

    /// Numeric attribute attached to a dataset.
    fn dataset_attribute(&self, dataset: &str, name: &str) -> Result<Option<f64>>;
}
