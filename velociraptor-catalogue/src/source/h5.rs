use super::Source;
use crate::error::{Error, Result};
use hdf5::{Dataset, File};
use std::ops::Range;
use std::path::{Path, PathBuf};

/// An open Velociraptor HDF5 file.
///
/// The file handle is held for the lifetime of this value and released on
/// drop.
pub struct Hdf5Source {
    path: PathBuf,
    file: File,
}

impl Hdf5Source {
    /// Opens `path` read-only.
    ///
    /// # Errors
    /// [`Error::FileNotFound`] if the path does not exist, [`Error::Format`]
    /// if it is not a readable HDF5 file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let file = File::open(path).map_err(|e| {
            Error::format(&path.display().to_string(), format!("cannot open as HDF5: {}", e))
        })?;
        tracing::debug!(path = %path.display(), "opened HDF5 file");
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dataset(&self, name: &str) -> Result<Dataset> {
        self.file
            .dataset(name)
            .map_err(|_| Error::format(&self.describe(), format!("no dataset named '{}'", name)))
    }
}

impl Source for Hdf5Source {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn dataset_names(&self) -> Result<Vec<String>> {
        Ok(self
            .file
            .datasets()?
            .iter()
            .map(|ds| ds.name().trim_start_matches('/').to_string())
            .collect())
    }

    fn dataset_len(&self, name: &str) -> Result<usize> {
        Ok(self.dataset(name)?.size())
    }

    fn read_f64(&self, name: &str) -> Result<Vec<f64>> {
        Ok(self.dataset(name)?.read_raw::<f64>()?)
    }

    fn read_u64(&self, name: &str) -> Result<Vec<u64>> {
        Ok(self.dataset(name)?.read_raw::<u64>()?)
    }

    fn read_u64_range(&self, name: &str, range: Range<usize>) -> Result<Vec<u64>> {
        let dataset = self.dataset(name)?;
        if range.end > dataset.size() {
            return Err(Error::format(
                &self.describe(),
                format!(
                    "range {}..{} out of bounds for '{}' of length {}",
                    range.start,
                    range.end,
                    name,
                    dataset.size()
                ),
            ));
        }
        Ok(dataset.read_slice_1d::<u64, _>(range)?.to_vec())
    }

    fn header_attribute(&self, group: &str, name: &str) -> Result<Option<f64>> {
        let Ok(group) = self.file.group(group) else {
            return Ok(None);
        };
        match group.attr(name) {
            Ok(attr) => Ok(Some(attr.read_scalar::<f64>()?)),
            Err(_) => Ok(None),
        }
    }

    fn dataset_attribute(&self, dataset: &str, name: &str) -> Result<Option<f64>> {
        let dataset = self.dataset(dataset)?;
        match dataset.attr(name) {
            Ok(attr) => Ok(Some(attr.read_scalar::<f64>()?)),
            Err(_) => Ok(None),
        }
    }
}
