use std::path::PathBuf;
use thiserror::Error;
use velociraptor_units::UnitError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("format error in {context}: {message}")]
    Format { context: String, message: String },

    #[error("no property '{name}' in {category}{}", suggestion_suffix(.suggestions))]
    AttributeNotFound {
        category: String,
        name: String,
        suggestions: Vec<String>,
    },

    #[error("halo {0} not found in groups file")]
    HaloNotFound(u64),

    #[error("catalogue has been closed")]
    UseAfterClose,

    #[error("halo {halo_id} has no '{property}' property; load the groups file with a catalogue")]
    MissingHaloProperty { halo_id: u64, property: String },

    #[error("unit error: {0}")]
    Units(#[from] UnitError),

    #[error("config error: {0}")]
    Config(String),

    #[error("plot error: {0}")]
    Plot(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "hdf5")]
    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),
}

fn suggestion_suffix(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!("; did you mean: {}?", suggestions.join(", "))
    }
}

impl Error {
    pub fn format(context: &str, message: impl Into<String>) -> Self {
        Self::Format {
            context: context.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
