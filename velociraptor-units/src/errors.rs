//! Error type for unit parsing and conversion.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnitError {
    /// A symbol in a unit expression is not in the named-unit table.
    #[error("Unknown unit symbol '{0}'")]
    UnknownUnit(String),

    /// The expression could not be tokenised.
    #[error("Cannot parse unit expression '{expression}': {message}")]
    Parse { expression: String, message: String },

    /// Source and target units describe different physical dimensions.
    #[error("Cannot convert from '{from}' to '{to}': dimensions {from_dims} and {to_dims} differ")]
    IncompatibleUnits {
        from: String,
        to: String,
        from_dims: String,
        to_dims: String,
    },
}

impl UnitError {
    pub fn parse(expression: &str, message: &str) -> Self {
        Self::Parse {
            expression: expression.to_string(),
            message: message.to_string(),
        }
    }
}

pub type UnitResult<T> = Result<T, UnitError>;
