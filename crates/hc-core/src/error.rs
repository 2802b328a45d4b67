//! Error types for hadrochem

use thiserror::Error;

/// hadrochem error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required file, object or table could not be found.
    ///
    /// Fatal for the current run; never retried.
    #[error("input not found: {0}")]
    InputAbsent(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Computation error
    #[error("Computation error: {0}")]
    Computation(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error reports a missing input (file, key or table).
    pub fn is_input_absent(&self) -> bool {
        match self {
            Error::InputAbsent(_) => true,
            Error::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
