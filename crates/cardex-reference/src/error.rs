//! Error types for reference table loading.

use cardex_core::ErrorKind;
use thiserror::Error;

/// Errors that can occur while loading reference tables.
#[derive(Error, Debug)]
pub enum ReferenceError {
    /// Reference directory not found
    #[error("reference directory not found at {path}")]
    DirectoryNotFound {
        /// Expected directory path
        path: String,
    },

    /// Table file is not a JSON array
    #[error("failed to parse reference table {path}: {source}")]
    ParseError {
        /// Path to the table file
        path: String,
        /// JSON parse error
        #[source]
        source: serde_json::Error,
    },

    /// I/O error while reading a table
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Default data directory could not be determined
    #[error("configuration error: {0}")]
    Config(#[from] cardex_core::ConfigError),
}

impl ReferenceError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Configuration
    }
}

/// Result type for reference operations.
pub type Result<T> = std::result::Result<T, ReferenceError>;
