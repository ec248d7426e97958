//! Core error types for the Cardex pipeline.
//!
//! This module defines the central error type shared across crates and the
//! coarse [`ErrorKind`] classification every crate-level error maps onto.

use thiserror::Error;

/// Coarse classification of failures inside the pipeline.
///
/// None of these kinds is fatal to a run: transient failures degrade to an
/// empty result, ambiguous input is skipped, and lookup misses are dropped
/// from the signal that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Timeout, connection failure, or undecodable payload; retried
    NetworkTransient,
    /// Input outside the accepted markup or filename shape; skipped
    ParseAmbiguous,
    /// Name or code not present in the reference tables; dropped
    LookupMiss,
    /// Invalid configuration or reference data supplied by the caller
    Configuration,
}

/// Central error type for Cardex operations.
#[derive(Error, Debug)]
pub enum CardexError {
    /// Configuration errors (file loading, parsing, validation)
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Network errors (HTTP requests, timeouts, payload decoding)
    #[error("network error: {0}")]
    Network(String),

    /// Markup or filename could not be interpreted
    #[error("parse error: {0}")]
    Parse(String),

    /// Reference lookup failed
    #[error("lookup miss: {0}")]
    LookupMiss(String),

    /// Validation errors (invalid input, constraints)
    #[error("validation error: {0}")]
    Validation(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl CardexError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) | Self::Io(_) => ErrorKind::NetworkTransient,
            Self::Parse(_) => ErrorKind::ParseAmbiguous,
            Self::LookupMiss(_) => ErrorKind::LookupMiss,
            Self::Config(_) | Self::Validation(_) | Self::Internal(_) => ErrorKind::Configuration,
        }
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config
    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// I/O error reading/writing config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Result type alias using `CardexError`.
pub type Result<T> = std::result::Result<T, CardexError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CardexError::LookupMiss("rarity 'XYZ'".to_string());
        assert_eq!(err.to_string(), "lookup miss: rarity 'XYZ'");

        let err = ConfigError::InvalidValue {
            field: "fetch.max_attempts".to_string(),
            reason: "must be at least 1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value for fetch.max_attempts: must be at least 1"
        );
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(
            CardexError::Network("timeout".to_string()).kind(),
            ErrorKind::NetworkTransient
        );
        assert_eq!(
            CardexError::Parse("bad line".to_string()).kind(),
            ErrorKind::ParseAmbiguous
        );
        assert_eq!(
            CardexError::Config(ConfigError::NoConfigDir).kind(),
            ErrorKind::Configuration
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: CardexError = io_err.into();
        assert!(matches!(err, CardexError::Io(_)));
    }
}
