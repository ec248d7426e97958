//! Error types for upstream fetching.

use cardex_core::ErrorKind;
use thiserror::Error;

/// Errors that can occur while fetching from the upstream wiki.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Call exceeded its wall-clock timeout
    #[error("request timed out after {seconds}s")]
    Timeout {
        /// Timeout that elapsed
        seconds: u64,
    },

    /// Non-success HTTP status
    #[error("HTTP {status} from {endpoint}")]
    Http {
        /// Status code
        status: u16,
        /// Endpoint that answered
        endpoint: String,
    },

    /// Body was not the expected JSON
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Connection-level failure
    #[error("network error: {0}")]
    Network(String),

    /// HTTP client could not be built from configuration
    #[error("failed to create HTTP client: {0}")]
    Client(String),

    /// Retry budget exhausted; the explicit no-result outcome
    #[error("no result after {attempts} attempts: {last}")]
    Exhausted {
        /// Attempts made
        attempts: u32,
        /// Error of the final attempt
        last: Box<FetchError>,
    },
}

impl FetchError {
    /// Whether another attempt may succeed.
    ///
    /// HTTP 4xx other than 429 is treated as permanent.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Decode(_) | Self::Network(_) => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            Self::Client(_) | Self::Exhausted { .. } => false,
        }
    }

    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Client(_) => ErrorKind::Configuration,
            _ => ErrorKind::NetworkTransient,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Http {
                status: status.as_u16(),
                endpoint: err.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Result type for fetch operations.
pub type Result<T> = std::result::Result<T, FetchError>;
