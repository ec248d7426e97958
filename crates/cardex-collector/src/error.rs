//! Error types at the collector boundary.

use cardex_core::ErrorKind;
use cardex_fetch::FetchError;
use thiserror::Error;

/// Errors a collector worker can report to the pool.
#[derive(Error, Debug)]
pub enum CollectError {
    /// Upstream fetch failed
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Every request of a batch failed, so the batch produced nothing
    #[error("{pass} batch produced no pages ({titles} titles)")]
    EmptyBatch {
        /// Pass the batch belonged to
        pass: &'static str,
        /// Titles in the batch
        titles: usize,
    },

    /// Worker task panicked or was cancelled
    #[error("worker task failed: {0}")]
    Worker(String),
}

impl CollectError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Fetch(e) => e.kind(),
            Self::EmptyBatch { .. } | Self::Worker(_) => ErrorKind::NetworkTransient,
        }
    }
}

/// Result type for collector operations.
pub type Result<T> = std::result::Result<T, CollectError>;
