//! Cardex Fetch
//!
//! Upstream access for the catalog pipeline:
//! - [`WikiTransport`] seam with the production [`HttpTransport`]
//! - [`RetryPolicy`] with an explicit exhausted outcome
//! - [`FetchOrchestrator`] applying per-call timeouts, retries, continuation
//!   and offset pagination
//! - query builders ([`params`]) and response decoders ([`response`])

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod orchestrator;
pub mod params;
pub mod response;
pub mod retry;
pub mod transport;

// Re-export commonly used types
pub use error::{FetchError, Result};
pub use orchestrator::{chunk_titles, merge_continuation, ContinuedPages, FetchOrchestrator};
pub use retry::{Backoff, RetryPolicy};
pub use transport::{HttpTransport, WikiTransport};
