//! Timed, retried and paginated upstream calls.

use crate::error::{FetchError, Result};
use crate::retry::RetryPolicy;
use crate::transport::{HttpTransport, WikiTransport};
use cardex_core::{AppConfig, FetchConfig, SourceConfig};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Pages collected by a paginated fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContinuedPages {
    /// Pages in request order
    pub pages: Vec<Value>,
    /// A page exhausted its retry budget and pagination stopped early
    pub interrupted: bool,
}

impl ContinuedPages {
    /// Whether pagination ran to its natural end.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.interrupted
    }
}

/// Executes upstream calls with a per-call timeout and a bounded retry budget.
///
/// Cloning is cheap; every worker holds its own clone sharing one transport.
#[derive(Clone)]
pub struct FetchOrchestrator {
    transport: Arc<dyn WikiTransport>,
    source: SourceConfig,
    fetch: FetchConfig,
    retry: RetryPolicy,
}

impl FetchOrchestrator {
    /// Create an orchestrator over any transport.
    #[must_use]
    pub fn new(transport: Arc<dyn WikiTransport>, config: &AppConfig) -> Self {
        Self {
            transport,
            source: config.source.clone(),
            fetch: config.fetch.clone(),
            retry: RetryPolicy::from_config(&config.fetch),
        }
    }

    /// Create an orchestrator over the HTTP transport.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config.source, &config.fetch)?;
        Ok(Self::new(Arc::new(transport), config))
    }

    /// Replace the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Query API endpoint.
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.source.api_url
    }

    /// Semantic search endpoint.
    #[must_use]
    pub fn semantic_url(&self) -> &str {
        &self.source.semantic_url
    }

    /// Maximum titles per batch request.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.fetch.batch_size
    }

    /// One call with timeout and retries.
    ///
    /// A timeout counts as one failed attempt.
    pub async fn fetch(&self, endpoint: &str, params: &[(String, String)]) -> Result<Value> {
        let timeout = self.fetch.timeout();
        let transport = self.transport.as_ref();

        self.retry
            .run(endpoint, move || async move {
                match tokio::time::timeout(timeout, transport.get_json(endpoint, params)).await {
                    Ok(result) => result,
                    Err(_) => Err(FetchError::Timeout {
                        seconds: timeout.as_secs(),
                    }),
                }
            })
            .await
    }

    /// One call against the query API endpoint.
    pub async fn query(&self, params: &[(String, String)]) -> Result<Value> {
        self.fetch(self.api_url(), params).await
    }

    /// Follow the `continue` object until the source stops returning one.
    ///
    /// A page that exhausts its retries ends pagination; pages already
    /// fetched are kept and the result is marked interrupted.
    pub async fn fetch_continued(
        &self,
        endpoint: &str,
        mut params: Vec<(String, String)>,
    ) -> ContinuedPages {
        let mut result = ContinuedPages::default();

        loop {
            let page = match self.fetch(endpoint, &params).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(endpoint, pages = result.pages.len(), error = %e, "Pagination interrupted");
                    result.interrupted = true;
                    break;
                }
            };

            let continuation = page.get("continue").and_then(Value::as_object).cloned();
            result.pages.push(page);

            let Some(continuation) = continuation else {
                break;
            };
            if !merge_continuation(&mut params, &continuation) {
                warn!(endpoint, "Continuation did not advance, stopping");
                break;
            }
            debug!(endpoint, pages = result.pages.len(), "Following continuation");
        }

        result
    }

    /// Request `offset`/`limit` pages until one is short or empty.
    ///
    /// `count` returns the number of results in a page.
    pub async fn paginate_offset<C>(
        &self,
        endpoint: &str,
        params: &[(String, String)],
        limit: usize,
        count: C,
    ) -> ContinuedPages
    where
        C: Fn(&Value) -> usize,
    {
        let limit = limit.max(1);
        let mut result = ContinuedPages::default();
        let mut offset = 0usize;

        loop {
            let mut page_params = params.to_vec();
            page_params.push(("offset".to_string(), offset.to_string()));
            page_params.push(("limit".to_string(), limit.to_string()));

            let page = match self.fetch(endpoint, &page_params).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(endpoint, offset, error = %e, "Offset pagination interrupted");
                    result.interrupted = true;
                    break;
                }
            };

            let results = count(&page);
            if results > 0 {
                result.pages.push(page);
            }
            if results < limit {
                debug!(endpoint, offset, results, "Short page, pagination complete");
                break;
            }
            offset += limit;
        }

        result
    }
}

/// Merge a `continue` object into request parameters.
///
/// Returns whether any parameter changed.
pub fn merge_continuation(params: &mut Vec<(String, String)>, continuation: &Map<String, Value>) -> bool {
    let mut changed = false;

    for (key, value) in continuation {
        let value = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };

        match params.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => {
                if *existing != value {
                    *existing = value;
                    changed = true;
                }
            }
            None => {
                params.push((key.clone(), value));
                changed = true;
            }
        }
    }

    changed
}

/// Split titles into `|`-joined batches of at most `batch_size`.
#[must_use]
pub fn chunk_titles<S: AsRef<str>>(titles: &[S], batch_size: usize) -> Vec<String> {
    titles
        .chunks(batch_size.max(1))
        .map(|chunk| {
            chunk
                .iter()
                .map(AsRef::as_ref)
                .collect::<Vec<&str>>()
                .join("|")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chunk_titles() {
        let titles: Vec<String> = (1..=120).map(|i| format!("Page {i}")).collect();
        let chunks = chunk_titles(&titles, 50);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].split('|').count(), 50);
        assert_eq!(chunks[2].split('|').count(), 20);
        assert!(chunks[0].starts_with("Page 1|Page 2|"));
    }

    #[test]
    fn test_chunk_titles_edge_cases() {
        let empty: Vec<&str> = Vec::new();
        assert!(chunk_titles(&empty, 50).is_empty());
        assert_eq!(chunk_titles(&["A", "B"], 0), vec!["A", "B"]);
    }

    #[test]
    fn test_merge_continuation() {
        let mut params = vec![
            ("action".to_string(), "query".to_string()),
            ("imcontinue".to_string(), "1|A".to_string()),
        ];
        let continuation = json!({"imcontinue": "2|B", "continue": "||"});
        let continuation = continuation.as_object().expect("object");

        assert!(merge_continuation(&mut params, continuation));
        assert_eq!(params.len(), 3);
        assert!(params.contains(&("imcontinue".to_string(), "2|B".to_string())));
        assert!(params.contains(&("continue".to_string(), "||".to_string())));

        // Same object again changes nothing
        assert!(!merge_continuation(&mut params, continuation));
    }

    #[test]
    fn test_continued_pages_complete() {
        let pages = ContinuedPages::default();
        assert!(pages.is_complete());
    }
}
