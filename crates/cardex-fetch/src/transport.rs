//! Transport seam between the orchestrator and the network.

use crate::error::{FetchError, Result};
use async_trait::async_trait;
use cardex_core::{FetchConfig, SourceConfig};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, FROM, USER_AGENT};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

/// A single JSON GET against the upstream wiki.
///
/// Implementations perform exactly one attempt; timeouts and retries are
/// applied by the caller. Implementations must be thread-safe (Send + Sync)
/// since one transport is shared by every worker.
#[async_trait]
pub trait WikiTransport: Send + Sync {
    /// Issue a GET to `endpoint` with query `params` and decode the JSON body.
    ///
    /// # Errors
    /// Returns error on connection failure, non-success status, or a body
    /// that is not JSON.
    async fn get_json(&self, endpoint: &str, params: &[(String, String)]) -> Result<Value>;
}

/// Production transport over `reqwest`.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a client carrying the identifying header set from `source`.
    ///
    /// Extra headers with invalid names or values are logged and skipped.
    ///
    /// # Errors
    /// Returns error if the user agent is not a valid header value or the
    /// HTTP client cannot be created.
    pub fn new(source: &SourceConfig, fetch: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(fetch.timeout())
            .default_headers(Self::default_headers(source)?)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client })
    }

    fn default_headers(source: &SourceConfig) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        let user_agent = HeaderValue::from_str(&source.user_agent)
            .map_err(|e| FetchError::Client(format!("invalid user agent: {e}")))?;
        headers.insert(USER_AGENT, user_agent);

        if let Some(from) = source.from.as_deref() {
            match HeaderValue::from_str(from) {
                Ok(value) => {
                    headers.insert(FROM, value);
                }
                Err(e) => warn!(error = %e, "skipping invalid From header"),
            }
        }

        for (name, value) in &source.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => warn!(header = %name, "skipping invalid configured header"),
            }
        }

        Ok(headers)
    }
}

#[async_trait]
impl WikiTransport for HttpTransport {
    async fn get_json(&self, endpoint: &str, params: &[(String, String)]) -> Result<Value> {
        debug!(endpoint, params = params.len(), "GET");

        let response = self.client.get(endpoint).query(params).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}
