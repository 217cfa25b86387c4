//! HTTP client for the market-data aggregates API.

use std::time::Duration;

use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    query::AggsQuery,
    status::{classify, Classification},
    types::AggsResponse,
    Error,
};

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://api.massive.com";

/// Per-request socket timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the aggregates API.
///
/// Every call is a single attempt. Status codes are classified so callers
/// can tell a transient failure (`Error::Transient`) from a fatal one
/// (`Error::HttpStatus`) and decide whether to retry.
pub struct Client {
    http: reqwest::Client,
    api_key: String,
    base_url: Url,
}

impl Client {
    /// Creates a client pointing at the production API.
    pub fn new(api_key: String) -> Result<Self, Error> {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    /// Creates a client with a custom base URL. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str, api_key: String) -> Result<Self, Error> {
        let base_url = Url::parse(base_url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::RequestFailed(e.to_string())
            })?;
        Ok(Self {
            http,
            api_key,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.api_key)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to get resource: {}", e);
                Error::RequestFailed(e.to_string())
            })?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| {
            tracing::error!("Failed to read response body: {}", e);
            Error::RequestFailed(e.to_string())
        })?;

        match classify(status) {
            Classification::Success => {}
            Classification::Retryable => {
                return Err(Error::Transient {
                    status,
                    body: truncate_body(&body),
                });
            }
            Classification::Fatal => {
                let snippet = truncate_body(&body);
                tracing::error!("Request failed with status {}: {}", status, snippet);
                return Err(Error::HttpStatus {
                    status,
                    body: snippet,
                });
            }
        }

        serde_json::from_str::<T>(&body).map_err(|e| {
            let snippet = truncate_body(&body);
            tracing::error!("Failed to parse resource: {} | body: {}", e, snippet);
            Error::Parse(e.to_string())
        })
    }

    /// Fetches one date-ranged aggregate series.
    pub async fn get_aggs(&self, query: &AggsQuery) -> Result<AggsResponse, Error> {
        self.get::<AggsResponse>(query.to_url(&self.base_url)).await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[truncated]", &body[..end])
    }
}
