//! Company metadata from Yahoo's quoteSummary endpoint, flattened into one
//! ordered key/value record per ticker.
//!
//! The endpoint requires a session cookie plus a matching crumb token. The
//! crumb is fetched once per client and reused for every lookup.

use std::time::Duration;

use massive_api::{classify, Classification};
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::retry::{with_retry, RetryPolicy, Retryable};
use crate::universe::CompanySource;

pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query2.finance.yahoo.com";

/// Any response from this host sets the session cookie the crumb is bound to.
pub const DEFAULT_COOKIE_URL: &str = "https://fc.yahoo.com";

/// quoteSummary modules merged into each record, in precedence order.
pub const MODULES: [&str; 6] = [
    "assetProfile",
    "summaryDetail",
    "defaultKeyStatistics",
    "financialData",
    "price",
    "quoteType",
];

const USER_AGENT: &str = "Mozilla/5.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(thiserror::Error, Debug)]
pub enum MetadataError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP {status} for {ticker}")]
    Transient { status: u16, ticker: String },
    #[error("HTTP {status} for {ticker}")]
    HttpStatus { status: u16, ticker: String },
    #[error("crumb unavailable: {0}")]
    Crumb(String),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Retryable for MetadataError {
    fn is_retryable(&self) -> bool {
        matches!(self, MetadataError::Transient { .. })
    }
}

/// One company's flattened metadata. `symbol` is always the first field;
/// later fields keep the order they were first seen in.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyInfo {
    fields: Vec<(String, String)>,
}

impl CompanyInfo {
    pub fn new(symbol: &str) -> Self {
        Self {
            fields: vec![("symbol".to_string(), symbol.to_string())],
        }
    }

    /// Adds a field unless the key is already present or the value is blank.
    pub fn insert(&mut self, key: &str, value: String) -> bool {
        if value.trim().is_empty() || self.get(key).is_some() {
            return false;
        }
        self.fields.push((key.to_string(), value));
        true
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn symbol(&self) -> &str {
        &self.fields[0].1
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// True when nothing beyond the symbol was found.
    pub fn is_empty(&self) -> bool {
        self.fields.len() <= 1
    }
}

/// Cell text for a quoteSummary value. Formatted numbers `{raw, fmt}` keep
/// `raw`; other nested values are kept as JSON text; nulls and empties drop.
pub fn flatten_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) if items.is_empty() => None,
        Value::Object(map) => {
            if let Some(raw) = map.get("raw") {
                return flatten_value(raw);
            }
            if map.values().all(Value::is_null) {
                return None;
            }
            serde_json::to_string(value).ok()
        }
        Value::Array(_) => serde_json::to_string(value).ok(),
    }
}

/// Merge the modules of a quoteSummary response into one record. Returns
/// `None` when the response has no result or the result carries no fields.
pub fn flatten_quote_summary(symbol: &str, body: &Value) -> Option<CompanyInfo> {
    let result = body
        .get("quoteSummary")?
        .get("result")?
        .as_array()?
        .first()?
        .as_object()?;

    let mut info = CompanyInfo::new(symbol);
    for module in MODULES {
        let Some(Value::Object(fields)) = result.get(module) else {
            continue;
        };
        for (key, value) in fields {
            if key == "maxAge" || key == "symbol" {
                continue;
            }
            if let Some(text) = flatten_value(value) {
                info.insert(key, text);
            }
        }
    }
    (!info.is_empty()).then_some(info)
}

/// quoteSummary client holding the cookie session and cached crumb.
pub struct MetadataClient {
    http: reqwest::Client,
    base_url: String,
    cookie_url: String,
    crumb: OnceCell<String>,
    policy: RetryPolicy,
}

impl MetadataClient {
    pub fn new(policy: RetryPolicy) -> Result<Self, MetadataError> {
        Self::with_urls(DEFAULT_YAHOO_BASE_URL, DEFAULT_COOKIE_URL, policy)
    }

    pub fn with_urls(
        base_url: &str,
        cookie_url: &str,
        policy: RetryPolicy,
    ) -> Result<Self, MetadataError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            cookie_url: cookie_url.to_string(),
            crumb: OnceCell::new(),
            policy,
        })
    }

    async fn fetch_crumb(&self) -> Result<String, MetadataError> {
        // The cookie host answers with an error status but still sets the cookie.
        if let Err(e) = self.http.get(&self.cookie_url).send().await {
            tracing::debug!("cookie request failed: {}", e);
        }

        let resp = self
            .http
            .get(format!("{}/v1/test/getcrumb", self.base_url))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(MetadataError::Crumb(format!("HTTP {}", status.as_u16())));
        }
        let crumb = resp.text().await?.trim().to_string();
        if crumb.is_empty() {
            return Err(MetadataError::Crumb("empty response".to_string()));
        }
        tracing::debug!("obtained crumb");
        Ok(crumb)
    }

    async fn crumb(&self) -> Result<&str, MetadataError> {
        self.crumb
            .get_or_try_init(|| self.fetch_crumb())
            .await
            .map(String::as_str)
    }

    async fn fetch_summary(&self, ticker: &str) -> Result<Option<Value>, MetadataError> {
        let crumb = self.crumb().await?;
        let resp = self
            .http
            .get(format!("{}/v10/finance/quoteSummary/{}", self.base_url, ticker))
            .query(&[("modules", MODULES.join(",").as_str()), ("crumb", crumb)])
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status == 404 {
            return Ok(None);
        }
        match classify(status) {
            Classification::Success => {}
            Classification::Retryable => {
                return Err(MetadataError::Transient {
                    status,
                    ticker: ticker.to_string(),
                })
            }
            Classification::Fatal => {
                return Err(MetadataError::HttpStatus {
                    status,
                    ticker: ticker.to_string(),
                })
            }
        }
        let body = resp.text().await?;
        Ok(Some(serde_json::from_str(&body)?))
    }

    /// Flattened metadata for `ticker`, or `None` when Yahoo has nothing for it.
    pub async fn company_info(&self, ticker: &str) -> Result<Option<CompanyInfo>, MetadataError> {
        let label = format!("quoteSummary {}", ticker);
        let body = with_retry(&self.policy, &label, || self.fetch_summary(ticker)).await?;
        Ok(body.and_then(|b| flatten_quote_summary(ticker, &b)))
    }
}

impl CompanySource for MetadataClient {
    async fn company_info(&self, ticker: &str) -> Result<Option<CompanyInfo>, MetadataError> {
        MetadataClient::company_info(self, ticker).await
    }
}
