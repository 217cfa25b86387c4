//! Environment-driven settings, resolved once at startup.
//!
//! Every loader has a `from_lookup` form taking a key lookup function so it
//! can be exercised without touching the process environment.

use crate::error::Sp1500Error;

/// Credential for the market-data API.
pub const API_KEY_VAR: &str = "MASSIVE_API_KEY";
/// Optional override of the market-data API root.
pub const BASE_URL_VAR: &str = "MASSIVE_BASE_URL";
/// Optional override of the index-table site root.
pub const WIKI_BASE_URL_VAR: &str = "SP1500_WIKI_BASE_URL";
/// Optional override of the metadata provider root.
pub const YAHOO_BASE_URL_VAR: &str = "SP1500_YAHOO_BASE_URL";

/// Table written by the universe builder and read by the snapshot enricher.
pub const DEFAULT_TABLE_PATH: &str = "sp1500_company_info.csv";
/// Column holding the ticker symbol.
pub const DEFAULT_SYMBOL_COLUMN: &str = "symbol";

/// Connection settings for the market-data API.
#[derive(Debug, Clone)]
pub struct MassiveConfig {
    pub api_key: String,
    pub base_url: String,
}

impl MassiveConfig {
    pub fn from_env() -> Result<Self, Sp1500Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, Sp1500Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                Sp1500Error::Config(format!("set {} in your environment", API_KEY_VAR))
            })?;
        let base_url = non_empty(lookup(BASE_URL_VAR))
            .unwrap_or_else(|| massive_api::DEFAULT_BASE_URL.to_string());
        Ok(Self { api_key, base_url })
    }
}

/// Endpoints used by the universe builder.
#[derive(Debug, Clone)]
pub struct UniverseConfig {
    pub wiki_base_url: String,
    pub yahoo_base_url: Option<String>,
}

impl UniverseConfig {
    pub const DEFAULT_WIKI_BASE_URL: &'static str = "https://en.wikipedia.org";

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            wiki_base_url: non_empty(lookup(WIKI_BASE_URL_VAR))
                .unwrap_or_else(|| Self::DEFAULT_WIKI_BASE_URL.to_string()),
            yahoo_base_url: non_empty(lookup(YAHOO_BASE_URL_VAR)),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|val| val.trim().parse::<T>().ok())
        .unwrap_or(default)
}
