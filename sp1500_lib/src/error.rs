//! Error types for the library layer.

use std::fmt;

use crate::metadata::MetadataError;
use crate::table::TableError;
use crate::universe::ScrapeError;

/// Errors produced by the library layer, wrapping the per-module errors
/// and adding configuration and input validation failures.
#[derive(Debug)]
pub enum Sp1500Error {
    /// An error from the market-data API client.
    Api(massive_api::Error),
    /// Reading, merging or writing the company table failed.
    Table(TableError),
    /// Fetching or parsing an index constituents page failed.
    Scrape(ScrapeError),
    /// A company metadata lookup failed.
    Metadata(MetadataError),
    /// A required setting is missing or malformed.
    Config(String),
    /// User-provided input failed validation.
    InvalidInput(String),
}

impl fmt::Display for Sp1500Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api(e) => write!(f, "API error: {}", e),
            Self::Table(e) => write!(f, "Table error: {}", e),
            Self::Scrape(e) => write!(f, "Scrape error: {}", e),
            Self::Metadata(e) => write!(f, "Metadata error: {}", e),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl std::error::Error for Sp1500Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Api(e) => Some(e),
            Self::Table(e) => Some(e),
            Self::Scrape(e) => Some(e),
            Self::Metadata(e) => Some(e),
            _ => None,
        }
    }
}

impl From<massive_api::Error> for Sp1500Error {
    fn from(e: massive_api::Error) -> Self {
        Self::Api(e)
    }
}

impl From<TableError> for Sp1500Error {
    fn from(e: TableError) -> Self {
        Self::Table(e)
    }
}

impl From<ScrapeError> for Sp1500Error {
    fn from(e: ScrapeError) -> Self {
        Self::Scrape(e)
    }
}

impl From<MetadataError> for Sp1500Error {
    fn from(e: MetadataError) -> Self {
        Self::Metadata(e)
    }
}
