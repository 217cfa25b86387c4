use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One aggregate bar. Field names follow the compact wire format.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Bar {
    /// Start of the aggregate window, epoch milliseconds UTC.
    #[serde(rename = "t")]
    pub timestamp: i64,
    #[serde(rename = "o", default)]
    pub open: Option<f64>,
    #[serde(rename = "h", default)]
    pub high: Option<f64>,
    #[serde(rename = "l", default)]
    pub low: Option<f64>,
    #[serde(rename = "c", default)]
    pub close: Option<f64>,
    #[serde(rename = "v", default)]
    pub volume: Option<f64>,
    #[serde(rename = "vw", default)]
    pub vwap: Option<f64>,
    #[serde(rename = "n", default)]
    pub transactions: Option<i64>,
}

impl Bar {
    /// Timestamp as a UTC instant.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }

    /// UTC calendar date of the bar.
    pub fn date(&self) -> Option<NaiveDate> {
        self.datetime().map(|dt| dt.date_naive())
    }
}

/// Response envelope of the aggregates endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct AggsResponse {
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub adjusted: Option<bool>,
    #[serde(default)]
    pub query_count: Option<i64>,
    #[serde(default)]
    pub results_count: Option<i64>,
    #[serde(rename = "request_id", default)]
    pub request_id: Option<String>,
    /// Absent when the range holds no bars.
    #[serde(default)]
    pub results: Option<Vec<Bar>>,
    #[serde(rename = "next_url", default)]
    pub next_url: Option<String>,
}

impl AggsResponse {
    /// Bars in the response, empty when `results` is missing.
    pub fn into_bars(self) -> Vec<Bar> {
        self.results.unwrap_or_default()
    }
}
