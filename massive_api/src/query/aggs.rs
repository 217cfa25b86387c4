//! Query builder for the aggregates (bars) endpoint.

use std::fmt;

use chrono::NaiveDate;
use url::Url;

/// Size unit of each aggregate window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Timespan {
    Minute,
    Hour,
    #[default]
    Day,
    Week,
    Month,
}

impl fmt::Display for Timespan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Timespan::Minute => "minute",
            Timespan::Hour => "hour",
            Timespan::Day => "day",
            Timespan::Week => "week",
            Timespan::Month => "month",
        };
        write!(f, "{}", s)
    }
}

/// Order in which bars are returned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "asc"),
            SortOrder::Desc => write!(f, "desc"),
        }
    }
}

/// Date-ranged aggregate request for one ticker.
///
/// Defaults match daily split-adjusted bars, ascending, with the largest
/// page the API allows so a multi-year daily range fits in one response.
#[derive(Clone, Debug)]
pub struct AggsQuery {
    pub ticker: String,
    pub multiplier: u32,
    pub timespan: Timespan,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub adjusted: bool,
    pub sort: SortOrder,
    pub limit: u32,
}

impl AggsQuery {
    pub const MAX_LIMIT: u32 = 50_000;

    pub fn new(ticker: &str, from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            ticker: ticker.to_string(),
            multiplier: 1,
            timespan: Timespan::Day,
            from,
            to,
            adjusted: true,
            sort: SortOrder::Asc,
            limit: Self::MAX_LIMIT,
        }
    }

    pub fn with_timespan(mut self, multiplier: u32, timespan: Timespan) -> Self {
        self.multiplier = multiplier;
        self.timespan = timespan;
        self
    }

    pub fn with_adjusted(mut self, adjusted: bool) -> Self {
        self.adjusted = adjusted;
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// Sets the page size, capped at [`AggsQuery::MAX_LIMIT`].
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit.min(Self::MAX_LIMIT);
        self
    }

    /// Builds the full request URL on top of `base`.
    pub fn to_url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        let multiplier = self.multiplier.to_string();
        let timespan = self.timespan.to_string();
        let from = self.from.format("%Y-%m-%d").to_string();
        let to = self.to.format("%Y-%m-%d").to_string();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "v2",
                "aggs",
                "ticker",
                self.ticker.as_str(),
                "range",
                multiplier.as_str(),
                timespan.as_str(),
                from.as_str(),
                to.as_str(),
            ]);
        }
        url.query_pairs_mut()
            .append_pair("adjusted", if self.adjusted { "true" } else { "false" })
            .append_pair("sort", &self.sort.to_string())
            .append_pair("limit", &self.limit.to_string());
        url
    }
}
