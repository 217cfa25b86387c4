//! Per-symbol snapshot job: fetch the bar history, pick one bar per anchor,
//! and project it into the flat snapshot columns.

use std::future::Future;

use chrono::NaiveDate;
use massive_api::types::Bar;
use massive_api::AggsQuery;

use crate::anchors::{Anchor, SnapshotField, ERROR_COLUMN};
use crate::retry::{with_retry, RetryPolicy};
use crate::selector::{pick_on_or_before, sort_bars};

/// Errors that can abort a single symbol's job.
#[derive(thiserror::Error, Debug)]
pub enum JobError {
    #[error(transparent)]
    Fetch(#[from] massive_api::Error),
    #[error("reference date {0} has no representable lookback window")]
    DateRange(NaiveDate),
    #[error("bar timestamp {0} is out of range")]
    BadTimestamp(i64),
}

/// Values taken from the bar selected for one anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorSnapshot {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
    pub vwap: Option<f64>,
}

impl AnchorSnapshot {
    pub fn from_bar(bar: &Bar) -> Result<Self, JobError> {
        let date = bar.date().ok_or(JobError::BadTimestamp(bar.timestamp))?;
        Ok(Self {
            date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            vwap: bar.vwap,
        })
    }

    /// Cell text for one field; `None` is a null cell.
    pub fn value(&self, field: SnapshotField) -> Option<String> {
        let number = match field {
            SnapshotField::Date => return Some(self.date.format("%Y-%m-%d").to_string()),
            SnapshotField::Open => self.open,
            SnapshotField::High => self.high,
            SnapshotField::Low => self.low,
            SnapshotField::Close => self.close,
            SnapshotField::Volume => self.volume,
            SnapshotField::Vwap => self.vwap,
        };
        number.map(|n| n.to_string())
    }
}

/// Result of one symbol's job. Always schema-complete: a failed job is a row
/// with every anchor empty and `error` set.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRow {
    /// Normalized symbol this row was computed for.
    pub symbol: String,
    /// Indexed by [`Anchor::index`].
    pub anchors: [Option<AnchorSnapshot>; 6],
    pub error: Option<String>,
}

impl SnapshotRow {
    pub fn empty(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            anchors: Default::default(),
            error: None,
        }
    }

    pub fn failed(symbol: &str, error: impl std::fmt::Display) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::empty(symbol)
        }
    }

    pub fn get(&self, anchor: Anchor) -> Option<&AnchorSnapshot> {
        self.anchors[anchor.index()].as_ref()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// `(column, value)` pairs for all 43 output columns, in column order.
    pub fn cells(&self) -> Vec<(String, Option<String>)> {
        let mut cells = Vec::with_capacity(Anchor::ALL.len() * SnapshotField::ALL.len() + 1);
        for anchor in Anchor::ALL {
            let snapshot = self.get(anchor);
            for field in SnapshotField::ALL {
                cells.push((anchor.column(field), snapshot.and_then(|s| s.value(field))));
            }
        }
        cells.push((ERROR_COLUMN.to_string(), self.error.clone()));
        cells
    }
}

/// First day of the fetch window: four years before the reference date.
pub fn window_start(reference: NaiveDate) -> Option<NaiveDate> {
    Anchor::FourYears.target_date(reference)
}

/// Select one bar per anchor. `bars` must already be sorted ascending.
pub fn extract_snapshots(
    bars: &[Bar],
    reference: NaiveDate,
) -> Result<[Option<AnchorSnapshot>; 6], JobError> {
    let mut anchors: [Option<AnchorSnapshot>; 6] = Default::default();
    for anchor in Anchor::ALL {
        let target = anchor
            .target_date(reference)
            .ok_or(JobError::DateRange(reference))?;
        anchors[anchor.index()] = match pick_on_or_before(bars, target) {
            Some(bar) => Some(AnchorSnapshot::from_bar(bar)?),
            None => None,
        };
    }
    Ok(anchors)
}

/// Source of daily bars for a symbol over an inclusive date range.
pub trait BarSource: Send + Sync {
    fn fetch_bars(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> impl Future<Output = Result<Vec<Bar>, JobError>> + Send;
}

/// [`BarSource`] backed by the market-data API with retry on transient statuses.
pub struct MassiveBarSource {
    client: massive_api::Client,
    policy: RetryPolicy,
}

impl MassiveBarSource {
    pub fn new(client: massive_api::Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }
}

impl BarSource for MassiveBarSource {
    async fn fetch_bars(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Bar>, JobError> {
        let query = AggsQuery::new(symbol, from, to);
        let label = format!("aggs {}", symbol);
        let resp = with_retry(&self.policy, &label, || self.client.get_aggs(&query)).await?;
        Ok(resp.into_bars())
    }
}

async fn try_snapshot<S: BarSource>(
    source: &S,
    symbol: &str,
    reference: NaiveDate,
) -> Result<SnapshotRow, JobError> {
    let start = window_start(reference).ok_or(JobError::DateRange(reference))?;
    let mut bars = source.fetch_bars(symbol, start, reference).await?;
    sort_bars(&mut bars);
    let anchors = extract_snapshots(&bars, reference)?;
    tracing::debug!("{}: {} bars, reference {}", symbol, bars.len(), reference);
    Ok(SnapshotRow {
        symbol: symbol.to_string(),
        anchors,
        error: None,
    })
}

/// Run the job for one symbol. Never fails: any error becomes an all-null
/// row carrying the error text.
pub async fn run_snapshot_job<S: BarSource>(
    source: &S,
    symbol: &str,
    reference: NaiveDate,
) -> SnapshotRow {
    match try_snapshot(source, symbol, reference).await {
        Ok(row) => row,
        Err(err) => {
            tracing::warn!("{}: snapshot failed: {}", symbol, err);
            SnapshotRow::failed(symbol, &err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn bar_on(date: NaiveDate, close: f64) -> Bar {
        Bar {
            timestamp: date.and_hms_opt(5, 0, 0).unwrap().and_utc().timestamp_millis(),
            open: Some(close - 1.0),
            high: Some(close + 1.0),
            low: Some(close - 2.0),
            close: Some(close),
            volume: Some(1_000_000.0),
            vwap: Some(close + 0.5),
            transactions: Some(10),
        }
    }

    struct FixedSource {
        bars: Vec<Bar>,
        requested: Mutex<Vec<(String, NaiveDate, NaiveDate)>>,
    }

    impl FixedSource {
        fn new(bars: Vec<Bar>) -> Self {
            Self {
                bars,
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    impl BarSource for FixedSource {
        async fn fetch_bars(
            &self,
            symbol: &str,
            from: NaiveDate,
            to: NaiveDate,
        ) -> Result<Vec<Bar>, JobError> {
            self.requested
                .lock()
                .unwrap()
                .push((symbol.to_string(), from, to));
            Ok(self.bars.clone())
        }
    }

    struct FailingSource;

    impl BarSource for FailingSource {
        async fn fetch_bars(
            &self,
            _symbol: &str,
            _from: NaiveDate,
            _to: NaiveDate,
        ) -> Result<Vec<Bar>, JobError> {
            Err(JobError::Fetch(massive_api::Error::HttpStatus {
                status: 404,
                body: "not found".to_string(),
            }))
        }
    }

    #[test]
    fn snapshot_value_formatting() {
        let snap = AnchorSnapshot::from_bar(&bar_on(d(2024, 6, 14), 100.25)).unwrap();
        assert_eq!(snap.value(SnapshotField::Date).as_deref(), Some("2024-06-14"));
        assert_eq!(snap.value(SnapshotField::Close).as_deref(), Some("100.25"));
        assert_eq!(snap.value(SnapshotField::Volume).as_deref(), Some("1000000"));
    }

    #[test]
    fn missing_bar_field_is_null() {
        let mut bar = bar_on(d(2024, 6, 14), 10.0);
        bar.vwap = None;
        let snap = AnchorSnapshot::from_bar(&bar).unwrap();
        assert_eq!(snap.value(SnapshotField::Vwap), None);
    }

    #[test]
    fn extract_picks_per_anchor() {
        let reference = d(2025, 6, 15);
        let bars = vec![
            bar_on(d(2021, 6, 14), 1.0),
            bar_on(d(2023, 6, 15), 2.0),
            bar_on(d(2024, 6, 14), 3.0),
            bar_on(d(2024, 12, 13), 4.0),
            bar_on(d(2025, 3, 14), 5.0),
            bar_on(d(2025, 5, 15), 6.0),
            bar_on(d(2025, 6, 13), 7.0),
        ];
        let anchors = extract_snapshots(&bars, reference).unwrap();
        let closes: Vec<Option<f64>> = anchors
            .iter()
            .map(|a| a.as_ref().and_then(|s| s.close))
            .collect();
        assert_eq!(
            closes,
            vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0), Some(6.0)]
        );
    }

    #[test]
    fn extract_short_history_nulls_early_anchors() {
        let reference = d(2025, 6, 15);
        let bars = vec![bar_on(d(2025, 1, 2), 50.0), bar_on(d(2025, 6, 13), 60.0)];
        let anchors = extract_snapshots(&bars, reference).unwrap();
        assert!(anchors[Anchor::FourYears.index()].is_none());
        assert!(anchors[Anchor::TwoYears.index()].is_none());
        assert!(anchors[Anchor::OneYear.index()].is_none());
        assert!(anchors[Anchor::SixMonths.index()].is_none());
        assert_eq!(
            anchors[Anchor::ThreeMonths.index()].as_ref().unwrap().close,
            Some(50.0)
        );
        assert_eq!(
            anchors[Anchor::OneMonth.index()].as_ref().unwrap().date,
            d(2025, 1, 2)
        );
    }

    #[test]
    fn cells_cover_all_output_columns() {
        let row = SnapshotRow::empty("AAPL");
        let cells = row.cells();
        assert_eq!(cells.len(), 43);
        assert!(cells.iter().all(|(_, v)| v.is_none()));
        let names: Vec<String> = cells.into_iter().map(|(k, _)| k).collect();
        assert_eq!(names, crate::anchors::output_columns());
    }

    #[test]
    fn failed_row_is_all_null_with_error() {
        let row = SnapshotRow::failed("ZZZZ", "HTTP 404: not found");
        assert!(row.is_error());
        let cells = row.cells();
        let (last_col, last_val) = cells.last().unwrap();
        assert_eq!(last_col, ERROR_COLUMN);
        assert_eq!(last_val.as_deref(), Some("HTTP 404: not found"));
        assert!(cells[..42].iter().all(|(_, v)| v.is_none()));
    }

    #[tokio::test]
    async fn job_requests_four_year_window_and_sorts() {
        let reference = d(2025, 6, 15);
        let source = FixedSource::new(vec![
            bar_on(d(2025, 6, 13), 7.0),
            bar_on(d(2025, 5, 15), 6.0),
        ]);
        let row = run_snapshot_job(&source, "AAPL", reference).await;
        assert!(!row.is_error());
        assert_eq!(row.get(Anchor::OneMonth).unwrap().close, Some(6.0));
        assert!(row.get(Anchor::OneYear).is_none());

        let requested = source.requested.lock().unwrap();
        assert_eq!(
            requested.as_slice(),
            &[("AAPL".to_string(), d(2021, 6, 15), reference)]
        );
    }

    #[tokio::test]
    async fn job_failure_collapses_to_error_row() {
        let row = run_snapshot_job(&FailingSource, "ZZZZ", d(2025, 6, 15)).await;
        assert_eq!(row.symbol, "ZZZZ");
        assert_eq!(row.error.as_deref(), Some("HTTP 404: not found"));
        assert!(row.anchors.iter().all(|a| a.is_none()));
    }

    #[tokio::test]
    async fn job_with_no_bars_is_all_null_without_error() {
        let row = run_snapshot_job(&FixedSource::new(vec![]), "NEW", d(2025, 6, 15)).await;
        assert!(!row.is_error());
        assert!(row.anchors.iter().all(|a| a.is_none()));
    }
}
