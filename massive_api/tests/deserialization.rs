use chrono::NaiveDate;
use massive_api::types::{AggsResponse, Bar};

fn load_fixture(name: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap()
}

#[test]
fn deserialize_aggs_full() {
    let json = load_fixture("aggs.json");
    let resp: AggsResponse = serde_json::from_str(&json).unwrap();
    assert_eq!(resp.ticker.as_deref(), Some("AAPL"));
    assert_eq!(resp.status.as_deref(), Some("OK"));
    assert_eq!(resp.results_count, Some(3));
    assert_eq!(resp.query_count, Some(3));
    assert_eq!(
        resp.request_id.as_deref(),
        Some("6a7e466379af0a71039d60cc78e72282")
    );

    let bars = resp.into_bars();
    assert_eq!(bars.len(), 3);
    let first = &bars[0];
    assert_eq!(first.timestamp, 1704171600000);
    assert_eq!(first.open, Some(187.15));
    assert_eq!(first.high, Some(188.44));
    assert_eq!(first.low, Some(183.885));
    assert_eq!(first.close, Some(185.64));
    assert_eq!(first.volume, Some(82488674.0));
    assert_eq!(first.vwap, Some(186.0962));
    assert_eq!(first.transactions, Some(1008871));
    assert_eq!(first.date(), NaiveDate::from_ymd_opt(2024, 1, 2));
}

#[test]
fn deserialize_aggs_without_results() {
    let json = load_fixture("aggs_empty.json");
    let resp: AggsResponse = serde_json::from_str(&json).unwrap();
    assert!(resp.results.is_none());
    assert_eq!(resp.results_count, Some(0));
    assert!(resp.into_bars().is_empty());
}

#[test]
fn deserialize_bar_with_missing_fields() {
    let bar: Bar = serde_json::from_str(r#"{"t": 1704171600000, "c": 10.5}"#).unwrap();
    assert_eq!(bar.close, Some(10.5));
    assert_eq!(bar.open, None);
    assert_eq!(bar.vwap, None);
    assert_eq!(bar.transactions, None);
}

#[test]
fn bar_date_uses_utc_calendar_day() {
    // 2024-01-01T23:30:00Z stays on the 1st even though it is the 2nd further east
    let bar: Bar = serde_json::from_str(r#"{"t": 1704151800000}"#).unwrap();
    assert_eq!(bar.date(), NaiveDate::from_ymd_opt(2024, 1, 1));
}
