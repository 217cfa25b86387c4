use chrono::NaiveDate;
use massive_api::{AggsQuery, SortOrder, Timespan};
use url::Url;

fn base_url() -> Url {
    Url::parse("https://example.com").unwrap()
}

fn range() -> (NaiveDate, NaiveDate) {
    (
        NaiveDate::from_ymd_opt(2021, 6, 15).unwrap(),
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
    )
}

#[test]
fn aggs_query_defaults() {
    let (from, to) = range();
    let url = AggsQuery::new("AAPL", from, to).to_url(&base_url());
    assert_eq!(
        url.path(),
        "/v2/aggs/ticker/AAPL/range/1/day/2021-06-15/2025-06-15"
    );
    let query = url.query().unwrap();
    assert!(query.contains("adjusted=true"));
    assert!(query.contains("sort=asc"));
    assert!(query.contains("limit=50000"));
}

#[test]
fn aggs_query_overrides() {
    let (from, to) = range();
    let url = AggsQuery::new("MSFT", from, to)
        .with_timespan(5, Timespan::Minute)
        .with_adjusted(false)
        .with_sort(SortOrder::Desc)
        .with_limit(120)
        .to_url(&base_url());
    assert_eq!(
        url.path(),
        "/v2/aggs/ticker/MSFT/range/5/minute/2021-06-15/2025-06-15"
    );
    let query = url.query().unwrap();
    assert!(query.contains("adjusted=false"));
    assert!(query.contains("sort=desc"));
    assert!(query.contains("limit=120"));
}

#[test]
fn aggs_query_limit_is_capped() {
    let (from, to) = range();
    let q = AggsQuery::new("AAPL", from, to).with_limit(1_000_000);
    assert_eq!(q.limit, AggsQuery::MAX_LIMIT);
}

#[test]
fn aggs_query_keeps_base_path_prefix() {
    let (from, to) = range();
    let base = Url::parse("http://localhost:8080/proxy/").unwrap();
    let url = AggsQuery::new("BRK-B", from, to).to_url(&base);
    assert_eq!(
        url.path(),
        "/proxy/v2/aggs/ticker/BRK-B/range/1/day/2021-06-15/2025-06-15"
    );
}
