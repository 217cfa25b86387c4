//! Anchor-date bar selection over a time-ascending bar series.

use chrono::NaiveDate;
use massive_api::types::Bar;

/// 23:59:59.000 UTC on `date`, as epoch milliseconds.
pub fn end_of_day_millis(date: NaiveDate) -> Option<i64> {
    date.and_hms_opt(23, 59, 59)
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// Sort bars ascending by timestamp. Fetched data is not trusted to be ordered.
pub fn sort_bars(bars: &mut [Bar]) {
    bars.sort_by_key(|bar| bar.timestamp);
}

/// Latest bar whose timestamp is at or before `cutoff_ms`.
///
/// `bars` must be sorted ascending by timestamp. Returns `None` when every
/// bar is after the cutoff, or the slice is empty. Among equal timestamps
/// any one may be returned.
pub fn pick_at_or_before(bars: &[Bar], cutoff_ms: i64) -> Option<&Bar> {
    let idx = bars.partition_point(|bar| bar.timestamp <= cutoff_ms);
    idx.checked_sub(1).map(|i| &bars[i])
}

/// Latest bar on or before the end of `date` (UTC).
///
/// A date past the last bar yields the last bar; a date before the first
/// bar yields `None`.
pub fn pick_on_or_before(bars: &[Bar], date: NaiveDate) -> Option<&Bar> {
    let cutoff = end_of_day_millis(date)?;
    pick_at_or_before(bars, cutoff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    const DAY_MS: i64 = 86_400_000;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn bar(timestamp: i64, close: f64) -> Bar {
        Bar {
            timestamp,
            open: Some(close),
            high: Some(close),
            low: Some(close),
            close: Some(close),
            volume: Some(1000.0),
            vwap: Some(close),
            transactions: None,
        }
    }

    fn midnight(date: NaiveDate) -> i64 {
        date.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp_millis()
    }

    fn day1_day10_day20() -> Vec<Bar> {
        vec![
            bar(midnight(d(2024, 1, 1)), 10.0),
            bar(midnight(d(2024, 1, 10)), 20.0),
            bar(midnight(d(2024, 1, 20)), 30.0),
        ]
    }

    #[test]
    fn end_of_day_is_last_second() {
        let eod = end_of_day_millis(d(2024, 1, 1)).unwrap();
        assert_eq!(eod, midnight(d(2024, 1, 2)) - 1000);
    }

    #[test]
    fn between_bars_picks_earlier() {
        let bars = day1_day10_day20();
        let picked = pick_on_or_before(&bars, d(2024, 1, 15)).unwrap();
        assert_eq!(picked.close, Some(20.0));
    }

    #[test]
    fn exact_day_is_inclusive() {
        let bars = day1_day10_day20();
        let picked = pick_on_or_before(&bars, d(2024, 1, 10)).unwrap();
        assert_eq!(picked.close, Some(20.0));
        let picked = pick_on_or_before(&bars, d(2024, 1, 1)).unwrap();
        assert_eq!(picked.close, Some(10.0));
    }

    #[test]
    fn intraday_timestamp_counts_for_its_day() {
        // bar stamped 05:00 UTC on the target day is before end of day
        let bars = vec![bar(midnight(d(2024, 1, 2)) + 5 * 3_600_000, 1.0)];
        assert!(pick_on_or_before(&bars, d(2024, 1, 2)).is_some());
        assert!(pick_on_or_before(&bars, d(2024, 1, 1)).is_none());
    }

    #[test]
    fn before_first_bar_is_none() {
        let bars = day1_day10_day20();
        assert!(pick_on_or_before(&bars, d(2023, 12, 31)).is_none());
    }

    #[test]
    fn after_last_bar_returns_last() {
        let bars = day1_day10_day20();
        let picked = pick_on_or_before(&bars, d(2030, 1, 1)).unwrap();
        assert_eq!(picked.close, Some(30.0));
    }

    #[test]
    fn empty_is_none() {
        assert!(pick_on_or_before(&[], d(2024, 1, 1)).is_none());
    }

    #[test]
    fn sort_bars_orders_by_timestamp() {
        let mut bars = vec![bar(30, 3.0), bar(10, 1.0), bar(20, 2.0)];
        sort_bars(&mut bars);
        let ts: Vec<i64> = bars.iter().map(|b| b.timestamp).collect();
        assert_eq!(ts, vec![10, 20, 30]);
    }

    #[test]
    fn equal_timestamps_return_one_of_them() {
        let bars = vec![bar(10, 1.0), bar(20, 2.0), bar(20, 3.0), bar(30, 4.0)];
        let picked = pick_at_or_before(&bars, 25).unwrap();
        assert_eq!(picked.timestamp, 20);
    }

    #[test]
    fn matches_linear_scan_on_random_series() {
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let len = rng.gen_range(0..40);
            let mut ts = 0i64;
            let mut bars = Vec::with_capacity(len);
            for i in 0..len {
                ts += rng.gen_range(1..5) * DAY_MS;
                bars.push(bar(ts, i as f64));
            }
            for _ in 0..20 {
                let cutoff = rng.gen_range(-DAY_MS..ts + 3 * DAY_MS);
                let expected = bars.iter().filter(|b| b.timestamp <= cutoff).last();
                assert_eq!(pick_at_or_before(&bars, cutoff), expected);
            }
        }
    }
}
