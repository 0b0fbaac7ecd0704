//! Timestamp and calendar-date utilities

use crate::{Error, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};

/// Today's date in the local time zone
pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> std::time::Duration {
    std::time::Duration::from_millis(millis)
}

/// Parse an ISO-8601 calendar date (`YYYY-MM-DD`)
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Convert an inclusive calendar-date range into Unix timestamp bounds
///
/// The start bound is midnight of `start`, the end bound is 23:59:59 of
/// `end`, both interpreted in `tz`. Fails only if a bound falls into a
/// non-existent local time.
pub fn day_bounds<Tz: TimeZone>(start: NaiveDate, end: NaiveDate, tz: &Tz) -> Result<(i64, i64)> {
    let start_local = start.and_time(NaiveTime::MIN);
    let end_time = NaiveTime::from_hms_opt(23, 59, 59)
        .ok_or_else(|| Error::Internal("invalid end-of-day time".to_string()))?;
    let end_local = end.and_time(end_time);

    let start_ts = tz
        .from_local_datetime(&start_local)
        .earliest()
        .ok_or_else(|| Error::InvalidInput(format!("start date {start} has no local midnight")))?
        .timestamp();
    let end_ts = tz
        .from_local_datetime(&end_local)
        .latest()
        .ok_or_else(|| Error::InvalidInput(format!("end date {end} has no local 23:59:59")))?
        .timestamp();

    Ok((start_ts, end_ts))
}

/// Calendar date of a Unix timestamp in `tz`
pub fn timestamp_to_date<Tz: TimeZone>(timestamp: i64, tz: &Tz) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp(timestamp, 0).map(|dt| dt.with_timezone(tz).date_naive())
}

/// Whole days from `start` to `end` (negative if `end` precedes `start`)
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_millis_to_duration() {
        assert_eq!(millis_to_duration(0), Duration::from_millis(0));
        assert_eq!(millis_to_duration(500), Duration::from_millis(500));
        assert_eq!(millis_to_duration(3_600_000), Duration::from_secs(3600));
    }

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(parse_iso_date("2024-02-29"), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(parse_iso_date(" 2024-01-05 "), NaiveDate::from_ymd_opt(2024, 1, 5));
        assert!(parse_iso_date("2023-02-29").is_none());
        assert!(parse_iso_date("05/01/2024").is_none());
        assert!(parse_iso_date("").is_none());
    }

    #[test]
    fn test_day_bounds_utc() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let (from, to) = day_bounds(start, end, &Utc).unwrap();
        assert_eq!(from, 1_704_067_200); // 2024-01-01T00:00:00Z
        assert_eq!(to, 1_704_239_999); // 2024-01-02T23:59:59Z
    }

    #[test]
    fn test_day_bounds_single_day_spans_whole_day() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let (from, to) = day_bounds(day, day, &Utc).unwrap();
        assert_eq!(to - from, 86_399);
    }

    #[test]
    fn test_timestamp_to_date() {
        assert_eq!(
            timestamp_to_date(1_704_239_999, &Utc),
            NaiveDate::from_ymd_opt(2024, 1, 2)
        );
    }

    #[test]
    fn test_days_between() {
        let a = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 1, 16).unwrap();
        assert_eq!(days_between(a, b), 15);
        assert_eq!(days_between(b, a), -15);
        assert_eq!(days_between(a, a), 0);
    }
}
