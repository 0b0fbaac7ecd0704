//! Time bucketing and cumulative series
//!
//! Granularity follows the span of the window: up to 15 days is daily, up to
//! 31 days weekly (ISO weeks, starting Monday), anything longer monthly.

use crate::models::{BucketGranularity, EntityKind, ScrobbleEvent, SeriesPoint};
use chrono::{Datelike, Duration, NaiveDate, TimeZone};
use musan_common::time::{days_between, timestamp_to_date};
use std::collections::{BTreeMap, HashSet};

/// Longest span still bucketed per day
pub const DAILY_MAX_DAYS: i64 = 15;
/// Longest span still bucketed per week
pub const WEEKLY_MAX_DAYS: i64 = 31;

/// An event tagged with the first day of its bucket
#[derive(Debug, Clone, PartialEq)]
pub struct BucketedEvent<'a> {
    pub bucket: NaiveDate,
    pub event: &'a ScrobbleEvent,
}

pub fn granularity_for_range(start: NaiveDate, end: NaiveDate) -> BucketGranularity {
    let span = days_between(start, end);
    if span <= DAILY_MAX_DAYS {
        BucketGranularity::Day
    } else if span <= WEEKLY_MAX_DAYS {
        BucketGranularity::Week
    } else {
        BucketGranularity::Month
    }
}

/// First day of the bucket containing `date`
pub fn bucket_start(date: NaiveDate, granularity: BucketGranularity) -> NaiveDate {
    match granularity {
        BucketGranularity::Day => date,
        BucketGranularity::Week => {
            date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
        }
        BucketGranularity::Month => date.with_day(1).unwrap_or(date),
    }
}

/// Tag every event with its bucket, dates taken in `tz`
///
/// Events whose timestamp cannot be represented are dropped.
pub fn bucket_by_time_window<'a, Tz: TimeZone>(
    events: &'a [ScrobbleEvent],
    start: NaiveDate,
    end: NaiveDate,
    tz: &Tz,
) -> (BucketGranularity, Vec<BucketedEvent<'a>>) {
    let granularity = granularity_for_range(start, end);
    let bucketed = events
        .iter()
        .filter_map(|event| {
            let date = timestamp_to_date(event.timestamp, tz)?;
            Some(BucketedEvent {
                bucket: bucket_start(date, granularity),
                event,
            })
        })
        .collect();
    (granularity, bucketed)
}

/// Distinct entities of `kind` per bucket, with a running total
///
/// An entity heard in several buckets counts once in each of them.
pub fn cumulative_series(bucketed: &[BucketedEvent<'_>], kind: EntityKind) -> Vec<SeriesPoint> {
    let mut per_bucket: BTreeMap<NaiveDate, HashSet<(String, Option<String>)>> = BTreeMap::new();
    for item in bucketed {
        per_bucket
            .entry(item.bucket)
            .or_default()
            .insert(item.event.key(kind).normalized());
    }

    let mut running = 0u64;
    per_bucket
        .into_iter()
        .map(|(bucket, entities)| {
            let count = entities.len() as u64;
            running += count;
            SeriesPoint {
                bucket,
                count,
                cumulative: running,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn event_at(track: &str, y: i32, m: u32, d: u32) -> ScrobbleEvent {
        let ts = Utc
            .with_ymd_and_hms(y, m, d, 12, 0, 0)
            .single()
            .unwrap()
            .timestamp();
        ScrobbleEvent {
            track: track.to_string(),
            artist: "Band".to_string(),
            album: "Record".to_string(),
            timestamp: ts,
        }
    }

    #[test]
    fn test_granularity_boundaries() {
        let start = date(2024, 1, 1);
        assert_eq!(granularity_for_range(start, date(2024, 1, 16)), BucketGranularity::Day);
        assert_eq!(granularity_for_range(start, date(2024, 1, 17)), BucketGranularity::Week);
        assert_eq!(granularity_for_range(start, date(2024, 2, 1)), BucketGranularity::Week);
        assert_eq!(granularity_for_range(start, date(2024, 2, 2)), BucketGranularity::Month);
    }

    #[test]
    fn test_week_bucket_starts_monday() {
        // 2024-01-03 is a Wednesday
        assert_eq!(bucket_start(date(2024, 1, 3), BucketGranularity::Week), date(2024, 1, 1));
        assert_eq!(bucket_start(date(2024, 1, 7), BucketGranularity::Week), date(2024, 1, 1));
        assert_eq!(bucket_start(date(2024, 1, 8), BucketGranularity::Week), date(2024, 1, 8));
    }

    #[test]
    fn test_month_bucket_starts_first() {
        assert_eq!(bucket_start(date(2024, 2, 29), BucketGranularity::Month), date(2024, 2, 1));
    }

    #[test]
    fn test_bucketing_in_utc() {
        let events = vec![event_at("A", 2024, 1, 3), event_at("B", 2024, 1, 10)];
        let (granularity, bucketed) =
            bucket_by_time_window(&events, date(2024, 1, 1), date(2024, 1, 20), &Utc);

        assert_eq!(granularity, BucketGranularity::Week);
        assert_eq!(bucketed[0].bucket, date(2024, 1, 1));
        assert_eq!(bucketed[1].bucket, date(2024, 1, 8));
    }

    #[test]
    fn test_cumulative_distinct_counts() {
        let events = vec![
            event_at("A", 2024, 1, 1),
            event_at("A", 2024, 1, 1),
            event_at("B", 2024, 1, 1),
            event_at("A", 2024, 1, 2),
            event_at("C", 2024, 1, 4),
        ];
        let (_, bucketed) = bucket_by_time_window(&events, date(2024, 1, 1), date(2024, 1, 5), &Utc);

        let series = cumulative_series(&bucketed, EntityKind::Track);

        let points: Vec<(NaiveDate, u64, u64)> =
            series.iter().map(|p| (p.bucket, p.count, p.cumulative)).collect();
        assert_eq!(
            points,
            vec![
                (date(2024, 1, 1), 2, 2),
                (date(2024, 1, 2), 1, 3),
                (date(2024, 1, 4), 1, 4),
            ]
        );

        let artists = cumulative_series(&bucketed, EntityKind::Artist);
        assert_eq!(artists.last().map(|p| p.cumulative), Some(3));
    }
}
