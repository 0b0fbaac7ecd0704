//! Summary statistics

use crate::models::{EntityKind, MergedRow, SummaryStats, TimeWindow};
use chrono::NaiveDate;
use musan_common::human_time::format_hms;
use musan_common::time::days_between;
use std::collections::BTreeMap;

/// Number of days a window covers, used as the per-day denominator
///
/// - predefined periods use their nominal length (7, 30, 90, 180, 365)
/// - `overall` counts from registration to `today`
/// - custom ranges use `end - start`
///
/// `None` when the count is unknown or not positive, so that no per-day
/// figure is ever divided by zero.
pub fn day_count(window: &TimeWindow, registration: Option<NaiveDate>, today: NaiveDate) -> Option<i64> {
    let days = match window {
        TimeWindow::Predefined { period } => Some(period.days()),
        TimeWindow::Overall => registration.map(|r| days_between(r, today)),
        TimeWindow::Custom { start, end } => Some(days_between(*start, *end)),
    }?;
    (days > 0).then_some(days)
}

/// Popularity weighted by scrobble share among matched rows
fn weighted_popularity(rows: &[MergedRow]) -> Option<f64> {
    let (weighted, scrobbles) = rows
        .iter()
        .filter_map(|r| r.popularity().map(|p| (f64::from(p), r.row.scrobble_count as f64)))
        .fold((0.0, 0.0), |(w, s), (pop, count)| (w + pop * count, s + count));
    (scrobbles > 0.0).then(|| weighted / scrobbles)
}

fn average_popularity(rows: &[MergedRow]) -> Option<f64> {
    let matched: Vec<f64> = rows.iter().filter_map(|r| r.popularity().map(f64::from)).collect();
    (!matched.is_empty()).then(|| matched.iter().sum::<f64>() / matched.len() as f64)
}

fn total_listening_secs(tracks: &[MergedRow]) -> Option<u64> {
    let durations: Vec<u64> = tracks
        .iter()
        .filter_map(|r| {
            let secs = r.catalog.as_ref()?.duration_secs()?;
            Some(secs * r.row.scrobble_count)
        })
        .collect();
    (!durations.is_empty()).then(|| durations.iter().sum())
}

/// Derive summary statistics from merged tables
///
/// Totals come from the track table; distinct counts are table lengths.
pub fn compute_summary_stats(
    tables: &BTreeMap<EntityKind, Vec<MergedRow>>,
    day_count: Option<i64>,
) -> SummaryStats {
    let table = |kind: EntityKind| tables.get(&kind).map(Vec::as_slice).unwrap_or(&[]);
    let tracks = table(EntityKind::Track);
    let artists = table(EntityKind::Artist);

    let total_scrobbles: u64 = tracks.iter().map(|r| r.row.scrobble_count).sum();
    let day_count = day_count.filter(|d| *d > 0);
    let total_listening_secs = total_listening_secs(tracks);

    SummaryStats {
        total_scrobbles,
        distinct_tracks: tracks.len(),
        distinct_albums: table(EntityKind::Album).len(),
        distinct_artists: artists.len(),
        day_count,
        average_scrobbles_per_day: day_count.map(|d| total_scrobbles as f64 / d as f64),
        weighted_track_popularity: weighted_popularity(tracks),
        weighted_artist_popularity: weighted_popularity(artists),
        average_track_popularity: average_popularity(tracks),
        average_artist_popularity: average_popularity(artists),
        total_listening_secs,
        total_listening_time: total_listening_secs.map(format_hms),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CatalogDetails, CatalogEntity, Identifier, Period, TopEntityRow};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn track_row(name: &str, count: u64, catalog: Option<(u8, u64)>) -> MergedRow {
        MergedRow {
            row: TopEntityRow {
                name: name.to_string(),
                artist: Some("Band".to_string()),
                scrobble_count: count,
            },
            catalog: catalog.map(|(popularity, duration_secs)| CatalogEntity {
                id: Identifier::new(name),
                name: name.to_string(),
                artist: Some("Band".to_string()),
                popularity,
                details: CatalogDetails::Track {
                    album: "Record".to_string(),
                    duration_secs,
                    release_date: None,
                },
            }),
        }
    }

    #[test]
    fn test_day_count_per_window() {
        let today = date(2024, 6, 1);
        let week = TimeWindow::Predefined { period: Period::SevenDay };
        assert_eq!(day_count(&week, None, today), Some(7));
        assert_eq!(day_count(&TimeWindow::Overall, Some(date(2024, 5, 2)), today), Some(30));
        assert_eq!(day_count(&TimeWindow::Overall, None, today), None);

        let custom = TimeWindow::Custom { start: date(2024, 5, 1), end: date(2024, 5, 11) };
        assert_eq!(day_count(&custom, None, today), Some(10));
    }

    #[test]
    fn test_zero_day_window_has_no_per_day_average() {
        let same_day = TimeWindow::Custom { start: date(2024, 5, 1), end: date(2024, 5, 1) };
        let days = day_count(&same_day, None, date(2024, 6, 1));
        assert_eq!(days, None);

        let mut tables = BTreeMap::new();
        tables.insert(EntityKind::Track, vec![track_row("A", 4, None)]);
        let stats = compute_summary_stats(&tables, days);

        assert_eq!(stats.total_scrobbles, 4);
        assert_eq!(stats.average_scrobbles_per_day, None);
    }

    #[test]
    fn test_weighted_popularity_and_duration() {
        let mut tables = BTreeMap::new();
        tables.insert(
            EntityKind::Track,
            vec![
                track_row("A", 3, Some((80, 200))),
                track_row("B", 1, Some((40, 100))),
                track_row("C", 6, None),
            ],
        );

        let stats = compute_summary_stats(&tables, Some(5));

        assert_eq!(stats.total_scrobbles, 10);
        assert_eq!(stats.distinct_tracks, 3);
        assert_eq!(stats.average_scrobbles_per_day, Some(2.0));
        // (80*3 + 40*1) / 4
        assert_eq!(stats.weighted_track_popularity, Some(70.0));
        assert_eq!(stats.average_track_popularity, Some(60.0));
        assert_eq!(stats.total_listening_secs, Some(700));
        assert_eq!(stats.total_listening_time.as_deref(), Some("0:11:40"));
        assert_eq!(stats.weighted_artist_popularity, None);
    }
}
