//! Aggregation engine
//!
//! Pure transforms over history and catalog data: joins, grouping, time
//! bucketing, cumulative series, summary statistics and similar-artist
//! recommendations. Nothing here performs I/O.

pub mod buckets;
pub mod grouping;
pub mod merge;
pub mod similar;
pub mod summary;

pub use buckets::{bucket_by_time_window, cumulative_series, granularity_for_range, BucketedEvent};
pub use grouping::group_events_by_entity;
pub use merge::{merge_rows, MergeOutcome};
pub use similar::recommend_similar_artists;
pub use summary::{compute_summary_stats, day_count};
