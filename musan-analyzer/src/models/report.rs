//! Report structures produced by the analysis pipeline

use crate::models::catalog::CatalogEntity;
use crate::models::scrobble::{EntityKey, EntityKind, TopEntityRow};
use crate::models::window::TimeWindow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A ranking row joined with its catalog record, when one was found
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRow {
    #[serde(flatten)]
    pub row: TopEntityRow,
    pub catalog: Option<CatalogEntity>,
}

impl MergedRow {
    pub fn unmatched(row: TopEntityRow) -> Self {
        Self { row, catalog: None }
    }

    pub fn popularity(&self) -> Option<u8> {
        self.catalog.as_ref().map(|c| c.popularity)
    }
}

/// Derived statistics
///
/// Every ratio is `None` when its denominator is zero or unknown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_scrobbles: u64,
    pub distinct_tracks: usize,
    pub distinct_albums: usize,
    pub distinct_artists: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_scrobbles_per_day: Option<f64>,
    /// Track popularity weighted by scrobble share
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weighted_track_popularity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weighted_artist_popularity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_track_popularity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_artist_popularity: Option<f64>,
    /// Σ count × duration over matched tracks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_listening_secs: Option<u64>,
    /// `total_listening_secs` as H:MM:SS
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_listening_time: Option<String>,
}

/// Chart bucket width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketGranularity {
    Day,
    Week,
    Month,
}

/// One point of a cumulative distinct-entity series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// First day of the bucket
    pub bucket: NaiveDate,
    /// Distinct entities heard in this bucket
    pub count: u64,
    /// Running total of `count`
    pub cumulative: u64,
}

/// Per-kind chart series sharing one granularity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub granularity: BucketGranularity,
    pub series: BTreeMap<EntityKind, Vec<SeriesPoint>>,
}

/// Artist recommended from the similar-artist graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarArtist {
    pub name: String,
    /// Similarity score in 0..=1
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Full result of one analysis request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub window: TimeWindow,
    pub tables: BTreeMap<EntityKind, Vec<MergedRow>>,
    /// Entities sent to the catalog that could not be resolved or joined
    pub not_found: Vec<EntityKey>,
    pub summary: SummaryStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartSeries>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub similar_artists: Vec<SimilarArtist>,
    /// Source artists whose similar-artist lookup failed
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub similar_artists_failed: Vec<String>,
}

impl AnalysisReport {
    pub fn table(&self, kind: EntityKind) -> &[MergedRow] {
        self.tables.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }
}
