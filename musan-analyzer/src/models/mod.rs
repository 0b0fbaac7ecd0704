//! Data models for musan-analyzer
//!
//! - `scrobble`: listening events and per-entity ranking rows
//! - `catalog`: catalog identifiers, search candidates and detail records
//! - `window`: the analysed time window
//! - `report`: merged tables, summary statistics and chart series

pub mod catalog;
pub mod report;
pub mod scrobble;
pub mod window;

pub use catalog::{CatalogCandidate, CatalogDetails, CatalogEntity, Identifier};
pub use report::{
    AnalysisReport, BucketGranularity, ChartSeries, MergedRow, SeriesPoint, SimilarArtist,
    SummaryStats,
};
pub use scrobble::{EntityKey, EntityKind, HistoryTable, RankingTable, ScrobbleEvent, TopEntityRow};
pub use window::{Period, TimeWindow};
