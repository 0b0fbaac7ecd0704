//! musan-analyzer library interface
//!
//! Aggregates a listener's scrobble history, enriches it with music catalog
//! metadata and derives rankings, summary statistics and chart series.
//!
//! Layers:
//! - `services`: upstream clients, matching policy, bounded fan-out, imports
//! - `aggregation`: pure joins, grouping, bucketing and statistics
//! - `workflow`: request-level orchestration into an `AnalysisReport`

pub mod aggregation;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod workflow;

pub use crate::error::{AnalyzerError, AnalyzerResult, ValidationError};
pub use crate::workflow::{AnalysisPipeline, PipelineConfig};
