//! Analysis workflow
//!
//! Request-level orchestration: validate, fetch history, enrich through the
//! catalog, aggregate into an [`AnalysisReport`](crate::models::AnalysisReport).

pub mod pipeline;

pub use pipeline::{AnalysisPipeline, PipelineConfig};
