//! Service modules
//!
//! - Upstream clients: `history_client`, `catalog_client`
//! - Matching and fan-out: `entity_matcher`, `fan_out`, `rate_limiter`
//! - Local inputs: `history_import`, `validation`

pub mod catalog_client;
pub mod entity_matcher;
pub mod fan_out;
pub mod history_client;
pub mod history_import;
pub mod rate_limiter;
pub mod validation;

pub use catalog_client::{CatalogApi, CatalogClient, SpotifyCatalogApi, CATALOG_BATCH_LIMIT};
pub use entity_matcher::{select_best_candidate, EntityMatcher};
pub use fan_out::{BoundedFanOut, FanOutOutcome};
pub use history_client::{HistoryClient, LastFmApi, ScrobbleApi};
pub use history_import::{import_history_files, ImportedListen};
pub use rate_limiter::BatchPacer;
