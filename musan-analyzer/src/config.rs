//! Configuration resolution for musan-analyzer
//!
//! Turns the bootstrap [`TomlConfig`] into per-client settings. Credentials
//! resolve with ENV → TOML priority (see `musan_common::config`).
//!
//! The scrobble key is only mandatory for operations that talk to the scrobble
//! service; catalog credentials are optional and their absence disables
//! enrichment rather than failing startup.

use crate::error::{AnalyzerError, AnalyzerResult};
use musan_common::config::{
    resolve_credential, TomlConfig, ENV_CATALOG_CLIENT_ID, ENV_CATALOG_CLIENT_SECRET,
    ENV_LASTFM_API_KEY,
};
use musan_common::time::millis_to_duration;
use std::time::Duration;
use tracing::warn;

/// Scrobble service REST endpoint
pub const LASTFM_API_URL: &str = "https://ws.audioscrobbler.com/2.0/";
/// Catalog service REST root
pub const CATALOG_API_URL: &str = "https://api.spotify.com/v1";
/// Catalog service client-credentials token endpoint
pub const CATALOG_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Default per-request timeout for both services
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User agent sent to both services
pub const USER_AGENT: &str = concat!("musan/", env!("CARGO_PKG_VERSION"));

/// Scrobble history client settings
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryClientConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
    /// Upper bound on requests per second issued by one client
    pub requests_per_second: u32,
}

impl HistoryClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: LASTFM_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            requests_per_second: 5,
        }
    }
}

/// Catalog client settings
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogClientConfig {
    pub client_id: String,
    pub client_secret: String,
    pub api_url: String,
    pub token_url: String,
    pub timeout: Duration,
    pub requests_per_second: u32,
}

impl CatalogClientConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            api_url: CATALOG_API_URL.to_string(),
            token_url: CATALOG_TOKEN_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            requests_per_second: 10,
        }
    }
}

/// Bounded fan-out settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanOutConfig {
    /// Maximum lookups in flight at once (and batch size)
    pub concurrency: usize,
    /// Delay enforced after each batch completes
    pub pacing: Duration,
}

impl Default for FanOutConfig {
    fn default() -> Self {
        Self {
            concurrency: 3,
            pacing: Duration::from_millis(500),
        }
    }
}

/// Fully resolved analyzer configuration
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub history: Option<HistoryClientConfig>,
    pub catalog: Option<CatalogClientConfig>,
    pub fan_out: FanOutConfig,
    pub enrich_limit: usize,
    pub similar_artists_source_limit: usize,
}

impl AnalyzerConfig {
    /// Resolve credentials and limits from TOML plus environment
    pub fn from_toml(toml_config: &TomlConfig) -> AnalyzerResult<Self> {
        let history = resolve_credential(ENV_LASTFM_API_KEY, toml_config.lastfm_api_key.as_ref())
            .map(HistoryClientConfig::new);

        let client_id = resolve_credential(
            ENV_CATALOG_CLIENT_ID,
            toml_config.catalog_client_id.as_ref(),
        );
        let client_secret = resolve_credential(
            ENV_CATALOG_CLIENT_SECRET,
            toml_config.catalog_client_secret.as_ref(),
        );

        let catalog = match (client_id, client_secret) {
            (Some(id), Some(secret)) => Some(CatalogClientConfig::new(id, secret)),
            (None, None) => {
                warn!("Catalog credentials not configured, enrichment disabled");
                None
            }
            _ => {
                return Err(AnalyzerError::Config(format!(
                    "Catalog credentials incomplete: both {} and {} are required",
                    ENV_CATALOG_CLIENT_ID, ENV_CATALOG_CLIENT_SECRET
                )))
            }
        };

        let limits = &toml_config.limits;
        if limits.concurrency == 0 {
            return Err(AnalyzerError::Config(
                "limits.concurrency must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            history,
            catalog,
            fan_out: FanOutConfig {
                concurrency: limits.concurrency,
                pacing: millis_to_duration(limits.pacing_ms),
            },
            enrich_limit: limits.enrich_limit,
            similar_artists_source_limit: limits.similar_artists_source_limit,
        })
    }

    /// Drop catalog settings so that no enrichment is attempted
    pub fn without_catalog(mut self) -> Self {
        self.catalog = None;
        self
    }
}
