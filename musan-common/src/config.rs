//! Configuration loading and credential resolution
//!
//! Bootstrap configuration comes from a single TOML file. Every field is
//! optional: a missing file or missing section falls back to built-in
//! defaults with a warning, never a startup failure.
//!
//! Credentials resolve with **ENV → TOML** priority so that a key exported in
//! the shell overrides one written to disk.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable holding the scrobble service API key
pub const ENV_LASTFM_API_KEY: &str = "MUSAN_LASTFM_API_KEY";
/// Environment variable holding the catalog service client id
pub const ENV_CATALOG_CLIENT_ID: &str = "MUSAN_CATALOG_CLIENT_ID";
/// Environment variable holding the catalog service client secret
pub const ENV_CATALOG_CLIENT_SECRET: &str = "MUSAN_CATALOG_CLIENT_SECRET";
/// Environment variable overriding the config file location
pub const ENV_CONFIG_PATH: &str = "MUSAN_CONFIG";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TomlConfig {
    /// Scrobble service API key
    #[serde(default)]
    pub lastfm_api_key: Option<String>,

    /// Catalog service client-credentials id
    #[serde(default)]
    pub catalog_client_id: Option<String>,

    /// Catalog service client-credentials secret
    #[serde(default)]
    pub catalog_client_secret: Option<String>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Upstream pacing and enrichment limits
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Fan-out and enrichment limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LimitsConfig {
    /// Maximum in-flight catalog lookups
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Delay enforced after every fan-out batch (milliseconds)
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,

    /// Number of top rows per entity kind sent through catalog enrichment
    #[serde(default = "default_enrich_limit")]
    pub enrich_limit: usize,

    /// Number of top artists whose similar artists are collected
    #[serde(default = "default_similar_source_limit")]
    pub similar_artists_source_limit: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            pacing_ms: default_pacing_ms(),
            enrich_limit: default_enrich_limit(),
            similar_artists_source_limit: default_similar_source_limit(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_concurrency() -> usize {
    3
}

fn default_pacing_ms() -> u64 {
    500
}

fn default_enrich_limit() -> usize {
    50
}

fn default_similar_source_limit() -> usize {
    10
}

/// Default configuration file location
///
/// Priority: `MUSAN_CONFIG` → `<config dir>/musan/musan.toml` → `./musan.toml`
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    dirs::config_dir()
        .map(|d| d.join("musan").join("musan.toml"))
        .unwrap_or_else(|| PathBuf::from("musan.toml"))
}

/// Load the TOML configuration file
///
/// A missing file is not an error: defaults are returned and a warning is
/// logged. A file that exists but cannot be parsed is a `Config` error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(
            path = %path.display(),
            "Config file not found, using built-in defaults"
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))?;

    info!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

/// Validate a credential value (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Resolve one credential from environment and TOML
///
/// **Priority:** ENV → TOML
///
/// Returns `Ok(None)` when neither source holds a valid value; callers
/// decide whether the credential is mandatory.
pub fn resolve_credential(env_var: &str, toml_value: Option<&String>) -> Option<String> {
    let env_value = std::env::var(env_var).ok().filter(|v| is_valid_key(v));
    let toml_value = toml_value.filter(|v| is_valid_key(v)).cloned();

    if env_value.is_some() && toml_value.is_some() {
        warn!(
            "{} found in both environment and TOML config. Using environment (highest priority).",
            env_var
        );
    }

    match (env_value, toml_value) {
        (Some(v), _) => {
            info!("{} loaded from environment variable", env_var);
            Some(v)
        }
        (None, Some(v)) => {
            info!("{} loaded from TOML config", env_var);
            Some(v)
        }
        (None, None) => None,
    }
}

/// Message naming every way to supply a missing credential
pub fn missing_credential_message(env_var: &str, toml_key: &str) -> String {
    format!(
        "{toml_key} not configured. Please configure using one of:\n\
         1. Environment: {env_var}=your-value\n\
         2. TOML config: {} ({toml_key} = \"your-value\")",
        default_config_path().display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("abc"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("   "));
    }

    #[test]
    fn test_limits_defaults() {
        let limits = LimitsConfig::default();
        assert_eq!(limits.concurrency, 3);
        assert_eq!(limits.pacing_ms, 500);
        assert_eq!(limits.enrich_limit, 50);
        assert_eq!(limits.similar_artists_source_limit, 10);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: TomlConfig = toml::from_str("lastfm_api_key = \"k\"\n[limits]\nconcurrency = 5\n").unwrap();
        assert_eq!(config.lastfm_api_key.as_deref(), Some("k"));
        assert_eq!(config.limits.concurrency, 5);
        assert_eq!(config.limits.pacing_ms, 500);
        assert_eq!(config.logging.level, "info");
    }
}
