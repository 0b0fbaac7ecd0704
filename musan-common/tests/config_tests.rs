//! Unit tests for configuration loading and credential resolution
//!
//! Covers:
//! - Missing TOML files SHALL NOT cause termination
//! - Malformed TOML is reported as a configuration error
//! - ENV → TOML priority for credentials
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate MUSAN_* variables are marked with #[serial].

use musan_common::config::{
    default_config_path, load_toml_config, missing_credential_message, resolve_credential,
    LimitsConfig, LoggingConfig, TomlConfig, ENV_CONFIG_PATH, ENV_LASTFM_API_KEY,
};
use musan_common::Error;
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_missing_config_file_returns_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("does-not-exist.toml");

    let config = load_toml_config(&path).unwrap();

    assert_eq!(config, TomlConfig::default());
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.limits, LimitsConfig::default());
}

#[test]
fn test_full_config_file_is_loaded() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("musan.toml");
    std::fs::write(
        &path,
        r#"
            lastfm_api_key = "lfm-key"
            catalog_client_id = "client"
            catalog_client_secret = "secret"

            [logging]
            level = "debug"
            file = "/tmp/musan.log"

            [limits]
            concurrency = 5
            pacing_ms = 250
            enrich_limit = 20
            similar_artists_source_limit = 3
        "#,
    )
    .unwrap();

    let config = load_toml_config(&path).unwrap();

    assert_eq!(config.lastfm_api_key.as_deref(), Some("lfm-key"));
    assert_eq!(config.catalog_client_id.as_deref(), Some("client"));
    assert_eq!(config.catalog_client_secret.as_deref(), Some("secret"));
    assert_eq!(
        config.logging,
        LoggingConfig {
            level: "debug".to_string(),
            file: Some(PathBuf::from("/tmp/musan.log")),
        }
    );
    assert_eq!(config.limits.concurrency, 5);
    assert_eq!(config.limits.pacing_ms, 250);
    assert_eq!(config.limits.enrich_limit, 20);
    assert_eq!(config.limits.similar_artists_source_limit, 3);
}

#[test]
fn test_malformed_config_is_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.toml");
    std::fs::write(&path, "lastfm_api_key = [unterminated").unwrap();

    let result = load_toml_config(&path);

    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_toml_roundtrip() {
    let config = TomlConfig {
        lastfm_api_key: Some("test-key-123".to_string()),
        ..TomlConfig::default()
    };

    let toml_str = toml::to_string(&config).unwrap();
    let parsed: TomlConfig = toml::from_str(&toml_str).unwrap();

    assert_eq!(parsed, config);
}

#[test]
#[serial]
fn test_env_credential_takes_precedence() {
    env::set_var(ENV_LASTFM_API_KEY, "from-env");
    let toml_value = Some("from-toml".to_string());

    let resolved = resolve_credential(ENV_LASTFM_API_KEY, toml_value.as_ref());

    assert_eq!(resolved.as_deref(), Some("from-env"));
    env::remove_var(ENV_LASTFM_API_KEY);
}

#[test]
#[serial]
fn test_toml_credential_used_without_env() {
    env::remove_var(ENV_LASTFM_API_KEY);
    let toml_value = Some("from-toml".to_string());

    let resolved = resolve_credential(ENV_LASTFM_API_KEY, toml_value.as_ref());

    assert_eq!(resolved.as_deref(), Some("from-toml"));
}

#[test]
#[serial]
fn test_whitespace_credentials_are_ignored() {
    env::set_var(ENV_LASTFM_API_KEY, "   ");
    let toml_value = Some("".to_string());

    let resolved = resolve_credential(ENV_LASTFM_API_KEY, toml_value.as_ref());

    assert_eq!(resolved, None);
    env::remove_var(ENV_LASTFM_API_KEY);
}

#[test]
#[serial]
fn test_missing_credential_message_names_sources() {
    env::remove_var(ENV_CONFIG_PATH);

    let message = missing_credential_message(ENV_LASTFM_API_KEY, "lastfm_api_key");

    assert!(message.contains(ENV_LASTFM_API_KEY));
    assert!(message.contains("lastfm_api_key"));
}

#[test]
#[serial]
fn test_config_path_env_override() {
    env::set_var(ENV_CONFIG_PATH, "/tmp/musan-test/custom.toml");

    assert_eq!(default_config_path(), PathBuf::from("/tmp/musan-test/custom.toml"));

    env::remove_var(ENV_CONFIG_PATH);
    assert!(default_config_path().ends_with("musan.toml"));
}
