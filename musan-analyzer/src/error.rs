//! Error types for musan-analyzer
//!
//! Taxonomy:
//! - `UpstreamApi`: the upstream answered but flagged a logical error
//! - `Transport`: network, timeout or malformed-JSON failure
//! - `InvalidInput`: request parameters rejected before any remote call
//!
//! A catalog miss is not an error: lookups return `Ok(None)` and the caller
//! collects the entity into its not-found list. Statistics whose denominator
//! is unknown are `None`, never an error.

use chrono::NaiveDate;
use thiserror::Error;

/// Request validation failures, one variant per violated rule
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Empty field {0}!")]
    EmptyField(&'static str),

    #[error("Invalid {field} date: {value}")]
    InvalidDate { field: &'static str, value: String },

    #[error("Invalid time period {0}")]
    UnknownPeriod(String),

    #[error("Invalid data type {0}")]
    UnknownEntityKind(String),

    #[error("Username {0} not found!")]
    UnknownUser(String),

    #[error("End date cannot be before start date!")]
    EndBeforeStart,

    #[error("Start date {start} cannot be before the registration date {registered}!")]
    StartBeforeRegistration {
        start: NaiveDate,
        registered: NaiveDate,
    },

    #[error("End date {0} cannot be in the future!")]
    EndInFuture(NaiveDate),

    #[error("Invalid filename: {0}")]
    NotJsonFile(String),

    #[error("Could not read {path}: {reason}")]
    InvalidImportFile { path: String, reason: String },

    #[error("No files were provided")]
    NoFiles,

    #[error("No data available for the selected time period!")]
    NoData,
}

/// Analyzer error type
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// Upstream responded with a logical error (unknown user, bad parameter)
    #[error("Upstream API error {code}: {message}")]
    UpstreamApi { code: i64, message: String },

    /// Network failure, timeout or unparseable response body
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request parameters rejected before any remote call
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// Missing or unusable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// musan-common error
    #[error("Common error: {0}")]
    Common(#[from] musan_common::Error),
}

impl AnalyzerError {
    /// Message suitable for showing to the person who made the request
    pub fn user_message(&self) -> String {
        match self {
            AnalyzerError::UpstreamApi { message, .. } => {
                format!("The scrobble service encountered an error: {}", message)
            }
            AnalyzerError::Transport(_) => "The upstream API is down right now...".to_string(),
            AnalyzerError::InvalidInput(e) => e.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for AnalyzerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AnalyzerError::Transport(format!("request timed out: {}", err))
        } else {
            AnalyzerError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AnalyzerError {
    fn from(err: serde_json::Error) -> Self {
        AnalyzerError::Transport(format!("malformed response: {}", err))
    }
}

/// Result type for analyzer operations
pub type AnalyzerResult<T> = Result<T, AnalyzerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_converts_into_invalid_input() {
        let err: AnalyzerError = ValidationError::EndBeforeStart.into();
        assert!(matches!(err, AnalyzerError::InvalidInput(ValidationError::EndBeforeStart)));
        assert_eq!(err.user_message(), "End date cannot be before start date!");
    }

    #[test]
    fn test_malformed_json_is_transport() {
        let parse_err = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
        let err: AnalyzerError = parse_err.into();
        assert!(matches!(err, AnalyzerError::Transport(_)));
    }

    #[test]
    fn test_upstream_message_is_user_facing() {
        let err = AnalyzerError::UpstreamApi {
            code: 6,
            message: "User not found".to_string(),
        };
        assert!(err.user_message().contains("User not found"));
    }
}
