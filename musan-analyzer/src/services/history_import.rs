//! Extended streaming history import
//!
//! Reads exported streaming-history JSON files (an array of play records) and
//! normalizes them into [`ScrobbleEvent`]s. Plays shorter than
//! [`MIN_PLAY_MS`] do not count as listens. Records without a track or artist
//! name (podcast episodes, local files) are skipped.

use crate::error::{AnalyzerResult, ValidationError};
use crate::models::ScrobbleEvent;
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Minimum play length for a record to count as a listen
pub const MIN_PLAY_MS: u64 = 30_000;

/// One record of an exported streaming history file
#[derive(Debug, Clone, Deserialize)]
pub struct StreamingHistoryRecord {
    pub ts: String,
    #[serde(default)]
    pub ms_played: u64,
    #[serde(default)]
    pub master_metadata_track_name: Option<String>,
    #[serde(default)]
    pub master_metadata_album_artist_name: Option<String>,
    #[serde(default)]
    pub master_metadata_album_album_name: Option<String>,
    #[serde(default)]
    pub reason_end: Option<String>,
    #[serde(default)]
    pub skipped: Option<bool>,
    #[serde(default)]
    pub spotify_track_uri: Option<String>,
}

/// A counted listen with its export-only extras
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportedListen {
    pub event: ScrobbleEvent,
    pub ms_played: u64,
    pub reason_end: Option<String>,
    pub skipped: bool,
    pub track_uri: Option<String>,
}

/// Reject anything that is not a `.json` file, before reading any of them
pub fn validate_history_paths(paths: &[PathBuf]) -> Result<(), ValidationError> {
    if paths.is_empty() {
        return Err(ValidationError::NoFiles);
    }

    for path in paths {
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if !is_json {
            return Err(ValidationError::NotJsonFile(path.display().to_string()));
        }
    }
    Ok(())
}

/// Keep a record if it is a counted listen of an identifiable track
pub fn normalize_record(record: StreamingHistoryRecord) -> Option<ImportedListen> {
    if record.ms_played < MIN_PLAY_MS {
        return None;
    }

    let track = record.master_metadata_track_name.filter(|s| !s.trim().is_empty())?;
    let artist = record
        .master_metadata_album_artist_name
        .filter(|s| !s.trim().is_empty())?;

    let timestamp = match DateTime::parse_from_rfc3339(&record.ts) {
        Ok(ts) => ts.timestamp(),
        Err(e) => {
            warn!(ts = %record.ts, error = %e, "Skipping record with unparseable timestamp");
            return None;
        }
    };

    Some(ImportedListen {
        event: ScrobbleEvent {
            track,
            artist,
            album: record.master_metadata_album_album_name.unwrap_or_default(),
            timestamp,
        },
        ms_played: record.ms_played,
        reason_end: record.reason_end,
        skipped: record.skipped.unwrap_or(false),
        track_uri: record.spotify_track_uri,
    })
}

/// Parse one file's content and append its listens to `listens`
pub fn import_history_str(
    content: &str,
    listens: &mut Vec<ImportedListen>,
) -> Result<usize, serde_json::Error> {
    let records: Vec<StreamingHistoryRecord> = serde_json::from_str(content)?;
    let total = records.len();
    let before = listens.len();

    listens.extend(records.into_iter().filter_map(normalize_record));

    let kept = listens.len() - before;
    debug!(total, kept, "Normalized streaming history records");
    Ok(kept)
}

fn import_history_file(path: &Path, listens: &mut Vec<ImportedListen>) -> AnalyzerResult<usize> {
    let content = std::fs::read_to_string(path)?;
    import_history_str(&content, listens).map_err(|e| {
        ValidationError::InvalidImportFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

/// Import every file into one accumulator, in the given order
///
/// Paths are validated up front; a bad extension rejects the whole request.
pub fn import_history_files(paths: &[PathBuf]) -> AnalyzerResult<Vec<ImportedListen>> {
    validate_history_paths(paths)?;

    let mut listens = Vec::new();
    for path in paths {
        let kept = import_history_file(path, &mut listens)?;
        info!(path = %path.display(), kept, "Imported streaming history file");
    }

    Ok(listens)
}
