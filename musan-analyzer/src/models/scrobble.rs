//! Listening events and ranking rows

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of music entity being ranked or looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Track,
    Album,
    Artist,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Track, EntityKind::Album, EntityKind::Artist];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Track => "track",
            EntityKind::Album => "album",
            EntityKind::Artist => "artist",
        }
    }

    pub fn plural(&self) -> &'static str {
        match self {
            EntityKind::Track => "tracks",
            EntityKind::Album => "albums",
            EntityKind::Artist => "artists",
        }
    }

    /// Artists are keyed by name alone
    pub fn has_artist(&self) -> bool {
        !matches!(self, EntityKind::Artist)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One listening event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrobbleEvent {
    pub track: String,
    pub artist: String,
    pub album: String,
    /// Unix seconds
    pub timestamp: i64,
}

impl ScrobbleEvent {
    /// Key of the entity of `kind` this event counts towards
    pub fn key(&self, kind: EntityKind) -> EntityKey {
        match kind {
            EntityKind::Track => EntityKey::new(&self.track, Some(&self.artist)),
            EntityKind::Album => EntityKey::new(&self.album, Some(&self.artist)),
            EntityKind::Artist => EntityKey::new(&self.artist, None),
        }
    }
}

/// Ordered listening events
pub type HistoryTable = Vec<ScrobbleEvent>;

/// Identity of an entity in a ranking table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityKey {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
}

impl EntityKey {
    pub fn new(name: &str, artist: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            artist: artist.map(str::to_string),
        }
    }

    /// Case-insensitive form used for joins and grouping
    pub fn normalized(&self) -> (String, Option<String>) {
        (
            self.name.to_lowercase(),
            self.artist.as_ref().map(|a| a.to_lowercase()),
        )
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.artist {
            Some(artist) => write!(f, "{} - {}", artist, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// One row of a per-entity ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopEntityRow {
    pub name: String,
    /// Absent for artist rows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    pub scrobble_count: u64,
}

impl TopEntityRow {
    pub fn key(&self) -> EntityKey {
        EntityKey {
            name: self.name.clone(),
            artist: self.artist.clone(),
        }
    }
}

/// Ranking rows sorted by scrobble count, descending
pub type RankingTable = Vec<TopEntityRow>;
