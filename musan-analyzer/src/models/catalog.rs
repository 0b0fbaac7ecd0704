//! Catalog identifiers and detail records

use crate::models::scrobble::EntityKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque catalog identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(pub String);

impl Identifier {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One search hit, before matching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogCandidate {
    pub id: Identifier,
    pub name: String,
    /// 0-100; simplified search objects without popularity report 0
    pub popularity: u8,
}

/// Kind-specific catalog fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CatalogDetails {
    Track {
        album: String,
        duration_secs: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        release_date: Option<String>,
    },
    Album {
        #[serde(skip_serializing_if = "Option::is_none")]
        release_date: Option<String>,
    },
    Artist {
        genres: Vec<String>,
    },
}

/// Catalog detail record for one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntity {
    pub id: Identifier,
    pub name: String,
    /// Primary artist; absent for artist entities
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    pub popularity: u8,
    #[serde(flatten)]
    pub details: CatalogDetails,
}

impl CatalogEntity {
    pub fn kind(&self) -> EntityKind {
        match self.details {
            CatalogDetails::Track { .. } => EntityKind::Track,
            CatalogDetails::Album { .. } => EntityKind::Album,
            CatalogDetails::Artist { .. } => EntityKind::Artist,
        }
    }

    pub fn duration_secs(&self) -> Option<u64> {
        match self.details {
            CatalogDetails::Track { duration_secs, .. } => Some(duration_secs),
            _ => None,
        }
    }

    pub fn genres(&self) -> Option<&[String]> {
        match &self.details {
            CatalogDetails::Artist { genres } => Some(genres),
            _ => None,
        }
    }

    pub fn release_date(&self) -> Option<&str> {
        match &self.details {
            CatalogDetails::Track { release_date, .. } | CatalogDetails::Album { release_date } => {
                release_date.as_deref()
            }
            CatalogDetails::Artist { .. } => None,
        }
    }
}
