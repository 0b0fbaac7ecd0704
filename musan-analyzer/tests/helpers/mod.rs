//! Test helper utilities
//!
//! In-memory transports standing in for the scrobble and catalog services.

#![allow(dead_code)]

pub mod fake_catalog;
pub mod fake_scrobbles;

pub use fake_catalog::FakeCatalogApi;
pub use fake_scrobbles::{recent_page, top_page, FakeScrobbleApi};

use musan_analyzer::models::{CatalogDetails, CatalogEntity, Identifier};

pub fn track_entity(id: &str, name: &str, artist: &str, popularity: u8, duration_secs: u64) -> CatalogEntity {
    CatalogEntity {
        id: Identifier::new(id),
        name: name.to_string(),
        artist: Some(artist.to_string()),
        popularity,
        details: CatalogDetails::Track {
            album: "Record".to_string(),
            duration_secs,
            release_date: Some("2020-01-01".to_string()),
        },
    }
}

pub fn artist_entity(id: &str, name: &str, popularity: u8) -> CatalogEntity {
    CatalogEntity {
        id: Identifier::new(id),
        name: name.to_string(),
        artist: None,
        popularity,
        details: CatalogDetails::Artist {
            genres: vec!["indie".to_string()],
        },
    }
}

pub fn album_entity(id: &str, name: &str, artist: &str, popularity: u8) -> CatalogEntity {
    CatalogEntity {
        id: Identifier::new(id),
        name: name.to_string(),
        artist: Some(artist.to_string()),
        popularity,
        details: CatalogDetails::Album {
            release_date: Some("2020-01-01".to_string()),
        },
    }
}
