//! Left join of ranking rows with catalog detail records

use crate::models::{CatalogEntity, EntityKey, EntityKind, MergedRow, TopEntityRow};
use std::collections::HashMap;

/// Join result
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// Every input row, in input order
    pub rows: Vec<MergedRow>,
    /// Keys of rows with no catalog counterpart
    pub unmatched: Vec<EntityKey>,
}

type JoinKey = (String, Option<String>);

fn join_key(kind: EntityKind, name: &str, artist: Option<&str>) -> JoinKey {
    let artist = if kind.has_artist() {
        artist.map(str::to_lowercase)
    } else {
        None
    };
    (name.to_lowercase(), artist)
}

/// Left-join `rows` with `catalog`
///
/// Tracks and albums join on (name, artist), artists on name alone, both
/// ignoring case. When several catalog records share a key the first wins.
pub fn merge_rows(kind: EntityKind, rows: Vec<TopEntityRow>, catalog: &[CatalogEntity]) -> MergeOutcome {
    let mut index: HashMap<JoinKey, &CatalogEntity> = HashMap::with_capacity(catalog.len());
    for entity in catalog {
        index
            .entry(join_key(kind, &entity.name, entity.artist.as_deref()))
            .or_insert(entity);
    }

    let mut unmatched = Vec::new();
    let rows = rows
        .into_iter()
        .map(|row| {
            let key = join_key(kind, &row.name, row.artist.as_deref());
            let catalog = index.get(&key).map(|entity| (*entity).clone());
            if catalog.is_none() {
                unmatched.push(row.key());
            }
            MergedRow { row, catalog }
        })
        .collect();

    MergeOutcome { rows, unmatched }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CatalogDetails, Identifier};

    fn row(name: &str, artist: Option<&str>, count: u64) -> TopEntityRow {
        TopEntityRow {
            name: name.to_string(),
            artist: artist.map(str::to_string),
            scrobble_count: count,
        }
    }

    fn track(id: &str, name: &str, artist: &str, popularity: u8) -> CatalogEntity {
        CatalogEntity {
            id: Identifier::new(id),
            name: name.to_string(),
            artist: Some(artist.to_string()),
            popularity,
            details: CatalogDetails::Track {
                album: "Record".to_string(),
                duration_secs: 200,
                release_date: None,
            },
        }
    }

    #[test]
    fn test_left_join_keeps_every_row() {
        let rows = vec![row("Song", Some("Band"), 10), row("Other", Some("Band"), 4)];
        let catalog = vec![track("t1", "song", "BAND", 60)];

        let outcome = merge_rows(EntityKind::Track, rows, &catalog);

        assert_eq!(outcome.rows.len(), 2);
        assert_eq!(outcome.rows[0].popularity(), Some(60));
        assert!(outcome.rows[1].catalog.is_none());
        assert_eq!(outcome.unmatched, vec![EntityKey::new("Other", Some("Band"))]);
    }

    #[test]
    fn test_same_title_different_artist_not_joined() {
        let rows = vec![row("Song", Some("Band"), 10)];
        let catalog = vec![track("t1", "Song", "Someone Else", 60)];

        let outcome = merge_rows(EntityKind::Track, rows, &catalog);
        assert!(outcome.rows[0].catalog.is_none());
    }

    #[test]
    fn test_artist_join_on_name_only() {
        let rows = vec![row("Band", None, 10)];
        let catalog = vec![CatalogEntity {
            id: Identifier::new("a1"),
            name: "band".to_string(),
            artist: None,
            popularity: 42,
            details: CatalogDetails::Artist { genres: vec![] },
        }];

        let outcome = merge_rows(EntityKind::Artist, rows, &catalog);
        assert_eq!(outcome.rows[0].popularity(), Some(42));
        assert!(outcome.unmatched.is_empty());
    }
}
