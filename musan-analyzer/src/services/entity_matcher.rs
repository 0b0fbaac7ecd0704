//! Entity matching policy
//!
//! Deciding which catalog search hit "is" a history entity:
//! 1. keep only candidates whose name equals the target, ignoring case
//! 2. of those, take the most popular
//! 3. on a popularity tie the earliest candidate in search order wins
//!
//! No fuzzy matching: "Song" never matches "Song (Remix)".

use crate::error::AnalyzerResult;
use crate::models::{CatalogCandidate, EntityKey, EntityKind, Identifier};
use crate::services::catalog_client::CatalogClient;
use std::sync::Arc;

/// Case-insensitive exact name comparison
pub fn names_match(candidate: &str, target: &str) -> bool {
    candidate.to_lowercase() == target.to_lowercase()
}

/// Pick the best candidate for `target`, if any matches exactly
pub fn select_best_candidate<'a>(
    target: &str,
    candidates: &'a [CatalogCandidate],
) -> Option<&'a CatalogCandidate> {
    candidates
        .iter()
        .filter(|c| names_match(&c.name, target))
        .fold(None, |best: Option<&CatalogCandidate>, c| match best {
            Some(b) if b.popularity >= c.popularity => Some(b),
            _ => Some(c),
        })
}

/// Strip everything but word characters and whitespace
///
/// Artist searches choke on punctuation ("AC/DC", "Sigur Rós!"), so the query
/// uses the stripped form while matching still compares the original name.
pub fn strip_punctuation(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect()
}

/// Resolves ranking keys to catalog identifiers
#[derive(Clone)]
pub struct EntityMatcher {
    catalog: Arc<CatalogClient>,
}

impl EntityMatcher {
    pub fn new(catalog: Arc<CatalogClient>) -> Self {
        Self { catalog }
    }

    /// Resolve one key; `Ok(None)` when no candidate matches
    pub async fn resolve(
        &self,
        kind: EntityKind,
        key: &EntityKey,
    ) -> AnalyzerResult<Option<Identifier>> {
        match (kind, key.artist.as_deref()) {
            (EntityKind::Artist, _) => self.catalog.resolve_artist_identifier(&key.name).await,
            (_, Some(artist)) => {
                self.catalog
                    .resolve_identifier(kind, &key.name, artist)
                    .await
            }
            (_, None) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, name: &str, popularity: u8) -> CatalogCandidate {
        CatalogCandidate {
            id: Identifier::new(id),
            name: name.to_string(),
            popularity,
        }
    }

    #[test]
    fn test_most_popular_exact_match_wins() {
        let candidates = vec![candidate("a", "Song", 80), candidate("b", "song", 95)];
        let best = select_best_candidate("Song", &candidates).unwrap();
        assert_eq!(best.id.as_str(), "b");
    }

    #[test]
    fn test_variant_title_is_not_a_match() {
        let candidates = vec![candidate("a", "Song (Remix)", 99)];
        assert!(select_best_candidate("Song", &candidates).is_none());
    }

    #[test]
    fn test_popularity_tie_keeps_first() {
        let candidates = vec![
            candidate("first", "Song", 50),
            candidate("second", "SONG", 50),
        ];
        let best = select_best_candidate("song", &candidates).unwrap();
        assert_eq!(best.id.as_str(), "first");
    }

    #[test]
    fn test_non_matching_candidates_ignored_even_if_popular() {
        let candidates = vec![
            candidate("a", "Song (Live)", 100),
            candidate("b", "Song", 10),
        ];
        let best = select_best_candidate("Song", &candidates).unwrap();
        assert_eq!(best.id.as_str(), "b");
    }

    #[test]
    fn test_empty_candidates() {
        assert!(select_best_candidate("Song", &[]).is_none());
    }

    #[test]
    fn test_strip_punctuation() {
        assert_eq!(strip_punctuation("AC/DC"), "ACDC");
        assert_eq!(strip_punctuation("Sigur Rós!"), "Sigur Rós");
        assert_eq!(strip_punctuation("P!nk_x"), "Pnk_x");
    }
}
