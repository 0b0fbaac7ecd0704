//! Similar-artist recommendations

use crate::models::SimilarArtist;
use std::collections::{HashMap, HashSet};

/// Recommend artists the user has not listened to yet
///
/// Candidate lists are unioned; an artist suggested more than once keeps
/// its best score. Known artists are excluded ignoring case. The result is
/// ordered by score descending, then name, and truncated to `limit`.
pub fn recommend_similar_artists(
    known_artists: &[String],
    candidate_lists: Vec<Vec<SimilarArtist>>,
    limit: usize,
) -> Vec<SimilarArtist> {
    let known: HashSet<String> = known_artists.iter().map(|a| a.to_lowercase()).collect();

    let mut best: HashMap<String, SimilarArtist> = HashMap::new();
    for candidate in candidate_lists.into_iter().flatten() {
        let key = candidate.name.to_lowercase();
        if known.contains(&key) {
            continue;
        }
        match best.get(&key) {
            Some(existing) if existing.score >= candidate.score => {}
            _ => {
                best.insert(key, candidate);
            }
        }
    }

    let mut recommended: Vec<SimilarArtist> = best.into_values().collect();
    recommended.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    recommended.truncate(limit);
    recommended
}

#[cfg(test)]
mod tests {
    use super::*;

    fn similar(name: &str, score: f64) -> SimilarArtist {
        SimilarArtist {
            name: name.to_string(),
            score,
            url: None,
        }
    }

    #[test]
    fn test_known_artists_excluded_and_best_score_kept() {
        let known = vec!["Band".to_string()];
        let lists = vec![
            vec![similar("band", 0.99), similar("Echo", 0.8)],
            vec![similar("Echo", 0.9), similar("Drift", 0.75)],
        ];

        let recommended = recommend_similar_artists(&known, lists, 10);

        let names: Vec<(&str, f64)> = recommended.iter().map(|a| (a.name.as_str(), a.score)).collect();
        assert_eq!(names, vec![("Echo", 0.9), ("Drift", 0.75)]);
    }

    #[test]
    fn test_limit_and_tie_order() {
        let lists = vec![vec![
            similar("Zed", 0.8),
            similar("Alpha", 0.8),
            similar("Mid", 0.85),
        ]];
        let recommended = recommend_similar_artists(&[], lists, 2);
        let names: Vec<&str> = recommended.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Mid", "Alpha"]);
    }
}
