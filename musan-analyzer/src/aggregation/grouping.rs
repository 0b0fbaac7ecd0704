//! Event grouping into ranking tables

use crate::models::{EntityKind, RankingTable, ScrobbleEvent, TopEntityRow};
use std::collections::HashMap;

/// Count events per entity of `kind`
///
/// Grouping ignores case; each row keeps the spelling of its first event.
/// Rows come back sorted by count descending, first-seen order on ties.
pub fn group_events_by_entity(events: &[ScrobbleEvent], kind: EntityKind) -> RankingTable {
    let mut positions: HashMap<(String, Option<String>), usize> = HashMap::new();
    let mut rows: Vec<TopEntityRow> = Vec::new();

    for event in events {
        let key = event.key(kind);
        match positions.get(&key.normalized()) {
            Some(&position) => rows[position].scrobble_count += 1,
            None => {
                positions.insert(key.normalized(), rows.len());
                rows.push(TopEntityRow {
                    name: key.name,
                    artist: key.artist,
                    scrobble_count: 1,
                });
            }
        }
    }

    rows.sort_by(|a, b| b.scrobble_count.cmp(&a.scrobble_count));
    rows
}
