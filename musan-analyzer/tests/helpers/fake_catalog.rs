//! Scripted catalog service

use async_trait::async_trait;
use musan_analyzer::error::{AnalyzerError, AnalyzerResult};
use musan_analyzer::models::{CatalogCandidate, CatalogEntity, EntityKind, Identifier};
use musan_analyzer::services::CatalogApi;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Search hits keyed by query text, details keyed by identifier
#[derive(Default)]
pub struct FakeCatalogApi {
    search_results: HashMap<String, Vec<CatalogCandidate>>,
    failing_queries: HashSet<String>,
    entities: HashMap<String, CatalogEntity>,
    searches: Mutex<Vec<String>>,
    batch_sizes: Mutex<Vec<usize>>,
}

impl FakeCatalogApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, query: &str, hits: &[(&str, &str, u8)]) -> Self {
        let hits = hits
            .iter()
            .map(|(id, name, popularity)| CatalogCandidate {
                id: Identifier::new(*id),
                name: name.to_string(),
                popularity: *popularity,
            })
            .collect();
        self.search_results.insert(query.to_string(), hits);
        self
    }

    pub fn with_failing_search(mut self, query: &str) -> Self {
        self.failing_queries.insert(query.to_string());
        self
    }

    pub fn with_entity(mut self, entity: CatalogEntity) -> Self {
        self.entities.insert(entity.id.as_str().to_string(), entity);
        self
    }

    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogApi for FakeCatalogApi {
    async fn search(
        &self,
        _kind: EntityKind,
        query: &str,
        _limit: u32,
    ) -> AnalyzerResult<Vec<CatalogCandidate>> {
        self.searches.lock().unwrap().push(query.to_string());
        if self.failing_queries.contains(query) {
            return Err(AnalyzerError::Transport("connection reset".to_string()));
        }
        Ok(self.search_results.get(query).cloned().unwrap_or_default())
    }

    async fn fetch_batch(
        &self,
        _kind: EntityKind,
        ids: &[Identifier],
    ) -> AnalyzerResult<Vec<CatalogEntity>> {
        self.batch_sizes.lock().unwrap().push(ids.len());
        Ok(ids
            .iter()
            .filter_map(|id| self.entities.get(id.as_str()).cloned())
            .collect())
    }
}
