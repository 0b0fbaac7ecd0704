//! Analysis pipeline
//!
//! Three entry points share one report builder:
//! - [`AnalysisPipeline::analyze_predefined`]: ranking endpoints for a fixed period
//! - [`AnalysisPipeline::analyze_custom`]: raw events for a calendar range
//! - [`AnalysisPipeline::analyze_imported`]: exported streaming-history files
//!
//! # Phases
//! 1. Validation (local checks first, then the account checks)
//! 2. History fetch (any failure aborts the request)
//! 3. Enrichment through the bounded fan-out (per-entity failures isolated)
//! 4. Aggregation into tables, summary, chart series and recommendations
//!
//! Enrichment of the three entity kinds runs concurrently; all lookups share
//! one semaphore and one batch pacer.

use crate::aggregation::{
    bucket_by_time_window, compute_summary_stats, cumulative_series, day_count,
    group_events_by_entity, merge_rows, recommend_similar_artists,
};
use crate::config::AnalyzerConfig;
use crate::error::{AnalyzerError, AnalyzerResult, ValidationError};
use crate::models::{
    AnalysisReport, CatalogEntity, ChartSeries, EntityKey, EntityKind, Identifier, MergedRow,
    RankingTable, ScrobbleEvent, SimilarArtist, TimeWindow, TopEntityRow,
};
use crate::services::entity_matcher::EntityMatcher;
use crate::services::history_client::ERROR_USER_NOT_FOUND;
use crate::services::history_import::import_history_files;
use crate::services::validation::{
    parse_window_token, require_non_empty, validate_custom_range,
    validate_start_after_registration,
};
use crate::services::{BoundedFanOut, CatalogClient, HistoryClient};
use chrono::{Local, NaiveDate};
use musan_common::config::{missing_credential_message, ENV_LASTFM_API_KEY};
use musan_common::time::{timestamp_to_date, today_local};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Similar-artist suggestions returned per report
pub const SIMILAR_ARTISTS_LIMIT: usize = 10;

/// Pipeline limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Top rows per kind sent through catalog enrichment
    pub enrich_limit: usize,
    /// Top artists whose similar artists are collected
    pub similar_artists_source_limit: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enrich_limit: 50,
            similar_artists_source_limit: 10,
        }
    }
}

impl From<&AnalyzerConfig> for PipelineConfig {
    fn from(config: &AnalyzerConfig) -> Self {
        Self {
            enrich_limit: config.enrich_limit,
            similar_artists_source_limit: config.similar_artists_source_limit,
        }
    }
}

/// Analysis pipeline orchestrator
pub struct AnalysisPipeline {
    history: Option<HistoryClient>,
    catalog: Option<Arc<CatalogClient>>,
    fan_out: BoundedFanOut,
    config: PipelineConfig,
    today: Option<NaiveDate>,
}

impl AnalysisPipeline {
    pub fn new(
        history: Option<HistoryClient>,
        catalog: Option<Arc<CatalogClient>>,
        fan_out: BoundedFanOut,
        config: PipelineConfig,
    ) -> Self {
        Self {
            history,
            catalog,
            fan_out,
            config,
            today: None,
        }
    }

    /// Build HTTP-backed clients from resolved configuration
    pub fn from_config(config: &AnalyzerConfig) -> AnalyzerResult<Self> {
        let history = config
            .history
            .clone()
            .map(HistoryClient::from_config)
            .transpose()?;
        let catalog = config
            .catalog
            .clone()
            .map(CatalogClient::from_config)
            .transpose()?
            .map(Arc::new);

        Ok(Self::new(
            history,
            catalog,
            BoundedFanOut::new(&config.fan_out),
            PipelineConfig::from(config),
        ))
    }

    /// Pin "today" instead of reading the local clock
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(today_local)
    }

    fn history(&self) -> AnalyzerResult<&HistoryClient> {
        self.history.as_ref().ok_or_else(|| {
            AnalyzerError::Config(missing_credential_message(ENV_LASTFM_API_KEY, "lastfm_api_key"))
        })
    }

    async fn ensure_user_exists(&self, history: &HistoryClient, user: &str) -> AnalyzerResult<()> {
        if history.user_exists(user).await? {
            Ok(())
        } else {
            Err(ValidationError::UnknownUser(user.to_string()).into())
        }
    }

    /// Registration date, doubling as the account existence check
    async fn registration_date(&self, history: &HistoryClient, user: &str) -> AnalyzerResult<NaiveDate> {
        match history.fetch_registration_date(user).await {
            Err(AnalyzerError::UpstreamApi { code, .. }) if code == ERROR_USER_NOT_FOUND => {
                Err(ValidationError::UnknownUser(user.to_string()).into())
            }
            other => other,
        }
    }

    /// Report for a predefined period (`7day` … `12month`) or `overall`
    pub async fn analyze_predefined(&self, user: &str, period: &str) -> AnalyzerResult<AnalysisReport> {
        let user = require_non_empty("username", user)?;
        let window = parse_window_token(period)?;
        let history = self.history()?;

        let registration = match window {
            TimeWindow::Overall => Some(self.registration_date(history, user).await?),
            _ => {
                self.ensure_user_exists(history, user).await?;
                None
            }
        };

        let mut rankings = BTreeMap::new();
        for kind in EntityKind::ALL {
            let rows = history.fetch_top_entities(user, kind, &window).await?;
            rankings.insert(kind, rows);
        }

        if rankings.values().all(Vec::is_empty) {
            return Err(ValidationError::NoData.into());
        }

        let days = day_count(&window, registration, self.today());

        info!(user, period, "Building report for predefined window");
        self.build_report(window, rankings, days, None).await
    }

    /// Report for an inclusive calendar range
    pub async fn analyze_custom(
        &self,
        user: &str,
        start: &str,
        end: &str,
    ) -> AnalyzerResult<AnalysisReport> {
        let user = require_non_empty("username", user)?;
        let (start, end) = validate_custom_range(start, end, self.today())?;
        let history = self.history()?;

        let registered = self.registration_date(history, user).await?;
        validate_start_after_registration(start, registered)?;

        let events = history.fetch_events_in_range(user, start, end).await?;

        info!(user, %start, %end, events = events.len(), "Building report for custom range");
        self.report_from_events(start, end, &events).await
    }

    /// Report over exported streaming-history files
    ///
    /// The window spans the first to the last listen date found.
    pub async fn analyze_imported(&self, paths: &[PathBuf]) -> AnalyzerResult<AnalysisReport> {
        let listens = import_history_files(paths)?;
        let events: Vec<ScrobbleEvent> = listens.into_iter().map(|l| l.event).collect();

        let dates: Vec<NaiveDate> = events
            .iter()
            .filter_map(|e| timestamp_to_date(e.timestamp, &Local))
            .collect();
        let (Some(start), Some(end)) = (dates.iter().min().copied(), dates.iter().max().copied())
        else {
            return Err(ValidationError::NoData.into());
        };

        info!(files = paths.len(), events = events.len(), %start, %end, "Building report for imported history");
        self.report_from_events(start, end, &events).await
    }

    async fn report_from_events(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        events: &[ScrobbleEvent],
    ) -> AnalyzerResult<AnalysisReport> {
        if events.is_empty() {
            return Err(ValidationError::NoData.into());
        }

        let window = TimeWindow::Custom { start, end };

        let rankings: BTreeMap<EntityKind, RankingTable> = EntityKind::ALL
            .into_iter()
            .map(|kind| (kind, group_events_by_entity(events, kind)))
            .collect();

        let (granularity, bucketed) = bucket_by_time_window(events, start, end, &Local);
        let series = EntityKind::ALL
            .into_iter()
            .map(|kind| (kind, cumulative_series(&bucketed, kind)))
            .collect();
        let chart = ChartSeries { granularity, series };

        let days = day_count(&window, None, self.today());
        self.build_report(window, rankings, days, Some(chart)).await
    }

    async fn build_report(
        &self,
        window: TimeWindow,
        mut rankings: BTreeMap<EntityKind, RankingTable>,
        days: Option<i64>,
        chart: Option<ChartSeries>,
    ) -> AnalyzerResult<AnalysisReport> {
        let mut take = |kind: EntityKind| rankings.remove(&kind).unwrap_or_default();
        let (tracks, albums, artists) = (
            take(EntityKind::Track),
            take(EntityKind::Album),
            take(EntityKind::Artist),
        );

        let (tracks, albums, artists) = tokio::join!(
            self.enrich(EntityKind::Track, tracks),
            self.enrich(EntityKind::Album, albums),
            self.enrich(EntityKind::Artist, artists),
        );

        let mut tables = BTreeMap::new();
        let mut not_found = Vec::new();
        for (kind, (rows, missing)) in [
            (EntityKind::Track, tracks),
            (EntityKind::Album, albums),
            (EntityKind::Artist, artists),
        ] {
            tables.insert(kind, rows);
            not_found.extend(missing);
        }

        let summary = compute_summary_stats(&tables, days);
        let (similar_artists, similar_artists_failed) = self
            .similar_artists(tables.get(&EntityKind::Artist).map(Vec::as_slice).unwrap_or(&[]))
            .await;

        Ok(AnalysisReport {
            window,
            tables,
            not_found,
            summary,
            chart,
            similar_artists,
            similar_artists_failed,
        })
    }

    /// Join the top `enrich_limit` rows with catalog records
    ///
    /// # Returns
    /// All rows (tail rows without catalog data) and the keys that were sent
    /// for enrichment but could not be resolved or joined
    async fn enrich(&self, kind: EntityKind, rows: RankingTable) -> (Vec<MergedRow>, Vec<EntityKey>) {
        let Some(catalog) = &self.catalog else {
            return (rows.into_iter().map(MergedRow::unmatched).collect(), Vec::new());
        };

        let mut head = rows;
        let tail = head.split_off(head.len().min(self.config.enrich_limit));

        let matcher = EntityMatcher::new(Arc::clone(catalog));
        let keys: Vec<EntityKey> = head.iter().map(TopEntityRow::key).collect();
        let resolved = self
            .fan_out
            .run(keys, |key| {
                let matcher = matcher.clone();
                async move { matcher.resolve(kind, &key).await }
            })
            .await;

        let mut not_found = resolved.not_found;
        let mut seen = HashSet::new();
        let ids: Vec<Identifier> = resolved
            .resolved
            .into_iter()
            .map(|(_, id)| id)
            .filter(|id| seen.insert(id.clone()))
            .collect();

        let details = self
            .fan_out
            .run(CatalogClient::detail_chunks(&ids), |chunk| {
                let catalog = Arc::clone(catalog);
                async move { catalog.fetch_chunk(kind, &chunk).await.map(Some) }
            })
            .await;

        if !details.not_found.is_empty() {
            warn!(
                kind = %kind,
                failed_chunks = details.not_found.len(),
                "Some catalog detail requests failed"
            );
        }

        let entities: Vec<CatalogEntity> = details.values().into_iter().flatten().collect();
        let merged = merge_rows(kind, head, &entities);

        for key in merged.unmatched {
            if !not_found.contains(&key) {
                not_found.push(key);
            }
        }

        let mut rows = merged.rows;
        rows.extend(tail.into_iter().map(MergedRow::unmatched));
        (rows, not_found)
    }

    /// Recommendations plus the source artists whose lookup failed
    async fn similar_artists(&self, artists: &[MergedRow]) -> (Vec<SimilarArtist>, Vec<String>) {
        let Some(history) = &self.history else {
            return (Vec::new(), Vec::new());
        };

        let sources: Vec<String> = artists
            .iter()
            .take(self.config.similar_artists_source_limit)
            .map(|r| r.row.name.clone())
            .collect();
        if sources.is_empty() {
            return (Vec::new(), Vec::new());
        }

        let outcome = self
            .fan_out
            .run(sources, |artist| {
                let history = history.clone();
                async move { history.fetch_similar_artists(&artist).await.map(Some) }
            })
            .await;
        let failed = outcome.not_found.clone();

        let known: Vec<String> = artists.iter().map(|r| r.row.name.clone()).collect();
        let recommended = recommend_similar_artists(&known, outcome.values(), SIMILAR_ARTISTS_LIMIT);
        (recommended, failed)
    }
}
