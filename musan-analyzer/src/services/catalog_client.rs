//! Music catalog client
//!
//! Resolves history entities to catalog identifiers and fetches detail records
//! in bulk. Transport lives behind the [`CatalogApi`] trait; the shipped
//! implementation talks to the Spotify Web API using client-credentials auth.
//!
//! Bulk fetches are split into chunks of [`CATALOG_BATCH_LIMIT`], one remote
//! call per chunk, concatenated in input order.

use crate::config::{CatalogClientConfig, USER_AGENT};
use crate::error::{AnalyzerError, AnalyzerResult, ValidationError};
use crate::models::{CatalogCandidate, CatalogDetails, CatalogEntity, EntityKind, Identifier};
use crate::services::entity_matcher::{select_best_candidate, strip_punctuation};
use crate::services::rate_limiter::request_quota;
use async_trait::async_trait;
use governor::DefaultDirectRateLimiter;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

/// Maximum identifiers per bulk detail request
pub const CATALOG_BATCH_LIMIT: usize = 50;

/// Search result count for track and album lookups
pub const SEARCH_LIMIT: u32 = 10;

/// Search result count for artist lookups (names collide more often)
pub const ARTIST_SEARCH_LIMIT: u32 = 50;

/// Tokens are refreshed this long before the advertised expiry
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Raw catalog transport
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Free-text search for entities of `kind`, in relevance order
    async fn search(
        &self,
        kind: EntityKind,
        query: &str,
        limit: u32,
    ) -> AnalyzerResult<Vec<CatalogCandidate>>;

    /// Fetch detail records for at most [`CATALOG_BATCH_LIMIT`] identifiers
    ///
    /// Identifiers the catalog does not know are omitted from the result.
    async fn fetch_batch(
        &self,
        kind: EntityKind,
        ids: &[Identifier],
    ) -> AnalyzerResult<Vec<CatalogEntity>>;
}

/// Catalog lookups built on a [`CatalogApi`]
pub struct CatalogClient {
    api: Arc<dyn CatalogApi>,
}

impl CatalogClient {
    pub fn new(api: Arc<dyn CatalogApi>) -> Self {
        Self { api }
    }

    /// Client backed by the Spotify Web API
    pub fn from_config(config: CatalogClientConfig) -> AnalyzerResult<Self> {
        Ok(Self::new(Arc::new(SpotifyCatalogApi::new(config)?)))
    }

    /// Resolve a track or album by name and artist
    ///
    /// # Returns
    /// `Ok(None)` when no candidate name matches exactly
    pub async fn resolve_identifier(
        &self,
        kind: EntityKind,
        name: &str,
        artist: &str,
    ) -> AnalyzerResult<Option<Identifier>> {
        if kind == EntityKind::Artist {
            return Err(ValidationError::UnknownEntityKind(kind.to_string()).into());
        }

        let query = format!("{}:{} artist:{}", kind.as_str(), name, artist);
        let candidates = self.api.search(kind, &query, SEARCH_LIMIT).await?;

        let found = select_best_candidate(name, &candidates).map(|c| c.id.clone());
        debug!(kind = %kind, name, artist, found = found.is_some(), "Resolved identifier");
        Ok(found)
    }

    /// Resolve an artist by name
    pub async fn resolve_artist_identifier(&self, name: &str) -> AnalyzerResult<Option<Identifier>> {
        let cleaned = strip_punctuation(name);
        let term = if cleaned.trim().is_empty() {
            name
        } else {
            cleaned.as_str()
        };

        let query = format!("artist:{}", term);
        let candidates = self
            .api
            .search(EntityKind::Artist, &query, ARTIST_SEARCH_LIMIT)
            .await?;

        Ok(select_best_candidate(name, &candidates).map(|c| c.id.clone()))
    }

    /// Split identifiers into bulk-request sized chunks
    pub fn detail_chunks(ids: &[Identifier]) -> Vec<Vec<Identifier>> {
        ids.chunks(CATALOG_BATCH_LIMIT).map(<[Identifier]>::to_vec).collect()
    }

    /// Fetch details for one chunk (at most [`CATALOG_BATCH_LIMIT`] ids)
    pub async fn fetch_chunk(
        &self,
        kind: EntityKind,
        ids: &[Identifier],
    ) -> AnalyzerResult<Vec<CatalogEntity>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.api.fetch_batch(kind, ids).await
    }

    /// Fetch details for any number of identifiers, chunk by chunk
    ///
    /// Issues `ceil(ids.len() / 50)` remote calls; the first failing chunk
    /// aborts the whole fetch.
    pub async fn fetch_details(
        &self,
        kind: EntityKind,
        ids: &[Identifier],
    ) -> AnalyzerResult<Vec<CatalogEntity>> {
        let mut entities = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(CATALOG_BATCH_LIMIT) {
            entities.extend(self.fetch_chunk(kind, chunk).await?);
        }
        Ok(entities)
    }
}

// ============================================================================
// Spotify Web API transport
// ============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Option<SearchPage>,
    albums: Option<SearchPage>,
    artists: Option<SearchPage>,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    items: Vec<Option<SearchItem>>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: String,
    name: String,
    #[serde(default)]
    popularity: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct ArtistRef {
    name: String,
}

#[derive(Debug, Deserialize)]
struct AlbumRef {
    name: String,
    #[serde(default)]
    release_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TrackObject {
    id: String,
    name: String,
    #[serde(default)]
    popularity: u8,
    #[serde(default)]
    duration_ms: u64,
    #[serde(default)]
    artists: Vec<ArtistRef>,
    album: AlbumRef,
}

#[derive(Debug, Deserialize)]
struct AlbumObject {
    id: String,
    name: String,
    #[serde(default)]
    popularity: u8,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    artists: Vec<ArtistRef>,
}

#[derive(Debug, Deserialize)]
struct ArtistObject {
    id: String,
    name: String,
    #[serde(default)]
    popularity: u8,
    #[serde(default)]
    genres: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TracksResponse {
    #[serde(default)]
    tracks: Vec<Option<TrackObject>>,
}

#[derive(Debug, Deserialize)]
struct AlbumsResponse {
    #[serde(default)]
    albums: Vec<Option<AlbumObject>>,
}

#[derive(Debug, Deserialize)]
struct ArtistsResponse {
    #[serde(default)]
    artists: Vec<Option<ArtistObject>>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    status: i64,
    #[serde(default)]
    message: String,
}

impl From<TrackObject> for CatalogEntity {
    fn from(track: TrackObject) -> Self {
        CatalogEntity {
            id: Identifier(track.id),
            name: track.name,
            artist: track.artists.into_iter().next().map(|a| a.name),
            popularity: track.popularity,
            details: CatalogDetails::Track {
                album: track.album.name,
                duration_secs: track.duration_ms / 1000,
                release_date: track.album.release_date,
            },
        }
    }
}

impl From<AlbumObject> for CatalogEntity {
    fn from(album: AlbumObject) -> Self {
        CatalogEntity {
            id: Identifier(album.id),
            name: album.name,
            artist: album.artists.into_iter().next().map(|a| a.name),
            popularity: album.popularity,
            details: CatalogDetails::Album {
                release_date: album.release_date,
            },
        }
    }
}

impl From<ArtistObject> for CatalogEntity {
    fn from(artist: ArtistObject) -> Self {
        CatalogEntity {
            id: Identifier(artist.id),
            name: artist.name,
            artist: None,
            popularity: artist.popularity,
            details: CatalogDetails::Artist {
                genres: artist.genres,
            },
        }
    }
}

/// Spotify Web API transport with client-credentials auth
pub struct SpotifyCatalogApi {
    http_client: reqwest::Client,
    config: CatalogClientConfig,
    token: Mutex<Option<AccessToken>>,
    quota: DefaultDirectRateLimiter,
}

impl SpotifyCatalogApi {
    pub fn new(config: CatalogClientConfig) -> AnalyzerResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| AnalyzerError::Transport(e.to_string()))?;

        let quota = request_quota(config.requests_per_second);

        Ok(Self {
            http_client,
            config,
            token: Mutex::new(None),
            quota,
        })
    }

    /// Cached bearer token, refreshed shortly before expiry
    async fn bearer_token(&self) -> AnalyzerResult<String> {
        let mut token = self.token.lock().await;

        if let Some(current) = token.as_ref() {
            if Instant::now() < current.expires_at {
                return Ok(current.value.clone());
            }
        }

        debug!("Requesting catalog access token");
        let response = self
            .http_client
            .post(&self.config.token_url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AnalyzerError::UpstreamApi {
                code: i64::from(status.as_u16()),
                message: format!("token request rejected: {}", body),
            });
        }

        let parsed: TokenResponse = serde_json::from_str(&body)?;
        let lifetime = Duration::from_secs(parsed.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        let value = parsed.access_token;

        *token = Some(AccessToken {
            value: value.clone(),
            expires_at: Instant::now() + lifetime,
        });

        info!("Catalog access token acquired (valid {:?})", lifetime);
        Ok(value)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> AnalyzerResult<T> {
        self.quota.until_ready().await;
        let token = self.bearer_token().await?;

        let url = format!("{}/{}", self.config.api_url.trim_end_matches('/'), path);
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(AnalyzerError::UpstreamApi {
                code: i64::from(status.as_u16()),
                message,
            });
        }

        // Some error payloads arrive with a 2xx status
        if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(&body) {
            return Err(AnalyzerError::UpstreamApi {
                code: envelope.error.status,
                message: envelope.error.message,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl CatalogApi for SpotifyCatalogApi {
    async fn search(
        &self,
        kind: EntityKind,
        query: &str,
        limit: u32,
    ) -> AnalyzerResult<Vec<CatalogCandidate>> {
        let response: SearchResponse = self
            .get_json(
                "search",
                &[
                    ("q", query.to_string()),
                    ("type", kind.as_str().to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        let page = match kind {
            EntityKind::Track => response.tracks,
            EntityKind::Album => response.albums,
            EntityKind::Artist => response.artists,
        };

        Ok(page
            .map(|p| p.items)
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .map(|item| CatalogCandidate {
                id: Identifier(item.id),
                name: item.name,
                popularity: item.popularity.unwrap_or(0),
            })
            .collect())
    }

    async fn fetch_batch(
        &self,
        kind: EntityKind,
        ids: &[Identifier],
    ) -> AnalyzerResult<Vec<CatalogEntity>> {
        let joined = ids
            .iter()
            .map(Identifier::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let query = [("ids", joined)];

        let entities = match kind {
            EntityKind::Track => {
                let response: TracksResponse = self.get_json("tracks", &query).await?;
                response.tracks.into_iter().flatten().map(CatalogEntity::from).collect()
            }
            EntityKind::Album => {
                let response: AlbumsResponse = self.get_json("albums", &query).await?;
                response.albums.into_iter().flatten().map(CatalogEntity::from).collect()
            }
            EntityKind::Artist => {
                let response: ArtistsResponse = self.get_json("artists", &query).await?;
                response.artists.into_iter().flatten().map(CatalogEntity::from).collect()
            }
        };

        Ok(entities)
    }
}
