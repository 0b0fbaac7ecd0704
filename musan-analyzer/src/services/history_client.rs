//! Scrobble history client
//!
//! Pulls per-entity rankings and raw listening events from the Last.fm REST
//! API. Transport lives behind [`ScrobbleApi`]; this module owns pagination,
//! payload decoding and the upstream error check.
//!
//! Every response body is inspected for a top-level `error` key, which the
//! service uses to flag logical failures (unknown user, bad parameter) even
//! on otherwise well-formed replies. Any failure mid-pagination discards the
//! pages gathered so far.

use crate::config::{HistoryClientConfig, USER_AGENT};
use crate::error::{AnalyzerError, AnalyzerResult, ValidationError};
use crate::models::{EntityKind, RankingTable, ScrobbleEvent, SimilarArtist, TimeWindow, TopEntityRow};
use crate::services::rate_limiter::request_quota;
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use governor::DefaultDirectRateLimiter;
use musan_common::time::{day_bounds, timestamp_to_date};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Rows requested per page
pub const PAGE_SIZE: u32 = 200;

/// Similar artists at or below this score are dropped
pub const SIMILARITY_THRESHOLD: f64 = 0.7;

/// Upstream error code for an unknown user
pub const ERROR_USER_NOT_FOUND: i64 = 6;

/// Raw scrobble service transport
#[async_trait]
pub trait ScrobbleApi: Send + Sync {
    /// Invoke one API method and return the decoded JSON body
    ///
    /// Bodies carrying an upstream `error` key are returned as-is; the
    /// caller performs the error check.
    async fn call(&self, method: &str, params: &[(&str, String)]) -> AnalyzerResult<Value>;
}

// ============================================================================
// Wire types
// ============================================================================

/// Numbers arrive as JSON numbers or as strings depending on the endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Lenient {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Lenient {
    fn as_i64(&self) -> Option<i64> {
        match self {
            Lenient::Int(n) => Some(*n),
            Lenient::Float(f) => Some(*f as i64),
            Lenient::Text(s) => s.trim().parse().ok(),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Lenient::Int(n) => Some(*n as f64),
            Lenient::Float(f) => Some(*f),
            Lenient::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// A single entry is sent as an object rather than a one-element array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(v) => v,
            OneOrMany::One(t) => vec![t],
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct PageAttr {
    #[serde(rename = "totalPages", default)]
    total_pages: Option<Lenient>,
    #[serde(default)]
    total: Option<Lenient>,
}

impl PageAttr {
    fn total_pages(&self) -> u32 {
        self.total_pages
            .as_ref()
            .and_then(Lenient::as_i64)
            .map(|n| n.max(1) as u32)
            .unwrap_or(1)
    }

    fn is_empty(&self) -> bool {
        self.total.as_ref().and_then(Lenient::as_i64) == Some(0)
    }
}

/// `{"name": ..}` in rankings, `{"#text": ..}` in recent tracks
#[derive(Debug, Default, Deserialize)]
struct NameRef {
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "#text", default)]
    text: Option<String>,
}

impl NameRef {
    fn into_name(self) -> Option<String> {
        self.name.or(self.text)
    }
}

#[derive(Debug, Deserialize)]
struct TopEntry {
    name: String,
    playcount: Lenient,
    #[serde(default)]
    artist: Option<NameRef>,
}

#[derive(Debug, Deserialize)]
struct RecentEntry {
    name: String,
    #[serde(default)]
    artist: NameRef,
    #[serde(default)]
    album: NameRef,
    #[serde(default)]
    date: Option<DateRef>,
    #[serde(rename = "@attr", default)]
    attr: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct DateRef {
    uts: Lenient,
}

#[derive(Debug, Deserialize)]
struct SimilarEntry {
    name: String,
    #[serde(rename = "match")]
    score: Lenient,
    #[serde(default)]
    url: Option<String>,
}

/// Fail with `UpstreamApi` if the body carries a top-level `error`
fn check_api_error(body: &Value) -> AnalyzerResult<()> {
    if let Some(code) = body.get("error") {
        let code = code.as_i64().unwrap_or(0);
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        return Err(AnalyzerError::UpstreamApi { code, message });
    }
    Ok(())
}

fn take_field(value: &mut Value, key: &str) -> Option<Value> {
    value.get_mut(key).map(Value::take)
}

/// Split a paged section into its entries and pagination attributes
fn decode_page<T: DeserializeOwned>(
    mut body: Value,
    section: &str,
    entry_key: &str,
) -> AnalyzerResult<(Vec<T>, PageAttr)> {
    let mut section_value = take_field(&mut body, section)
        .ok_or_else(|| AnalyzerError::Transport(format!("response missing '{}'", section)))?;

    let attr = match take_field(&mut section_value, "@attr") {
        Some(v) => serde_json::from_value(v)?,
        None => PageAttr::default(),
    };

    let entries = match take_field(&mut section_value, entry_key) {
        Some(v) => serde_json::from_value::<OneOrMany<T>>(v)?.into_vec(),
        None => Vec::new(),
    };

    Ok((entries, attr))
}

// ============================================================================
// Client
// ============================================================================

/// Scrobble history client
#[derive(Clone)]
pub struct HistoryClient {
    api: Arc<dyn ScrobbleApi>,
}

impl HistoryClient {
    pub fn new(api: Arc<dyn ScrobbleApi>) -> Self {
        Self { api }
    }

    /// Client backed by the Last.fm REST API
    pub fn from_config(config: HistoryClientConfig) -> AnalyzerResult<Self> {
        Ok(Self::new(Arc::new(LastFmApi::new(config)?)))
    }

    async fn call_checked(&self, method: &str, params: &[(&str, String)]) -> AnalyzerResult<Value> {
        let body = self.api.call(method, params).await?;
        check_api_error(&body)?;
        Ok(body)
    }

    /// Per-entity ranking for a predefined window or `overall`
    ///
    /// Pages are requested until the advertised page count is reached.
    ///
    /// # Returns
    /// Rows sorted by scrobble count descending, upstream order kept on ties.
    /// Artist rows carry no artist column.
    pub async fn fetch_top_entities(
        &self,
        user: &str,
        kind: EntityKind,
        window: &TimeWindow,
    ) -> AnalyzerResult<RankingTable> {
        // Custom ranges are served from recent events, not rankings
        let period = window
            .api_period()
            .ok_or_else(|| ValidationError::UnknownPeriod("custom".to_string()))?;

        let method = format!("user.gettop{}", kind.plural());
        let section = format!("top{}", kind.plural());

        let mut rows = Vec::new();
        let mut page = 1u32;

        loop {
            let body = self
                .call_checked(
                    &method,
                    &[
                        ("user", user.to_string()),
                        ("period", period.to_string()),
                        ("limit", PAGE_SIZE.to_string()),
                        ("page", page.to_string()),
                    ],
                )
                .await?;

            let (entries, attr) = decode_page::<TopEntry>(body, &section, kind.as_str())?;
            let total_pages = attr.total_pages();

            debug!(kind = %kind, page, total_pages, entries = entries.len(), "Fetched ranking page");

            rows.extend(entries.into_iter().map(|entry| TopEntityRow {
                name: entry.name,
                artist: if kind.has_artist() {
                    entry.artist.and_then(NameRef::into_name)
                } else {
                    None
                },
                scrobble_count: entry.playcount.as_i64().unwrap_or(0).max(0) as u64,
            }));

            if page >= total_pages {
                break;
            }
            page += 1;
        }

        rows.sort_by(|a, b| b.scrobble_count.cmp(&a.scrobble_count));
        info!(user, kind = %kind, period, rows = rows.len(), "Ranking fetched");
        Ok(rows)
    }

    /// Listening events between two local calendar dates, both inclusive
    pub async fn fetch_events_in_range(
        &self,
        user: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AnalyzerResult<Vec<ScrobbleEvent>> {
        let (from, to) = day_bounds(start, end, &Local)?;
        self.fetch_events_between(user, from, to).await
    }

    /// Listening events with `from <= timestamp <= to` (unix seconds)
    ///
    /// The currently-playing entry has no timestamp and is skipped.
    pub async fn fetch_events_between(
        &self,
        user: &str,
        from: i64,
        to: i64,
    ) -> AnalyzerResult<Vec<ScrobbleEvent>> {
        let mut events = Vec::new();
        let mut page = 1u32;

        loop {
            let body = self
                .call_checked(
                    "user.getrecenttracks",
                    &[
                        ("user", user.to_string()),
                        ("from", from.to_string()),
                        ("to", to.to_string()),
                        ("limit", PAGE_SIZE.to_string()),
                        ("page", page.to_string()),
                    ],
                )
                .await?;

            let (entries, attr) = decode_page::<RecentEntry>(body, "recenttracks", "track")?;
            if attr.is_empty() {
                debug!(user, "No scrobbles in range");
                return Ok(Vec::new());
            }
            let total_pages = attr.total_pages();

            for entry in entries {
                if entry.attr.is_some() {
                    continue;
                }
                let Some(timestamp) = entry.date.as_ref().and_then(|d| d.uts.as_i64()) else {
                    continue;
                };
                events.push(ScrobbleEvent {
                    track: entry.name,
                    artist: entry.artist.into_name().unwrap_or_default(),
                    album: entry.album.into_name().unwrap_or_default(),
                    timestamp,
                });
            }

            if page >= total_pages {
                break;
            }
            page += 1;
        }

        info!(user, events = events.len(), "Recent events fetched");
        Ok(events)
    }

    /// Account registration date (local calendar)
    pub async fn fetch_registration_date(&self, user: &str) -> AnalyzerResult<NaiveDate> {
        let body = self
            .call_checked("user.getinfo", &[("user", user.to_string())])
            .await?;

        let registered = body
            .get("user")
            .and_then(|u| u.get("registered"))
            .ok_or_else(|| AnalyzerError::Transport("response missing 'user.registered'".to_string()))?;

        let unixtime = registered
            .get("unixtime")
            .or_else(|| registered.get("#text"))
            .cloned()
            .map(serde_json::from_value::<Lenient>)
            .transpose()?
            .and_then(|v| v.as_i64())
            .ok_or_else(|| AnalyzerError::Transport("registration time not a number".to_string()))?;

        timestamp_to_date(unixtime, &Local)
            .ok_or_else(|| AnalyzerError::Transport(format!("registration time out of range: {}", unixtime)))
    }

    /// Whether the user account exists
    pub async fn user_exists(&self, user: &str) -> AnalyzerResult<bool> {
        match self
            .call_checked("user.getinfo", &[("user", user.to_string())])
            .await
        {
            Ok(_) => Ok(true),
            Err(AnalyzerError::UpstreamApi { code, .. }) if code == ERROR_USER_NOT_FOUND => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Artists similar to `artist` with a score above [`SIMILARITY_THRESHOLD`]
    pub async fn fetch_similar_artists(&self, artist: &str) -> AnalyzerResult<Vec<SimilarArtist>> {
        let body = self
            .call_checked("artist.getsimilar", &[("artist", artist.to_string())])
            .await?;

        let (entries, _) = decode_page::<SimilarEntry>(body, "similarartists", "artist")?;

        Ok(entries
            .into_iter()
            .filter_map(|entry| {
                let score = entry.score.as_f64()?;
                (score > SIMILARITY_THRESHOLD).then_some(SimilarArtist {
                    name: entry.name,
                    score,
                    url: entry.url,
                })
            })
            .collect())
    }
}

// ============================================================================
// Last.fm REST transport
// ============================================================================

/// Last.fm REST transport
pub struct LastFmApi {
    http_client: reqwest::Client,
    config: HistoryClientConfig,
    quota: DefaultDirectRateLimiter,
}

impl LastFmApi {
    pub fn new(config: HistoryClientConfig) -> AnalyzerResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| AnalyzerError::Transport(e.to_string()))?;

        let quota = request_quota(config.requests_per_second);

        Ok(Self {
            http_client,
            config,
            quota,
        })
    }
}

#[async_trait]
impl ScrobbleApi for LastFmApi {
    async fn call(&self, method: &str, params: &[(&str, String)]) -> AnalyzerResult<Value> {
        self.quota.until_ready().await;

        let mut query: Vec<(&str, &str)> = vec![
            ("method", method),
            ("api_key", self.config.api_key.as_str()),
            ("format", "json"),
        ];
        query.extend(params.iter().map(|(k, v)| (*k, v.as_str())));

        debug!(method, "Querying scrobble API");

        let response = self
            .http_client
            .get(&self.config.base_url)
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        match serde_json::from_str::<Value>(&text) {
            Ok(body) => Ok(body),
            Err(e) if status.is_success() => Err(e.into()),
            Err(_) => {
                warn!(method, status = status.as_u16(), "Scrobble API returned non-JSON error");
                Err(AnalyzerError::Transport(format!("HTTP {}", status.as_u16())))
            }
        }
    }
}
