//! Scripted scrobble service

use async_trait::async_trait;
use musan_analyzer::error::AnalyzerResult;
use musan_analyzer::services::ScrobbleApi;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

type Responder = dyn Fn(&str, &HashMap<String, String>) -> AnalyzerResult<Value> + Send + Sync;

/// Answers every call through a closure and records what was asked
pub struct FakeScrobbleApi {
    responder: Box<Responder>,
    calls: Mutex<Vec<(String, HashMap<String, String>)>>,
}

impl FakeScrobbleApi {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str, &HashMap<String, String>) -> AnalyzerResult<Value> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, HashMap<String, String>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: &str) -> usize {
        self.calls().iter().filter(|(m, _)| m == method).count()
    }
}

#[async_trait]
impl ScrobbleApi for FakeScrobbleApi {
    async fn call(&self, method: &str, params: &[(&str, String)]) -> AnalyzerResult<Value> {
        let params: HashMap<String, String> = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        self.calls
            .lock()
            .unwrap()
            .push((method.to_string(), params.clone()));
        (self.responder)(method, &params)
    }
}

/// One ranking page: `entries` are (name, artist, playcount)
pub fn top_page(section: &str, entry_key: &str, entries: &[(&str, &str, u64)], total_pages: u32) -> Value {
    let items: Vec<Value> = entries
        .iter()
        .map(|(name, artist, count)| {
            json!({
                "name": name,
                "playcount": count.to_string(),
                "artist": {"name": artist, "mbid": ""}
            })
        })
        .collect();

    json!({
        section: {
            entry_key: items,
            "@attr": {
                "totalPages": total_pages.to_string(),
                "total": (entries.len() as u32 * total_pages).to_string()
            }
        }
    })
}

/// One recent-tracks page: `entries` are (track, artist, album, uts)
pub fn recent_page(entries: &[(&str, &str, &str, i64)], total_pages: u32) -> Value {
    let items: Vec<Value> = entries
        .iter()
        .map(|(track, artist, album, uts)| {
            json!({
                "name": track,
                "artist": {"#text": artist},
                "album": {"#text": album},
                "date": {"uts": uts.to_string(), "#text": "01 Jan 2024, 12:00"}
            })
        })
        .collect();

    json!({
        "recenttracks": {
            "track": items,
            "@attr": {
                "totalPages": total_pages.to_string(),
                "total": (entries.len() as u32 * total_pages).to_string()
            }
        }
    })
}
