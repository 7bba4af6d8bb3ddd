//! Catalog search and lookup.

use crate::client::RateLimitedClient;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};
use walkup_core::{Result, Track, WalkupError};

/// Largest page the search endpoint serves
pub const MAX_SEARCH_LIMIT: u32 = 50;

// =============================================================================
// Provider payloads
// =============================================================================

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Page,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    items: Vec<ProviderTrack>,
}

#[derive(Debug, Deserialize)]
struct ProviderTrack {
    id: String,
    uri: String,
    name: String,
    duration_ms: u64,
    #[serde(default)]
    artists: Vec<Named>,
    #[serde(default)]
    album: Option<Named>,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

impl From<ProviderTrack> for Track {
    fn from(t: ProviderTrack) -> Self {
        let mut track = Track::new(t.id, t.uri, t.name, Duration::from_millis(t.duration_ms))
            .with_artists(t.artists.into_iter().map(|a| a.name).collect());
        track.album = t.album.map(|a| a.name);
        track
    }
}

// =============================================================================
// Client
// =============================================================================

/// Track search and lookup through the shared request queue.
#[derive(Clone)]
pub struct CatalogClient {
    client: RateLimitedClient,
}

impl CatalogClient {
    pub fn new(client: RateLimitedClient) -> Self {
        Self { client }
    }

    /// Search tracks matching `query`.
    pub async fn search_tracks(&self, query: &str, limit: u32) -> Result<Vec<Track>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(WalkupError::validation("search query cannot be empty"));
        }
        if limit == 0 || limit > MAX_SEARCH_LIMIT {
            return Err(WalkupError::validation(format!(
                "search limit must be within 1..={}, got {}",
                MAX_SEARCH_LIMIT, limit
            )));
        }

        debug!(query, limit, "Searching tracks");
        let limit = limit.to_string();
        let response: SearchResponse = self
            .client
            .get_json(
                "search",
                &[("q", query), ("type", "track"), ("limit", limit.as_str())],
            )
            .await?;

        let tracks: Vec<Track> = response.tracks.items.into_iter().map(Track::from).collect();
        info!(query, results = tracks.len(), "Search complete");
        Ok(tracks)
    }

    /// Fetch one track by provider id.
    pub async fn get_track(&self, id: &str) -> Result<Track> {
        let id = id.trim();
        if id.is_empty() || id.contains('/') {
            return Err(WalkupError::validation(format!("invalid track id {:?}", id)));
        }

        let track: ProviderTrack = self.client.get_json(&format!("tracks/{}", id), &[]).await?;
        Ok(track.into())
    }
}
