/// Track domain type
use super::TrackId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Streaming-provider track, already normalized from the provider's JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Provider track identifier
    pub id: TrackId,

    /// Playable URI handed to the playback transport
    pub uri: String,

    /// Track title
    pub name: String,

    /// Artist names, in provider order
    #[serde(default)]
    pub artists: Vec<String>,

    /// Album name
    pub album: Option<String>,

    /// Track duration in milliseconds
    pub duration_ms: u64,
}

impl Track {
    /// Create a track with minimal metadata
    pub fn new(
        id: impl Into<String>,
        uri: impl Into<String>,
        name: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            id: TrackId::new(id),
            uri: uri.into(),
            name: name.into(),
            artists: Vec::new(),
            album: None,
            duration_ms: duration.as_millis() as u64,
        }
    }

    /// Builder-style artist list
    #[must_use]
    pub fn with_artists(mut self, artists: Vec<String>) -> Self {
        self.artists = artists;
        self
    }

    /// Get the track duration as a Duration
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// "Title - Artist, Artist" for display
    pub fn display_name(&self) -> String {
        if self.artists.is_empty() {
            self.name.clone()
        } else {
            format!("{} - {}", self.name, self.artists.join(", "))
        }
    }
}
