/// Player domain type
use super::{PlayerId, SongSegment};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Roster entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Unique player identifier
    pub id: PlayerId,

    /// Display name
    pub name: String,

    /// Walk-up segment, if one has been picked
    pub song: Option<SongSegment>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Player {
    /// Create a new player without a walk-up song
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(PlayerId::generate(), name)
    }

    /// Create a player with a known id
    pub fn with_id(id: PlayerId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            song: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the walk-up segment
    #[must_use]
    pub fn with_song(&self, song: SongSegment) -> Self {
        Self {
            song: Some(song),
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    /// Remove the walk-up segment
    #[must_use]
    pub fn without_song(&self) -> Self {
        Self {
            song: None,
            updated_at: Utc::now(),
            ..self.clone()
        }
    }
}
