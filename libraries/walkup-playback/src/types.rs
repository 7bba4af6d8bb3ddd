//! Core types for segment playback

use serde::{Deserialize, Serialize};
use std::time::Duration;
use walkup_core::Track;

/// Playback status
///
/// ```text
/// Idle ──play──▶ Loading ──ok──▶ Playing ──timer──▶ Idle
///                   │               │
///                   └──err──▶ Error └──pause──▶ Paused
///
/// Paused / Error ──stop──▶ Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    /// Nothing playing
    #[default]
    Idle,

    /// Start requested, waiting on the transport
    Loading,

    /// Segment is audible
    Playing,

    /// Manually paused mid-segment
    Paused,

    /// Transport refused to start
    Error,
}

impl PlaybackStatus {
    /// Whether the transport may currently be producing audio
    pub fn is_active(self) -> bool {
        matches!(self, Self::Loading | Self::Playing)
    }
}

/// Read-only view of the playback session
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    pub status: PlaybackStatus,

    /// Track being played (or last paused / failed)
    pub current_track: Option<Track>,

    /// Position within the track
    pub position: Duration,

    /// Segment length, `None` when playing without auto-stop
    pub duration: Option<Duration>,

    /// User-facing failure message while in `Error`
    pub error: Option<String>,
}
