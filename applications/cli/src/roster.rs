//! Roster files
//!
//! ```json
//! {
//!   "players": [
//!     { "id": "p1", "name": "Avery",
//!       "song": { "track": { "id": "t1", "uri": "spotify:track:t1", "name": "Walk",
//!                            "duration_ms": 180000 },
//!                 "start_ms": 30000, "duration_ms": 8000 } }
//!   ],
//!   "batting_order": ["p1"]
//! }
//! ```

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use walkup_core::{BattingOrder, Player, PlayerId, SegmentPolicy, SongSegment, Track};

#[derive(Debug, Deserialize, Serialize)]
struct RosterFile {
    players: Vec<RosterPlayer>,
    /// Defaults to the order of `players`
    #[serde(default)]
    batting_order: Vec<PlayerId>,
}

#[derive(Debug, Deserialize, Serialize)]
struct RosterPlayer {
    id: PlayerId,
    name: String,
    #[serde(default)]
    song: Option<RosterSong>,
}

#[derive(Debug, Deserialize, Serialize)]
struct RosterSong {
    track: Track,
    start_ms: u64,
    duration_ms: u64,
}

/// Players plus their batting order
#[derive(Debug, Clone)]
pub struct Roster {
    pub players: Vec<Player>,
    pub batting_order: Vec<PlayerId>,
}

impl Roster {
    /// Read and validate a roster file
    pub fn load(path: &Path, policy: &SegmentPolicy) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let roster = Self::parse(&contents, policy)?;
        debug!(
            path = %path.display(),
            players = roster.players.len(),
            "Roster loaded"
        );
        Ok(roster)
    }

    /// Parse roster JSON, checking every song against `policy`
    pub fn parse(json: &str, policy: &SegmentPolicy) -> Result<Self> {
        let file: RosterFile = serde_json::from_str(json)?;

        let mut seen = HashSet::new();
        let mut players = Vec::with_capacity(file.players.len());
        for entry in file.players {
            if !seen.insert(entry.id.clone()) {
                return Err(CliError::Roster(format!("duplicate player id {}", entry.id)));
            }

            let player = Player::with_id(entry.id, entry.name);
            let player = match entry.song {
                Some(song) => {
                    let segment = SongSegment::new(
                        song.track,
                        Duration::from_millis(song.start_ms),
                        Duration::from_millis(song.duration_ms),
                        policy,
                    )
                    .map_err(|e| CliError::Roster(format!("{}: {}", player.name, e)))?;
                    player.with_song(segment)
                }
                None => player,
            };
            players.push(player);
        }

        let batting_order = if file.batting_order.is_empty() {
            players.iter().map(|p| p.id.clone()).collect()
        } else {
            if let Some(unknown) = file.batting_order.iter().find(|id| !seen.contains(*id)) {
                return Err(CliError::Roster(format!(
                    "batting order names unknown player {}",
                    unknown
                )));
            }
            file.batting_order
        };

        Ok(Self {
            players,
            batting_order,
        })
    }

    /// Batting order with `position` as the current batter
    pub fn order(&self, position: usize) -> Result<BattingOrder> {
        BattingOrder::with_position(self.batting_order.clone(), position)
            .map_err(|e| CliError::Roster(e.to_string()))
    }

    /// Find a player by id, or by case-insensitive name
    pub fn find_player(&self, key: &str) -> Result<&Player> {
        self.players
            .iter()
            .find(|p| p.id.as_str() == key)
            .or_else(|| {
                self.players
                    .iter()
                    .find(|p| p.name.eq_ignore_ascii_case(key))
            })
            .ok_or_else(|| CliError::UnknownPlayer(key.to_string()))
    }
}
