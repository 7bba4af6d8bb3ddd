/// Batting order for a game in progress
use super::PlayerId;
use crate::error::{Result, WalkupError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Ordered lineup plus the index of the player currently at bat
///
/// Invariants: ids are unique, and `current_position < player_ids.len()`
/// whenever the lineup is non-empty (`0` otherwise). Rotation functions in
/// [`crate::rotation`] return new values instead of mutating this one.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawBattingOrder")]
pub struct BattingOrder {
    player_ids: Vec<PlayerId>,
    current_position: usize,
}

#[derive(Deserialize)]
struct RawBattingOrder {
    player_ids: Vec<PlayerId>,
    #[serde(default)]
    current_position: usize,
}

impl TryFrom<RawBattingOrder> for BattingOrder {
    type Error = WalkupError;

    fn try_from(raw: RawBattingOrder) -> Result<Self> {
        Self::with_position(raw.player_ids, raw.current_position)
    }
}

impl BattingOrder {
    /// Lineup starting at the first batter
    pub fn new(player_ids: Vec<PlayerId>) -> Result<Self> {
        Self::with_position(player_ids, 0)
    }

    /// Lineup starting at `current_position`
    pub fn with_position(player_ids: Vec<PlayerId>, current_position: usize) -> Result<Self> {
        let mut seen = HashSet::with_capacity(player_ids.len());
        if let Some(dup) = player_ids.iter().find(|id| !seen.insert(*id)) {
            return Err(WalkupError::validation(format!(
                "player {} appears twice in the batting order",
                dup
            )));
        }

        if player_ids.is_empty() {
            if current_position != 0 {
                return Err(WalkupError::validation(
                    "empty batting order cannot have a current position",
                ));
            }
        } else if current_position >= player_ids.len() {
            return Err(WalkupError::validation(format!(
                "position {} out of range for {} batters",
                current_position,
                player_ids.len()
            )));
        }

        Ok(Self {
            player_ids,
            current_position,
        })
    }

    /// Only for callers that already upheld the invariants
    pub(crate) fn from_parts(player_ids: Vec<PlayerId>, current_position: usize) -> Self {
        debug_assert!(
            (player_ids.is_empty() && current_position == 0)
                || current_position < player_ids.len()
        );
        Self {
            player_ids,
            current_position,
        }
    }

    pub fn player_ids(&self) -> &[PlayerId] {
        &self.player_ids
    }

    pub fn current_position(&self) -> usize {
        self.current_position
    }

    pub fn len(&self) -> usize {
        self.player_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.player_ids.is_empty()
    }

    /// Id of the player at bat
    pub fn current_id(&self) -> Option<&PlayerId> {
        self.player_ids.get(self.current_position)
    }

    pub fn position_of(&self, id: &PlayerId) -> Option<usize> {
        self.player_ids.iter().position(|p| p == id)
    }
}
