/// Game mode: the batting order only exists while a game is running
use super::{BattingOrder, Player, PlayerId};
use crate::rotation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Game mode wrapper around an optional [`BattingOrder`]
///
/// Rotation queries return `None` while no game is active.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    order: Option<BattingOrder>,
    started_at: Option<DateTime<Utc>>,
}

impl GameSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter game mode with the given lineup, replacing any previous game
    pub fn start(&mut self, order: BattingOrder) {
        tracing::info!(batters = order.len(), "Game started");
        self.order = Some(order);
        self.started_at = Some(Utc::now());
    }

    /// Leave game mode, discarding the batting order
    pub fn end(&mut self) -> Option<BattingOrder> {
        self.started_at = None;
        let order = self.order.take();
        if order.is_some() {
            tracing::info!("Game ended");
        }
        order
    }

    pub fn is_active(&self) -> bool {
        self.order.is_some()
    }

    pub fn order(&self) -> Option<&BattingOrder> {
        self.order.as_ref()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn current_batter<'a>(&self, roster: &'a [Player]) -> Option<&'a Player> {
        self.order
            .as_ref()
            .and_then(|order| rotation::current_batter(order, roster))
    }

    pub fn on_deck<'a>(&self, roster: &'a [Player]) -> Option<&'a Player> {
        self.order
            .as_ref()
            .and_then(|order| rotation::on_deck(order, roster))
    }

    pub fn in_the_hole<'a>(&self, roster: &'a [Player]) -> Option<&'a Player> {
        self.order
            .as_ref()
            .and_then(|order| rotation::in_the_hole(order, roster))
    }

    /// Next batter up; no-op outside a game
    pub fn advance(&mut self) {
        self.update(rotation::advance);
    }

    pub fn retreat(&mut self) {
        self.update(rotation::retreat);
    }

    pub fn jump_to(&mut self, id: &PlayerId) {
        self.update(|order| rotation::jump_to(order, id));
    }

    pub fn move_up(&mut self, id: &PlayerId) {
        self.update(|order| rotation::move_up(order, id));
    }

    pub fn move_down(&mut self, id: &PlayerId) {
        self.update(|order| rotation::move_down(order, id));
    }

    pub fn add_player(&mut self, id: PlayerId) {
        self.update(move |order| rotation::add_player(order, id));
    }

    pub fn remove_player(&mut self, id: &PlayerId) {
        self.update(|order| rotation::remove_player(order, id));
    }

    fn update(&mut self, f: impl FnOnce(&BattingOrder) -> BattingOrder) {
        if let Some(next) = self.order.as_ref().map(f) {
            self.order = Some(next);
        }
    }
}
