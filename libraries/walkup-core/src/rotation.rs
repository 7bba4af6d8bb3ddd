//! Batting rotation
//!
//! Pure functions over a [`BattingOrder`] and the live roster. Nothing here
//! mutates its inputs, so any UI event may call these without locking.
//!
//! ```text
//! player_ids:  [P1, P2, P3]      current_position = 2
//!                          ^
//! current     = P3
//! on deck     = P1   (offset 1, wraps)
//! in the hole = P2   (offset 2, wraps)
//! ```

use crate::types::{BattingOrder, Player, PlayerId};

/// Player currently at bat
///
/// `None` for an empty lineup or when the id is not on the roster.
pub fn current_batter<'a>(order: &BattingOrder, roster: &'a [Player]) -> Option<&'a Player> {
    batter_at_offset(order, roster, 0)
}

/// Player `offset` places after the current batter
///
/// Wraps around the end of the lineup, but only as far as it stays
/// meaningful: an offset that reaches past the lineup is `None`, except
/// whole laps, which land back on the current batter.
pub fn batter_at_offset<'a>(
    order: &BattingOrder,
    roster: &'a [Player],
    offset: usize,
) -> Option<&'a Player> {
    let len = order.len();
    if len == 0 {
        return None;
    }
    if offset >= len && offset % len != 0 {
        return None;
    }

    let index = (order.current_position() + offset % len) % len;
    let id = &order.player_ids()[index];
    roster.iter().find(|p| &p.id == id)
}

/// Next batter; needs at least two players
pub fn on_deck<'a>(order: &BattingOrder, roster: &'a [Player]) -> Option<&'a Player> {
    if order.len() < 2 {
        return None;
    }
    batter_at_offset(order, roster, 1)
}

/// Batter after next; needs at least three players
pub fn in_the_hole<'a>(order: &BattingOrder, roster: &'a [Player]) -> Option<&'a Player> {
    if order.len() < 3 {
        return None;
    }
    batter_at_offset(order, roster, 2)
}

/// Move to the next batter, wrapping to the top of the order
pub fn advance(order: &BattingOrder) -> BattingOrder {
    if order.is_empty() {
        return order.clone();
    }
    let next = (order.current_position() + 1) % order.len();
    BattingOrder::from_parts(order.player_ids().to_vec(), next)
}

/// Step back to the previous batter (undo an accidental advance)
pub fn retreat(order: &BattingOrder) -> BattingOrder {
    if order.is_empty() {
        return order.clone();
    }
    let len = order.len();
    let prev = (order.current_position() + len - 1) % len;
    BattingOrder::from_parts(order.player_ids().to_vec(), prev)
}

/// Make `id` the current batter; unchanged if `id` is not in the lineup
pub fn jump_to(order: &BattingOrder, id: &PlayerId) -> BattingOrder {
    match order.position_of(id) {
        Some(position) => BattingOrder::from_parts(order.player_ids().to_vec(), position),
        None => order.clone(),
    }
}

/// Move the batter at `from` to index `to`
///
/// Out-of-range indices leave the order unchanged. The current position
/// keeps pointing at the same player.
pub fn move_player(order: &BattingOrder, from: usize, to: usize) -> BattingOrder {
    let len = order.len();
    if from >= len || to >= len || from == to {
        return order.clone();
    }

    let mut ids = order.player_ids().to_vec();
    let moved = ids.remove(from);
    ids.insert(to, moved);
    retarget(order, ids)
}

/// Swap a player with the one batting before them
pub fn move_up(order: &BattingOrder, id: &PlayerId) -> BattingOrder {
    match order.position_of(id) {
        Some(index) if index > 0 => move_player(order, index, index - 1),
        _ => order.clone(),
    }
}

/// Swap a player with the one batting after them
pub fn move_down(order: &BattingOrder, id: &PlayerId) -> BattingOrder {
    match order.position_of(id) {
        Some(index) if index + 1 < order.len() => move_player(order, index, index + 1),
        _ => order.clone(),
    }
}

/// Append a player to the end of the order; ignored if already present
pub fn add_player(order: &BattingOrder, id: PlayerId) -> BattingOrder {
    insert_player(order, order.len(), id)
}

/// Insert a player at `index` (clamped to the end); ignored if already present
pub fn insert_player(order: &BattingOrder, index: usize, id: PlayerId) -> BattingOrder {
    if order.position_of(&id).is_some() {
        return order.clone();
    }

    let mut ids = order.player_ids().to_vec();
    ids.insert(index.min(ids.len()), id);
    retarget(order, ids)
}

/// Remove a player from the order
///
/// Removing someone ahead of the current batter shifts the position so the
/// same player stays up. Removing the current batter leaves the position on
/// the same slot, clamped into range.
pub fn remove_player(order: &BattingOrder, id: &PlayerId) -> BattingOrder {
    let Some(index) = order.position_of(id) else {
        return order.clone();
    };

    let mut ids = order.player_ids().to_vec();
    ids.remove(index);
    retarget(order, ids)
}

/// Rebuild an order from edited ids, following the current batter if they
/// survived the edit and clamping the old index otherwise.
fn retarget(order: &BattingOrder, ids: Vec<PlayerId>) -> BattingOrder {
    if ids.is_empty() {
        return BattingOrder::from_parts(ids, 0);
    }

    let position = order
        .current_id()
        .and_then(|current| ids.iter().position(|p| p == current))
        .unwrap_or_else(|| order.current_position().min(ids.len() - 1));

    BattingOrder::from_parts(ids, position)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(names: &[&str]) -> Vec<Player> {
        names
            .iter()
            .map(|n| Player::with_id(PlayerId::new(*n), *n))
            .collect()
    }

    fn lineup(names: &[&str], position: usize) -> BattingOrder {
        BattingOrder::with_position(names.iter().map(|n| PlayerId::new(*n)).collect(), position)
            .unwrap()
    }

    fn name(player: Option<&Player>) -> Option<&str> {
        player.map(|p| p.name.as_str())
    }

    fn names(order: &BattingOrder) -> Vec<&str> {
        order.player_ids().iter().map(PlayerId::as_str).collect()
    }

    #[test]
    fn three_player_rotation_wraps() {
        let roster = roster(&["P1", "P2", "P3"]);
        let order = lineup(&["P1", "P2", "P3"], 2);

        assert_eq!(name(current_batter(&order, &roster)), Some("P3"));
        assert_eq!(name(on_deck(&order, &roster)), Some("P1"));
        assert_eq!(name(in_the_hole(&order, &roster)), Some("P2"));

        let next = advance(&order);
        assert_eq!(next.current_position(), 0);
        assert_eq!(name(current_batter(&next, &roster)), Some("P1"));

        // Input untouched
        assert_eq!(order.current_position(), 2);
    }

    #[test]
    fn short_lineups_have_no_on_deck_or_hole() {
        let roster = roster(&["P1", "P2"]);

        let single = lineup(&["P1"], 0);
        assert_eq!(name(current_batter(&single, &roster)), Some("P1"));
        assert!(on_deck(&single, &roster).is_none());
        assert!(in_the_hole(&single, &roster).is_none());

        let pair = lineup(&["P1", "P2"], 1);
        assert_eq!(name(on_deck(&pair, &roster)), Some("P1"));
        assert!(in_the_hole(&pair, &roster).is_none());
    }

    #[test]
    fn partial_wrap_past_lineup_is_none() {
        let roster = roster(&["P1", "P2"]);
        let pair = lineup(&["P1", "P2"], 0);

        assert!(batter_at_offset(&pair, &roster, 3).is_none());
        assert_eq!(name(batter_at_offset(&pair, &roster, 2)), Some("P1"));
        assert_eq!(name(batter_at_offset(&pair, &roster, 4)), Some("P1"));
    }

    #[test]
    fn empty_order_is_total() {
        let roster = roster(&["P1"]);
        let empty = BattingOrder::default();

        assert!(current_batter(&empty, &roster).is_none());
        assert!(batter_at_offset(&empty, &roster, 5).is_none());
        assert_eq!(advance(&empty), empty);
        assert_eq!(retreat(&empty), empty);
        assert_eq!(remove_player(&empty, &PlayerId::new("P1")), empty);
    }

    #[test]
    fn unknown_roster_id_yields_none() {
        let roster = roster(&["P1"]);
        let order = lineup(&["ghost", "P1"], 0);
        assert!(current_batter(&order, &roster).is_none());
        assert_eq!(name(on_deck(&order, &roster)), Some("P1"));
    }

    #[test]
    fn retreat_wraps_backwards() {
        let order = lineup(&["P1", "P2", "P3"], 0);
        assert_eq!(retreat(&order).current_position(), 2);
        assert_eq!(advance(&retreat(&order)), order);
    }

    #[test]
    fn jump_to_selects_batter() {
        let order = lineup(&["P1", "P2", "P3"], 0);
        assert_eq!(jump_to(&order, &PlayerId::new("P3")).current_position(), 2);
        assert_eq!(jump_to(&order, &PlayerId::new("nobody")), order);
    }

    #[test]
    fn moving_players_follows_current_batter() {
        // P2 is up
        let order = lineup(&["P1", "P2", "P3", "P4"], 1);

        let moved = move_down(&order, &PlayerId::new("P1"));
        assert_eq!(names(&moved), ["P2", "P1", "P3", "P4"]);
        assert_eq!(moved.current_id(), Some(&PlayerId::new("P2")));

        let moved = move_player(&order, 1, 3);
        assert_eq!(names(&moved), ["P1", "P3", "P4", "P2"]);
        assert_eq!(moved.current_position(), 3);

        let moved = move_up(&order, &PlayerId::new("P4"));
        assert_eq!(names(&moved), ["P1", "P2", "P4", "P3"]);
        assert_eq!(moved.current_position(), 1);
    }

    #[test]
    fn moves_at_the_edges_are_noops() {
        let order = lineup(&["P1", "P2"], 0);
        assert_eq!(move_up(&order, &PlayerId::new("P1")), order);
        assert_eq!(move_down(&order, &PlayerId::new("P2")), order);
        assert_eq!(move_player(&order, 0, 9), order);
    }

    #[test]
    fn adding_players() {
        let order = lineup(&["P1", "P2"], 1);

        let added = add_player(&order, PlayerId::new("P3"));
        assert_eq!(names(&added), ["P1", "P2", "P3"]);
        assert_eq!(added.current_position(), 1);

        // Duplicate ignored
        assert_eq!(add_player(&added, PlayerId::new("P1")), added);

        // Inserting ahead of the current batter shifts the position
        let inserted = insert_player(&order, 0, PlayerId::new("P0"));
        assert_eq!(names(&inserted), ["P0", "P1", "P2"]);
        assert_eq!(inserted.current_id(), Some(&PlayerId::new("P2")));
    }

    #[test]
    fn removing_players() {
        let order = lineup(&["P1", "P2", "P3"], 1);

        // Before the current batter: same player stays up
        let removed = remove_player(&order, &PlayerId::new("P1"));
        assert_eq!(names(&removed), ["P2", "P3"]);
        assert_eq!(removed.current_id(), Some(&PlayerId::new("P2")));

        // The current batter: next player slides into the slot
        let removed = remove_player(&order, &PlayerId::new("P2"));
        assert_eq!(removed.current_id(), Some(&PlayerId::new("P3")));

        // Current batter at the end: clamps into range
        let last = lineup(&["P1", "P2", "P3"], 2);
        let removed = remove_player(&last, &PlayerId::new("P3"));
        assert_eq!(removed.current_position(), 1);

        // Last player gone
        let single = lineup(&["P1"], 0);
        let removed = remove_player(&single, &PlayerId::new("P1"));
        assert!(removed.is_empty());
        assert_eq!(removed.current_position(), 0);
    }
}
