//! Item rules: pickup, inventory overflow and drops.

use log::{debug, warn};

use crate::config::game::MAX_INVENTORY;
use crate::game::error::GameError;
use crate::game::events::RoomEvent;
use crate::game::state::Room;
use crate::game::systems::ctf;
use crate::game::types::{Behavior, Item, Position};

/// Pick up the collectible item under the player, if any.
///
/// A virtual player over capacity drops an item right away; a human keeps
/// the extra item until they answer with a drop.
pub fn pick_up_item(room: &mut Room, player_id: &str) -> Vec<RoomEvent> {
    let mut events = Vec::new();
    let Some(position) = room.player(player_id).map(|p| p.position) else {
        return events;
    };
    let collectible = room
        .grid
        .cell(position)
        .and_then(|c| c.item)
        .is_some_and(|item| item.is_collectible());
    if !collectible {
        return events;
    }
    let Some(item) = room.grid.take_item(position) else {
        return events;
    };
    let Some(player) = room.player_mut(player_id) else {
        return events;
    };
    player.add_item(item);
    let overflow = player.inventory.len() > MAX_INVENTORY;
    let behavior = player.behavior();
    let items = player.inventory.clone();
    debug!("[Rules] {} picked up {:?}", player_id, item);
    events.push(RoomEvent::ItemPicked { player_id: player_id.to_string(), item, details: item.details() });

    if item == Item::Flag {
        events.push(ctf::take_flag(room, player_id));
    }

    if overflow {
        room.pending_drop = Some(player_id.to_string());
        match behavior.and_then(|b| choose_drop(b, &items)) {
            Some(dropped) => match drop_item(room, player_id, dropped) {
                Ok(dropped_events) => events.extend(dropped_events),
                Err(e) => warn!("[Rules] Virtual player {} could not drop {:?}: {}", player_id, dropped, e),
            },
            None => events.push(RoomEvent::InventoryFull { player_id: player_id.to_string(), items }),
        }
    }
    events
}

/// Item a virtual player gives up when over capacity: the first one that does
/// not match its behavior, else the oldest. Never the flag.
pub fn choose_drop(behavior: Behavior, inventory: &[Item]) -> Option<Item> {
    let droppable = inventory.iter().copied().filter(|item| *item != Item::Flag);
    let mismatched = droppable.clone().find(|item| match behavior {
        Behavior::Defensive => item.is_offensive(),
        Behavior::Aggressive => !item.is_offensive(),
    });
    mismatched.or_else(|| droppable.clone().next())
}

/// Drop one held item next to the player.
pub fn drop_item(room: &mut Room, player_id: &str, item: Item) -> Result<Vec<RoomEvent>, GameError> {
    let player = room.require_player_mut(player_id)?;
    if !player.remove_item(item) {
        return Err(GameError::ItemNotHeld(player_id.to_string(), item));
    }
    let position = player.position;
    let back_within_capacity = player.inventory.len() <= MAX_INVENTORY;

    let mut events = Vec::new();
    if let Some(placed) = place_item(room, item, position) {
        events.push(RoomEvent::ItemDropped {
            player_id: player_id.to_string(),
            item,
            details: item.details(),
            position: placed,
        });
    }
    if item == Item::Flag {
        events.extend(ctf::release_flag(room, player_id));
    }
    if back_within_capacity && room.pending_drop.as_deref() == Some(player_id) {
        room.pending_drop = None;
    }
    Ok(events)
}

/// Scatter every held item around `around` (defeat, disconnect).
pub fn drop_all_items(room: &mut Room, player_id: &str) -> Vec<RoomEvent> {
    let items = match room.player(player_id) {
        Some(player) => player.inventory.clone(),
        None => return Vec::new(),
    };
    let mut events = Vec::new();
    for item in items {
        match drop_item(room, player_id, item) {
            Ok(dropped) => events.extend(dropped),
            Err(e) => warn!("[Rules] Could not drop {:?} for {}: {}", item, player_id, e),
        }
    }
    events
}

/// Put an item on `origin` if it holds none, else on the nearest free empty tile.
fn place_item(room: &mut Room, item: Item, origin: Position) -> Option<Position> {
    let origin_empty = room.grid.cell(origin).is_some_and(|c| c.item.is_none());
    let target = if origin_empty {
        Some(origin)
    } else {
        room.grid.nearest_free_empty_tile(origin)
    };
    match target.and_then(|pos| room.grid.cell_mut(pos).map(|cell| (pos, cell))) {
        Some((pos, cell)) => {
            cell.item = Some(item);
            Some(pos)
        }
        None => {
            warn!("[Rules] No free tile to drop {:?} near {:?} in room {}", item, origin, room.id);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::fixtures::*;
    use crate::game::types::GameMode;

    fn pos(x: usize, y: usize) -> Position {
        Position::new(x, y)
    }

    fn put(room: &mut Room, at: Position, item: Item) {
        room.grid.cell_mut(at).unwrap().item = Some(item);
    }

    #[test]
    fn test_pickup_applies_buff_and_clears_tile() {
        let mut room = room_with(vec![human("a", 4), human("b", 4)], &[pos(3, 3), pos(6, 6)], GameMode::Classic);
        put(&mut room, pos(3, 3), Item::Sword);
        let events = pick_up_item(&mut room, "a");

        assert!(matches!(events[0], RoomEvent::ItemPicked { item: Item::Sword, .. }));
        assert_eq!(room.player("a").unwrap().stats.attack, 6);
        assert!(room.grid.cell(pos(3, 3)).unwrap().item.is_none());
    }

    #[test]
    fn test_human_overflow_waits_for_choice() {
        let mut room = room_with(vec![human("a", 4), human("b", 4)], &[pos(3, 3), pos(6, 6)], GameMode::Classic);
        room.player_mut("a").unwrap().inventory = vec![Item::Dagger, Item::Poison];
        put(&mut room, pos(3, 3), Item::Revive);

        let events = pick_up_item(&mut room, "a");
        assert!(events.iter().any(|e| matches!(e, RoomEvent::InventoryFull { .. })));
        assert_eq!(room.pending_drop.as_deref(), Some("a"));

        drop_item(&mut room, "a", Item::Dagger).unwrap();
        assert!(room.pending_drop.is_none());
        assert_eq!(room.player("a").unwrap().inventory.len(), 2);
        assert_eq!(room.grid.cell(pos(3, 3)).unwrap().item, Some(Item::Dagger));
    }

    #[test]
    fn test_virtual_overflow_drops_mismatched_item() {
        use crate::game::types::Behavior;
        let mut room = room_with(
            vec![bot("bot", Behavior::Defensive, 4), human("b", 4)],
            &[pos(3, 3), pos(6, 6)],
            GameMode::Classic,
        );
        room.player_mut("bot").unwrap().inventory = vec![Item::Armor, Item::Sword];
        put(&mut room, pos(3, 3), Item::Revive);

        pick_up_item(&mut room, "bot");
        let bot = room.player("bot").unwrap();
        assert_eq!(bot.inventory, vec![Item::Armor, Item::Revive]);
        assert!(room.pending_drop.is_none());
    }

    #[test]
    fn test_choose_drop_never_picks_flag() {
        assert_eq!(choose_drop(Behavior::Aggressive, &[Item::Flag, Item::Sword, Item::Dagger]), Some(Item::Sword));
        assert_eq!(choose_drop(Behavior::Aggressive, &[Item::Flag, Item::Sword, Item::Armor]), Some(Item::Armor));
        assert_eq!(choose_drop(Behavior::Defensive, &[Item::Flag]), None);
    }

    #[test]
    fn test_drop_all_scatters_and_releases_flag() {
        let mut room = room_with(
            vec![human("a", 4), human("b", 4)],
            &[pos(3, 3), pos(6, 6)],
            GameMode::CaptureTheFlag,
        );
        room.grid.take_item(pos(5, 5));
        room.player_mut("a").unwrap().inventory = vec![Item::Flag, Item::Dagger];
        room.flag_holder = Some("a".into());

        let events = drop_all_items(&mut room, "a");
        assert!(events.iter().any(|e| matches!(e, RoomEvent::FlagDropped {})));
        assert!(room.flag_holder.is_none());
        assert!(room.player("a").unwrap().inventory.is_empty());
        assert_eq!(room.grid.item_positions(|i| i == Item::Flag), vec![pos(3, 3)]);
        assert_eq!(room.grid.item_positions(|i| i == Item::Dagger).len(), 1);
    }
}
