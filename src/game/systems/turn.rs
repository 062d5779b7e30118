//! Turn rotation and room-level actions.
//!
//! The room moves through `WaitingForTurn -> ActingPlayerTurn -> (InCombat) ->
//! TurnEnding -> ActingPlayerTurn` and ends in `RoomClosed`. `end_turn` only
//! runs from `ActingPlayerTurn`, so a turn can never be ended twice.

use log::{debug, info};

use crate::game::error::GameError;
use crate::game::events::RoomEvent;
use crate::game::grid::Grid;
use crate::game::state::{Room, TurnPhase};
use crate::game::systems::{combat, pathfinding, rules};
use crate::game::types::{Item, Player, PlayerId, Position, Terrain};

/// Announce the board and hand the first turn out.
pub fn start_game(room: &mut Room) -> Vec<RoomEvent> {
    if room.phase != TurnPhase::WaitingForTurn {
        return Vec::new();
    }
    let mut events = vec![RoomEvent::GameStarted {
        players: room.players.clone(),
        grid: room.grid.clone(),
        teams: room.teams.clone(),
    }];
    match room.players.first().map(|p| p.id.clone()) {
        Some(first) if has_eligible_players(room) => events.extend(begin_turn(room, &first)),
        _ => events.extend(close_room(room)),
    }
    events
}

/// Give the turn to `player_id`: full speed, fresh actions.
pub fn begin_turn(room: &mut Room, player_id: &str) -> Vec<RoomEvent> {
    let Some(player) = room.player_mut(player_id) else {
        return Vec::new();
    };
    player.begin_turn();
    room.active_player = Some(player_id.to_string());
    room.phase = TurnPhase::ActingPlayerTurn;
    debug!("[Turn] Room {} turn {} goes to {}", room.id, room.stats.turns_played, player_id);
    vec![RoomEvent::TurnUpdate { player_id: player_id.to_string(), turn: room.stats.turns_played }]
}

/// End the active player's turn and pass it on.
///
/// Ignored unless a player is acting and no combat is running. An unanswered
/// inventory overflow is settled by dropping the newest item.
pub fn end_turn(room: &mut Room) -> Vec<RoomEvent> {
    if room.is_over() || room.phase != TurnPhase::ActingPlayerTurn {
        return Vec::new();
    }
    room.phase = TurnPhase::TurnEnding;

    let mut events = Vec::new();
    if let Some(pending) = room.pending_drop.clone() {
        let newest = room
            .player(&pending)
            .and_then(|p| p.inventory.iter().rev().find(|i| **i != Item::Flag).copied());
        if let Some(item) = newest {
            events.extend(rules::drop_item(room, &pending, item).unwrap_or_default());
        }
        room.pending_drop = None;
    }
    events.extend(advance_turn(room));
    events
}

/// End the turn whatever state the room is in: used when a turn must not
/// stall (virtual player fault, timer expiry during a broken state).
pub fn force_end_turn(room: &mut Room) -> Vec<RoomEvent> {
    let mut events = Vec::new();
    if room.combat.is_some() {
        if let Some(combat) = combat::end_combat(room, None, None) {
            events.push(RoomEvent::CombatEnded { winner: None, loser: None });
            debug!("[Turn] Force-closed combat {} vs {}", combat.attacker, combat.defender);
        }
    }
    if matches!(room.phase, TurnPhase::InCombat | TurnPhase::TurnEnding) {
        room.phase = TurnPhase::ActingPlayerTurn;
    }
    events.extend(end_turn(room));
    events
}

fn advance_turn(room: &mut Room) -> Vec<RoomEvent> {
    if !has_eligible_players(room) {
        return close_room(room);
    }
    let Some(next) = next_player_id(room) else {
        return close_room(room);
    };
    room.stats.turns_played += 1;
    begin_turn(room, &next)
}

/// Player after the active one in the fixed rotation.
pub fn next_player_id(room: &Room) -> Option<PlayerId> {
    if room.players.is_empty() {
        return None;
    }
    let next_index = room
        .active_player
        .as_deref()
        .and_then(|id| room.players.iter().position(|p| p.id == id))
        .map_or(0, |idx| (idx + 1) % room.players.len());
    Some(room.players[next_index].id.clone())
}

/// A room keeps running while at least one human is in it.
pub fn has_eligible_players(room: &Room) -> bool {
    room.has_humans()
}

pub fn close_room(room: &mut Room) -> Vec<RoomEvent> {
    if room.phase == TurnPhase::RoomClosed && room.active_player.is_none() {
        return Vec::new();
    }
    info!("[Turn] Closing room {}", room.id);
    room.phase = TurnPhase::RoomClosed;
    room.active_player = None;
    vec![RoomEvent::RoomClosed]
}

/// Whether the player still has a use for their action: an adjacent door or
/// an adjacent opponent.
fn has_usable_action(room: &Room, player: &Player) -> bool {
    if player.actions_left == 0 {
        return false;
    }
    player.position.neighbors(room.grid.size()).into_iter().any(|n| {
        let Some(cell) = room.grid.cell(n) else {
            return false;
        };
        match &cell.occupant {
            Some(other) => !room.same_team(&player.id, other),
            None => cell.terrain.is_door(),
        }
    })
}

/// Whether the active player's turn should end on its own: nothing left to
/// act on and nowhere left to go. Standing next to ice keeps the turn alive
/// since ice costs no movement.
pub fn should_end_turn(room: &Room) -> bool {
    if room.is_over() || room.phase != TurnPhase::ActingPlayerTurn || room.pending_drop.is_some() {
        return false;
    }
    let Some(player) = room.active() else {
        return false;
    };
    if has_usable_action(room, player) {
        return false;
    }
    pathfinding::explore(&room.grid, player.position, Some(player.stats.speed), None)
        .reachable
        .is_empty()
}

/// Open or close an adjacent door. Costs the turn's action.
pub fn toggle_door(room: &mut Room, player_id: &str, position: Position) -> Result<Vec<RoomEvent>, GameError> {
    room.ensure_acting(player_id)?;
    let player = room.require_player(player_id)?;
    if player.actions_left == 0 {
        return Err(GameError::NoActionLeft);
    }
    if !room.grid.in_bounds(position) {
        return Err(GameError::NotADoor(position));
    }
    if !player.position.is_adjacent(&position) {
        return Err(GameError::NotAdjacent(position));
    }

    let cell = room.grid.cell_mut(position).ok_or(GameError::NotADoor(position))?;
    let is_opened = match cell.terrain {
        Terrain::Door => {
            cell.terrain = Terrain::OpenedDoor;
            true
        }
        Terrain::OpenedDoor => {
            if cell.occupant.is_some() || cell.item.is_some() {
                return Err(GameError::DoorBlocked(position));
            }
            cell.terrain = Terrain::Door;
            false
        }
        _ => return Err(GameError::NotADoor(position)),
    };

    room.require_player_mut(player_id)?.actions_left -= 1;
    room.stats.toggled_doors.insert(position);
    debug!("[Turn] {} toggled door {:?} (opened={})", player_id, position, is_opened);
    Ok(vec![RoomEvent::DoorUpdated { position, is_opened, player_id: player_id.to_string() }])
}

/// Host-only switch for fixed combat rolls and teleport moves.
pub fn toggle_debug(room: &mut Room, player_id: &str) -> Result<Vec<RoomEvent>, GameError> {
    if !room.require_player(player_id)?.is_host {
        return Err(GameError::NotHost);
    }
    room.debug_mode = !room.debug_mode;
    info!("[Turn] Debug mode {} in room {}", if room.debug_mode { "on" } else { "off" }, room.id);
    Ok(vec![RoomEvent::DebugModeChanged { enabled: room.debug_mode }])
}

/// Send the authoritative board, after applying an inbound patch if one is given.
pub fn sync_map(room: &mut Room, patch: Option<&Grid>) -> Result<Vec<RoomEvent>, GameError> {
    if let Some(patch) = patch {
        if room.flag_holder.is_some() && !patch.item_positions(|i| i == Item::Flag).is_empty() {
            return Err(GameError::InvalidMap("the flag is already carried".into()));
        }
        room.grid.apply_patch(patch)?;
    }
    Ok(vec![RoomEvent::MapSync { grid: room.grid.clone() }])
}

/// Remove a departing player: settle their combat, drop their items and
/// flag, clear their starting point, and pass the turn if it was theirs.
pub fn handle_disconnect(room: &mut Room, player_id: &str) -> Vec<RoomEvent> {
    let Some(idx) = room.players.iter().position(|p| p.id == player_id) else {
        return Vec::new();
    };
    let mut events = Vec::new();
    let was_active = room.is_active(player_id);
    let next = if was_active { next_player_id(room).filter(|n| n != player_id) } else { None };

    if room.combat.as_ref().is_some_and(|c| c.involves(player_id)) {
        let winner = room.combat.as_ref().and_then(|c| c.opponent_of(player_id).cloned());
        combat::end_combat(room, winner.as_deref(), Some(player_id));
        events.push(RoomEvent::CombatEnded { winner, loser: Some(player_id.to_string()) });
        if room.phase == TurnPhase::InCombat {
            room.phase = TurnPhase::ActingPlayerTurn;
        }
    }

    events.extend(rules::drop_all_items(room, player_id));

    let player = room.players.remove(idx);
    room.grid.set_occupant(player.position, None);
    if room.grid.cell(player.starting_point).and_then(|c| c.item) == Some(Item::StartingPoint) {
        room.grid.take_item(player.starting_point);
    }
    if let Some(teams) = room.teams.as_mut() {
        teams.remove(player_id);
    }
    if room.pending_drop.as_deref() == Some(player_id) {
        room.pending_drop = None;
    }
    info!("[Turn] {} left room {}", player_id, room.id);
    room.disconnected.push(player);

    events.push(RoomEvent::PlayerLeft {
        player_id: player_id.to_string(),
        remaining_players: room.players.iter().map(|p| p.id.clone()).collect(),
    });

    if !has_eligible_players(room) {
        events.extend(close_room(room));
        return events;
    }
    if was_active && !room.is_over() {
        room.phase = TurnPhase::TurnEnding;
        match next {
            Some(next) => {
                room.stats.turns_played += 1;
                events.extend(begin_turn(room, &next));
            }
            None => events.extend(close_room(room)),
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::fixtures::*;
    use crate::game::types::{Behavior, GameMode};

    fn pos(x: usize, y: usize) -> Position {
        Position::new(x, y)
    }

    fn three() -> Room {
        room_with(
            vec![human("a", 4), human("b", 4), human("c", 4)],
            &[pos(1, 1), pos(5, 5), pos(8, 8)],
            GameMode::Classic,
        )
    }

    #[test]
    fn test_end_turn_rotates_and_counts() {
        let mut room = three();
        let events = end_turn(&mut room);
        assert!(matches!(&events[0], RoomEvent::TurnUpdate { player_id, turn: 1 } if player_id == "b"));
        end_turn(&mut room);
        end_turn(&mut room);
        assert!(room.is_active("a"));
        assert_eq!(room.stats.turns_played, 3);
    }

    #[test]
    fn test_end_turn_is_guarded_by_phase() {
        let mut room = three();
        room.phase = TurnPhase::TurnEnding;
        assert!(end_turn(&mut room).is_empty());
        room.phase = TurnPhase::InCombat;
        assert!(end_turn(&mut room).is_empty());
        assert!(room.is_active("a"));
    }

    #[test]
    fn test_begin_turn_restores_speed() {
        let mut room = three();
        room.player_mut("b").unwrap().stats.speed = 0;
        end_turn(&mut room);
        let b = room.player("b").unwrap();
        assert_eq!(b.stats.speed, b.stats.max_speed);
        assert_eq!(b.actions_left, 1);
    }

    #[test]
    fn test_start_game_announces_board_then_first_turn() {
        let mut room = three();
        room.phase = TurnPhase::WaitingForTurn;
        room.active_player = None;
        let events = start_game(&mut room);
        assert!(matches!(events[0], RoomEvent::GameStarted { .. }));
        assert!(matches!(&events[1], RoomEvent::TurnUpdate { player_id, .. } if player_id == "a"));
        assert!(start_game(&mut room).is_empty());
    }

    #[test]
    fn test_should_end_turn_when_stuck() {
        let mut room = three();
        assert!(!should_end_turn(&room));

        room.player_mut("a").unwrap().stats.speed = 0;
        room.player_mut("a").unwrap().actions_left = 0;
        assert!(should_end_turn(&room));

        room.grid.cell_mut(pos(1, 2)).unwrap().terrain = Terrain::Ice;
        assert!(!should_end_turn(&room));
    }

    #[test]
    fn test_adjacent_door_keeps_turn_alive() {
        let mut room = three();
        room.player_mut("a").unwrap().stats.speed = 0;
        room.grid.cell_mut(pos(2, 1)).unwrap().terrain = Terrain::Door;
        assert!(!should_end_turn(&room));
    }

    #[test]
    fn test_toggle_door_once_per_action_and_logged_once() {
        let mut room = three();
        room.grid.cell_mut(pos(2, 1)).unwrap().terrain = Terrain::Door;

        let events = toggle_door(&mut room, "a", pos(2, 1)).unwrap();
        assert!(matches!(events[0], RoomEvent::DoorUpdated { is_opened: true, .. }));
        assert_eq!(room.grid.terrain(pos(2, 1)), Some(Terrain::OpenedDoor));
        assert_eq!(toggle_door(&mut room, "a", pos(2, 1)).unwrap_err(), GameError::NoActionLeft);

        room.player_mut("a").unwrap().actions_left = 1;
        toggle_door(&mut room, "a", pos(2, 1)).unwrap();
        assert_eq!(room.grid.terrain(pos(2, 1)), Some(Terrain::Door));
        assert_eq!(room.stats.toggled_doors.len(), 1);
    }

    #[test]
    fn test_toggle_door_rejections() {
        let mut room = three();
        room.grid.cell_mut(pos(3, 3)).unwrap().terrain = Terrain::Door;
        assert_eq!(toggle_door(&mut room, "a", pos(3, 3)).unwrap_err(), GameError::NotAdjacent(pos(3, 3)));
        assert_eq!(toggle_door(&mut room, "a", pos(1, 2)).unwrap_err(), GameError::NotADoor(pos(1, 2)));
        assert_eq!(toggle_door(&mut room, "b", pos(3, 3)).unwrap_err(), GameError::NotPlayersTurn("b".into()));
        let far = pos(usize::MAX, usize::MAX);
        assert_eq!(toggle_door(&mut room, "a", far).unwrap_err(), GameError::NotADoor(far));
        assert_eq!(room.player("a").unwrap().actions_left, 1);

        room.grid.cell_mut(pos(1, 2)).unwrap().terrain = Terrain::OpenedDoor;
        room.grid.cell_mut(pos(1, 2)).unwrap().item = Some(Item::Sword);
        assert_eq!(toggle_door(&mut room, "a", pos(1, 2)).unwrap_err(), GameError::DoorBlocked(pos(1, 2)));
    }

    #[test]
    fn test_debug_toggle_is_host_only() {
        let mut room = room_with(vec![human("host", 4), human("b", 4)], &[], GameMode::Classic);
        assert_eq!(toggle_debug(&mut room, "b").unwrap_err(), GameError::NotHost);
        toggle_debug(&mut room, "host").unwrap();
        assert!(room.debug_mode);
    }

    #[test]
    fn test_disconnect_of_active_player_passes_turn_and_cleans_up() {
        let mut room = three();
        let home = room.player("a").unwrap().starting_point;
        room.player_mut("a").unwrap().inventory.push(Item::Dagger);

        let events = handle_disconnect(&mut room, "a");
        assert!(events.iter().any(|e| matches!(e, RoomEvent::ItemDropped { item: Item::Dagger, .. })));
        assert!(events.iter().any(|e| matches!(e, RoomEvent::PlayerLeft { .. })));
        assert!(room.is_active("b"));
        assert!(room.player("a").is_none());
        assert_eq!(room.disconnected.len(), 1);
        assert!(!room.grid.is_occupied(pos(1, 1)));
        assert_ne!(room.grid.cell(home).unwrap().item, Some(Item::StartingPoint));
    }

    #[test]
    fn test_disconnect_mid_combat_restores_opponent() {
        let mut room = three();
        combat::start_combat(&mut room, "a", "b").unwrap();
        room.phase = TurnPhase::InCombat;
        room.player_mut("a").unwrap().stats.life = 1;

        handle_disconnect(&mut room, "b");
        assert!(room.combat.is_none());
        assert_eq!(room.player("a").unwrap().stats.life, 4);
        assert_eq!(room.phase, TurnPhase::ActingPlayerTurn);
        assert!(room.is_active("a"));
    }

    #[test]
    fn test_room_closes_when_no_human_remains() {
        let mut room = room_with(
            vec![human("a", 4), bot("bot", Behavior::Aggressive, 4)],
            &[],
            GameMode::Classic,
        );
        let events = handle_disconnect(&mut room, "a");
        assert!(events.iter().any(|e| matches!(e, RoomEvent::RoomClosed)));
        assert_eq!(room.phase, TurnPhase::RoomClosed);
    }

    #[test]
    fn test_map_patch_and_sync() {
        let mut room = three();
        let mut patch = room.grid.clone();
        patch.cell_mut(pos(4, 4)).unwrap().terrain = Terrain::Water;
        let events = sync_map(&mut room, Some(&patch)).unwrap();
        assert!(matches!(events[0], RoomEvent::MapSync { .. }));
        assert_eq!(room.grid.terrain(pos(4, 4)), Some(Terrain::Water));
        assert!(sync_map(&mut room, Some(&Grid::new(5))).is_err());
    }

    #[test]
    fn test_map_patch_cannot_duplicate_a_carried_flag() {
        let mut room = three();
        room.player_mut("a").unwrap().inventory.push(Item::Flag);
        room.flag_holder = Some("a".into());
        let mut patch = room.grid.clone();
        patch.cell_mut(pos(6, 6)).unwrap().item = Some(Item::Flag);
        assert!(matches!(sync_map(&mut room, Some(&patch)), Err(GameError::InvalidMap(_))));
        assert!(room.grid.item_positions(|i| i == Item::Flag).is_empty());
    }
}
