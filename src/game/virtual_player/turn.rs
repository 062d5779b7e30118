use log::{debug, error};

use crate::config::game::MAX_INVENTORY;
use crate::game::error::GameError;
use crate::game::events::RoomEvent;
use crate::game::state::{Room, TurnPhase};
use crate::game::systems::pathfinding::{self, Path};
use crate::game::systems::{actions, movement, turn};
use crate::game::types::{Behavior, GameMode, Item, PlayerId, Position, Terrain};

/// How far a sequence got. Ordered so `max` keeps the furthest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Progress {
    Idle,
    Moved,
    Engaged,
}

fn rank(path: &Path) -> (u32, usize, u32) {
    (path.cost, path.positions.len(), path.turns)
}

fn is_defensive_item(item: Item) -> bool {
    item.is_collectible() && item != Item::Flag && !item.is_offensive()
}

fn is_offensive_item(item: Item) -> bool {
    item.is_offensive()
}

/// Play a virtual player's turn.
///
/// The turn ends here unless a combat was started, in which case it carries
/// on once the combat is over. A failure anywhere still ends the turn.
pub fn turn_action(room: &mut Room, player_id: &str) -> Vec<RoomEvent> {
    if !room.is_active(player_id) || room.phase != TurnPhase::ActingPlayerTurn {
        return Vec::new();
    }
    let mut events = Vec::new();
    match play_turn(room, player_id, &mut events) {
        Ok(Progress::Engaged) => {
            debug!("[VirtualPlayer] {} engaged a combat in room {}", player_id, room.id);
        }
        Ok(progress) => {
            debug!("[VirtualPlayer] {} done ({:?}) in room {}", player_id, progress, room.id);
            events.extend(turn::end_turn(room));
        }
        Err(e) => {
            error!("[VirtualPlayer] {} failed its turn in room {}: {}", player_id, room.id, e);
            events.extend(turn::force_end_turn(room));
        }
    }
    events
}

fn play_turn(room: &mut Room, me: &str, events: &mut Vec<RoomEvent>) -> Result<Progress, GameError> {
    let behavior = room.require_player(me)?.behavior().unwrap_or(Behavior::Aggressive);

    if room.mode == GameMode::CaptureTheFlag {
        let progress = flag_branch(room, me, behavior, events)?;
        if progress != Progress::Idle || room.is_over() {
            return Ok(progress);
        }
    }

    match behavior {
        Behavior::Defensive => {
            collect_items(room, me, is_defensive_item, events)?;
            seek_opponent(room, me, false, None, events)
        }
        Behavior::Aggressive => {
            let progress = seek_opponent(room, me, true, None, events)?;
            if progress == Progress::Engaged {
                return Ok(progress);
            }
            collect_items(room, me, is_offensive_item, events)?;
            seek_opponent(room, me, false, None, events)
        }
    }
}

fn flag_branch(
    room: &mut Room,
    me: &str,
    behavior: Behavior,
    events: &mut Vec<RoomEvent>,
) -> Result<Progress, GameError> {
    match room.flag_holder.clone() {
        None => {
            let flags = room.grid.item_positions(|item| item == Item::Flag);
            seek_tiles(room, me, &flags, true, events)
        }
        Some(holder) if holder == me => {
            let home = room.require_player(me)?.starting_point;
            let moved = seek_tiles(room, me, &[home], true, events)?;
            if room.is_over() {
                return Ok(moved);
            }
            match adjacent_opponent(room, me, None)? {
                Some(target) => Ok(moved.max(engage(room, me, &target, events)?)),
                None => Ok(moved),
            }
        }
        Some(holder) if room.same_team(me, &holder) => Ok(Progress::Idle),
        Some(holder) => match behavior {
            Behavior::Defensive => {
                let carrier_home = room.require_player(&holder)?.starting_point;
                seek_tiles(room, me, &[carrier_home], true, events)
            }
            Behavior::Aggressive => seek_opponent(room, me, false, Some(&holder), events),
        },
    }
}

/// Go after wanted items until the inventory is full or none can be reached.
fn collect_items(
    room: &mut Room,
    me: &str,
    wanted: fn(Item) -> bool,
    events: &mut Vec<RoomEvent>,
) -> Result<(), GameError> {
    for _ in 0..MAX_INVENTORY {
        if room.require_player(me)?.inventory_full() || room.is_over() {
            break;
        }
        let targets = room.grid.item_positions(wanted);
        if seek_tiles(room, me, &targets, false, events)? == Progress::Idle {
            break;
        }
    }
    Ok(())
}

/// Walk toward the cheapest target tile within this turn's speed. With
/// `unbounded`, a target out of reach is still approached as far as possible.
fn seek_tiles(
    room: &mut Room,
    me: &str,
    targets: &[Position],
    unbounded: bool,
    events: &mut Vec<RoomEvent>,
) -> Result<Progress, GameError> {
    let player = room.require_player(me)?;
    let (from, speed) = (player.position, player.stats.speed);

    let reachable = targets
        .iter()
        .filter_map(|t| pathfinding::find_path(&room.grid, from, speed, *t))
        .min_by_key(rank);
    let path = match reachable {
        Some(path) => Some(path),
        None if unbounded => targets
            .iter()
            .filter_map(|t| pathfinding::find_path_unbounded(&room.grid, from, *t))
            .min_by_key(rank),
        None => None,
    };
    match path {
        Some(path) => follow(room, me, path.steps(), events),
        None => Ok(Progress::Idle),
    }
}

/// Close in on an opponent (or on `only`) and attack once adjacent.
///
/// With `reachable_only`, opponents that cannot be reached this turn are
/// left alone.
fn seek_opponent(
    room: &mut Room,
    me: &str,
    reachable_only: bool,
    only: Option<&str>,
    events: &mut Vec<RoomEvent>,
) -> Result<Progress, GameError> {
    if let Some(target) = adjacent_opponent(room, me, only)? {
        return engage(room, me, &target, events);
    }

    let player = room.require_player(me)?;
    let (from, speed) = (player.position, player.stats.speed);
    let size = room.grid.size();
    let opponents: Vec<Position> = room
        .players
        .iter()
        .filter(|p| p.id != me && !room.same_team(me, &p.id))
        .filter(|p| only.is_none_or(|id| p.id == id))
        .map(|p| p.position)
        .collect();

    let best = if reachable_only {
        opponents
            .iter()
            .flat_map(|pos| pos.neighbors(size))
            .filter_map(|n| pathfinding::find_path(&room.grid, from, speed, n))
            .min_by_key(rank)
    } else {
        opponents
            .iter()
            .filter_map(|pos| pathfinding::find_path_unbounded(&room.grid, from, *pos))
            .min_by_key(rank)
            .map(|mut path| {
                // The last tile is the opponent itself.
                path.positions.pop();
                path
            })
    };
    let Some(path) = best else {
        return Ok(Progress::Idle);
    };

    let moved = follow(room, me, path.steps(), events)?;
    if room.is_over() {
        return Ok(moved);
    }
    match adjacent_opponent(room, me, only)? {
        Some(target) => Ok(moved.max(engage(room, me, &target, events)?)),
        None => Ok(moved),
    }
}

fn adjacent_opponent(room: &Room, me: &str, only: Option<&str>) -> Result<Option<PlayerId>, GameError> {
    let position = room.require_player(me)?.position;
    let found = position
        .neighbors(room.grid.size())
        .into_iter()
        .filter_map(|n| room.grid.cell(n).and_then(|c| c.occupant.clone()))
        .find(|id| id.as_str() != me && !room.same_team(me, id) && only.is_none_or(|o| o == id.as_str()));
    Ok(found)
}

fn engage(room: &mut Room, me: &str, target: &str, events: &mut Vec<RoomEvent>) -> Result<Progress, GameError> {
    if room.require_player(me)?.actions_left == 0 {
        return Ok(Progress::Idle);
    }
    events.extend(actions::request_combat(room, me, target)?);
    Ok(Progress::Engaged)
}

/// Walk a route as far as speed allows, opening closed doors on the way
/// while an action is left.
fn follow(room: &mut Room, me: &str, route: &[Position], events: &mut Vec<RoomEvent>) -> Result<Progress, GameError> {
    let mut progress = Progress::Idle;
    let mut started = false;

    for &next in route {
        if room.is_over() {
            break;
        }
        if room.grid.terrain(next) == Some(Terrain::Door) {
            if room.require_player(me)?.actions_left == 0 {
                break;
            }
            events.extend(turn::toggle_door(room, me, next)?);
            progress = Progress::Moved;
        }

        let speed = room.require_player(me)?.stats.speed;
        match movement::check_destination(&room.grid, next) {
            Ok(cost) if cost <= speed => {}
            _ => break,
        }
        if !started {
            events.push(RoomEvent::MovementStarted { player_id: me.to_string() });
            started = true;
        }
        movement::move_one_step(room, me, next)?;
        progress = Progress::Moved;

        let report = actions::after_step(room, me, next);
        events.extend(report.events);
        if report.stop {
            break;
        }
    }

    if started {
        events.extend(actions::finish_movement(room, me));
    }
    Ok(progress)
}
