//! Player actions as the room applies them: movement requests, combat and
//! item drops. Every function returns the events to broadcast, in order.

use log::{debug, info, warn};

use crate::config::game::WINS_TO_WIN;
use crate::game::dice::Dice;
use crate::game::error::GameError;
use crate::game::events::RoomEvent;
use crate::game::state::{GameResult, Room, TurnPhase};
use crate::game::systems::combat::{self, CombatAction, CombatOutcome, CombatResult};
use crate::game::systems::movement::{self, Movement};
use crate::game::systems::{ctf, pathfinding, rules, turn};
use crate::game::types::{GameMode, Item, Position};

/// What a move request turned into.
#[derive(Debug)]
pub enum MoveRequest {
    /// A path to walk step by step.
    Walk(Movement),
    /// A debug teleport, already applied.
    Teleported(Vec<RoomEvent>),
}

/// Events produced by a single step and whether the walk must stop there.
#[derive(Debug, Default)]
pub struct StepReport {
    pub events: Vec<RoomEvent>,
    pub stop: bool,
}

/// Validate a move request. The client's path only names the destination;
/// the route itself is recomputed against the current board and speed.
pub fn request_move(
    room: &mut Room,
    player_id: &str,
    path: &[Position],
    is_right_click: bool,
) -> Result<MoveRequest, GameError> {
    room.ensure_acting(player_id)?;
    if room.combat.is_some() {
        return Err(GameError::CombatInProgress);
    }
    let player = room.require_player(player_id)?;
    let (from, speed) = (player.position, player.stats.speed);
    let destination = path.last().copied().ok_or(GameError::Unreachable(from))?;

    if is_right_click && room.debug_mode {
        movement::teleport(room, player_id, destination)?;
        info!("[Actions] {} teleported to {:?}", player_id, destination);
        let mut events = vec![RoomEvent::PlayerTeleported { player_id: player_id.to_string(), position: destination }];
        events.extend(arrive(room, player_id).events);
        return Ok(MoveRequest::Teleported(events));
    }

    let route = pathfinding::find_path(&room.grid, from, speed, destination)
        .ok_or(GameError::Unreachable(destination))?;
    Ok(MoveRequest::Walk(Movement::new(player_id, &route)))
}

/// Effects of landing on a tile: item pickup first, then flag capture.
/// Either one ends the walk.
fn arrive(room: &mut Room, player_id: &str) -> StepReport {
    let mut report = StepReport::default();
    let picked = rules::pick_up_item(room, player_id);
    report.stop |= !picked.is_empty();
    report.events.extend(picked);

    let captured = ctf::check_flag_capture(room, player_id);
    report.stop |= !captured.is_empty();
    report.events.extend(captured);
    report
}

/// Call after each successful step of a walk.
pub fn after_step(room: &mut Room, player_id: &str, position: Position) -> StepReport {
    let mut report = arrive(room, player_id);
    report.events.insert(0, RoomEvent::PlayerNextPosition { player_id: player_id.to_string(), next_position: position });
    report
}

/// Close a walk: tell the mover where they can still go.
pub fn finish_movement(room: &Room, player_id: &str) -> Vec<RoomEvent> {
    let Some(player) = room.player(player_id) else {
        return Vec::new();
    };
    let reachable_tiles = pathfinding::explore(&room.grid, player.position, Some(player.stats.speed), None).reachable;
    vec![RoomEvent::MovementStopped {
        player_id: player_id.to_string(),
        reachable_tiles,
        speed_left: player.stats.speed,
    }]
}

/// Walk a whole movement at once. The room actor paces steps itself; this
/// is for virtual players and callers that do not animate.
pub fn walk(room: &mut Room, mut movement: Movement) -> Vec<RoomEvent> {
    let player_id = movement.player_id().to_string();
    let mut events = vec![RoomEvent::MovementStarted { player_id: player_id.clone() }];
    loop {
        match movement.step(room) {
            Ok(Some(position)) => {
                let report = after_step(room, &player_id, position);
                events.extend(report.events);
                if report.stop {
                    movement.stop();
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("[Actions] Walk of {} interrupted: {}", player_id, e);
                break;
            }
        }
    }
    events.extend(finish_movement(room, &player_id));
    events
}

/// Start a combat against an adjacent opponent. Costs the turn's action.
pub fn request_combat(room: &mut Room, attacker_id: &str, target_id: &str) -> Result<Vec<RoomEvent>, GameError> {
    room.ensure_acting(attacker_id)?;
    if room.combat.is_some() {
        return Err(GameError::CombatInProgress);
    }
    let attacker = room.require_player(attacker_id)?;
    let target = room.require_player(target_id)?;
    if attacker.actions_left == 0 {
        return Err(GameError::NoActionLeft);
    }
    if attacker_id == target_id || !attacker.position.is_adjacent(&target.position) || room.same_team(attacker_id, target_id) {
        return Err(GameError::NotAdjacent(target.position));
    }
    let message = format!("{} attacks {}", attacker.name, target.name);

    room.require_player_mut(attacker_id)?.actions_left -= 1;
    let game_state = combat::start_combat(room, attacker_id, target_id)?;
    room.phase = TurnPhase::InCombat;
    info!("[Actions] {} in room {}", message, room.id);
    Ok(vec![RoomEvent::CombatInitiated { message, game_state }])
}

fn describe(room: &Room, result: &CombatResult) -> String {
    let name = |id: &str| room.player(id).map_or_else(|| id.to_string(), |p| p.name.clone());
    let (actor, target) = (name(&result.actor), name(&result.target));
    match result.outcome {
        CombatOutcome::AttackDefeated => format!("{actor} defeats {target}"),
        CombatOutcome::AttackNotDefeated => match result.damage {
            Some(damage) => format!("{actor} hits {target} for {damage}"),
            None => format!("{target} blocks {actor}"),
        },
        CombatOutcome::EscapeSucceeded => format!("{actor} escapes from {target}"),
        CombatOutcome::EscapeFailed => format!("{actor} fails to escape from {target}"),
    }
}

/// Apply a combatant's action. Out-of-turn or stray actions produce nothing.
pub fn combat_action(room: &mut Room, player_id: &str, action: CombatAction, dice: &mut dyn Dice) -> Vec<RoomEvent> {
    let Some(result) = combat::process_combat_action(room, player_id, action, dice) else {
        return Vec::new();
    };
    let Some(game_state) = combat::combat_state(room) else {
        return Vec::new();
    };
    let mut events = vec![RoomEvent::CombatUpdate {
        message: describe(room, &result),
        outcome: result.outcome,
        game_state,
        dice_attack: result.dice_attack,
        dice_defense: result.dice_defense,
        attack: result.attack,
        defense: result.defense,
        escape_attempts_left: result.escape_attempts_left,
    }];
    match result.outcome {
        CombatOutcome::AttackDefeated => events.extend(finish_combat(room, Some(&result.actor), Some(&result.target))),
        CombatOutcome::EscapeSucceeded => events.extend(finish_combat(room, None, None)),
        CombatOutcome::AttackNotDefeated | CombatOutcome::EscapeFailed => {}
    }
    events
}

/// Close the running combat. The loser drops everything and goes home; a
/// classic game ends when the winner reaches the victory count.
pub fn finish_combat(room: &mut Room, winner: Option<&str>, loser: Option<&str>) -> Vec<RoomEvent> {
    if combat::end_combat(room, winner, loser).is_none() {
        return Vec::new();
    }
    let mut events = vec![RoomEvent::CombatEnded {
        winner: winner.map(str::to_string),
        loser: loser.map(str::to_string),
    }];
    if room.phase == TurnPhase::InCombat {
        room.phase = TurnPhase::ActingPlayerTurn;
    }

    if let Some(loser) = loser {
        events.extend(rules::drop_all_items(room, loser));
        events.extend(respawn(room, loser));
    }

    if let Some(winner) = winner {
        let victories = room.player(winner).map_or(0, |p| p.victories);
        if room.mode == GameMode::Classic && victories >= WINS_TO_WIN {
            info!("[Actions] {} wins room {} with {} victories", winner, room.id, victories);
            let result = GameResult::Player(winner.to_string());
            room.result = Some(result.clone());
            room.phase = TurnPhase::RoomClosed;
            events.push(RoomEvent::GameOver { result });
            return events;
        }
    }

    if loser.is_some_and(|l| room.is_active(l)) {
        events.extend(turn::end_turn(room));
    }
    events
}

/// Send a player back to their starting point, or the nearest free tile
/// when someone stands on it.
fn respawn(room: &mut Room, player_id: &str) -> Option<RoomEvent> {
    let player = room.player(player_id)?;
    let home = player.starting_point;
    if player.position == home {
        return Some(RoomEvent::PlayerRespawned { player_id: player_id.to_string(), position: home });
    }
    let target = if room.grid.is_free(home) {
        home
    } else {
        room.grid.nearest_free_empty_tile(home)?
    };
    match movement::teleport(room, player_id, target) {
        Ok(()) => {
            debug!("[Actions] {} respawned at {:?}", player_id, target);
            Some(RoomEvent::PlayerRespawned { player_id: player_id.to_string(), position: target })
        }
        Err(e) => {
            warn!("[Actions] Could not respawn {}: {}", player_id, e);
            None
        }
    }
}

/// Answer an inventory overflow, or drop an item during one's own turn.
pub fn request_drop(room: &mut Room, player_id: &str, item: Item) -> Result<Vec<RoomEvent>, GameError> {
    if room.is_over() {
        return Err(GameError::GameOver);
    }
    if room.pending_drop.as_deref() != Some(player_id) {
        room.ensure_acting(player_id)?;
    }
    rules::drop_item(room, player_id, item)
}
