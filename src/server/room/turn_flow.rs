//! Timers and follow-ups run by a room after every change.
//!
//! A turn timer ends a human turn left idle, a combat timer attacks for a
//! combatant who lets the clock run out, and a thinking timer paces virtual
//! players. Each timer remembers what it was started for, so a timer that
//! fires after the room has moved on does nothing.

use std::time::Duration;
use actix::prelude::*;
use log::{debug, info};

use crate::config::game::{
    COMBAT_TURN_DURATION, COMBAT_TURN_DURATION_NO_ESCAPE, TURN_DURATION, VIRTUAL_THINKING_DELAY_MS,
};
use crate::game::dice::Dice;
use crate::game::events::RoomEvent;
use crate::game::state::{Room, TurnPhase};
use crate::game::systems::actions;
use crate::game::systems::combat::CombatAction;
use crate::game::systems::turn;
use crate::game::types::PlayerId;
use crate::game::virtual_player::{self, Prompt};
use crate::server::room::messages::RoomClosed;
use crate::server::room::server::RoomSession;

/// `(turn number, player)` a turn clock runs for.
pub type TurnKey = (u32, PlayerId);
/// `(attacker, defender, combat turn)` a combat clock runs for.
pub type CombatKey = (PlayerId, PlayerId, PlayerId);

/// What an expired turn clock did to the room.
#[derive(Debug)]
enum TurnClock {
    /// The turn it was started for is over.
    Stale,
    /// A combat is running; check again later.
    Deferred,
    Expired(Vec<RoomEvent>),
}

fn turn_key(room: &Room) -> Option<TurnKey> {
    room.active_player.clone().map(|id| (room.stats.turns_played, id))
}

fn combat_key(room: &Room) -> Option<CombatKey> {
    room.combat
        .as_ref()
        .map(|c| (c.attacker.clone(), c.defender.clone(), c.turn.clone()))
}

fn expire_turn_clock(room: &mut Room, key: &TurnKey) -> TurnClock {
    if turn_key(room).as_ref() != Some(key) {
        return TurnClock::Stale;
    }
    if room.phase == TurnPhase::InCombat {
        return TurnClock::Deferred;
    }
    TurnClock::Expired(turn::force_end_turn(room))
}

/// How long the combatant due to act gets. Virtual players answer on their
/// own and get no clock.
fn combat_clock(room: &Room) -> Option<(CombatKey, Duration)> {
    let key = combat_key(room)?;
    let acting = room.player(&key.2)?;
    if acting.is_virtual() {
        return None;
    }
    let secs = if acting.escape_attempts == 0 { COMBAT_TURN_DURATION_NO_ESCAPE } else { COMBAT_TURN_DURATION };
    Some((key, Duration::from_secs(secs)))
}

/// Attack on behalf of a combatant whose clock ran out, unless the combat
/// has moved on since the clock started.
fn expire_combat_clock(room: &mut Room, key: &CombatKey, dice: &mut dyn Dice) -> Option<Vec<RoomEvent>> {
    if combat_key(room).as_ref() != Some(key) {
        return None;
    }
    Some(actions::combat_action(room, &key.2, CombatAction::Attack, dice))
}

/// Bring the room up to date after a change.
pub fn settle(this: &mut RoomSession, ctx: &mut Context<RoomSession>) {
    // Each pass hands the turn to someone else, so one pass per player is enough.
    for _ in 0..this.room.players.len().max(1) {
        if !turn::should_end_turn(&this.room) {
            break;
        }
        debug!("[Room] {:?} has nothing left to do", this.room.active_player);
        let events = turn::end_turn(&mut this.room);
        this.broadcast(events);
    }

    if this.room.phase == TurnPhase::RoomClosed {
        close(this, ctx);
        return;
    }
    refresh_turn_timer(this, ctx);
    refresh_combat_timer(this, ctx);
    schedule_prompt(this, ctx);
}

fn close(this: &mut RoomSession, ctx: &mut Context<RoomSession>) {
    let events = turn::close_room(&mut this.room);
    this.broadcast(events);
    for handle in [this.turn_timer.take(), this.combat_timer.take(), this.thinking_timer.take()]
        .into_iter()
        .flatten()
    {
        ctx.cancel_future(handle);
    }
    info!("[Room] Room {} closed after {} turns", this.room.id, this.room.stats.turns_played);
    this.manager.do_send(RoomClosed { room_id: this.room.id });
    ctx.stop();
}

fn refresh_turn_timer(this: &mut RoomSession, ctx: &mut Context<RoomSession>) {
    let key = turn_key(&this.room);
    if key == this.timed_turn {
        return;
    }
    if let Some(handle) = this.turn_timer.take() {
        ctx.cancel_future(handle);
    }
    this.timed_turn = key.clone();
    if let Some(key) = key {
        start_turn_timer(this, ctx, key, Duration::from_secs(TURN_DURATION));
    }
}

fn start_turn_timer(
    this: &mut RoomSession,
    ctx: &mut Context<RoomSession>,
    key: TurnKey,
    after: Duration,
) {
    let handle = ctx.run_later(after, move |act, ctx| {
        act.turn_timer = None;
        match expire_turn_clock(&mut act.room, &key) {
            TurnClock::Stale => {}
            TurnClock::Deferred => {
                start_turn_timer(act, ctx, key, Duration::from_secs(COMBAT_TURN_DURATION));
            }
            TurnClock::Expired(events) => {
                info!("[Room] Turn of {} timed out in room {}", key.1, act.room.id);
                act.dispatch(events, ctx);
            }
        }
    });
    this.turn_timer = Some(handle);
}

fn refresh_combat_timer(this: &mut RoomSession, ctx: &mut Context<RoomSession>) {
    let key = combat_key(&this.room);
    if key == this.timed_combat {
        return;
    }
    if let Some(handle) = this.combat_timer.take() {
        ctx.cancel_future(handle);
    }
    this.timed_combat = key;
    let Some((key, after)) = combat_clock(&this.room) else {
        return;
    };

    let handle = ctx.run_later(after, move |act, ctx| {
        act.combat_timer = None;
        if let Some(events) = expire_combat_clock(&mut act.room, &key, &mut act.dice) {
            info!("[Room] {} let the combat clock run out, attacking", key.2);
            act.dispatch(events, ctx);
        }
    });
    this.combat_timer = Some(handle);
}

fn schedule_prompt(this: &mut RoomSession, ctx: &mut Context<RoomSession>) {
    if this.thinking_timer.is_some() || virtual_player::pending_prompt(&this.room).is_none() {
        return;
    }
    let handle = ctx.run_later(Duration::from_millis(VIRTUAL_THINKING_DELAY_MS), |act, ctx| {
        act.thinking_timer = None;
        // The room may have moved on while thinking.
        let Some(prompt) = virtual_player::pending_prompt(&act.room) else {
            return;
        };
        debug!("[VirtualPlayer] {} acts in room {}", prompt.player_id(), act.room.id);
        let events = match prompt {
            Prompt::Turn(id) => virtual_player::turn_action(&mut act.room, &id),
            Prompt::Combat(id) => virtual_player::combat_answer(&mut act.room, &id, &mut act.dice),
        };
        act.dispatch(events, ctx);
    });
    this.thinking_timer = Some(handle);
}
