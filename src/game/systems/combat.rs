//! Combat resolution.
//!
//! A combat is a turn-based duel between two adjacent players. Each side either
//! attacks (attack die against defense die, adjusted by held items) or tries
//! to escape. Stats are snapshotted when the fight starts and restored when it
//! ends, which also lifts the ice penalty.

use log::{debug, warn};
use serde::{Serialize, Deserialize};

use crate::config::game::{
    DAGGER_BONUS, DAGGER_LIFE_THRESHOLD, ESCAPE_PERCENTAGE, ICE_PENALTY, MAX_ESCAPE_ATTEMPTS,
    POISON_DAMAGE_CAP,
};
use crate::game::dice::Dice;
use crate::game::error::GameError;
use crate::game::events::CombatState;
use crate::game::state::Room;
use crate::game::types::{Item, Player, PlayerId, Stats, Terrain};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatAction {
    Attack,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatOutcome {
    AttackDefeated,
    AttackNotDefeated,
    EscapeSucceeded,
    EscapeFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatSnapshot {
    pub player_id: PlayerId,
    pub stats: Stats,
    pub ice_debuffed: bool,
}

impl CombatSnapshot {
    fn of(player: &Player) -> Self {
        Self { player_id: player.id.clone(), stats: player.stats, ice_debuffed: player.ice_debuffed }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combat {
    pub attacker: PlayerId,
    pub defender: PlayerId,
    /// Combatant due to act.
    pub turn: PlayerId,
    pub snapshots: Vec<CombatSnapshot>,
}

impl Combat {
    pub fn involves(&self, id: &str) -> bool {
        self.attacker == id || self.defender == id
    }

    pub fn opponent_of(&self, id: &str) -> Option<&PlayerId> {
        if self.attacker == id {
            Some(&self.defender)
        } else if self.defender == id {
            Some(&self.attacker)
        } else {
            None
        }
    }
}

/// Result of one combat action.
#[derive(Debug, Clone)]
pub struct CombatResult {
    pub outcome: CombatOutcome,
    pub actor: PlayerId,
    pub target: PlayerId,
    pub dice_attack: Option<u32>,
    pub dice_defense: Option<u32>,
    /// Attack value after item effects.
    pub attack: Option<u32>,
    pub defense: Option<u32>,
    pub damage: Option<u32>,
    pub escape_attempts_left: Option<u32>,
}

/// Open a combat between two players.
///
/// Both players are snapshotted first; a combatant standing on ice then loses
/// `ICE_PENALTY` attack and defense unless already debuffed.
pub fn start_combat(room: &mut Room, attacker_id: &str, defender_id: &str) -> Result<CombatState, GameError> {
    if room.combat.is_some() {
        return Err(GameError::CombatInProgress);
    }
    let snapshots = vec![
        CombatSnapshot::of(room.require_player(attacker_id)?),
        CombatSnapshot::of(room.require_player(defender_id)?),
    ];

    for id in [attacker_id, defender_id] {
        let on_ice = room
            .player(id)
            .and_then(|p| room.grid.terrain(p.position))
            .is_some_and(|t| t == Terrain::Ice);
        let player = room.require_player_mut(id)?;
        if on_ice && !player.ice_debuffed {
            player.stats.attack = player.stats.attack.saturating_sub(ICE_PENALTY).max(1);
            player.stats.defense = player.stats.defense.saturating_sub(ICE_PENALTY).max(1);
            player.ice_debuffed = true;
        }
        player.escape_attempts = MAX_ESCAPE_ATTEMPTS;
        player.combats += 1;
    }

    room.stats.combats += 1;
    room.combat = Some(Combat {
        attacker: attacker_id.to_string(),
        defender: defender_id.to_string(),
        turn: attacker_id.to_string(),
        snapshots,
    });
    debug!("[Combat] {} engages {} in room {}", attacker_id, defender_id, room.id);
    combat_state(room).ok_or(GameError::CombatInProgress)
}

/// Current view of the combat, if one is running.
pub fn combat_state(room: &Room) -> Option<CombatState> {
    let combat = room.combat.as_ref()?;
    Some(CombatState {
        attacker: room.player(&combat.attacker)?.clone(),
        defender: room.player(&combat.defender)?.clone(),
        turn: combat.turn.clone(),
    })
}

/// Apply one action for the combatant due to act.
///
/// Returns `None` when no combat is running or when `actor_id` is not the one
/// due to act; callers treat both as a no-op.
pub fn process_combat_action(
    room: &mut Room,
    actor_id: &str,
    action: CombatAction,
    dice: &mut dyn Dice,
) -> Option<CombatResult> {
    let combat = room.combat.as_ref()?;
    if combat.turn != actor_id {
        warn!("[Combat] {} acted out of turn in room {}", actor_id, room.id);
        return None;
    }
    let target_id = combat.opponent_of(actor_id)?.clone();

    let result = match action {
        CombatAction::Attack => resolve_attack(room, actor_id, &target_id, dice)?,
        CombatAction::Escape => resolve_escape(room, actor_id, &target_id, dice)?,
    };

    if matches!(result.outcome, CombatOutcome::AttackNotDefeated | CombatOutcome::EscapeFailed) {
        if let Some(combat) = room.combat.as_mut() {
            combat.turn = target_id;
        }
    }
    Some(result)
}

fn resolve_attack(room: &mut Room, attacker_id: &str, defender_id: &str, dice: &mut dyn Dice) -> Option<CombatResult> {
    let attacker = room.player(attacker_id)?;
    let defender = room.player(defender_id)?;

    let (mut dice_attack, dice_defense) = if room.debug_mode {
        (attacker.stats.attack, 1)
    } else {
        (dice.roll(attacker.stats.attack), dice.roll(defender.stats.defense))
    };

    if attacker.has_item(Item::LoadedDice) {
        dice_attack = attacker.stats.attack;
    }
    let mut attack = dice_attack;
    if attacker.has_item(Item::Dagger) && attacker.stats.life < DAGGER_LIFE_THRESHOLD {
        attack += DAGGER_BONUS;
    }

    let mut damage = i64::from(attack) - i64::from(dice_defense);
    if defender.has_item(Item::Poison) {
        damage = damage.min(i64::from(POISON_DAMAGE_CAP));
    }
    let damage = u32::try_from(damage).ok();

    let defender = room.player_mut(defender_id)?;
    if let Some(damage) = damage {
        defender.stats.life = defender.stats.life.saturating_sub(damage);
    }

    let outcome = if defender.stats.life > 0 {
        CombatOutcome::AttackNotDefeated
    } else if defender.has_item(Item::Revive) && !defender.revive_used {
        defender.stats.life = 1;
        defender.revive_used = true;
        debug!("[Combat] {} revived with 1 life", defender_id);
        CombatOutcome::AttackNotDefeated
    } else {
        defender.defeats += 1;
        CombatOutcome::AttackDefeated
    };

    if outcome == CombatOutcome::AttackDefeated {
        room.player_mut(attacker_id)?.victories += 1;
    }

    Some(CombatResult {
        outcome,
        actor: attacker_id.to_string(),
        target: defender_id.to_string(),
        dice_attack: Some(dice_attack),
        dice_defense: Some(dice_defense),
        attack: Some(attack),
        defense: Some(dice_defense),
        damage,
        escape_attempts_left: None,
    })
}

fn resolve_escape(room: &mut Room, escaper_id: &str, opponent_id: &str, dice: &mut dyn Dice) -> Option<CombatResult> {
    let player = room.player_mut(escaper_id)?;

    let outcome = if player.escape_attempts == 0 {
        // No roll: the attempt is spent already.
        CombatOutcome::EscapeFailed
    } else if dice.draw() < ESCAPE_PERCENTAGE {
        player.escapes += 1;
        CombatOutcome::EscapeSucceeded
    } else {
        player.escape_attempts -= 1;
        CombatOutcome::EscapeFailed
    };

    Some(CombatResult {
        outcome,
        actor: escaper_id.to_string(),
        target: opponent_id.to_string(),
        dice_attack: None,
        dice_defense: None,
        attack: None,
        defense: None,
        damage: None,
        escape_attempts_left: Some(player.escape_attempts),
    })
}

/// Close the running combat and restore both combatants' pre-combat stats.
///
/// Restoration happens even when the winner and loser are unknown (a
/// successful escape, a disconnect). Returns the combat that was closed.
pub fn end_combat(room: &mut Room, winner: Option<&str>, loser: Option<&str>) -> Option<Combat> {
    let combat = room.combat.take()?;
    for snapshot in &combat.snapshots {
        let player = room
            .players
            .iter_mut()
            .chain(room.disconnected.iter_mut())
            .find(|p| p.id == snapshot.player_id);
        if let Some(player) = player {
            player.stats = snapshot.stats;
            player.ice_debuffed = snapshot.ice_debuffed;
        }
    }
    debug!(
        "[Combat] Combat {} vs {} ended in room {} (winner={:?}, loser={:?})",
        combat.attacker, combat.defender, room.id, winner, loser
    );
    Some(combat)
}

/// Virtual player due to act in the running combat, if any.
pub fn pending_virtual_combatant(room: &Room) -> Option<PlayerId> {
    let combat = room.combat.as_ref()?;
    room.player(&combat.turn).filter(|p| p.is_virtual()).map(|p| p.id.clone())
}
