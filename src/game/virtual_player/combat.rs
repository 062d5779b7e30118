use log::debug;

use crate::game::dice::Dice;
use crate::game::events::RoomEvent;
use crate::game::state::Room;
use crate::game::systems::actions;
use crate::game::systems::combat::CombatAction;
use crate::game::types::{Behavior, Player};

/// A defensive player runs while hurt and able to; everyone else attacks.
pub fn choose_combat_action(player: &Player) -> CombatAction {
    match player.behavior() {
        Some(Behavior::Defensive) if player.escape_attempts > 0 && player.stats.life < player.stats.max_life => {
            CombatAction::Escape
        }
        _ => CombatAction::Attack,
    }
}

/// Play the virtual combatant's move in the running combat.
pub fn combat_answer(room: &mut Room, player_id: &str, dice: &mut dyn Dice) -> Vec<RoomEvent> {
    let Some(player) = room.player(player_id).filter(|p| p.is_virtual()) else {
        return Vec::new();
    };
    let action = choose_combat_action(player);
    debug!("[VirtualPlayer] {} answers with {:?} in room {}", player_id, action, room.id);
    actions::combat_action(room, player_id, action, dice)
}
