//! Virtual players: scripted turns and combat answers.
//!
//! The room actor asks [`pending_prompt`] after every change and, once the
//! thinking delay has passed, runs [`turn_action`] or [`combat_answer`].

mod combat;
mod turn;

pub use combat::{choose_combat_action, combat_answer};
pub use turn::turn_action;

use crate::game::state::{Room, TurnPhase};
use crate::game::systems::combat::pending_virtual_combatant;
use crate::game::types::PlayerId;

/// Decision a virtual player owes the room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    Turn(PlayerId),
    Combat(PlayerId),
}

impl Prompt {
    pub fn player_id(&self) -> &str {
        match self {
            Prompt::Turn(id) | Prompt::Combat(id) => id,
        }
    }
}

pub fn pending_prompt(room: &Room) -> Option<Prompt> {
    if room.is_over() || room.phase == TurnPhase::RoomClosed {
        return None;
    }
    if let Some(id) = pending_virtual_combatant(room) {
        return Some(Prompt::Combat(id));
    }
    let active = room.active()?;
    if room.phase == TurnPhase::ActingPlayerTurn && active.is_virtual() && room.pending_drop.is_none() {
        return Some(Prompt::Turn(active.id.clone()));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::fixtures::*;
    use crate::game::systems::combat::start_combat;
    use crate::game::types::{Behavior, GameMode, Position};

    #[test]
    fn test_prompts_follow_turn_and_combat() {
        let mut room = room_with(
            vec![human("a", 3), bot("bot", Behavior::Aggressive, 3)],
            &[Position::new(1, 1), Position::new(2, 1)],
            GameMode::Classic,
        );
        assert_eq!(pending_prompt(&room), None);

        start_combat(&mut room, "a", "bot").unwrap();
        room.phase = TurnPhase::InCombat;
        assert_eq!(pending_prompt(&room), None);
        room.combat.as_mut().unwrap().turn = "bot".into();
        assert_eq!(pending_prompt(&room), Some(Prompt::Combat("bot".into())));

        room.combat = None;
        room.phase = TurnPhase::ActingPlayerTurn;
        room.active_player = Some("bot".into());
        assert_eq!(pending_prompt(&room), Some(Prompt::Turn("bot".into())));
    }
}
