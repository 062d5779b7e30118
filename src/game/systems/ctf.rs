//! Capture-the-flag bookkeeping.
//!
//! Teams are fixed at room creation. The flag is an ordinary item while on the
//! board; whoever carries it is the room's flag holder until it is dropped or
//! brought back to the holder's starting point.

use log::info;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Serialize, Deserialize};

use crate::game::events::RoomEvent;
use crate::game::state::{GameResult, Room, TurnPhase};
use crate::game::types::{GameMode, Item, PlayerId, Team};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teams {
    pub red: Vec<PlayerId>,
    pub blue: Vec<PlayerId>,
}

impl Teams {
    /// Shuffle the players and cut them into two halves (red gets the extra player).
    pub fn split<R: Rng + ?Sized>(ids: &[PlayerId], rng: &mut R) -> Self {
        let mut shuffled = ids.to_vec();
        shuffled.shuffle(rng);
        let blue = shuffled.split_off(shuffled.len().div_ceil(2));
        Self { red: shuffled, blue }
    }

    pub fn team_of(&self, id: &str) -> Option<Team> {
        if self.red.iter().any(|p| p == id) {
            Some(Team::Red)
        } else if self.blue.iter().any(|p| p == id) {
            Some(Team::Blue)
        } else {
            None
        }
    }

    /// Players outside both teams are never on the same team as anyone.
    pub fn same_team(&self, a: &str, b: &str) -> bool {
        match (self.team_of(a), self.team_of(b)) {
            (Some(left), Some(right)) => left == right,
            _ => false,
        }
    }

    pub fn remove(&mut self, id: &str) {
        self.red.retain(|p| p != id);
        self.blue.retain(|p| p != id);
    }
}

/// Record a flag pickup.
pub fn take_flag(room: &mut Room, player_id: &str) -> RoomEvent {
    room.flag_holder = Some(player_id.to_string());
    room.stats.flag_holders.insert(player_id.to_string());
    info!("[CTF] {} took the flag in room {}", player_id, room.id);
    RoomEvent::FlagTaken { flag_holder: player_id.to_string() }
}

/// Clear the flag holder. The caller puts the flag item back on the board.
pub fn release_flag(room: &mut Room, player_id: &str) -> Option<RoomEvent> {
    if room.flag_holder.as_deref() != Some(player_id) {
        return None;
    }
    room.flag_holder = None;
    info!("[CTF] {} dropped the flag in room {}", player_id, room.id);
    Some(RoomEvent::FlagDropped {})
}

/// Check whether the flag holder is standing on their starting point. A
/// capture ends the game for the holder's team.
pub fn check_flag_capture(room: &mut Room, player_id: &str) -> Vec<RoomEvent> {
    if room.mode != GameMode::CaptureTheFlag || room.flag_holder.as_deref() != Some(player_id) {
        return Vec::new();
    }
    let Some(player) = room.player(player_id) else {
        return Vec::new();
    };
    if player.position != player.starting_point || !player.has_item(Item::Flag) {
        return Vec::new();
    }
    let Some(team) = room.teams.as_ref().and_then(|t| t.team_of(player_id)) else {
        return Vec::new();
    };

    info!("[CTF] Team {:?} captured the flag in room {}", team, room.id);
    room.result = Some(GameResult::Team(team));
    room.phase = TurnPhase::RoomClosed;
    vec![
        RoomEvent::FlagCaptured { winning_team: team },
        RoomEvent::GameOver { result: GameResult::Team(team) },
    ]
}
