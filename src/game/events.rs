//! Outbound room events.
//!
//! Every core operation returns the events it produced; the room actor
//! broadcasts them to all connections in order.

use serde::{Serialize, Deserialize};

use crate::game::grid::Grid;
use crate::game::state::GameResult;
use crate::game::systems::combat::CombatOutcome;
use crate::game::systems::ctf::Teams;
use crate::game::types::{Item, ItemDetails, Player, PlayerId, Position, Team};

/// Both combatants as they stand, and whose move it is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatState {
    pub attacker: Player,
    pub defender: Player,
    pub turn: PlayerId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum RoomEvent {
    GameStarted {
        players: Vec<Player>,
        grid: Grid,
        teams: Option<Teams>,
    },
    TurnUpdate {
        player_id: PlayerId,
        turn: u32,
    },
    MovementStarted {
        player_id: PlayerId,
    },
    PlayerNextPosition {
        player_id: PlayerId,
        next_position: Position,
    },
    MovementStopped {
        player_id: PlayerId,
        reachable_tiles: Vec<Position>,
        speed_left: u32,
    },
    PlayerTeleported {
        player_id: PlayerId,
        position: Position,
    },
    ItemPicked {
        player_id: PlayerId,
        item: Item,
        details: ItemDetails,
    },
    InventoryFull {
        player_id: PlayerId,
        items: Vec<Item>,
    },
    ItemDropped {
        player_id: PlayerId,
        item: Item,
        details: ItemDetails,
        position: Position,
    },
    DoorUpdated {
        position: Position,
        is_opened: bool,
        player_id: PlayerId,
    },
    CombatInitiated {
        message: String,
        game_state: CombatState,
    },
    CombatUpdate {
        message: String,
        outcome: CombatOutcome,
        game_state: CombatState,
        dice_attack: Option<u32>,
        dice_defense: Option<u32>,
        attack: Option<u32>,
        defense: Option<u32>,
        escape_attempts_left: Option<u32>,
    },
    CombatEnded {
        winner: Option<PlayerId>,
        loser: Option<PlayerId>,
    },
    PlayerRespawned {
        player_id: PlayerId,
        position: Position,
    },
    FlagTaken {
        flag_holder: PlayerId,
    },
    FlagDropped {},
    FlagCaptured {
        winning_team: Team,
    },
    GameOver {
        result: GameResult,
    },
    MapSync {
        grid: Grid,
    },
    PlayerLeft {
        player_id: PlayerId,
        remaining_players: Vec<PlayerId>,
    },
    DebugModeChanged {
        enabled: bool,
    },
    RoomClosed,
}

impl RoomEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RoomEvent::GameStarted { .. } => "GameStarted",
            RoomEvent::TurnUpdate { .. } => "TurnUpdate",
            RoomEvent::MovementStarted { .. } => "MovementStarted",
            RoomEvent::PlayerNextPosition { .. } => "PlayerNextPosition",
            RoomEvent::MovementStopped { .. } => "MovementStopped",
            RoomEvent::PlayerTeleported { .. } => "PlayerTeleported",
            RoomEvent::ItemPicked { .. } => "ItemPicked",
            RoomEvent::InventoryFull { .. } => "InventoryFull",
            RoomEvent::ItemDropped { .. } => "ItemDropped",
            RoomEvent::DoorUpdated { .. } => "DoorUpdated",
            RoomEvent::CombatInitiated { .. } => "CombatInitiated",
            RoomEvent::CombatUpdate { .. } => "CombatUpdate",
            RoomEvent::CombatEnded { .. } => "CombatEnded",
            RoomEvent::PlayerRespawned { .. } => "PlayerRespawned",
            RoomEvent::FlagTaken { .. } => "FlagTaken",
            RoomEvent::FlagDropped {} => "FlagDropped",
            RoomEvent::FlagCaptured { .. } => "FlagCaptured",
            RoomEvent::GameOver { .. } => "GameOver",
            RoomEvent::MapSync { .. } => "MapSync",
            RoomEvent::PlayerLeft { .. } => "PlayerLeft",
            RoomEvent::DebugModeChanged { .. } => "DebugModeChanged",
            RoomEvent::RoomClosed => "RoomClosed",
        }
    }
}
