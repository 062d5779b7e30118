//! Errors raised by the game core.
//!
//! None of these escape the room actor: they are logged and, when a
//! connection caused them, echoed back as an error frame.

use crate::game::types::{Position, PlayerId};

/// Why a single movement step was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoveRejection {
    #[error("destination is outside the board")]
    OutOfBounds,

    #[error("destination is a wall")]
    Wall,

    #[error("destination is a closed door")]
    ClosedDoor,

    #[error("destination is occupied")]
    Occupied,

    #[error("destination is not adjacent to the mover")]
    NotAdjacent,

    #[error("not enough movement left")]
    NoSpeedLeft,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("unknown player '{0}'")]
    PlayerNotFound(PlayerId),

    #[error("it is not {0}'s turn")]
    NotPlayersTurn(PlayerId),

    #[error("invalid move to {position:?}: {reason}")]
    InvalidMove { position: Position, reason: MoveRejection },

    #[error("no path to {0:?}")]
    Unreachable(Position),

    #[error("a combat is already in progress")]
    CombatInProgress,

    #[error("no action left this turn")]
    NoActionLeft,

    #[error("{0:?} is not adjacent to the player")]
    NotAdjacent(Position),

    #[error("no door at {0:?}")]
    NotADoor(Position),

    #[error("door at {0:?} is blocked")]
    DoorBlocked(Position),

    #[error("player '{0}' does not hold {1:?}")]
    ItemNotHeld(PlayerId, crate::game::types::Item),

    #[error("player '{0}' must drop an item first")]
    PendingDrop(PlayerId),

    #[error("only the host can do that")]
    NotHost,

    #[error("invalid map: {0}")]
    InvalidMap(String),

    #[error("the game is over")]
    GameOver,
}

impl GameError {
    /// Stable code sent to clients in error frames.
    pub fn code(&self) -> &'static str {
        match self {
            GameError::PlayerNotFound(_) => "PLAYER_NOT_FOUND",
            GameError::NotPlayersTurn(_) => "NOT_YOUR_TURN",
            GameError::InvalidMove { .. } => "INVALID_MOVE",
            GameError::Unreachable(_) => "UNREACHABLE",
            GameError::CombatInProgress => "COMBAT_IN_PROGRESS",
            GameError::NoActionLeft => "NO_ACTION_LEFT",
            GameError::NotAdjacent(_) => "NOT_ADJACENT",
            GameError::NotADoor(_) => "NOT_A_DOOR",
            GameError::DoorBlocked(_) => "DOOR_BLOCKED",
            GameError::ItemNotHeld(..) => "ITEM_NOT_HELD",
            GameError::PendingDrop(_) => "PENDING_DROP",
            GameError::NotHost => "NOT_HOST",
            GameError::InvalidMap(_) => "INVALID_MAP",
            GameError::GameOver => "GAME_OVER",
        }
    }
}
