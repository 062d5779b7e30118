use actix::prelude::*;
use serde::{Serialize, Deserialize};
use uuid::Uuid;

use super::session::RoomConnection;
use crate::game::events::RoomEvent;
use crate::game::grid::Grid;
use crate::game::systems::combat::CombatAction;
use crate::game::types::{Item, PlayerId, Position};

/// Inbound client message, `{"action": ..., "data": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", content = "data")]
pub enum ClientAction {
    MovePlayer {
        path: Vec<Position>,
        #[serde(default)]
        is_right_click: bool,
    },
    StartCombat {
        target: PlayerId,
    },
    CombatAction {
        action: CombatAction,
    },
    ToggleDoor {
        position: Position,
    },
    EndTurn,
    MapRequest {
        #[serde(default)]
        map: Option<Grid>,
    },
    DropItem {
        item: Item,
    },
    ToggleDebug,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct ProcessClientMessage {
    pub msg: ClientAction,
    pub player_id: PlayerId,
    pub addr: Addr<RoomConnection>,
}

/// Outbound frame for one connection.
#[derive(Message, Debug, Clone)]
#[rtype(result = "()")]
pub enum ServerFrame {
    Event(RoomEvent),
    Error { code: String, message: String },
    /// Another connection took over this player.
    Replaced,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Connect {
    pub player_id: PlayerId,
    pub addr: Addr<RoomConnection>,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub player_id: PlayerId,
    pub addr: Addr<RoomConnection>,
}

#[derive(Message)]
#[rtype(result = "bool")]
pub struct IsPlayer(pub PlayerId);

/// Sent by a room to the manager once it has shut down.
#[derive(Message)]
#[rtype(result = "()")]
pub struct RoomClosed {
    pub room_id: Uuid,
}
