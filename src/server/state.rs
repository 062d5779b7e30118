// src/server/state.rs

//! Application state for the backend server.
//!
//! Holds the address of the room manager actor, shared between the
//! WebSocket handlers and the actor system.

use actix::Addr;
use crate::server::room::RoomManager;

/// Shared application state, injected into HTTP/WebSocket handlers.
pub struct AppState {
    /// Address of the room manager actor (creates, finds and drops rooms).
    pub room_manager: Addr<RoomManager>,
}

impl AppState {
    pub fn new(room_manager: Addr<RoomManager>) -> Self {
        AppState { room_manager }
    }
}
