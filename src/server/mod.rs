// src/server/mod.rs

//! Server layer root module.
//!
//! This module wires the game core to the network:
//! - Application state shared by the HTTP/WebSocket handlers
//! - HTTP/WebSocket routing
//! - Room creation for players handed over by a lobby
//! - Room actors (one per running game) and their manager
//! - Error frames sent to clients

pub mod lobby;
pub mod state;
pub mod router;
pub mod room;
pub mod ws_error;
