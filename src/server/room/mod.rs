pub mod messages;
pub mod server;
pub mod session;
pub mod turn_flow;

pub use server::{RoomManager, RoomSession};
