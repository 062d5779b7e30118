pub mod dice;
pub mod error;
pub mod events;
pub mod grid;
pub mod state;
pub mod systems;
pub mod types;
pub mod virtual_player;
