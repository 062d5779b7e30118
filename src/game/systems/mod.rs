pub mod actions;
pub mod combat;
pub mod ctf;
pub mod movement;
pub mod pathfinding;
pub mod rules;
pub mod turn;
