//! Player movement system.
//!
//! This module applies a computed path one tile at a time. Each step is only
//! taken when the caller asks for it, so the caller can broadcast progress and
//! stop early (an item was picked up, the flag was captured).

use std::collections::VecDeque;

use crate::game::error::{GameError, MoveRejection};
use crate::game::grid::Grid;
use crate::game::state::Room;
use crate::game::systems::pathfinding::{Path, tile_cost};
use crate::game::types::{PlayerId, Position, Terrain};

/// Check that a player could step onto `to`, returning the tile cost.
pub fn check_destination(grid: &Grid, to: Position) -> Result<u32, MoveRejection> {
    let cell = grid.cell(to).ok_or(MoveRejection::OutOfBounds)?;
    match cell.terrain {
        Terrain::Wall => return Err(MoveRejection::Wall),
        Terrain::Door => return Err(MoveRejection::ClosedDoor),
        _ => {}
    }
    if cell.occupant.is_some() {
        return Err(MoveRejection::Occupied);
    }
    tile_cost(cell.terrain).ok_or(MoveRejection::Wall)
}

/// Move a player to an adjacent tile, paying its movement cost.
/// Returns the cost paid. Nothing changes when the step is rejected.
pub fn move_one_step(room: &mut Room, player_id: &str, to: Position) -> Result<u32, GameError> {
    let reject = |reason| GameError::InvalidMove { position: to, reason };

    let player = room.require_player(player_id)?;
    let from = player.position;
    let speed = player.stats.speed;

    let cost = check_destination(&room.grid, to).map_err(reject)?;
    if !from.is_adjacent(&to) {
        return Err(reject(MoveRejection::NotAdjacent));
    }
    if cost > speed {
        return Err(reject(MoveRejection::NoSpeedLeft));
    }

    room.grid.set_occupant(from, None);
    room.grid.set_occupant(to, Some(player_id.to_string()));
    let player = room.require_player_mut(player_id)?;
    player.position = to;
    player.stats.speed -= cost;
    room.stats.visited_tiles.insert(to);
    Ok(cost)
}

/// Place a player on any free tile, ignoring distance and cost.
pub fn teleport(room: &mut Room, player_id: &str, to: Position) -> Result<(), GameError> {
    check_destination(&room.grid, to).map_err(|reason| GameError::InvalidMove { position: to, reason })?;
    let from = room.require_player(player_id)?.position;
    room.grid.set_occupant(from, None);
    room.grid.set_occupant(to, Some(player_id.to_string()));
    room.require_player_mut(player_id)?.position = to;
    room.stats.visited_tiles.insert(to);
    Ok(())
}

/// A path being walked by one player.
#[derive(Debug, Clone)]
pub struct Movement {
    player_id: PlayerId,
    remaining: VecDeque<Position>,
}

impl Movement {
    pub fn new(player_id: &str, path: &Path) -> Self {
        Self {
            player_id: player_id.to_string(),
            remaining: path.steps().iter().copied().collect(),
        }
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    pub fn is_finished(&self) -> bool {
        self.remaining.is_empty()
    }

    pub fn next_position(&self) -> Option<Position> {
        self.remaining.front().copied()
    }

    /// Abandon the rest of the path.
    pub fn stop(&mut self) {
        self.remaining.clear();
    }

    /// Take the next step. `Ok(None)` once the path is done; a rejected step
    /// ends the movement.
    pub fn step(&mut self, room: &mut Room) -> Result<Option<Position>, GameError> {
        let Some(next) = self.remaining.pop_front() else {
            return Ok(None);
        };
        match move_one_step(room, &self.player_id, next) {
            Ok(_) => Ok(Some(next)),
            Err(e) => {
                self.stop();
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::fixtures::*;
    use crate::game::systems::pathfinding::find_path;
    use crate::game::types::GameMode;

    fn pos(x: usize, y: usize) -> Position {
        Position::new(x, y)
    }

    fn room() -> Room {
        room_with(vec![human("a", 6), human("b", 6)], &[pos(1, 1), pos(4, 1)], GameMode::Classic)
    }

    #[test]
    fn test_step_updates_occupancy_and_speed() {
        let mut room = room();
        room.grid.cell_mut(pos(2, 1)).unwrap().terrain = Terrain::Water;
        move_one_step(&mut room, "a", pos(2, 1)).unwrap();

        assert!(!room.grid.is_occupied(pos(1, 1)));
        assert_eq!(room.grid.cell(pos(2, 1)).unwrap().occupant.as_deref(), Some("a"));
        let a = room.player("a").unwrap();
        assert_eq!(a.position, pos(2, 1));
        assert_eq!(a.stats.speed, 4);
    }

    #[test]
    fn test_rejected_steps_change_nothing() {
        let mut room = room();
        room.grid.cell_mut(pos(1, 0)).unwrap().terrain = Terrain::Wall;
        room.grid.cell_mut(pos(0, 1)).unwrap().terrain = Terrain::Door;
        let cases = [
            (pos(1, 0), MoveRejection::Wall),
            (pos(0, 1), MoveRejection::ClosedDoor),
            (pos(3, 3), MoveRejection::NotAdjacent),
        ];
        for (to, reason) in cases {
            let err = move_one_step(&mut room, "a", to).unwrap_err();
            assert_eq!(err, GameError::InvalidMove { position: to, reason });
        }
        move_one_step(&mut room, "b", pos(3, 1)).unwrap();
        move_one_step(&mut room, "b", pos(2, 1)).unwrap();
        let err = move_one_step(&mut room, "a", pos(2, 1)).unwrap_err();
        assert_eq!(err, GameError::InvalidMove { position: pos(2, 1), reason: MoveRejection::Occupied });
        let err = move_one_step(&mut room, "a", pos(1, 99)).unwrap_err();
        assert_eq!(err, GameError::InvalidMove { position: pos(1, 99), reason: MoveRejection::OutOfBounds });
        assert_eq!(room.player("a").unwrap().position, pos(1, 1));
        assert_eq!(room.player("a").unwrap().stats.speed, 6);
    }

    #[test]
    fn test_ice_steps_are_free() {
        let mut room = room();
        room.player_mut("a").unwrap().stats.speed = 0;
        room.grid.cell_mut(pos(1, 2)).unwrap().terrain = Terrain::Ice;
        assert_eq!(move_one_step(&mut room, "a", pos(1, 2)).unwrap(), 0);
        assert_eq!(
            move_one_step(&mut room, "a", pos(1, 3)).unwrap_err(),
            GameError::InvalidMove { position: pos(1, 3), reason: MoveRejection::NoSpeedLeft }
        );
    }

    #[test]
    fn test_movement_walks_path_one_step_at_a_time() {
        let mut room = room();
        let path = find_path(&room.grid, pos(1, 1), 6, pos(1, 4)).unwrap();
        let mut movement = Movement::new("a", &path);

        assert_eq!(movement.next_position(), Some(pos(1, 2)));
        assert_eq!(movement.step(&mut room).unwrap(), Some(pos(1, 2)));
        assert_eq!(room.player("a").unwrap().position, pos(1, 2));

        while movement.step(&mut room).unwrap().is_some() {}
        assert!(movement.is_finished());
        assert_eq!(room.player("a").unwrap().position, pos(1, 4));
        assert_eq!(room.player("a").unwrap().stats.speed, 3);
    }

    #[test]
    fn test_movement_stops_when_path_gets_blocked() {
        let mut room = room();
        let path = find_path(&room.grid, pos(1, 1), 6, pos(1, 4)).unwrap();
        let mut movement = Movement::new("a", &path);
        movement.step(&mut room).unwrap();

        room.grid.cell_mut(pos(1, 3)).unwrap().terrain = Terrain::Wall;
        assert!(movement.step(&mut room).is_err());
        assert!(movement.is_finished());
        assert_eq!(room.player("a").unwrap().position, pos(1, 2));
    }
}
