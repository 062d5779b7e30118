//! Pathfinding over the board.
//!
//! A cost-weighted frontier search seeded at the mover. Nodes leave the
//! frontier ordered by (cost, path length, direction changes), so the first
//! time a tile is popped it carries its best path.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use serde::{Serialize, Deserialize};

use crate::config::game::{DEFAULT_TILE_COST, ICE_TILE_COST, WATER_TILE_COST};
use crate::game::grid::Grid;
use crate::game::types::{Direction, Position, Terrain};

/// A route on the board, start tile first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    pub positions: Vec<Position>,
    pub cost: u32,
    pub turns: u32,
}

impl Path {
    pub fn destination(&self) -> Option<Position> {
        self.positions.last().copied()
    }

    /// Tiles still to walk, the start excluded.
    pub fn steps(&self) -> &[Position] {
        self.positions.get(1..).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default)]
pub struct Exploration {
    pub reachable: Vec<Position>,
    pub path: Option<Path>,
}

/// Movement cost of a terrain, `None` when it cannot be walked on.
pub fn tile_cost(terrain: Terrain) -> Option<u32> {
    match terrain {
        Terrain::Default | Terrain::OpenedDoor => Some(DEFAULT_TILE_COST),
        Terrain::Water => Some(WATER_TILE_COST),
        Terrain::Ice => Some(ICE_TILE_COST),
        Terrain::Wall | Terrain::Door => None,
    }
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    Bounded(u32),
    /// No budget, closed doors count as default tiles and the target may be occupied.
    Unbounded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Node {
    cost: u32,
    turns: u32,
    position: Position,
    direction: Option<Direction>,
    path: Vec<Position>,
}

impl Node {
    fn rank(&self) -> (u32, usize, u32, Position) {
        (self.cost, self.path.len(), self.turns, self.position)
    }
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse so the lowest rank pops first.
        other.rank().cmp(&self.rank())
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Reachable tiles within `speed` and, if `target` is given, the best path to it.
///
/// A mover with no speed left only explores when standing next to ice, since
/// ice costs nothing to cross.
pub fn explore(grid: &Grid, start: Position, speed: Option<u32>, target: Option<Position>) -> Exploration {
    let budget = match speed {
        Some(speed) if speed > 0 => speed,
        _ if grid.is_adjacent_to(start, Terrain::Ice) => 0,
        _ => return Exploration::default(),
    };
    search(grid, start, Mode::Bounded(budget), target)
}

pub fn reachable_tiles(grid: &Grid, start: Position, speed: u32) -> Vec<Position> {
    explore(grid, start, Some(speed), None).reachable
}

pub fn find_path(grid: &Grid, start: Position, speed: u32, target: Position) -> Option<Path> {
    explore(grid, start, Some(speed), Some(target)).path
}

/// Cheapest path ignoring the speed budget. Closed doors are treated as
/// passable and the target itself may be occupied, so any player or item
/// not walled off can be reached eventually.
pub fn find_path_unbounded(grid: &Grid, start: Position, target: Position) -> Option<Path> {
    search(grid, start, Mode::Unbounded, Some(target)).path
}

fn step_cost(grid: &Grid, next: Position, mode: Mode, target: Option<Position>) -> Option<u32> {
    let cell = grid.cell(next)?;
    let unbounded = matches!(mode, Mode::Unbounded);
    if cell.occupant.is_some() && !(unbounded && Some(next) == target) {
        return None;
    }
    match cell.terrain {
        Terrain::Door if unbounded => Some(DEFAULT_TILE_COST),
        terrain => tile_cost(terrain),
    }
}

fn search(grid: &Grid, start: Position, mode: Mode, target: Option<Position>) -> Exploration {
    let budget = match mode {
        Mode::Bounded(budget) => budget,
        Mode::Unbounded => u32::MAX,
    };

    let mut frontier = BinaryHeap::new();
    let mut visited = HashSet::new();
    let mut exploration = Exploration::default();

    frontier.push(Node { cost: 0, turns: 0, position: start, direction: None, path: vec![start] });

    while let Some(node) = frontier.pop() {
        if !visited.insert(node.position) {
            continue;
        }
        if node.position != start {
            exploration.reachable.push(node.position);
        }
        if Some(node.position) == target && exploration.path.is_none() {
            exploration.path = Some(Path {
                positions: node.path.clone(),
                cost: node.cost,
                turns: node.turns,
            });
            if matches!(mode, Mode::Unbounded) {
                break;
            }
        }
        if node.position != start && grid.is_occupied(node.position) {
            continue;
        }

        for next in node.position.neighbors(grid.size()) {
            if visited.contains(&next) {
                continue;
            }
            let Some(cost) = step_cost(grid, next, mode, target) else {
                continue;
            };
            let total = node.cost.saturating_add(cost);
            if total > budget {
                continue;
            }
            let direction = Direction::between(node.position, next);
            let turned = node.direction.is_some() && node.direction != direction;
            let mut path = node.path.clone();
            path.push(next);
            frontier.push(Node {
                cost: total,
                turns: node.turns + u32::from(turned),
                position: next,
                direction,
                path,
            });
        }
    }

    exploration
}
