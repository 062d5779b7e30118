//! Board representation.
//!
//! The grid is a flat arena of cells addressed by `y * size + x`. It is owned by
//! the room and mutated in place; players are referenced by id from the cells.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Serialize, Deserialize};

use crate::config::game::{MAX_GRID_SIZE, MIN_GRID_SIZE};
use crate::game::error::GameError;
use crate::game::types::{Item, PlayerId, Position, Terrain};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Cell {
    pub terrain: Terrain,
    pub item: Option<Item>,
    pub occupant: Option<PlayerId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacedItem {
    pub position: Position,
    pub item: Item,
}

/// Map definition a room is created from. Loading and storing templates is
/// left to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapTemplate {
    pub size: usize,
    /// Row-major terrain, `terrain[y][x]`.
    pub terrain: Vec<Vec<Terrain>>,
    pub items: Vec<PlacedItem>,
}

impl MapTemplate {
    /// Plain board of default tiles with starting points in the corners.
    pub fn open_field(size: usize) -> Self {
        let last = size.saturating_sub(1);
        let corners = [(0, 0), (last, last), (last, 0), (0, last)];
        Self {
            size,
            terrain: vec![vec![Terrain::Default; size]; size],
            items: corners
                .iter()
                .map(|&(x, y)| PlacedItem { position: Position::new(x, y), item: Item::StartingPoint })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    size: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Empty board of default tiles.
    pub fn new(size: usize) -> Self {
        Self { size, cells: vec![Cell::default(); size * size] }
    }

    pub fn from_template(template: &MapTemplate) -> Result<Self, GameError> {
        let size = template.size;
        if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&size) {
            return Err(GameError::InvalidMap(format!("unsupported size {}", size)));
        }
        if template.terrain.len() != size || template.terrain.iter().any(|row| row.len() != size) {
            return Err(GameError::InvalidMap("terrain is not a square of the declared size".into()));
        }

        let mut grid = Grid::new(size);
        for (y, row) in template.terrain.iter().enumerate() {
            for (x, terrain) in row.iter().enumerate() {
                grid.cells[y * size + x].terrain = *terrain;
            }
        }
        for placed in &template.items {
            let cell = grid
                .cell_mut(placed.position)
                .ok_or_else(|| GameError::InvalidMap(format!("item outside the board at {:?}", placed.position)))?;
            if matches!(cell.terrain, Terrain::Wall | Terrain::Door | Terrain::OpenedDoor) {
                return Err(GameError::InvalidMap(format!("item on a wall or door at {:?}", placed.position)));
            }
            cell.item = Some(placed.item);
        }
        Ok(grid)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x < self.size && pos.y < self.size
    }

    fn index(&self, pos: Position) -> Option<usize> {
        self.in_bounds(pos).then(|| pos.y * self.size + pos.x)
    }

    pub fn cell(&self, pos: Position) -> Option<&Cell> {
        self.index(pos).map(|idx| &self.cells[idx])
    }

    pub fn cell_mut(&mut self, pos: Position) -> Option<&mut Cell> {
        self.index(pos).map(move |idx| &mut self.cells[idx])
    }

    pub fn terrain(&self, pos: Position) -> Option<Terrain> {
        self.cell(pos).map(|cell| cell.terrain)
    }

    pub fn is_occupied(&self, pos: Position) -> bool {
        self.cell(pos).is_some_and(|cell| cell.occupant.is_some())
    }

    /// Whether a player could stand on the tile right now.
    pub fn is_free(&self, pos: Position) -> bool {
        self.cell(pos).is_some_and(|cell| {
            cell.occupant.is_none() && !matches!(cell.terrain, Terrain::Wall | Terrain::Door)
        })
    }

    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.size).flat_map(move |y| (0..self.size).map(move |x| Position::new(x, y)))
    }

    pub fn is_adjacent_to(&self, pos: Position, terrain: Terrain) -> bool {
        pos.neighbors(self.size).into_iter().any(|n| self.terrain(n) == Some(terrain))
    }

    pub fn item_positions(&self, wanted: impl Fn(Item) -> bool) -> Vec<Position> {
        self.positions()
            .filter(|pos| self.cell(*pos).and_then(|c| c.item).is_some_and(&wanted))
            .collect()
    }

    pub fn set_occupant(&mut self, pos: Position, occupant: Option<PlayerId>) {
        if let Some(cell) = self.cell_mut(pos) {
            cell.occupant = occupant;
        }
    }

    pub fn take_item(&mut self, pos: Position) -> Option<Item> {
        self.cell_mut(pos).and_then(|cell| cell.item.take())
    }

    /// Nearest free tile without an item, searching outward from `origin`
    /// (the origin itself included).
    pub fn nearest_free_empty_tile(&self, origin: Position) -> Option<Position> {
        let mut candidates: Vec<Position> = self
            .positions()
            .filter(|pos| {
                self.is_free(*pos) && self.cell(*pos).is_some_and(|c| c.item.is_none())
            })
            .collect();
        candidates.sort_by_key(|pos| (pos.manhattan(&origin), pos.y, pos.x));
        candidates.into_iter().next()
    }

    /// Replace every `Random` placeholder with a collectible not already on
    /// the board. Placeholders left without a candidate are removed.
    pub fn resolve_random_items<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let present: Vec<Item> = self.cells.iter().filter_map(|c| c.item).collect();
        let mut pool: Vec<Item> = Item::COLLECTIBLES
            .iter()
            .copied()
            .filter(|item| !present.contains(item))
            .collect();
        pool.shuffle(rng);
        for cell in self.cells.iter_mut().filter(|c| c.item == Some(Item::Random)) {
            cell.item = pool.pop();
        }
    }

    /// Copy terrain and items from another board of the same size, keeping
    /// this board's occupants. Occupied tiles must stay walkable and the
    /// patch may hold at most one flag; otherwise nothing is changed.
    pub fn apply_patch(&mut self, patch: &Grid) -> Result<(), GameError> {
        if patch.size != self.size || patch.cells.len() != self.cells.len() {
            return Err(GameError::InvalidMap(format!(
                "patch size {} does not match board size {}",
                patch.size, self.size
            )));
        }
        for (idx, (cell, patched)) in self.cells.iter().zip(&patch.cells).enumerate() {
            if cell.occupant.is_some() && matches!(patched.terrain, Terrain::Wall | Terrain::Door) {
                let pos = Position::new(idx % self.size, idx / self.size);
                return Err(GameError::InvalidMap(format!("occupied tile {pos:?} would be blocked")));
            }
        }
        if patch.item_positions(|i| i == Item::Flag).len() > 1 {
            return Err(GameError::InvalidMap("more than one flag".into()));
        }
        for (cell, patched) in self.cells.iter_mut().zip(&patch.cells) {
            cell.terrain = patched.terrain;
            cell.item = patched.item;
        }
        Ok(())
    }
}
