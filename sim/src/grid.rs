//! Grid world - the per-tick occupancy and cost map.
//!
//! The map is a row-major grid of cell states derived from the current
//! obstacle positions. It is rebuilt from scratch every tick: obstacles move
//! every tick and the board is small, so there is no incremental update.

use crate::components::{Cell, GridDims, Obstacle};
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Traversal state of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CellState {
    /// Open ground.
    #[default]
    Free,
    /// An obstacle stands here. Blocking.
    Occupied,
    /// Next to an obstacle. Passable at a higher cost.
    Penalty,
}

impl CellState {
    /// Numeric cell code: 0 = free, 1 = occupied, 2 = penalty.
    pub fn code(&self) -> u8 {
        match self {
            CellState::Free => 0,
            CellState::Occupied => 1,
            CellState::Penalty => 2,
        }
    }
}

/// Occupancy/cost map for one tick.
#[derive(Resource, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMap {
    dims: GridDims,
    /// Grid cells (row-major order).
    cells: Vec<CellState>,
}

impl GameMap {
    /// An all-free map.
    pub fn new(dims: GridDims) -> Self {
        Self {
            dims,
            cells: vec![CellState::Free; dims.cell_count()],
        }
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    pub fn rows(&self) -> usize {
        self.dims.rows
    }

    pub fn cols(&self) -> usize {
        self.dims.cols
    }

    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        self.dims.contains(cell)
    }

    /// State at a cell, `None` when out of bounds.
    #[inline]
    pub fn get(&self, cell: Cell) -> Option<CellState> {
        self.dims.index(cell).map(|i| self.cells[i])
    }

    /// Overwrite a cell. Out-of-bounds writes are ignored.
    pub fn set(&mut self, cell: Cell, state: CellState) {
        if let Some(i) = self.dims.index(cell) {
            self.cells[i] = state;
        }
    }

    #[inline]
    pub fn is_blocked(&self, cell: Cell) -> bool {
        self.get(cell) == Some(CellState::Occupied)
    }

    #[inline]
    pub fn is_penalty(&self, cell: Cell) -> bool {
        self.get(cell) == Some(CellState::Penalty)
    }

    /// In bounds and not occupied.
    #[inline]
    pub fn is_walkable(&self, cell: Cell) -> bool {
        matches!(self.get(cell), Some(CellState::Free | CellState::Penalty))
    }

    /// All occupied cells in row-major order.
    pub fn occupied_cells(&self) -> Vec<Cell> {
        self.cells_in_state(CellState::Occupied)
    }

    /// All penalty cells in row-major order.
    pub fn penalty_cells(&self) -> Vec<Cell> {
        self.cells_in_state(CellState::Penalty)
    }

    fn cells_in_state(&self, state: CellState) -> Vec<Cell> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == state)
            .map(|(i, _)| Cell::new(i / self.dims.cols, i % self.dims.cols))
            .collect()
    }

    /// The map as rows of numeric cell codes.
    pub fn to_codes(&self) -> Vec<Vec<u8>> {
        if self.dims.cols == 0 {
            return Vec::new();
        }
        self.cells
            .chunks(self.dims.cols)
            .map(|row| row.iter().map(CellState::code).collect())
            .collect()
    }
}

/// Derive the map for the current obstacle positions.
///
/// Every obstacle cell is marked occupied. With `penalty_enabled`, the
/// in-bounds 4-neighbours of each obstacle are marked as penalty cells unless
/// they are occupied; occupied always wins regardless of obstacle order.
pub fn build_cost_map<'a>(
    obstacles: impl IntoIterator<Item = &'a Obstacle>,
    dims: GridDims,
    penalty_enabled: bool,
) -> GameMap {
    let mut map = GameMap::new(dims);
    let occupied: Vec<Cell> = obstacles
        .into_iter()
        .map(Obstacle::cell)
        .filter(|cell| dims.contains(*cell))
        .collect();

    for &cell in &occupied {
        map.set(cell, CellState::Occupied);
    }

    if penalty_enabled {
        for &cell in &occupied {
            for neighbor in cell.neighbors(dims) {
                if !map.is_blocked(neighbor) {
                    map.set(neighbor, CellState::Penalty);
                }
            }
        }
    }

    map
}
