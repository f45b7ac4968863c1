//! Components and resources for the Crossing simulation.
//!
//! Cells and grid dimensions are plain value types shared by every module.
//! Obstacles are ECS components; the agent, its path, the goal and the run
//! status are resources owned by the `SimWorld`.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

// ============================================================================
// GRID TYPES
// ============================================================================

/// A logical grid cell. Row 0 is the top of the board.
///
/// Ordering is lexicographic (row, then column). The planner relies on this
/// ordering to break priority ties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Manhattan distance between two cells.
    pub fn manhattan(&self, other: &Cell) -> u32 {
        (self.row.abs_diff(other.row) + self.col.abs_diff(other.col)) as u32
    }

    /// True when the cells share an edge.
    pub fn is_adjacent(&self, other: &Cell) -> bool {
        self.manhattan(other) == 1
    }

    /// In-bounds 4-neighbours, in up, down, left, right order.
    pub fn neighbors(self, dims: GridDims) -> impl Iterator<Item = Cell> {
        const OFFSETS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
        OFFSETS.into_iter().filter_map(move |(dr, dc)| {
            let row = self.row.checked_add_signed(dr)?;
            let col = self.col.checked_add_signed(dc)?;
            let cell = Cell::new(row, col);
            dims.contains(cell).then_some(cell)
        })
    }

    /// Board name of the cell: row letters followed by the 1-based column,
    /// e.g. `A1`, `C10`, `AB3`.
    pub fn label(&self) -> String {
        format!("{}{}", row_label(self.row), self.col + 1)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Spreadsheet-style row letters: 0 -> `A`, 25 -> `Z`, 26 -> `AA`.
pub fn row_label(row: usize) -> String {
    let mut letters = Vec::new();
    let mut n = row + 1;
    while n > 0 {
        n -= 1;
        letters.push((b'A' + (n % 26) as u8) as char);
        n /= 26;
    }
    letters.iter().rev().collect()
}

/// Logical size of the board in cells.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDims {
    pub rows: usize,
    pub cols: usize,
}

impl GridDims {
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.rows && cell.col < self.cols
    }

    /// Row-major index of a cell, or `None` when out of bounds.
    #[inline]
    pub fn index(&self, cell: Cell) -> Option<usize> {
        self.contains(cell).then(|| cell.row * self.cols + cell.col)
    }

    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }
}

// ============================================================================
// OBSTACLE COMPONENTS
// ============================================================================

/// Horizontal travel direction of an obstacle lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    /// Column delta per unit of speed.
    pub fn sign(&self) -> i64 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
        }
    }

    /// Direction of a lane in the alternating layout: rows with
    /// `row % 4 == 1` run right, the others run left.
    pub fn for_lane(row: usize) -> Self {
        if row % 4 == 1 {
            Direction::Right
        } else {
            Direction::Left
        }
    }
}

/// Stable identifier for an obstacle, used to order snapshots.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObstacleId(pub u32);

/// A moving obstacle. The row never changes; the column wraps around the
/// board every tick.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obstacle {
    pub row: usize,
    pub col: usize,
    pub direction: Direction,
    /// Columns travelled per tick.
    pub speed: u32,
}

impl Obstacle {
    pub fn new(row: usize, col: usize, direction: Direction, speed: u32) -> Self {
        Self { row, col, direction, speed }
    }

    pub fn cell(&self) -> Cell {
        Cell::new(self.row, self.col)
    }

    /// Move one tick along the lane, wrapping into `[0, cols)`.
    pub fn advance(&mut self, cols: usize) {
        if cols == 0 {
            return;
        }
        let delta = self.direction.sign() * i64::from(self.speed);
        self.col = (self.col as i64 + delta).rem_euclid(cols as i64) as usize;
    }
}

// ============================================================================
// AGENT RESOURCES
// ============================================================================

/// The autonomous agent: where it stands and the path it is following.
#[derive(Resource, Debug, Clone, Default)]
pub struct AgentState {
    pub cell: Cell,
    /// Remaining path, start excluded, goal included. `None` until planned
    /// or after a failed plan.
    pub path: Option<VecDeque<Cell>>,
    /// Cells moved since the run started.
    pub steps: u32,
    /// Successful plans since the run started.
    pub replans: u32,
    /// Planning failures since the last successful plan.
    pub consecutive_failures: u32,
}

impl AgentState {
    pub fn new(cell: Cell) -> Self {
        Self {
            cell,
            ..Default::default()
        }
    }

    /// Remaining path cells as a vector (empty when no path is held).
    pub fn remaining_path(&self) -> Vec<Cell> {
        self.path
            .as_ref()
            .map(|p| p.iter().copied().collect())
            .unwrap_or_default()
    }
}

/// The fixed destination of the run.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Goal(pub Cell);

/// Lifecycle of a run.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunStatus {
    /// Agent is following a path.
    #[default]
    Running,
    /// Last replan found no path; the agent waits for obstacles to move.
    Stalled { failures: u32 },
    /// Agent stepped onto the goal.
    GoalReached,
    /// Agent's cell was occupied by an obstacle.
    Destroyed,
    /// Replanning failed more often than the configured budget allows.
    Unreachable,
}

impl RunStatus {
    /// Terminal runs freeze: no further movement, only rendering and quit.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::GoalReached | RunStatus::Destroyed | RunStatus::Unreachable
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            RunStatus::Running => "Running",
            RunStatus::Stalled { .. } => "Stalled",
            RunStatus::GoalReached => "GoalReached",
            RunStatus::Destroyed => "Destroyed",
            RunStatus::Unreachable => "Unreachable",
        }
    }
}

/// Global simulation tick counter.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct SimTick(pub u64);

impl SimTick {
    pub fn increment(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbors_respect_bounds_and_order() {
        let dims = GridDims::new(3, 3);
        let corner: Vec<_> = Cell::new(0, 0).neighbors(dims).collect();
        assert_eq!(corner, vec![Cell::new(1, 0), Cell::new(0, 1)]);

        let center: Vec<_> = Cell::new(1, 1).neighbors(dims).collect();
        assert_eq!(
            center,
            vec![Cell::new(0, 1), Cell::new(2, 1), Cell::new(1, 0), Cell::new(1, 2)]
        );
    }

    #[test]
    fn test_cell_labels() {
        assert_eq!(Cell::new(0, 0).label(), "A1");
        assert_eq!(Cell::new(2, 9).label(), "C10");
        assert_eq!(Cell::new(25, 0).label(), "Z1");
        assert_eq!(Cell::new(26, 2).label(), "AA3");
        assert_eq!(Cell::new(27, 27).label(), "AB28");
    }

    #[test]
    fn test_obstacle_wraps_both_directions() {
        let mut right = Obstacle::new(1, 9, Direction::Right, 1);
        right.advance(10);
        assert_eq!(right.col, 0);

        let mut left = Obstacle::new(3, 0, Direction::Left, 3);
        left.advance(10);
        assert_eq!(left.col, 7);
    }

    #[test]
    fn test_cell_ordering_is_row_major() {
        assert!(Cell::new(0, 9) < Cell::new(1, 0));
        assert!(Cell::new(2, 1) < Cell::new(2, 3));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!RunStatus::Running.is_terminal());
        assert!(!RunStatus::Stalled { failures: 3 }.is_terminal());
        assert!(RunStatus::GoalReached.is_terminal());
        assert!(RunStatus::Destroyed.is_terminal());
        assert!(RunStatus::Unreachable.is_terminal());
    }
}
