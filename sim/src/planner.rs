//! Path planner - weighted A* over the 4-connected grid.
//!
//! One planner covers both modes of play:
//!
//! - **Basic**: every step costs 1 and the heuristic is the Manhattan
//!   distance, so returned paths are shortest paths.
//! - **Cost-aware** (`penalty_enabled`): stepping onto a penalty cell costs
//!   [`PENALTY_STEP_COST`], and the heuristic adds [`PENALTY_HEURISTIC_BONUS`]
//!   when the cell being scored is itself a penalty cell. The bonus makes the
//!   heuristic inadmissible on purpose: it steers the agent away from
//!   obstacle-adjacent cells before they become blocking. Paths in this mode
//!   are not guaranteed to be minimal-cost.
//!
//! ## Tie-breaking
//!
//! The open set is a min-heap keyed on `(priority, cell)`. Equal priorities
//! pop in lexicographic `(row, col)` order, so searches are reproducible.
//!
//! ## Tracing
//!
//! The search performs no I/O. Expansion and update events are reported to a
//! [`PlannerObserver`]; [`TracingObserver`] forwards them to `tracing`.

use crate::components::Cell;
use crate::grid::GameMap;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// Cost of stepping onto a penalty cell in cost-aware mode.
pub const PENALTY_STEP_COST: u32 = 2;

/// Heuristic bias added for penalty cells in cost-aware mode.
pub const PENALTY_HEURISTIC_BONUS: u32 = 5;

/// Planner mode selection.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Charge extra for penalty cells and bias the heuristic away from them.
    pub penalty_enabled: bool,
}

// ============================================================================
// OBSERVER
// ============================================================================

/// Hooks invoked while a search runs. All methods default to no-ops.
pub trait PlannerObserver {
    fn on_search_start(&mut self, _start: Cell, _goal: Cell) {}
    /// A cell was popped from the open set.
    fn on_expand(&mut self, _cell: Cell) {}
    /// A walkable neighbour was costed.
    fn on_evaluate(&mut self, _cell: Cell, _cost: u32) {}
    /// A neighbour got a better cost and was pushed.
    fn on_update(&mut self, _cell: Cell, _priority: u32) {}
    fn on_path_found(&mut self, _path: &[Cell]) {}
    fn on_no_path(&mut self) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PlannerObserver for NoopObserver {}

/// Observer that emits `tracing` events using board labels (`A1`, `C10`).
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PlannerObserver for TracingObserver {
    fn on_search_start(&mut self, start: Cell, goal: Cell) {
        tracing::debug!(start = %start.label(), goal = %goal.label(), "search started");
    }

    fn on_expand(&mut self, cell: Cell) {
        tracing::trace!(cell = %cell.label(), "expanding");
    }

    fn on_evaluate(&mut self, cell: Cell, cost: u32) {
        tracing::trace!(cell = %cell.label(), cost, "evaluating neighbour");
    }

    fn on_update(&mut self, cell: Cell, priority: u32) {
        tracing::trace!(cell = %cell.label(), priority, "updated");
    }

    fn on_path_found(&mut self, path: &[Cell]) {
        let labels: Vec<String> = path.iter().map(Cell::label).collect();
        tracing::debug!(len = path.len(), path = ?labels, "path found");
    }

    fn on_no_path(&mut self) {
        tracing::debug!("no path to goal");
    }
}

// ============================================================================
// RESULTS
// ============================================================================

/// Search effort counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStats {
    /// Entries popped from the open set.
    pub expanded: u32,
    /// Entries pushed onto the open set, the start included.
    pub pushed: u32,
}

/// Result of a search. Failing to find a path is an outcome, not an error:
/// obstacles keep moving, so the caller may simply retry next tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanOutcome {
    /// Cells from (excluding) the start to (including) the goal.
    Found(Vec<Cell>),
    NoPath,
}

impl PlanOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, PlanOutcome::Found(_))
    }

    pub fn path(&self) -> Option<&[Cell]> {
        match self {
            PlanOutcome::Found(path) => Some(path),
            PlanOutcome::NoPath => None,
        }
    }

    pub fn into_path(self) -> Option<Vec<Cell>> {
        match self {
            PlanOutcome::Found(path) => Some(path),
            PlanOutcome::NoPath => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanResult {
    pub outcome: PlanOutcome,
    pub stats: PlanStats,
}

// ============================================================================
// PLANNER
// ============================================================================

/// Weighted A* planner.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathPlanner {
    config: PlannerConfig,
}

impl PathPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    /// Planner for the basic (unweighted) mode.
    pub fn basic() -> Self {
        Self::new(PlannerConfig { penalty_enabled: false })
    }

    /// Planner for the cost-aware mode.
    pub fn cost_aware() -> Self {
        Self::new(PlannerConfig { penalty_enabled: true })
    }

    pub fn config(&self) -> PlannerConfig {
        self.config
    }

    /// Cost of stepping onto `cell`. Occupied cells are never stepped onto.
    #[inline]
    pub fn step_cost(&self, map: &GameMap, cell: Cell) -> u32 {
        if self.config.penalty_enabled && map.is_penalty(cell) {
            PENALTY_STEP_COST
        } else {
            1
        }
    }

    /// Estimated remaining cost from `cell` to `goal`.
    #[inline]
    pub fn heuristic(&self, map: &GameMap, cell: Cell, goal: Cell) -> u32 {
        let distance = cell.manhattan(&goal);
        if self.config.penalty_enabled && map.is_penalty(cell) {
            distance + PENALTY_HEURISTIC_BONUS
        } else {
            distance
        }
    }

    /// Search without tracing.
    pub fn plan(&self, map: &GameMap, start: Cell, goal: Cell) -> PlanResult {
        self.plan_observed(map, start, goal, &mut NoopObserver)
    }

    /// Search from `start` to `goal` against `map`, reporting progress to
    /// `observer`.
    pub fn plan_observed(
        &self,
        map: &GameMap,
        start: Cell,
        goal: Cell,
        observer: &mut dyn PlannerObserver,
    ) -> PlanResult {
        let mut stats = PlanStats::default();

        if start == goal {
            observer.on_path_found(&[]);
            return PlanResult {
                outcome: PlanOutcome::Found(Vec::new()),
                stats,
            };
        }
        if !map.contains(start) || !map.contains(goal) {
            observer.on_no_path();
            return PlanResult {
                outcome: PlanOutcome::NoPath,
                stats,
            };
        }

        observer.on_search_start(start, goal);

        let dims = map.dims();
        let mut open: BinaryHeap<Reverse<(u32, Cell)>> = BinaryHeap::new();
        let mut cost_so_far: HashMap<Cell, u32> = HashMap::new();
        let mut came_from: HashMap<Cell, Option<Cell>> = HashMap::new();

        open.push(Reverse((0, start)));
        stats.pushed += 1;
        cost_so_far.insert(start, 0);
        came_from.insert(start, None);

        while let Some(Reverse((_, current))) = open.pop() {
            stats.expanded += 1;
            observer.on_expand(current);

            if current == goal {
                let path = reconstruct_path(&came_from, start, goal);
                observer.on_path_found(&path);
                return PlanResult {
                    outcome: PlanOutcome::Found(path),
                    stats,
                };
            }

            let current_cost = cost_so_far.get(&current).copied().unwrap_or(0);
            for next in current.neighbors(dims) {
                if map.is_blocked(next) {
                    continue;
                }

                let new_cost = current_cost + self.step_cost(map, next);
                observer.on_evaluate(next, new_cost);

                let improved = cost_so_far
                    .get(&next)
                    .map_or(true, |&known| new_cost < known);
                if improved {
                    cost_so_far.insert(next, new_cost);
                    let priority = new_cost + self.heuristic(map, next, goal);
                    open.push(Reverse((priority, next)));
                    stats.pushed += 1;
                    came_from.insert(next, Some(current));
                    observer.on_update(next, priority);
                }
            }
        }

        observer.on_no_path();
        PlanResult {
            outcome: PlanOutcome::NoPath,
            stats,
        }
    }
}

/// Walk `came_from` back from `goal` and return the path in start-to-goal
/// order, the start itself excluded.
pub fn reconstruct_path(
    came_from: &HashMap<Cell, Option<Cell>>,
    start: Cell,
    goal: Cell,
) -> Vec<Cell> {
    let mut path = Vec::new();
    let mut current = goal;
    while current != start {
        path.push(current);
        match came_from.get(&current).copied().flatten() {
            Some(previous) => current = previous,
            None => break,
        }
    }
    path.reverse();
    path
}

/// Cost of walking `path` from `start` on `map`.
///
/// Returns `None` when the path is not contiguous, leaves the grid or crosses
/// an occupied cell.
pub fn path_cost(map: &GameMap, start: Cell, path: &[Cell], penalty_enabled: bool) -> Option<u32> {
    let planner = PathPlanner::new(PlannerConfig { penalty_enabled });
    let mut previous = start;
    let mut total = 0;
    for &cell in path {
        if !previous.is_adjacent(&cell) || !map.is_walkable(cell) {
            return None;
        }
        total += planner.step_cost(map, cell);
        previous = cell;
    }
    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Direction, GridDims, Obstacle};
    use crate::grid::{build_cost_map, CellState};

    fn assert_contiguous(start: Cell, path: &[Cell]) {
        let mut previous = start;
        for cell in path {
            assert!(previous.is_adjacent(cell), "{previous} -> {cell} is not a unit step");
            previous = *cell;
        }
    }

    #[derive(Default)]
    struct Recorder {
        expanded: Vec<Cell>,
        updates: usize,
        found: Option<usize>,
        no_path: bool,
    }

    impl PlannerObserver for Recorder {
        fn on_expand(&mut self, cell: Cell) {
            self.expanded.push(cell);
        }
        fn on_update(&mut self, _cell: Cell, _priority: u32) {
            self.updates += 1;
        }
        fn on_path_found(&mut self, path: &[Cell]) {
            self.found = Some(path.len());
        }
        fn on_no_path(&mut self) {
            self.no_path = true;
        }
    }

    #[test]
    fn test_open_grid_path_length_is_manhattan() {
        let dims = GridDims::new(6, 7);
        let map = GameMap::new(dims);
        let planner = PathPlanner::basic();

        for start_row in 0..dims.rows {
            for start_col in 0..dims.cols {
                let start = Cell::new(start_row, start_col);
                for goal in [Cell::new(0, 0), Cell::new(5, 6), Cell::new(2, 3)] {
                    let path = planner.plan(&map, start, goal).outcome.into_path().unwrap();
                    assert_eq!(path.len() as u32, start.manhattan(&goal));
                    assert_contiguous(start, &path);
                    if start != goal {
                        assert_eq!(path.last(), Some(&goal));
                    }
                }
            }
        }
    }

    #[test]
    fn test_start_equals_goal_returns_empty_without_search() {
        let map = GameMap::new(GridDims::new(5, 5));
        let mut recorder = Recorder::default();
        let result = PathPlanner::cost_aware().plan_observed(
            &map,
            Cell::new(2, 2),
            Cell::new(2, 2),
            &mut recorder,
        );
        assert_eq!(result.outcome, PlanOutcome::Found(Vec::new()));
        assert_eq!(result.stats, PlanStats::default());
        assert!(recorder.expanded.is_empty());
    }

    #[test]
    fn test_path_avoids_occupied_cells() {
        let dims = GridDims::new(5, 5);
        let mut map = GameMap::new(dims);
        for col in 0..4 {
            map.set(Cell::new(2, col), CellState::Occupied);
        }
        let start = Cell::new(4, 0);
        let goal = Cell::new(0, 0);

        let path = PathPlanner::basic().plan(&map, start, goal).outcome.into_path().unwrap();
        assert!(path.iter().all(|c| !map.is_blocked(*c)));
        assert!(path.contains(&Cell::new(2, 4)));
        assert_contiguous(start, &path);
        assert_eq!(path.len(), 12);
    }

    #[test]
    fn test_walled_off_goal_reports_no_path() {
        let dims = GridDims::new(4, 4);
        let mut map = GameMap::new(dims);
        for col in 0..4 {
            map.set(Cell::new(1, col), CellState::Occupied);
        }
        let mut recorder = Recorder::default();
        let result = PathPlanner::basic().plan_observed(
            &map,
            Cell::new(3, 0),
            Cell::new(0, 3),
            &mut recorder,
        );
        assert_eq!(result.outcome, PlanOutcome::NoPath);
        assert!(recorder.no_path);
        // Every cell below the wall gets expanded before the search gives up.
        let expanded: std::collections::HashSet<_> = recorder.expanded.iter().copied().collect();
        assert_eq!(expanded.len(), 8);
        assert!(expanded.iter().all(|c| c.row >= 2));
        assert!(result.stats.expanded >= 8);
    }

    #[test]
    fn test_occupied_goal_is_unreachable() {
        let mut map = GameMap::new(GridDims::new(3, 3));
        map.set(Cell::new(0, 1), CellState::Occupied);
        let result = PathPlanner::basic().plan(&map, Cell::new(2, 1), Cell::new(0, 1));
        assert!(!result.outcome.is_found());
    }

    #[test]
    fn test_out_of_bounds_endpoints_report_no_path() {
        let map = GameMap::new(GridDims::new(3, 3));
        let result = PathPlanner::basic().plan(&map, Cell::new(0, 0), Cell::new(3, 0));
        assert_eq!(result.outcome, PlanOutcome::NoPath);
    }

    #[test]
    fn test_ties_break_in_lexicographic_cell_order() {
        // From (1,1) to (0,0) both (0,1) and (1,0) have priority 2; (0,1)
        // sorts first and is expanded first.
        let map = GameMap::new(GridDims::new(3, 3));
        let mut recorder = Recorder::default();
        let path = PathPlanner::basic()
            .plan_observed(&map, Cell::new(1, 1), Cell::new(0, 0), &mut recorder)
            .outcome
            .into_path()
            .unwrap();
        assert_eq!(recorder.expanded[1], Cell::new(0, 1));
        assert_eq!(path, vec![Cell::new(0, 1), Cell::new(0, 0)]);
    }

    #[test]
    fn test_search_is_reproducible() {
        let dims = GridDims::new(12, 12);
        let obstacles = [
            Obstacle::new(3, 4, Direction::Right, 1),
            Obstacle::new(5, 6, Direction::Left, 1),
            Obstacle::new(7, 2, Direction::Right, 1),
        ];
        let map = build_cost_map(&obstacles, dims, true);
        let planner = PathPlanner::cost_aware();
        let first = planner.plan(&map, Cell::new(11, 5), Cell::new(0, 7));
        let second = planner.plan(&map, Cell::new(11, 5), Cell::new(0, 7));
        assert_eq!(first, second);
    }

    #[test]
    fn test_cost_aware_mode_prefers_to_skirt_penalty_cells() {
        // A single obstacle directly between start and goal: the basic
        // planner hugs it, the cost-aware planner keeps its distance.
        let dims = GridDims::new(7, 7);
        let obstacles = [Obstacle::new(3, 3, Direction::Right, 1)];
        let start = Cell::new(6, 3);
        let goal = Cell::new(0, 3);

        let basic_map = build_cost_map(&obstacles, dims, false);
        let basic = PathPlanner::basic().plan(&basic_map, start, goal).outcome.into_path().unwrap();
        assert_eq!(basic.len(), 8);

        let weighted_map = build_cost_map(&obstacles, dims, true);
        let weighted = PathPlanner::cost_aware()
            .plan(&weighted_map, start, goal)
            .outcome
            .into_path()
            .unwrap();
        assert_contiguous(start, &weighted);
        assert!(weighted.iter().all(|c| !weighted_map.is_blocked(*c)));
        let penalty_steps = weighted.iter().filter(|c| weighted_map.is_penalty(**c)).count();
        let basic_penalty_steps = basic.iter().filter(|c| weighted_map.is_penalty(**c)).count();
        assert!(penalty_steps < basic_penalty_steps);
    }

    #[test]
    fn test_step_cost_and_heuristic_bias() {
        let dims = GridDims::new(3, 3);
        let obstacles = [Obstacle::new(1, 1, Direction::Right, 1)];
        let map = build_cost_map(&obstacles, dims, true);
        let penalty_cell = Cell::new(0, 1);
        let free_cell = Cell::new(0, 0);
        let goal = Cell::new(0, 2);

        let weighted = PathPlanner::cost_aware();
        assert_eq!(weighted.step_cost(&map, penalty_cell), PENALTY_STEP_COST);
        assert_eq!(weighted.step_cost(&map, free_cell), 1);
        assert_eq!(weighted.heuristic(&map, penalty_cell, goal), 1 + PENALTY_HEURISTIC_BONUS);
        assert_eq!(weighted.heuristic(&map, free_cell, goal), 2);

        let basic = PathPlanner::basic();
        assert_eq!(basic.step_cost(&map, penalty_cell), 1);
        assert_eq!(basic.heuristic(&map, penalty_cell, goal), 1);
    }

    #[test]
    fn test_observer_sees_expansions_and_result() {
        let map = GameMap::new(GridDims::new(4, 4));
        let mut recorder = Recorder::default();
        let result =
            PathPlanner::basic().plan_observed(&map, Cell::new(3, 0), Cell::new(0, 0), &mut recorder);
        assert_eq!(recorder.found, Some(3));
        assert_eq!(recorder.expanded.len() as u32, result.stats.expanded);
        assert_eq!(recorder.updates as u32 + 1, result.stats.pushed);
        assert_eq!(recorder.expanded.last(), Some(&Cell::new(0, 0)));
    }

    #[test]
    fn test_path_cost_reevaluation() {
        let dims = GridDims::new(3, 3);
        let obstacles = [Obstacle::new(1, 1, Direction::Right, 1)];
        let map = build_cost_map(&obstacles, dims, true);
        let start = Cell::new(2, 0);
        let around = [Cell::new(1, 0), Cell::new(0, 0), Cell::new(0, 1)];

        assert_eq!(path_cost(&map, start, &around, false), Some(3));
        // (1,0) and (0,1) are penalty cells.
        assert_eq!(path_cost(&map, start, &around, true), Some(5));

        let through = [Cell::new(2, 1), Cell::new(1, 1)];
        assert_eq!(path_cost(&map, start, &through, false), None);

        let jump = [Cell::new(0, 0)];
        assert_eq!(path_cost(&map, start, &jump, false), None);
    }

    #[test]
    fn test_reconstruct_path_excludes_start() {
        let a = Cell::new(2, 0);
        let b = Cell::new(1, 0);
        let c = Cell::new(0, 0);
        let came_from = HashMap::from([(a, None), (b, Some(a)), (c, Some(b))]);
        assert_eq!(reconstruct_path(&came_from, a, c), vec![b, c]);
        assert!(reconstruct_path(&came_from, a, a).is_empty());
    }
}
