//! Simulation configuration.
//!
//! Defaults reproduce the classic board: a 1300 px window of 45 px tiles
//! (28 x 28 cells), five ticks per second, penalty-aware planning and the
//! alternating obstacle lanes. Any field can be overridden from JSON; missing
//! fields keep their defaults.

use crate::components::{Cell, GridDims, Obstacle};
use crate::error::{Result, SimError};
use crate::planner::PlannerConfig;
use crate::systems::obstacles::create_obstacles;
use bevy_ecs::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where obstacles start out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleLayout {
    /// Every other row from row 1, spaced every 4 columns, lanes alternating
    /// direction.
    #[default]
    Alternating,
    /// An explicit obstacle set.
    Custom(Vec<Obstacle>),
}

impl ObstacleLayout {
    pub fn build(&self, dims: GridDims) -> Vec<Obstacle> {
        match self {
            ObstacleLayout::Alternating => create_obstacles(dims),
            ObstacleLayout::Custom(obstacles) => obstacles.clone(),
        }
    }
}

/// When the agent throws its path away and searches again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplanPolicy {
    /// Only when no path is held, the path is used up, or it no longer ends
    /// at the goal. A held path is followed even if an obstacle moves onto it.
    #[default]
    WhenStale,
    /// Also when a remaining path cell is occupied on the fresh map.
    WhenBlocked,
    /// Every tick.
    EveryTick,
}

/// Configuration for a run.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub rows: usize,
    pub cols: usize,
    /// Tile edge in pixels, passed through to renderers.
    pub tile_size: u32,
    /// Ticks per second.
    pub tick_rate: f32,
    /// Mark obstacle-adjacent cells and plan around them.
    pub penalty_enabled: bool,
    /// Start cell; defaults to a random column on the bottom row.
    pub start: Option<Cell>,
    /// Goal cell; defaults to a random column on the top row.
    pub goal: Option<Cell>,
    pub obstacles: ObstacleLayout,
    pub replan: ReplanPolicy,
    /// Consecutive planning failures tolerated before the run is declared
    /// unreachable. `None` retries forever.
    pub max_replan_failures: Option<u32>,
    /// Seed for the random start/goal columns.
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            rows: 28,
            cols: 28,
            tile_size: 45,
            tick_rate: 5.0,
            penalty_enabled: true,
            start: None,
            goal: None,
            obstacles: ObstacleLayout::Alternating,
            replan: ReplanPolicy::WhenStale,
            max_replan_failures: None,
            seed: None,
        }
    }
}

/// Validated board setup derived from a `SimConfig`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub dims: GridDims,
    /// Agent's starting cell, inside `dims`.
    pub start: Cell,
    /// Destination cell, inside `dims`.
    pub goal: Cell,
    /// Initial obstacles, none on the start or goal row.
    pub obstacles: Vec<Obstacle>,
}

impl SimConfig {
    /// Parse a JSON config. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn dims(&self) -> GridDims {
        GridDims::new(self.rows, self.cols)
    }

    /// Seconds per tick.
    pub fn fixed_timestep(&self) -> f32 {
        1.0 / self.tick_rate
    }

    /// Seconds per tick as a `Duration`. Fails when the rate is not a
    /// positive number or the period does not fit in a `Duration`.
    pub fn tick_period(&self) -> Result<Duration> {
        if !self.tick_rate.is_finite() || self.tick_rate <= 0.0 {
            return Err(SimError::InvalidTickRate(self.tick_rate));
        }
        Duration::try_from_secs_f32(self.fixed_timestep())
            .map_err(|_| SimError::InvalidTickRate(self.tick_rate))
    }

    pub fn planner(&self) -> PlannerConfig {
        PlannerConfig {
            penalty_enabled: self.penalty_enabled,
        }
    }

    /// Check the configuration and place the start, goal and obstacles.
    pub fn resolve(&self) -> Result<Layout> {
        let dims = self.dims();
        if dims.rows == 0 || dims.cols == 0 {
            return Err(SimError::EmptyGrid {
                rows: dims.rows,
                cols: dims.cols,
            });
        }
        self.tick_period()?;

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let start = self
            .start
            .unwrap_or_else(|| Cell::new(dims.rows - 1, rng.gen_range(0..dims.cols)));
        let goal = self
            .goal
            .unwrap_or_else(|| Cell::new(0, rng.gen_range(0..dims.cols)));

        for (what, cell) in [("start", start), ("goal", goal)] {
            if !dims.contains(cell) {
                return Err(SimError::OutOfBounds {
                    what,
                    cell,
                    rows: dims.rows,
                    cols: dims.cols,
                });
            }
        }

        let obstacles = self.obstacles.build(dims);
        for obstacle in &obstacles {
            if !dims.contains(obstacle.cell()) {
                return Err(SimError::ObstacleOutOfBounds {
                    row: obstacle.row,
                    col: obstacle.col,
                });
            }
            if obstacle.row == start.row || obstacle.row == goal.row {
                return Err(SimError::ObstacleOnAgentRow { row: obstacle.row });
            }
        }

        Ok(Layout {
            dims,
            start,
            goal,
            obstacles,
        })
    }
}
