//! Per-tick snapshot handed to renderers.
//!
//! The `Snapshot` is a serializable, logical view of the board: cells only,
//! no pixel coordinates. Renderers scale by `tile_size` themselves.

use crate::components::*;
use crate::config::SimConfig;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Complete simulation state for one rendered frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Current simulation tick.
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub time: f32,
    pub rows: usize,
    pub cols: usize,
    /// Tile edge in pixels.
    pub tile_size: u32,
    pub agent: Cell,
    pub goal: Cell,
    /// Obstacle cells, ordered by obstacle id.
    pub obstacles: Vec<Cell>,
    /// Remaining path, next cell first. Empty when no path is held.
    pub path: Vec<Cell>,
    pub status: RunStatus,
    /// Cells the agent has moved so far.
    pub steps: u32,
}

impl Snapshot {
    /// Create a snapshot from the ECS world.
    pub fn from_world(world: &mut World, tick: u64, time: f32) -> Self {
        let mut query = world.query::<(&ObstacleId, &Obstacle)>();
        let mut obstacles: Vec<(ObstacleId, Cell)> = query
            .iter(world)
            .map(|(id, obstacle)| (*id, obstacle.cell()))
            .collect();
        obstacles.sort_by_key(|(id, _)| *id);

        let config = world.resource::<SimConfig>();
        let agent = world.resource::<AgentState>();

        Self {
            tick,
            time,
            rows: config.rows,
            cols: config.cols,
            tile_size: config.tile_size,
            agent: agent.cell,
            goal: world.resource::<Goal>().0,
            obstacles: obstacles.into_iter().map(|(_, cell)| cell).collect(),
            path: agent.remaining_path(),
            status: *world.resource::<RunStatus>(),
            steps: agent.steps,
        }
    }

    /// Serialize snapshot to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize snapshot to pretty JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
