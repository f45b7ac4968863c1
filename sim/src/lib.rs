//! Crossing - Simulation Core
//!
//! A deterministic, tick-driven simulation of an agent crossing a grid of
//! moving obstacles. Each tick the obstacles advance, the cost map is
//! rebuilt, the agent replans with weighted A* when its path went stale and
//! takes one step. Uses `bevy_ecs` for the entity-component-system
//! architecture.

pub mod api;
pub mod components;
pub mod config;
pub mod error;
pub mod grid;
pub mod host;
pub mod planner;
pub mod render_bridge;
pub mod systems;
pub mod world;

pub use api::{SimWorld, TickReport};
pub use components::*;
pub use config::{ObstacleLayout, ReplanPolicy, SimConfig};
pub use error::{Result, SimError};
pub use grid::{build_cost_map, CellState, GameMap};
pub use host::{HostExit, HostLoop, Pacing, Renderer};
pub use planner::{PathPlanner, PlanOutcome, PlanResult, PlanStats, PlannerConfig, PlannerObserver};
pub use render_bridge::{snapshot_to_buffer, AsciiRenderer};
pub use world::Snapshot;
