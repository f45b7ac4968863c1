//! ECS systems for the Crossing simulation.
//!
//! Every tick runs one chained group, strictly in this order:
//!
//! **Obstacles** - update the world:
//! - `obstacle_motion_system` - moves every obstacle along its lane
//! - `cost_map_system` - rebuilds the game map from obstacle positions
//!
//! **Navigation** - read the fresh map:
//! - `replan_system` - searches again when the held path is stale
//! - `agent_step_system` - moves the agent one cell
//! - `outcome_system` - detects collision and arrival

pub mod navigation;
pub mod obstacles;
pub mod serialization;

pub use navigation::*;
pub use obstacles::*;
pub use serialization::*;
