//! Public API for the simulation.
//!
//! `SimWorld` owns the whole run: the ECS world holding the obstacles, map,
//! agent and goal, and the schedule that advances them. A host calls
//! [`SimWorld::tick`] once per frame (or [`SimWorld::step`] with elapsed wall
//! time) and hands [`SimWorld::snapshot`] to its renderer.
//!
//! ## Fixed Timestep
//!
//! `step(dt)` accumulates time and runs one tick per `1 / tick_rate`
//! seconds, so the run is independent of the host's frame rate.
//!
//! ## Terminal States
//!
//! Once the agent reaches the goal, is destroyed, or the goal is declared
//! unreachable, `tick()` stops advancing anything. The last state stays
//! available for rendering.

use crate::components::*;
use crate::config::SimConfig;
use crate::error::Result;
use crate::grid::{build_cost_map, GameMap};
use crate::planner::{PlanStats, PlannerObserver};
use crate::systems::*;
use crate::world::Snapshot;
use bevy_ecs::prelude::*;

/// Upper bound on ticks run by a single [`SimWorld::step`] call.
pub const MAX_TICKS_PER_STEP: usize = 64;

/// Summary of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Tick number after this call.
    pub tick: u64,
    pub status: RunStatus,
    pub agent: Cell,
    pub moved: bool,
    pub replanned: bool,
    /// Search effort when a replan happened.
    pub plan: Option<PlanStats>,
}

/// The main simulation container.
///
/// Holds the ECS world and schedule, providing a clean API for:
/// - Initializing a run from a `SimConfig`
/// - Stepping the simulation forward
/// - Extracting snapshots for rendering
pub struct SimWorld {
    world: World,
    schedule: Schedule,
    tick: u64,
    time: f32,
    fixed_timestep: f32,
    /// Accumulated time for fixed timestep.
    time_accumulator: f32,
}

impl SimWorld {
    /// Create a run on the default board.
    pub fn new() -> Result<Self> {
        Self::with_config(SimConfig::default())
    }

    /// Create a run with custom configuration.
    ///
    /// Fails before any tick runs when the grid is empty, the start or goal
    /// is off the board, or an obstacle lane crosses the start or goal row.
    pub fn with_config(config: SimConfig) -> Result<Self> {
        let layout = config.resolve()?;
        let fixed_timestep = config.fixed_timestep();

        let mut world = World::new();
        for (i, obstacle) in layout.obstacles.iter().enumerate() {
            world.spawn((ObstacleId(i as u32), *obstacle));
        }

        world.insert_resource(layout.dims);
        world.insert_resource(build_cost_map(
            &layout.obstacles,
            layout.dims,
            config.penalty_enabled,
        ));
        world.insert_resource(AgentState::new(layout.start));
        world.insert_resource(Goal(layout.goal));
        world.insert_resource(RunStatus::Running);
        world.insert_resource(SimTick(0));
        world.insert_resource(TickLog::default());
        world.insert_resource(PlannerTrace::default());
        world.insert_resource(config);

        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                obstacle_motion_system,
                cost_map_system,
                replan_system,
                agent_step_system,
                outcome_system,
            )
                .chain(),
        );

        tracing::info!(
            rows = layout.dims.rows,
            cols = layout.dims.cols,
            start = %layout.start.label(),
            goal = %layout.goal.label(),
            obstacles = layout.obstacles.len(),
            "simulation created"
        );

        Ok(Self {
            world,
            schedule,
            tick: 0,
            time: 0.0,
            fixed_timestep,
            time_accumulator: 0.0,
        })
    }

    /// Run exactly one tick: advance obstacles, rebuild the map, replan if
    /// needed, move the agent and check the outcome.
    ///
    /// Does nothing once the run is terminal.
    pub fn tick(&mut self) -> TickReport {
        if self.status().is_terminal() {
            return TickReport {
                tick: self.tick,
                status: self.status(),
                agent: self.agent_cell(),
                moved: false,
                replanned: false,
                plan: None,
            };
        }

        self.world.resource_mut::<SimTick>().increment();
        self.schedule.run(&mut self.world);
        self.tick += 1;
        self.time += self.fixed_timestep;

        let log = *self.world.resource::<TickLog>();
        TickReport {
            tick: self.tick,
            status: self.status(),
            agent: self.agent_cell(),
            moved: log.moved,
            replanned: log.replanned,
            plan: log.last_plan,
        }
    }

    /// Step the simulation forward by `dt` seconds of wall time.
    ///
    /// Runs at most [`MAX_TICKS_PER_STEP`] ticks; a larger backlog is
    /// dropped. Returns the number of ticks that ran.
    pub fn step(&mut self, dt: f32) -> usize {
        if self.status().is_terminal() {
            self.time_accumulator = 0.0;
            return 0;
        }
        self.time_accumulator += dt.max(0.0);

        let due = (self.time_accumulator / self.fixed_timestep).floor();
        let ticks = if due > MAX_TICKS_PER_STEP as f32 {
            tracing::warn!(due, kept = MAX_TICKS_PER_STEP, "dropping tick backlog");
            self.time_accumulator = 0.0;
            MAX_TICKS_PER_STEP
        } else {
            self.time_accumulator = (self.time_accumulator - due * self.fixed_timestep).max(0.0);
            due as usize
        };

        let mut ran = 0;
        for _ in 0..ticks {
            if self.tick().status.is_terminal() {
                self.time_accumulator = 0.0;
                return ran + 1;
            }
            ran += 1;
        }
        ran
    }

    /// Tick until the run ends or `max_ticks` ticks have run.
    pub fn run_until_done(&mut self, max_ticks: u64) -> RunStatus {
        for _ in 0..max_ticks {
            if self.tick().status.is_terminal() {
                break;
            }
        }
        self.status()
    }

    /// Get a snapshot of the current simulation state.
    pub fn snapshot(&mut self) -> Snapshot {
        Snapshot::from_world(&mut self.world, self.tick, self.time)
    }

    /// Get the snapshot as a JSON string.
    pub fn snapshot_json(&mut self) -> String {
        self.snapshot().to_json().unwrap_or_else(|_| "{}".to_string())
    }

    /// Replace the observer that receives planner events.
    pub fn set_planner_observer(&mut self, observer: impl PlannerObserver + Send + Sync + 'static) {
        self.world.insert_resource(PlannerTrace(Box::new(observer)));
    }

    /// Get the current tick number.
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Get the elapsed simulation time.
    pub fn current_time(&self) -> f32 {
        self.time
    }

    pub fn status(&self) -> RunStatus {
        *self.world.resource::<RunStatus>()
    }

    pub fn agent_cell(&self) -> Cell {
        self.world.resource::<AgentState>().cell
    }

    pub fn agent(&self) -> &AgentState {
        self.world.resource::<AgentState>()
    }

    pub fn goal(&self) -> Cell {
        self.world.resource::<Goal>().0
    }

    /// Remaining path, next cell first.
    pub fn path(&self) -> Vec<Cell> {
        self.agent().remaining_path()
    }

    /// The map built during the last tick (or at construction).
    pub fn game_map(&self) -> &GameMap {
        self.world.resource::<GameMap>()
    }

    pub fn dims(&self) -> GridDims {
        *self.world.resource::<GridDims>()
    }

    pub fn config(&self) -> &SimConfig {
        self.world.resource::<SimConfig>()
    }

    /// All obstacles, ordered by id.
    pub fn obstacles(&mut self) -> Vec<Obstacle> {
        let mut query = self.world.query::<(&ObstacleId, &Obstacle)>();
        let mut obstacles: Vec<(ObstacleId, Obstacle)> =
            query.iter(&self.world).map(|(id, o)| (*id, *o)).collect();
        obstacles.sort_by_key(|(id, _)| *id);
        obstacles.into_iter().map(|(_, o)| o).collect()
    }

    /// Get direct access to the ECS world (for advanced usage).
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Get mutable access to the ECS world (for advanced usage).
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}
