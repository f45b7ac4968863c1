//! Navigation systems - replanning, agent movement and run outcome.
//!
//! These run after the obstacle systems in every tick:
//!
//! 1. `replan_system` - plan a new path when the held one is stale
//! 2. `agent_step_system` - move the agent one cell along its path
//! 3. `outcome_system` - detect collision or arrival
//!
//! Collision is checked against the map rebuilt *after* this tick's obstacle
//! advance. With `ReplanPolicy::WhenStale` a path cell that was free when the
//! path was planned may be occupied by the time the agent steps onto it.

use crate::components::*;
use crate::config::{ReplanPolicy, SimConfig};
use crate::grid::GameMap;
use crate::planner::{PathPlanner, PlanOutcome, PlanStats, PlannerObserver, TracingObserver};
use bevy_ecs::prelude::*;
use bevy_ecs::system::SystemParam;

/// Observer handed to every search the simulation runs.
#[derive(Resource)]
pub struct PlannerTrace(pub Box<dyn PlannerObserver + Send + Sync>);

impl Default for PlannerTrace {
    fn default() -> Self {
        Self(Box::new(TracingObserver))
    }
}

/// What happened during the current tick.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct TickLog {
    pub replanned: bool,
    pub plan_failed: bool,
    pub moved: bool,
    pub last_plan: Option<PlanStats>,
}

/// Whether the agent must search again before moving.
///
/// A path is stale when none is held, when it is used up, or when its last
/// cell is not the goal.
pub fn needs_replan(policy: ReplanPolicy, agent: &AgentState, goal: Cell, map: &GameMap) -> bool {
    let stale = match agent.path.as_ref() {
        None => true,
        Some(path) => path.back() != Some(&goal),
    };
    match policy {
        ReplanPolicy::WhenStale => stale,
        ReplanPolicy::WhenBlocked => {
            stale
                || agent
                    .path
                    .as_ref()
                    .is_some_and(|path| path.iter().any(|cell| map.is_blocked(*cell)))
        }
        ReplanPolicy::EveryTick => true,
    }
}

/// Read-only inputs of a replan.
#[derive(SystemParam)]
pub struct PlanInputs<'w> {
    config: Res<'w, SimConfig>,
    map: Res<'w, GameMap>,
    goal: Res<'w, Goal>,
    tick: Res<'w, SimTick>,
}

/// System that replaces a stale path with a fresh search from the agent's
/// current cell.
pub fn replan_system(
    inputs: PlanInputs,
    mut agent: ResMut<AgentState>,
    mut status: ResMut<RunStatus>,
    mut trace: ResMut<PlannerTrace>,
    mut log: ResMut<TickLog>,
) {
    let PlanInputs { config, map, goal, tick } = inputs;
    *log = TickLog::default();
    if !needs_replan(config.replan, &agent, goal.0, &map) {
        return;
    }

    let planner = PathPlanner::new(config.planner());
    let result = planner.plan_observed(&map, agent.cell, goal.0, trace.0.as_mut());
    log.replanned = true;
    log.last_plan = Some(result.stats);

    match result.outcome {
        PlanOutcome::Found(path) => {
            tracing::debug!(
                tick = tick.0,
                from = %agent.cell.label(),
                len = path.len(),
                expanded = result.stats.expanded,
                "replanned"
            );
            agent.path = Some(path.into());
            agent.replans += 1;
            agent.consecutive_failures = 0;
            if matches!(*status, RunStatus::Stalled { .. }) {
                *status = RunStatus::Running;
            }
        }
        PlanOutcome::NoPath => {
            agent.path = None;
            agent.consecutive_failures += 1;
            log.plan_failed = true;
            let failures = agent.consecutive_failures;
            tracing::warn!(tick = tick.0, from = %agent.cell.label(), failures, "no path to goal");

            *status = match config.max_replan_failures {
                Some(budget) if failures > budget => RunStatus::Unreachable,
                _ => RunStatus::Stalled { failures },
            };
        }
    }
}

/// System that pops the head of the path as the agent's new cell.
pub fn agent_step_system(mut agent: ResMut<AgentState>, mut log: ResMut<TickLog>) {
    if let Some(next) = agent.path.as_mut().and_then(|path| path.pop_front()) {
        agent.cell = next;
        agent.steps += 1;
        log.moved = true;
    }
}

/// System that ends the run on collision or arrival.
pub fn outcome_system(
    map: Res<GameMap>,
    goal: Res<Goal>,
    tick: Res<SimTick>,
    agent: Res<AgentState>,
    mut status: ResMut<RunStatus>,
) {
    if map.is_blocked(agent.cell) {
        tracing::info!(tick = tick.0, cell = %agent.cell.label(), "agent destroyed");
        *status = RunStatus::Destroyed;
    } else if agent.cell == goal.0 {
        tracing::info!(tick = tick.0, cell = %agent.cell.label(), steps = agent.steps, "goal reached");
        *status = RunStatus::GoalReached;
    }
}
