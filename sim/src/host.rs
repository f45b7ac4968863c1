//! Host loop - drives a `SimWorld` and hands each frame to a renderer.
//!
//! The loop renders the initial state, then per iteration: tick, render,
//! poll the quit signal. After the run turns terminal the simulation stays
//! frozen and the loop keeps rendering until quit or the tick limit.

use crate::api::SimWorld;
use crate::error::Result;
use crate::world::Snapshot;
use std::thread;
use std::time::Instant;

/// Anything that can draw a snapshot.
pub trait Renderer {
    fn render(&mut self, frame: &Snapshot) -> Result<()>;
}

/// Renderer that keeps every frame it was handed.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub frames: Vec<Snapshot>,
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, frame: &Snapshot) -> Result<()> {
        self.frames.push(frame.clone());
        Ok(())
    }
}

/// How the loop spaces ticks in wall time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pacing {
    /// Sleep so ticks land every `1 / tick_rate` seconds.
    #[default]
    Realtime,
    /// Tick as fast as possible.
    Unpaced,
}

/// Why the loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostExit {
    Quit,
    TickLimit,
}

/// Tick/render/quit loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostLoop {
    pacing: Pacing,
    max_ticks: Option<u64>,
}

impl HostLoop {
    pub fn new(pacing: Pacing) -> Self {
        Self {
            pacing,
            max_ticks: None,
        }
    }

    /// Stop after this many loop iterations, terminal or not.
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }

    pub fn run<R, Q>(&self, sim: &mut SimWorld, renderer: &mut R, mut quit: Q) -> Result<HostExit>
    where
        R: Renderer + ?Sized,
        Q: FnMut() -> bool,
    {
        let period = sim.config().tick_period()?;
        renderer.render(&sim.snapshot())?;

        let mut iterations = 0u64;
        loop {
            let started = Instant::now();

            let was_terminal = sim.status().is_terminal();
            let report = sim.tick();
            if !was_terminal && report.status.is_terminal() {
                tracing::info!(tick = report.tick, status = report.status.name(), "run finished");
            }
            renderer.render(&sim.snapshot())?;
            iterations += 1;

            if quit() {
                return Ok(HostExit::Quit);
            }
            if self.max_ticks.is_some_and(|max| iterations >= max) {
                return Ok(HostExit::TickLimit);
            }

            if self.pacing == Pacing::Realtime {
                if let Some(remaining) = period.checked_sub(started.elapsed()) {
                    thread::sleep(remaining);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Cell, RunStatus};
    use crate::config::{ObstacleLayout, SimConfig};

    fn short_run() -> SimWorld {
        SimWorld::with_config(SimConfig {
            rows: 4,
            cols: 3,
            start: Some(Cell::new(3, 1)),
            goal: Some(Cell::new(0, 1)),
            obstacles: ObstacleLayout::Custom(Vec::new()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_tick_limit() {
        let mut sim = short_run();
        let mut renderer = RecordingRenderer::default();
        let exit = HostLoop::new(Pacing::Unpaced)
            .with_max_ticks(10)
            .run(&mut sim, &mut renderer, || false)
            .unwrap();

        assert_eq!(exit, HostExit::TickLimit);
        // Initial frame plus one per iteration.
        assert_eq!(renderer.frames.len(), 11);
        assert_eq!(sim.status(), RunStatus::GoalReached);
        // Frozen after the third tick.
        assert_eq!(sim.current_tick(), 3);
        assert_eq!(renderer.frames[10].agent, Cell::new(0, 1));
    }

    #[test]
    fn test_quit_polled_after_render() {
        let mut sim = short_run();
        let mut renderer = RecordingRenderer::default();
        let mut polls = 0;
        let exit = HostLoop::new(Pacing::Unpaced)
            .run(&mut sim, &mut renderer, || {
                polls += 1;
                polls == 2
            })
            .unwrap();

        assert_eq!(exit, HostExit::Quit);
        assert_eq!(renderer.frames.len(), 3);
        assert_eq!(sim.current_tick(), 2);
    }

    #[test]
    fn test_unrepresentable_tick_period_is_an_error() {
        let mut sim = short_run();
        sim.world_mut().resource_mut::<SimConfig>().tick_rate = 1.0e-30;
        let mut renderer = RecordingRenderer::default();
        let err = HostLoop::new(Pacing::Unpaced)
            .with_max_ticks(2)
            .run(&mut sim, &mut renderer, || false);
        assert!(matches!(err, Err(crate::error::SimError::InvalidTickRate(_))));
        assert!(renderer.frames.is_empty());
    }

    #[test]
    fn test_render_failure_propagates() {
        struct Broken;
        impl Renderer for Broken {
            fn render(&mut self, _frame: &Snapshot) -> Result<()> {
                Err(std::io::Error::other("closed").into())
            }
        }

        let mut sim = short_run();
        let err = HostLoop::new(Pacing::Unpaced).run(&mut sim, &mut Broken, || false);
        assert!(matches!(err, Err(crate::error::SimError::Io(_))));
        assert_eq!(sim.current_tick(), 0);
    }
}
