//! Terminal demonstration of the Crossing simulation.
//!
//! Run with: cargo run --example crossing_demo -- --seed 7
//! Planner trace: RUST_LOG=crossing_sim=debug cargo run --example crossing_demo

use clap::Parser;
use crossing_sim::{
    AsciiRenderer, HostExit, HostLoop, Pacing, Renderer, SimConfig, SimWorld, Snapshot,
};
use std::cell::Cell;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::rc::Rc;

#[derive(Parser)]
#[command(name = "crossing-demo")]
#[command(about = "Watch an agent plan its way across lanes of moving obstacles")]
struct Args {
    /// JSON file with a SimConfig (defaults apply to missing fields)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for the start and goal columns
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many ticks
    #[arg(long, default_value_t = 500)]
    ticks: u64,

    /// Frames to keep showing after the run ends
    #[arg(long, default_value_t = 5)]
    linger: u32,

    /// Tick as fast as possible instead of at the configured rate
    #[arg(long)]
    unpaced: bool,
}

/// Draws to stdout and counts frames shown after the run ended.
struct Terminal {
    inner: AsciiRenderer<Stdout>,
    frames_after_end: Rc<Cell<u32>>,
}

impl Renderer for Terminal {
    fn render(&mut self, frame: &Snapshot) -> crossing_sim::Result<()> {
        if frame.status.is_terminal() {
            self.frames_after_end.set(self.frames_after_end.get() + 1);
        }
        self.inner.render(frame)
    }
}

fn main() -> crossing_sim::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)?;
            SimConfig::from_json(&json)?
        }
        None => SimConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let mut sim = SimWorld::with_config(config)?;
    let frames_after_end = Rc::new(Cell::new(0));
    let mut terminal = Terminal {
        inner: AsciiRenderer::new(io::stdout()).clearing(!args.unpaced),
        frames_after_end: Rc::clone(&frames_after_end),
    };

    let pacing = if args.unpaced {
        Pacing::Unpaced
    } else {
        Pacing::Realtime
    };
    let linger = args.linger;
    let exit = HostLoop::new(pacing)
        .with_max_ticks(args.ticks)
        .run(&mut sim, &mut terminal, || frames_after_end.get() > linger)?;

    let agent = sim.agent();
    println!();
    println!("=== RUN SUMMARY ===");
    println!("  Status:   {}", sim.status().name());
    println!("  Ticks:    {}", sim.current_tick());
    println!("  Steps:    {}", agent.steps);
    println!("  Replans:  {}", agent.replans);
    if exit == HostExit::TickLimit {
        println!("  Stopped at the {}-tick limit", args.ticks);
    }
    Ok(())
}
