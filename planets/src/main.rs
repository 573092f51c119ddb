use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use anyhow::{Context, anyhow, ensure};
use clap::{Parser, ValueEnum};
use log::info;
use planets::{
    BatchRequest, Camera, CollisionMode, GravityParams, ParallelSolver, Simulation,
    SimulationConfig, SystemStats,
    constants::{COLLISION_DAMPING, DELTA, G, MERGE_SPEED, RESTITUTION, SOFTENING},
    runner::{ViewLoopConfig, run_headless, run_sim_loop, run_view_loop},
};

const FRAME_TIME: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Collisions {
    Disabled,
    Impulse,
    Soft,
    Merge,
}

/// Two-dimensional n-body simulation with an auto-framing camera.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Number of random bodies. 0 loads the starter system
    #[arg(short, long, default_value_t = 0)]
    bodies: usize,

    /// Seed for the random system
    #[arg(long, default_value_t = 1337)]
    seed: u64,

    /// Run this many steps synchronously instead of in real time
    #[arg(long)]
    steps: Option<u64>,

    /// Wall-clock length of a real-time run
    #[arg(long, default_value_t = 5.0)]
    seconds: f32,

    #[arg(long, default_value_t = DELTA)]
    dt: f32,

    #[arg(long, default_value_t = G)]
    gravity: f32,

    #[arg(long, default_value_t = SOFTENING)]
    softening: f32,

    #[arg(long, value_enum, default_value_t = Collisions::Disabled)]
    collisions: Collisions,

    #[arg(long, default_value_t = RESTITUTION)]
    restitution: f32,

    #[arg(long, default_value_t = COLLISION_DAMPING)]
    damping: f32,

    #[arg(long, default_value_t = MERGE_SPEED)]
    merge_speed: f32,

    /// Freeze the simulation after this many wall-clock seconds of a real-time run
    #[arg(long)]
    pause_after: Option<f32>,

    /// Simulated seconds per wall-clock second
    #[arg(long, default_value_t = 1.0)]
    time_scale: f32,

    /// Compute forces on a thread pool of this size
    #[arg(long)]
    threads: Option<usize>,

    /// Index of the body the camera follows
    #[arg(long)]
    follow: Option<usize>,

    /// Log every N frames (or steps with --steps). 0 disables
    #[arg(long, default_value_t = 60)]
    log_every: u64,
}

impl Args {
    fn collision_mode(&self) -> CollisionMode {
        match self.collisions {
            Collisions::Disabled => CollisionMode::Disabled,
            Collisions::Impulse => CollisionMode::Impulse {
                restitution: self.restitution,
            },
            Collisions::Soft => CollisionMode::SoftDamping {
                damping: self.damping,
            },
            Collisions::Merge => CollisionMode::Merge {
                merge_speed: self.merge_speed,
                restitution: self.restitution,
            },
        }
    }
}

fn seconds(flag: &str, value: f32) -> anyhow::Result<Duration> {
    ensure!(
        value.is_finite() && value >= 0.0,
        "{flag} must be a non-negative number, got {value}"
    );
    Ok(Duration::from_secs_f32(value))
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = SimulationConfig {
        gravity: GravityParams::new(args.gravity, args.softening)?,
        timestep: args.dt,
        collision: args.collision_mode(),
    };
    let mut sim = match args.threads {
        Some(n) => Simulation::with_solver(config, Box::new(ParallelSolver::new(n)?)),
        None => Simulation::new(config),
    }
    .context("Invalid simulation parameters")?;

    if args.bodies == 0 {
        sim.init();
    } else {
        sim.init_random(args.bodies, args.seed);
    }

    let mut camera = Camera::new(1280.0, 720.0);
    camera.set_followed_body(args.follow);

    let stats = match args.steps {
        Some(steps) => run_headless(&mut sim, &mut camera, steps, args.log_every),
        None => {
            let view = ViewLoopConfig {
                duration: seconds("--seconds", args.seconds)?,
                frame_time: FRAME_TIME,
                log_every: args.log_every,
                pause_after: args
                    .pause_after
                    .map(|s| seconds("--pause-after", s))
                    .transpose()?,
            };
            let exchange = Arc::new(BatchRequest::new());
            exchange.set_time_scale(args.time_scale);
            let token = Arc::new(AtomicBool::new(false));

            let handle = {
                let exchange = exchange.clone();
                let token = token.clone();
                thread::spawn(move || run_sim_loop(sim, exchange, token))
            };

            run_view_loop(&mut camera, &exchange, view);
            token.store(true, Ordering::Relaxed);
            sim = handle
                .join()
                .map_err(|_| anyhow!("Simulation thread panicked"))?;
            SystemStats::compute(sim.bodies(), &sim.config().gravity)
        }
    };

    info!(
        "Finished after {} ticks ({:.3} simulated seconds): {stats}",
        sim.ticks(),
        sim.elapsed()
    );
    Ok(())
}
