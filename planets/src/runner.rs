use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use log::{debug, info};

use crate::{
    batch_request::{BatchRequest, BodySample},
    camera::Camera,
    constants::MAX_SUBSTEPS,
    diagnostics::SystemStats,
    simulation::Simulation,
};

const IDLE_SLEEP: Duration = Duration::from_millis(1);

/// Converts wall-clock time into a whole number of fixed simulation steps.
#[derive(Debug, Clone, Copy)]
pub struct FixedStepper {
    accumulator: f32,
    max_substeps: u32,
}

impl FixedStepper {
    pub fn new(max_substeps: u32) -> Self {
        Self {
            accumulator: 0.0,
            max_substeps: max_substeps.max(1),
        }
    }

    /// Banks `elapsed * time_scale` seconds and returns the number of `dt` steps now due.
    /// A backlog of more than `max_substeps` steps is dropped.
    pub fn advance(&mut self, elapsed: f32, time_scale: f32, dt: f32) -> u32 {
        if dt.is_nan() || dt <= 0.0 || !elapsed.is_finite() || elapsed <= 0.0 {
            return 0;
        }
        self.accumulator += elapsed * time_scale;
        let due = (self.accumulator / dt).floor();
        if due >= self.max_substeps as f32 {
            self.accumulator = 0.0;
            return self.max_substeps;
        }
        self.accumulator -= due * dt;
        due as u32
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

impl Default for FixedStepper {
    fn default() -> Self {
        Self::new(MAX_SUBSTEPS)
    }
}

/// Advances `sim` in real time until `token` is set, publishing snapshots whenever the viewer
/// asks for one. Returns the simulation so the caller can inspect the final state.
pub fn run_sim_loop(
    mut sim: Simulation,
    exchange: Arc<BatchRequest>,
    token: Arc<AtomicBool>,
) -> Simulation {
    let mut stepper = FixedStepper::default();
    let mut merges = Vec::new();
    let mut last = Instant::now();
    exchange.store(&sim, Vec::new());

    while !token.load(Ordering::Relaxed) {
        let now = Instant::now();
        let elapsed = now.duration_since(last).as_secs_f32();
        last = now;

        if exchange.paused() {
            stepper.reset();
            thread::sleep(IDLE_SLEEP);
            continue;
        }

        let due = stepper.advance(elapsed, exchange.time_scale(), sim.timestep());
        for _ in 0..due {
            sim.step();
            if !sim.last_collisions().merges.is_empty() {
                merges.push(sim.last_collisions().clone());
            }
        }

        if due > 0 && exchange.should_store() {
            exchange.store(&sim, std::mem::take(&mut merges));
        } else if due == 0 {
            thread::sleep(IDLE_SLEEP);
        }
    }

    info!("Simulation loop terminated after {} ticks", sim.ticks());
    sim
}

/// Pacing of [`run_view_loop`].
#[derive(Debug, Clone, Copy)]
pub struct ViewLoopConfig {
    pub duration: Duration,
    pub frame_time: Duration,
    /// Log camera and stats every N frames. 0 disables.
    pub log_every: u64,
    /// Freeze the simulation this long after the start. The camera keeps framing the last
    /// snapshot.
    pub pause_after: Option<Duration>,
}

/// Pulls snapshots from `exchange` once per frame for the configured duration, keeping
/// `camera` framed on them. Returns the number of frames.
pub fn run_view_loop(
    camera: &mut Camera,
    exchange: &BatchRequest,
    config: ViewLoopConfig,
) -> u64 {
    let mut samples: Vec<BodySample> = Vec::new();
    let start = Instant::now();
    let mut last = start;
    let mut frames = 0u64;

    while start.elapsed() < config.duration {
        thread::sleep(config.frame_time);
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32();
        last = now;

        if let Some(pause_after) = config.pause_after {
            if !exchange.paused() && now.duration_since(start) >= pause_after {
                info!("Pausing simulation at tick {}", exchange.current_ticks());
                exchange.set_paused(true);
            }
        }

        for report in exchange.sample(&mut samples) {
            camera.follow_across_merges(&report);
        }
        camera.update(&samples, dt);
        frames += 1;

        if config.log_every > 0 && frames % config.log_every == 0 {
            let cam = camera.position();
            info!(
                "frame {frames}, tick {}: camera ({:.3}, {:.3}) zoom {:.4} | {}",
                exchange.current_ticks(),
                cam.x,
                cam.y,
                camera.zoom(),
                exchange.stats()
            );
        }
    }

    debug!("View loop rendered {frames} frames");
    frames
}

/// Steps `sim` synchronously, updating the camera once per step. Followed-body indices are
/// carried across merges.
pub fn run_headless(
    sim: &mut Simulation,
    camera: &mut Camera,
    steps: u64,
    log_every: u64,
) -> SystemStats {
    let dt = sim.timestep();
    camera.update(sim.bodies(), dt);

    for step in 1..=steps {
        sim.step();
        camera.follow_across_merges(sim.last_collisions());
        camera.update(sim.bodies(), dt);

        if log_every > 0 && step % log_every == 0 {
            let cam = camera.position();
            info!(
                "tick {}: camera ({:.3}, {:.3}) zoom {:.4} | {}",
                sim.ticks(),
                cam.x,
                cam.y,
                camera.zoom(),
                SystemStats::compute(sim.bodies(), &sim.config().gravity)
            );
        }
    }

    SystemStats::compute(sim.bodies(), &sim.config().gravity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        body::Body,
        sim::collision::CollisionMode,
        simulation::SimulationConfig,
        vector::Vector2,
    };
    use cgmath::Zero;

    #[test]
    fn stepper_carries_remainder() {
        let mut stepper = FixedStepper::new(10);
        assert_eq!(stepper.advance(0.25, 1.0, 0.1), 2);
        assert_eq!(stepper.advance(0.06, 1.0, 0.1), 1);
        assert_eq!(stepper.advance(0.0, 1.0, 0.1), 0);
    }

    #[test]
    fn stepper_applies_time_scale() {
        let mut stepper = FixedStepper::new(100);
        assert_eq!(stepper.advance(0.125, 2.0, 0.0625), 4);
    }

    #[test]
    fn stepper_drops_backlog() {
        let mut stepper = FixedStepper::new(4);
        assert_eq!(stepper.advance(10.0, 1.0, 0.1), 4);
        assert_eq!(stepper.advance(0.05, 1.0, 0.1), 0);
    }

    #[test]
    fn headless_run_follows_merged_body() {
        let config = SimulationConfig {
            collision: CollisionMode::Merge {
                merge_speed: 10.0,
                restitution: 0.5,
            },
            ..Default::default()
        };
        let mut sim = Simulation::new(config).unwrap();
        sim.set_bodies(vec![
            Body::new("a", Vector2::new(0.0, 0.0), Vector2::zero(), 1.0, 0.1),
            Body::new("b", Vector2::new(0.05, 0.0), Vector2::zero(), 1.0, 0.1),
            Body::new("c", Vector2::new(1.0, 0.0), Vector2::zero(), 1.0, 0.01),
        ]);
        let mut camera = Camera::new(800.0, 600.0);
        camera.set_followed_body(Some(2));

        let stats = run_headless(&mut sim, &mut camera, 1, 0);
        assert_eq!(stats.bodies, 2);
        assert_eq!(camera.followed_body(), Some(1));
    }

    #[test]
    fn sim_loop_stops_on_token() {
        let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
        sim.init();
        let exchange = Arc::new(BatchRequest::new());
        let token = Arc::new(AtomicBool::new(true));
        let sim = run_sim_loop(sim, exchange.clone(), token);
        assert_eq!(sim.ticks(), 0);
        assert_eq!(exchange.current_ticks(), 0);

        let mut out = Vec::new();
        exchange.sample(&mut out);
        assert_eq!(out.len(), 5);
    }

    #[test]
    fn stepper_reset_discards_banked_time() {
        let mut stepper = FixedStepper::new(10);
        assert_eq!(stepper.advance(0.09, 1.0, 0.1), 0);
        stepper.reset();
        assert_eq!(stepper.advance(0.05, 1.0, 0.1), 0);
        assert_eq!(stepper.advance(0.06, 1.0, 0.1), 1);
    }

    fn merging_scene() -> Simulation {
        let config = SimulationConfig {
            collision: CollisionMode::Merge {
                merge_speed: 10.0,
                restitution: 0.5,
            },
            ..Default::default()
        };
        let mut sim = Simulation::new(config).unwrap();
        sim.set_bodies(vec![
            Body::new("a", Vector2::new(0.0, 0.0), Vector2::zero(), 1.0, 0.1),
            Body::new("b", Vector2::new(0.05, 0.0), Vector2::zero(), 1.0, 0.1),
            Body::new("c", Vector2::new(5.0, 0.0), Vector2::zero(), 1.0, 0.01),
            Body::new("d", Vector2::new(-5.0, 0.0), Vector2::zero(), 1.0, 0.01),
        ]);
        sim
    }

    fn view_config(millis: u64, pause_after: Option<Duration>) -> ViewLoopConfig {
        ViewLoopConfig {
            duration: Duration::from_millis(millis),
            frame_time: Duration::from_millis(5),
            log_every: 0,
            pause_after,
        }
    }

    #[test]
    fn realtime_run_follows_body_across_merges() {
        let exchange = Arc::new(BatchRequest::new());
        let token = Arc::new(AtomicBool::new(false));
        let handle = {
            let exchange = exchange.clone();
            let token = token.clone();
            thread::spawn(move || run_sim_loop(merging_scene(), exchange, token))
        };

        let mut camera = Camera::new(800.0, 600.0);
        camera.set_followed_body(Some(2));
        run_view_loop(&mut camera, &exchange, view_config(200, None));
        token.store(true, Ordering::Relaxed);
        let sim = handle.join().unwrap();

        assert_eq!(sim.bodies().len(), 3);
        assert_eq!(camera.followed_body(), Some(1));
        assert!(camera.target().x > 4.0);
    }

    #[test]
    fn paused_simulation_does_not_advance() {
        let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
        sim.init();
        let exchange = Arc::new(BatchRequest::new());
        exchange.set_paused(true);
        let token = Arc::new(AtomicBool::new(false));
        let handle = {
            let exchange = exchange.clone();
            let token = token.clone();
            thread::spawn(move || run_sim_loop(sim, exchange, token))
        };

        thread::sleep(Duration::from_millis(50));
        assert_eq!(exchange.current_ticks(), 0);

        exchange.set_paused(false);
        thread::sleep(Duration::from_millis(50));
        token.store(true, Ordering::Relaxed);
        let sim = handle.join().unwrap();
        assert!(sim.ticks() > 0);
    }

    #[test]
    fn view_loop_pauses_after_delay() {
        let exchange = BatchRequest::new();
        let mut camera = Camera::new(800.0, 600.0);
        let frames = run_view_loop(&mut camera, &exchange, view_config(30, Some(Duration::ZERO)));
        assert!(frames > 0);
        assert!(exchange.paused());
    }
}
