use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use cgmath::Vector3;

use crate::{
    body::Body, camera::Framed, constants::TIME_SCALE_RANGE, diagnostics::SystemStats,
    sim::collision::CollisionReport, simulation::Simulation, vector::Vector2,
};

/// Copy of the per-body state a viewer needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodySample {
    pub position: Vector2,
    pub velocity: Vector2,
    pub mass: f32,
    pub radius: f32,
    pub color: Vector3<f32>,
}

impl From<&Body> for BodySample {
    fn from(body: &Body) -> Self {
        Self {
            position: body.position,
            velocity: body.velocity,
            mass: body.mass,
            radius: body.radius,
            color: body.color,
        }
    }
}

impl Framed for BodySample {
    fn position(&self) -> Vector2 {
        self.position
    }

    fn mass(&self) -> f32 {
        self.mass
    }

    fn radius(&self) -> f32 {
        self.radius
    }
}

#[derive(Default)]
struct Snapshot {
    bodies: Vec<BodySample>,
    /// Merging steps since the last sample, oldest first.
    merges: Vec<CollisionReport>,
}

/// Primitive for communicating between simulation and viewer. Snapshots are copied under a
/// lock, so a viewer never observes a half-finished step.
pub struct BatchRequest {
    sample: Mutex<Snapshot>,
    stats: Mutex<SystemStats>,
    should_sample: AtomicBool,
    simulation_tick: AtomicU64,
    time_scale: AtomicU32,
    paused: AtomicBool,
}

impl BatchRequest {
    pub fn new() -> Self {
        Self {
            sample: Mutex::new(Snapshot::default()),
            stats: Mutex::new(SystemStats::default()),
            should_sample: AtomicBool::new(true),
            simulation_tick: AtomicU64::new(0),
            time_scale: AtomicU32::new(1.0f32.to_bits()),
            paused: AtomicBool::new(false),
        }
    }

    pub fn time_scale(&self) -> f32 {
        f32::from_bits(self.time_scale.load(Ordering::Relaxed))
    }

    pub fn set_time_scale(&self, scale: f32) {
        if scale.is_nan() {
            return;
        }
        let scale = scale.clamp(TIME_SCALE_RANGE.0, TIME_SCALE_RANGE.1);
        self.time_scale.store(scale.to_bits(), Ordering::Relaxed);
    }

    pub fn paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Relaxed);
    }

    /// Return whether we are ready to accept a new simulation batch.
    pub fn should_store(&self) -> bool {
        self.should_sample
            .compare_exchange_weak(true, false, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
    }

    /// Store a sample of each simulated body, as well as the current tick. `merges` holds the
    /// reports of every merging step since the previous store; they are queued until the viewer
    /// samples.
    pub fn store(&self, sim: &Simulation, merges: Vec<CollisionReport>) {
        {
            let mut data = self.sample.lock().unwrap_or_else(PoisonError::into_inner);
            data.bodies.clear();
            data.bodies.extend(sim.bodies().iter().map(BodySample::from));
            data.merges.extend(merges);
        }
        let stats = SystemStats::compute(sim.bodies(), &sim.config().gravity);
        *self.stats.lock().unwrap_or_else(PoisonError::into_inner) = stats;
        self.simulation_tick.store(sim.ticks(), Ordering::Relaxed);
    }

    /// Copy the latest sample into `out`, and request a new one from the simulation. Returns
    /// the merge reports leading up to this sample, which invalidate indices held from earlier
    /// samples.
    pub fn sample(&self, out: &mut Vec<BodySample>) -> Vec<CollisionReport> {
        let mut data = self.sample.lock().unwrap_or_else(PoisonError::into_inner);
        out.clear();
        out.extend_from_slice(&data.bodies);
        let merges = std::mem::take(&mut data.merges);
        self.should_sample.store(true, Ordering::Relaxed);
        merges
    }

    pub fn stats(&self) -> SystemStats {
        *self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn current_ticks(&self) -> u64 {
        self.simulation_tick.load(Ordering::Relaxed)
    }
}

impl Default for BatchRequest {
    fn default() -> Self {
        Self::new()
    }
}
