use cgmath::{InnerSpace, Zero};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::{
    body::Body,
    constants::{G, MAX_THREADS, OBJECTS_PER_THREAD, SOFTENING},
    error::SimError,
    vector::{Vector2, Vector2Ext},
};

pub mod collision;
mod direct;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityParams {
    pub g: f32,
    pub softening: f32,
}

impl Default for GravityParams {
    fn default() -> Self {
        Self {
            g: G,
            softening: SOFTENING,
        }
    }
}

impl GravityParams {
    pub fn new(g: f32, softening: f32) -> Result<Self, SimError> {
        let params = Self { g, softening };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if !self.g.is_finite() || self.g < 0.0 {
            return Err(SimError::InvalidGravity(self.g));
        }
        if !self.softening.is_finite() || self.softening < 0.0 {
            return Err(SimError::InvalidSoftening(self.softening));
        }
        Ok(())
    }

    /// Softened attraction exerted on `obj` by `other`, or `None` when the denominator vanishes
    /// (coincident bodies without softening).
    ///
    /// Swapping the arguments yields the exact negation: the relative vector flips sign bit for
    /// bit and the magnitude only depends on the symmetric product of the masses.
    #[inline]
    pub fn pair_force(&self, obj: &Body, other: &Body) -> Option<Vector2> {
        let rel = other.position - obj.position;
        let denom = rel.magnitude2() + self.softening * self.softening;
        if denom == 0.0 {
            return None;
        }
        let magnitude = self.g * (obj.mass * other.mass) / denom;
        Some(rel.normalized_or_zero() * magnitude)
    }
}

/// Strategy for filling the force accumulators of a body set.
pub trait ForceSolver: Send {
    /// Clears every accumulator, then adds the gravitational pull of every other body.
    fn accumulate(&mut self, bodies: &mut [Body], params: &GravityParams);
}

/// Single-threaded i < j sweep applying each pair as an action/reaction couple.
#[derive(Debug, Default, Clone, Copy)]
pub struct PairwiseSolver;

impl ForceSolver for PairwiseSolver {
    fn accumulate(&mut self, bodies: &mut [Body], params: &GravityParams) {
        direct::accumulate_pairwise(bodies, params);
    }
}

/// Row-parallel solver. Each body sums its own row, so no accumulator is shared between
/// workers.
pub struct ParallelSolver {
    pool: ThreadPool,
    out_buffer: Vec<Vector2>,
}

pub fn compute_target_threads(n_objects: usize) -> usize {
    n_objects.max(1).div_ceil(OBJECTS_PER_THREAD).min(MAX_THREADS)
}

impl ParallelSolver {
    pub fn new(n_threads: usize) -> Result<Self, SimError> {
        Ok(Self {
            pool: ThreadPoolBuilder::new()
                .num_threads(n_threads.clamp(1, MAX_THREADS))
                .build()?,
            out_buffer: Vec::new(),
        })
    }

    /// Sizes the pool from the expected body count.
    pub fn for_bodies(n_objects: usize) -> Result<Self, SimError> {
        Self::new(compute_target_threads(n_objects))
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl ForceSolver for ParallelSolver {
    fn accumulate(&mut self, bodies: &mut [Body], params: &GravityParams) {
        self.out_buffer.resize(bodies.len(), Vector2::zero());
        self.pool
            .install(|| direct::accumulate_rows(bodies, &mut self.out_buffer, params));
    }
}

/// Computes gravitational forces over a borrowed body slice and advances it with
/// semi-implicit Euler.
pub struct PhysicsEngine {
    params: GravityParams,
    solver: Box<dyn ForceSolver>,
}

impl PhysicsEngine {
    pub fn new(params: GravityParams) -> Self {
        Self::with_solver(params, Box::new(PairwiseSolver))
    }

    pub fn with_solver(params: GravityParams, solver: Box<dyn ForceSolver>) -> Self {
        Self { params, solver }
    }

    pub fn params(&self) -> GravityParams {
        self.params
    }

    pub fn set_params(&mut self, params: GravityParams) -> Result<(), SimError> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    pub fn set_solver(&mut self, solver: Box<dyn ForceSolver>) {
        self.solver = solver;
    }

    /// Accumulates every pairwise force, then integrates every velocity. No velocity changes
    /// before the whole accumulation pass has completed.
    pub fn compute_forces(&mut self, bodies: &mut [Body], dt: f32) {
        self.solver.accumulate(bodies, &self.params);
        direct::integrate_velocities(bodies, dt);
    }

    /// Advances positions with the velocities updated by [`PhysicsEngine::compute_forces`].
    pub fn integrate(&self, bodies: &mut [Body], dt: f32) {
        direct::integrate_positions(bodies, dt);
    }
}

impl Default for PhysicsEngine {
    fn default() -> Self {
        Self::new(GravityParams::default())
    }
}
