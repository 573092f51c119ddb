use log::info;

use crate::{
    body::Body,
    constants::DELTA,
    error::SimError,
    presets,
    sim::{
        ForceSolver, GravityParams, PhysicsEngine,
        collision::{self, CollisionMode, CollisionReport},
    },
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    pub gravity: GravityParams,
    pub timestep: f32,
    pub collision: CollisionMode,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            gravity: GravityParams::default(),
            timestep: DELTA,
            collision: CollisionMode::Disabled,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        self.gravity.validate()?;
        validate_timestep(self.timestep)?;
        self.collision.validate()
    }
}

fn validate_timestep(dt: f32) -> Result<(), SimError> {
    if dt.is_finite() && dt > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidTimestep(dt))
    }
}

/// Owns the body set and advances it one fixed timestep at a time.
pub struct Simulation {
    bodies: Vec<Body>,
    engine: PhysicsEngine,
    timestep: f32,
    collision: CollisionMode,
    ticks: u64,
    last_collisions: CollisionReport,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self {
            bodies: Vec::new(),
            engine: PhysicsEngine::new(config.gravity),
            timestep: config.timestep,
            collision: config.collision,
            ticks: 0,
            last_collisions: CollisionReport::default(),
        })
    }

    pub fn with_solver(
        config: SimulationConfig,
        solver: Box<dyn ForceSolver>,
    ) -> Result<Self, SimError> {
        let mut sim = Self::new(config)?;
        sim.engine.set_solver(solver);
        Ok(sim)
    }

    pub fn config(&self) -> SimulationConfig {
        SimulationConfig {
            gravity: self.engine.params(),
            timestep: self.timestep,
            collision: self.collision,
        }
    }

    /// Replaces the bodies with the starter system.
    pub fn init(&mut self) {
        let bodies = presets::starter_system(self.engine.params().g);
        self.set_bodies(bodies);
        info!("initialized starter system with {} bodies", self.bodies.len());
    }

    /// Replaces the bodies with a reproducible random system.
    pub fn init_random(&mut self, n_bodies: usize, seed: u64) {
        self.set_bodies(presets::random_system(n_bodies, seed));
        info!("initialized random system with {n_bodies} bodies (seed {seed})");
    }

    /// Replaces the bodies and resets the clock.
    pub fn set_bodies(&mut self, bodies: Vec<Body>) {
        self.bodies = bodies;
        self.ticks = 0;
        self.last_collisions = CollisionReport::default();
    }

    /// Forces, velocities, positions, then collisions.
    pub fn step(&mut self) {
        if self.bodies.is_empty() {
            return;
        }

        let dt = self.timestep;
        self.engine.compute_forces(&mut self.bodies, dt);
        self.engine.integrate(&mut self.bodies, dt);
        self.last_collisions = collision::resolve(&mut self.bodies, &self.collision);
        self.ticks += 1;
    }

    pub fn run(&mut self, steps: u64) {
        for _ in 0..steps {
            self.step();
        }
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn bodies_mut(&mut self) -> &mut [Body] {
        &mut self.bodies
    }

    pub fn set_gravity_params(&mut self, g: f32, softening: f32) -> Result<(), SimError> {
        self.engine.set_params(GravityParams { g, softening })
    }

    pub fn gravity_params(&self) -> (f32, f32) {
        let params = self.engine.params();
        (params.g, params.softening)
    }

    pub fn set_timestep(&mut self, dt: f32) -> Result<(), SimError> {
        validate_timestep(dt)?;
        self.timestep = dt;
        Ok(())
    }

    pub fn timestep(&self) -> f32 {
        self.timestep
    }

    pub fn set_collision_mode(&mut self, mode: CollisionMode) -> Result<(), SimError> {
        mode.validate()?;
        self.collision = mode;
        Ok(())
    }

    pub fn collision_mode(&self) -> CollisionMode {
        self.collision
    }

    pub fn set_solver(&mut self, solver: Box<dyn ForceSolver>) {
        self.engine.set_solver(solver);
    }

    /// Contacts and merges of the latest step. Held body indices must be passed through
    /// [`CollisionReport::remap_index`] after a step that merged bodies.
    pub fn last_collisions(&self) -> &CollisionReport {
        &self.last_collisions
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Simulated time since the last reinitialization.
    pub fn elapsed(&self) -> f64 {
        self.ticks as f64 * self.timestep as f64
    }

    pub fn clear_trails(&mut self) {
        for body in &mut self.bodies {
            body.clear_trail();
        }
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Zero;

    use super::*;
    use crate::vector::Vector2;

    #[test]
    fn empty_step_is_a_noop() {
        let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
        sim.step();
        assert!(sim.bodies().is_empty());
        assert_eq!(sim.ticks(), 0);
    }

    #[test]
    fn rejects_invalid_config() {
        let config = SimulationConfig {
            timestep: -0.1,
            ..Default::default()
        };
        assert!(matches!(
            Simulation::new(config),
            Err(SimError::InvalidTimestep(_))
        ));
    }

    #[test]
    fn failed_setters_keep_previous_values() {
        let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
        assert!(sim.set_gravity_params(f32::NAN, 0.1).is_err());
        assert_eq!(sim.gravity_params(), (0.05, 0.02));
        assert!(sim.set_timestep(0.0).is_err());
        assert_eq!(sim.timestep(), DELTA);
        assert!(
            sim.set_collision_mode(CollisionMode::Impulse { restitution: 2.0 })
                .is_err()
        );
        assert_eq!(sim.collision_mode(), CollisionMode::Disabled);

        sim.set_gravity_params(0.1, 0.05).unwrap();
        assert_eq!(sim.gravity_params(), (0.1, 0.05));
        assert_eq!(sim.config().gravity.g, 0.1);
    }

    #[test]
    fn reinitializing_resets_clock_and_trails() {
        let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
        sim.init();
        sim.run(10);
        assert_eq!(sim.ticks(), 10);
        assert_eq!(sim.bodies()[1].trail().len(), 10);
        assert!((sim.elapsed() - 10.0 * DELTA as f64).abs() < 1e-9);

        sim.init_random(3, 9);
        assert_eq!(sim.ticks(), 0);
        assert!(sim.bodies().iter().all(|b| b.trail().is_empty()));
    }

    #[test]
    fn edited_bodies_are_stepped() {
        let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
        sim.set_bodies(vec![Body::new("lone", Vector2::zero(), Vector2::zero(), 1.0, 0.1)]);
        sim.bodies_mut()[0].velocity = Vector2::new(2.0, 0.0);
        sim.run(4);
        assert!(sim.bodies()[0].position.x > 0.0);
        assert_eq!(sim.bodies()[0].trail().len(), 4);

        sim.clear_trails();
        assert!(sim.bodies()[0].trail().is_empty());
        assert_eq!(sim.ticks(), 4);
    }

    #[test]
    fn lone_body_keeps_its_velocity() {
        let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
        sim.set_bodies(vec![Body::new(
            "lone",
            Vector2::zero(),
            Vector2::new(0.5, -0.25),
            2.0,
            0.1,
        )]);
        sim.run(100);
        assert_eq!(sim.bodies()[0].velocity, Vector2::new(0.5, -0.25));
        assert_eq!(sim.bodies()[0].force(), Vector2::zero());
    }

    #[test]
    fn merges_are_reported() {
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
            Body::new("b", Vector2::new(0.05, 0.0), Vector2::zero(), 2.0, 0.1),
        ]);
        sim.step();
        assert_eq!(sim.bodies().len(), 1);
        assert_eq!(sim.bodies()[0].mass, 3.0);
        assert_eq!(sim.last_collisions().merges.len(), 1);
        assert_eq!(sim.last_collisions().remap_index(1), None);
    }
}
