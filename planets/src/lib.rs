pub mod batch_request;
pub mod body;
pub mod camera;
pub mod constants;
pub mod diagnostics;
mod error;
pub mod presets;
pub mod runner;
pub mod sim;
pub mod simulation;
pub mod vector;

pub use batch_request::{BatchRequest, BodySample};
pub use body::{Body, Trail};
pub use camera::{Camera, CameraUniform, Framed};
pub use diagnostics::SystemStats;
pub use error::SimError;
pub use sim::{
    ForceSolver, GravityParams, PairwiseSolver, ParallelSolver, PhysicsEngine,
    collision::{CollisionMode, CollisionReport, Contact, MergeEvent},
};
pub use simulation::{Simulation, SimulationConfig};
pub use vector::{Vector2, Vector2Ext};
