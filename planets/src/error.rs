//! Error types for the simulation core.
//!
//! Only configuration can fail. Numerical edge cases inside a step (coincident bodies,
//! zero-extent scenes) are absorbed where they occur and never surface here.

use std::fmt;

/// Errors raised when a configuration value is rejected.
#[derive(Debug)]
pub enum SimError {
    /// Timestep is not a finite, strictly positive number.
    InvalidTimestep(f32),
    /// Gravitational constant is negative or not finite.
    InvalidGravity(f32),
    /// Softening length is negative or not finite.
    InvalidSoftening(f32),
    /// Restitution lies outside `[0, 1]`.
    InvalidRestitution(f32),
    /// Damping lies outside `[0, 1]`.
    InvalidDamping(f32),
    /// Merge speed is negative or not finite.
    InvalidMergeSpeed(f32),
    /// Failed to build the worker pool of the parallel solver.
    ThreadPool(rayon::ThreadPoolBuildError),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::InvalidTimestep(v) => {
                write!(f, "Timestep must be finite and positive, got {}", v)
            }
            SimError::InvalidGravity(v) => {
                write!(f, "Gravitational constant must be finite and non-negative, got {}", v)
            }
            SimError::InvalidSoftening(v) => {
                write!(f, "Softening must be finite and non-negative, got {}", v)
            }
            SimError::InvalidRestitution(v) => {
                write!(f, "Restitution must lie in [0, 1], got {}", v)
            }
            SimError::InvalidDamping(v) => write!(f, "Damping must lie in [0, 1], got {}", v),
            SimError::InvalidMergeSpeed(v) => {
                write!(f, "Merge speed must be finite and non-negative, got {}", v)
            }
            SimError::ThreadPool(e) => write!(f, "Failed to build solver thread pool: {}", e),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::ThreadPool(e) => Some(e),
            _ => None,
        }
    }
}

impl From<rayon::ThreadPoolBuildError> for SimError {
    fn from(e: rayon::ThreadPoolBuildError) -> Self {
        SimError::ThreadPool(e)
    }
}
