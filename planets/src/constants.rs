// PHYSICS
/// Gravitational constant in simulation units. Tuned for visual stability, not physical accuracy.
pub const G: f32 = 0.05;
/// Added (squared) to the distance denominator so forces stay bounded as bodies approach.
pub const SOFTENING: f32 = 0.02;
/// Fixed physics step, independent of the render frame time.
pub const DELTA: f32 = 0.0015;

// BODIES
/// Number of positions retained per body for trail rendering.
pub const TRAIL_MAX_LENGTH: usize = 1000;

// COLLISIONS
/// Share of the penetration depth removed per step by the impulse solver.
pub const CORRECTION_PERCENT: f32 = 0.8;
/// Penetration tolerated before positional correction kicks in.
pub const CORRECTION_SLOP: f32 = 1e-3;
/// Default coefficient of restitution.
pub const RESTITUTION: f32 = 0.5;
/// Default share of approach speed removed by soft damping.
pub const COLLISION_DAMPING: f32 = 0.5;
/// Default normal speed below which overlapping bodies merge.
pub const MERGE_SPEED: f32 = 0.5;

// SIMULATION
/// Hard cap on number of threads to use.
pub const MAX_THREADS: usize = 20;
/// Minimum number of objects per thread.
pub const OBJECTS_PER_THREAD: usize = 64;
/// Upper bound on physics steps run for a single wake-up of the simulation thread.
pub const MAX_SUBSTEPS: u32 = 200;
/// Accepted range for the time scale knob.
pub const TIME_SCALE_RANGE: (f32, f32) = (0.01, 10.0);

// CAMERA
/// Lower zoom bound, keeps the view finite for huge scenes.
pub const MIN_ZOOM: f32 = 5e-4;
/// Upper zoom bound, keeps the view finite for zero-extent scenes.
pub const MAX_ZOOM: f32 = 100.0;
/// Bounds of the user zoom multiplier.
pub const ZOOM_OFFSET_RANGE: (f32, f32) = (0.1, 10.0);
/// Bounds of the outlier multiplier.
pub const OUTLIER_MULTIPLIER_RANGE: (f32, f32) = (1.0, 10.0);
/// Rate constant of the exponential position smoothing.
pub const CAMERA_SMOOTHING: f32 = 5.0;
/// Padding added around the framed bounding box.
pub const FRAME_PADDING: f32 = 1.2;
/// Floor for the framed extent in each dimension.
pub const MIN_FRAME_EXTENT: f32 = 1e-4;

// RANDOM SYSTEMS
/// Positions are drawn from `[-RANDOM_POSITION_EXTENT, RANDOM_POSITION_EXTENT]` on each axis.
pub const RANDOM_POSITION_EXTENT: f32 = 2.0;
/// Velocities are drawn from `[-RANDOM_SPEED, RANDOM_SPEED]` on each axis.
pub const RANDOM_SPEED: f32 = 0.25;
pub const RANDOM_MASS_RANGE: (f32, f32) = (1.0, 10.0);
pub const RANDOM_RADIUS_RANGE: (f32, f32) = (0.02, 0.06);
