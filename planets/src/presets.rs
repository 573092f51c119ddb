use cgmath::{Vector3, Zero};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    body::Body,
    constants::{RANDOM_MASS_RANGE, RANDOM_POSITION_EXTENT, RANDOM_RADIUS_RANGE, RANDOM_SPEED},
    vector::{Vector2, Vector2Ext},
};

/// Colors cycled by body index in generated systems.
pub const PALETTE: [[f32; 3]; 8] = [
    [0.95, 0.85, 0.30],
    [0.50, 0.80, 1.00],
    [0.90, 0.40, 0.40],
    [0.85, 0.85, 0.95],
    [0.55, 0.90, 0.55],
    [0.95, 0.60, 0.25],
    [0.75, 0.55, 0.95],
    [0.40, 0.90, 0.85],
];

pub fn palette_color(idx: usize) -> Vector3<f32> {
    PALETTE[idx % PALETTE.len()].into()
}

/// Speed of a circular orbit of radius `|body - center|` around a mass `center_mass`, directed
/// along the +90 degree tangent. Degenerate radii leave the velocity untouched.
pub fn circular_orbit_velocity(
    body: &mut Body,
    center: Vector2,
    center_velocity: Vector2,
    center_mass: f32,
    g: f32,
) {
    let rel = body.position - center;
    let radius = rel.length();
    if radius <= 1e-6 {
        return;
    }
    let speed = (g * center_mass / radius).sqrt();
    body.velocity = center_velocity + rel.perpendicular().normalized_or_zero() * speed;
}

/// Heavy star with three planets and a moon on circular orbits.
pub fn starter_system(g: f32) -> Vec<Body> {
    let star = Body::new("star", Vector2::zero(), Vector2::zero(), 1000.0, 0.2)
        .with_color(PALETTE[0]);

    let orbiters = [
        ("inner", 0.8, 5.0, 0.05, PALETTE[0]),
        ("middle", 1.5, 3.0, 0.04, PALETTE[1]),
        ("outer", 2.5, 2.0, 0.03, PALETTE[2]),
        ("moon", 0.9, 0.5, 0.02, PALETTE[3]),
    ];

    let mut bodies = vec![star];
    for (name, orbit, mass, radius, color) in orbiters {
        let mut body = Body::new(name, Vector2::new(0.0, orbit), Vector2::zero(), mass, radius)
            .with_color(color);
        let center = &bodies[0];
        circular_orbit_velocity(&mut body, center.position, center.velocity, center.mass, g);
        bodies.push(body);
    }
    bodies
}

/// `n_bodies` bodies with uniformly drawn state. Identical `(n_bodies, seed)` always yields
/// identical bodies.
pub fn random_system(n_bodies: usize, seed: u64) -> Vec<Body> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut bodies = Vec::with_capacity(n_bodies);
    for i in 0..n_bodies {
        let position = Vector2::new(
            rng.random_range(-RANDOM_POSITION_EXTENT..RANDOM_POSITION_EXTENT),
            rng.random_range(-RANDOM_POSITION_EXTENT..RANDOM_POSITION_EXTENT),
        );
        let velocity = Vector2::new(
            rng.random_range(-RANDOM_SPEED..RANDOM_SPEED),
            rng.random_range(-RANDOM_SPEED..RANDOM_SPEED),
        );
        let mass = rng.random_range(RANDOM_MASS_RANGE.0..RANDOM_MASS_RANGE.1);
        let radius = rng.random_range(RANDOM_RADIUS_RANGE.0..RANDOM_RADIUS_RANGE.1);
        bodies.push(
            Body::new(format!("body_{i}"), position, velocity, mass, radius)
                .with_color(palette_color(i)),
        );
    }
    bodies
}
