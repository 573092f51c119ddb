use cgmath::Zero;
use rayon::iter::{
    IndexedParallelIterator, IntoParallelRefIterator, IntoParallelRefMutIterator, ParallelIterator,
};

use crate::{body::Body, sim::GravityParams, vector::Vector2};

/// Visits every unordered pair once and applies the force and its exact negation.
pub fn accumulate_pairwise(bodies: &mut [Body], params: &GravityParams) {
    for body in bodies.iter_mut() {
        body.clear_forces();
    }

    for i in 0..bodies.len() {
        let (head, tail) = bodies.split_at_mut(i + 1);
        let obj = &mut head[i];
        for other in tail.iter_mut() {
            if let Some(force) = params.pair_force(obj, other) {
                obj.apply_force(force);
                other.apply_force(-force);
            }
        }
    }
}

/// Each worker owns one output slot and sums the full row of its body. The pair kernel is
/// antisymmetric, so the two halves of every pair still cancel exactly.
pub fn accumulate_rows(bodies: &mut [Body], out_buffer: &mut [Vector2], params: &GravityParams) {
    debug_assert!(out_buffer.len() == bodies.len());
    let objects: &[Body] = bodies;
    objects
        .par_iter()
        .zip(out_buffer.par_iter_mut())
        .enumerate()
        .for_each(|(i, (obj, out))| {
            *out = Vector2::zero();
            for (other_idx, other) in objects.iter().enumerate() {
                if other_idx == i {
                    continue;
                }
                if let Some(force) = params.pair_force(obj, other) {
                    *out += force;
                }
            }
        });

    bodies
        .par_iter_mut()
        .zip(out_buffer.par_iter())
        .for_each(|(obj, force)| {
            obj.clear_forces();
            obj.apply_force(*force);
        });
}

pub fn integrate_velocities(bodies: &mut [Body], dt: f32) {
    for obj in bodies.iter_mut() {
        obj.integrate_velocity(dt);
    }
}

pub fn integrate_positions(bodies: &mut [Body], dt: f32) {
    for obj in bodies.iter_mut() {
        obj.integrate_position(dt);
    }
}
