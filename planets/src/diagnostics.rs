use std::fmt::Display;

use cgmath::InnerSpace;

use crate::{body::Body, sim::GravityParams, vector::Vector2};

/// Conserved quantities and framing data of a body set, accumulated in `f64`.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SystemStats {
    pub bodies: usize,
    pub total_mass: f64,
    pub momentum: [f64; 2],
    pub center_of_mass: [f64; 2],
    pub kinetic_energy: f64,
    pub potential_energy: f64,
}

impl SystemStats {
    pub fn compute(bodies: &[Body], params: &GravityParams) -> Self {
        let mut stats = Self {
            bodies: bodies.len(),
            ..Default::default()
        };

        let mut weighted = [0.0f64; 2];
        for b in bodies {
            let m = b.mass as f64;
            stats.total_mass += m;
            stats.momentum[0] += m * b.velocity.x as f64;
            stats.momentum[1] += m * b.velocity.y as f64;
            weighted[0] += m * b.position.x as f64;
            weighted[1] += m * b.position.y as f64;
            stats.kinetic_energy += 0.5 * m * b.velocity.magnitude2() as f64;
        }
        if stats.total_mass > 0.0 {
            stats.center_of_mass = [
                weighted[0] / stats.total_mass,
                weighted[1] / stats.total_mass,
            ];
        }

        let eps_sq = (params.softening as f64).powi(2);
        for (i, obj) in bodies.iter().enumerate() {
            for other in &bodies[i + 1..] {
                let dist_sq = (other.position - obj.position).magnitude2() as f64 + eps_sq;
                if dist_sq > 0.0 {
                    stats.potential_energy -=
                        params.g as f64 * obj.mass as f64 * other.mass as f64 / dist_sq.sqrt();
                }
            }
        }

        stats
    }

    pub fn total_energy(&self) -> f64 {
        self.kinetic_energy + self.potential_energy
    }

    pub fn center_of_mass(&self) -> Vector2 {
        Vector2::new(self.center_of_mass[0] as f32, self.center_of_mass[1] as f32)
    }
}

impl Display for SystemStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} bodies, mass {:.3}, p = ({:.3e}, {:.3e}), com = ({:.3}, {:.3}), E = {:.5} (K {:.5}, U {:.5})",
            self.bodies,
            self.total_mass,
            self.momentum[0],
            self.momentum[1],
            self.center_of_mass[0],
            self.center_of_mass[1],
            self.total_energy(),
            self.kinetic_energy,
            self.potential_energy
        )
    }
}
