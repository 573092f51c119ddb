use cgmath::{Vector3, Zero};

use crate::{constants::TRAIL_MAX_LENGTH, vector::Vector2};

/// Fixed-capacity history of positions. Once full, each push overwrites the oldest sample.
#[derive(Debug, Clone)]
pub struct Trail {
    buff: Vec<Vector2>,
    head: usize,
    capacity: usize,
}

impl Trail {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0);
        Self {
            buff: Vec::new(),
            head: 0,
            capacity,
        }
    }

    pub fn push(&mut self, point: Vector2) {
        if self.buff.len() < self.capacity {
            self.buff.push(point);
        } else {
            self.buff[self.head] = point;
            self.head = (self.head + 1) % self.capacity;
        }
    }

    /// Samples from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Vector2> + '_ {
        self.buff[self.head..]
            .iter()
            .chain(self.buff[..self.head].iter())
    }

    pub fn latest(&self) -> Option<&Vector2> {
        if self.buff.is_empty() {
            return None;
        }
        let idx = (self.head + self.buff.len() - 1) % self.buff.len();
        self.buff.get(idx)
    }

    pub fn len(&self) -> usize {
        self.buff.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buff.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.buff.clear();
        self.head = 0;
    }
}

impl Default for Trail {
    fn default() -> Self {
        Self::new(TRAIL_MAX_LENGTH)
    }
}

/// A simulated point mass.
#[derive(Debug, Clone)]
pub struct Body {
    pub name: String,
    pub position: Vector2,
    pub velocity: Vector2,
    pub mass: f32,
    pub radius: f32,
    pub color: Vector3<f32>,
    force: Vector2,
    trail: Trail,
}

impl Body {
    /// # Panics
    ///
    /// If `mass` or `radius` is not strictly positive.
    pub fn new(
        name: impl Into<String>,
        position: Vector2,
        velocity: Vector2,
        mass: f32,
        radius: f32,
    ) -> Self {
        assert!(mass > 0.0, "body mass must be positive, got {mass}");
        assert!(radius > 0.0, "body radius must be positive, got {radius}");
        Self {
            name: name.into(),
            position,
            velocity,
            mass,
            radius,
            color: Vector3::new(1.0, 1.0, 1.0),
            force: Vector2::zero(),
            trail: Trail::default(),
        }
    }

    pub fn with_color(mut self, color: impl Into<Vector3<f32>>) -> Self {
        self.color = color.into();
        self
    }

    /// Adds `f` to the accumulator. Velocity only changes on [`Body::integrate_velocity`].
    #[inline]
    pub fn apply_force(&mut self, f: Vector2) {
        self.force += f;
    }

    #[inline]
    pub fn clear_forces(&mut self) {
        self.force = Vector2::zero();
    }

    /// Force accumulated so far this step.
    pub fn force(&self) -> Vector2 {
        self.force
    }

    #[inline]
    pub fn integrate_velocity(&mut self, dt: f32) {
        self.velocity += self.force / self.mass * dt;
    }

    /// Moves the body along its current velocity and records the new position in the trail.
    #[inline]
    pub fn integrate_position(&mut self, dt: f32) {
        self.position += self.velocity * dt;
        self.trail.push(self.position);
    }

    pub fn momentum(&self) -> Vector2 {
        self.velocity * self.mass
    }

    pub fn trail(&self) -> &Trail {
        &self.trail
    }

    pub fn clear_trail(&mut self) {
        self.trail.clear();
    }

    /// Folds `other` into `self`: mass and momentum are conserved, volume is conserved through
    /// the radius, position and color become mass-weighted averages.
    pub fn absorb(&mut self, other: &Body) {
        let total = self.mass + other.mass;
        let w_self = self.mass / total;
        let w_other = other.mass / total;

        self.velocity = (self.momentum() + other.momentum()) / total;
        self.position = self.position * w_self + other.position * w_other;
        self.color = self.color * w_self + other.color * w_other;
        self.radius = (self.radius.powi(3) + other.radius.powi(3)).cbrt();
        self.mass = total;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_at(x: f32, y: f32) -> Body {
        Body::new("test", Vector2::new(x, y), Vector2::zero(), 1.0, 0.1)
    }

    #[test]
    fn force_is_deferred_until_integration() {
        let mut b = body_at(0.0, 0.0);
        b.apply_force(Vector2::new(2.0, 0.0));
        b.apply_force(Vector2::new(0.0, -1.0));
        assert_eq!(b.velocity, Vector2::zero());
        assert_eq!(b.force(), Vector2::new(2.0, -1.0));

        b.integrate_velocity(0.5);
        assert_eq!(b.velocity, Vector2::new(1.0, -0.5));

        b.clear_forces();
        assert_eq!(b.force(), Vector2::zero());
    }

    #[test]
    fn position_integration_records_trail() {
        let mut b = body_at(1.0, 1.0);
        b.velocity = Vector2::new(1.0, 0.0);
        b.integrate_position(0.5);
        assert_eq!(b.position, Vector2::new(1.5, 1.0));
        assert_eq!(b.trail().len(), 1);
        assert_eq!(b.trail().latest(), Some(&Vector2::new(1.5, 1.0)));
    }

    #[test]
    fn trail_evicts_oldest_first() {
        let mut trail = Trail::new(4);
        assert_eq!(trail.capacity(), 4);
        assert_eq!(Trail::default().capacity(), TRAIL_MAX_LENGTH);
        for i in 0..10 {
            trail.push(Vector2::new(i as f32, 0.0));
        }
        let xs: Vec<f32> = trail.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![6.0, 7.0, 8.0, 9.0]);
        assert_eq!(trail.len(), trail.capacity());
        assert_eq!(trail.latest().map(|p| p.x), Some(9.0));

        trail.clear();
        assert!(trail.is_empty());
        assert_eq!(trail.latest(), None);
        trail.push(Vector2::new(42.0, 0.0));
        assert_eq!(trail.iter().count(), 1);
    }

    #[test]
    fn absorb_conserves_mass_momentum_and_volume() {
        let mut a = Body::new("a", Vector2::new(0.0, 0.0), Vector2::new(1.0, 0.0), 3.0, 0.2)
            .with_color((1.0, 0.0, 0.0));
        let b = Body::new("b", Vector2::new(1.0, 0.0), Vector2::new(-1.0, 2.0), 1.0, 0.1)
            .with_color((0.0, 0.0, 1.0));
        let momentum = a.momentum() + b.momentum();

        a.absorb(&b);

        assert_eq!(a.mass, 4.0);
        let expected_radius = (0.2f32.powi(3) + 0.1f32.powi(3)).cbrt();
        assert!((a.radius - expected_radius).abs() < 1e-6);
        assert!((a.momentum().x - momentum.x).abs() < 1e-5);
        assert!((a.momentum().y - momentum.y).abs() < 1e-5);
        assert!((a.position.x - 0.25).abs() < 1e-6);
        assert!((a.color.x - 0.75).abs() < 1e-6);
        assert!((a.color.z - 0.25).abs() < 1e-6);
    }

    #[test]
    #[should_panic]
    fn zero_mass_is_rejected() {
        let _ = Body::new("void", Vector2::zero(), Vector2::zero(), 0.0, 1.0);
    }
}
