use cgmath::{InnerSpace, Zero};

/// 2D vector used for every position, velocity and force in the simulation.
pub type Vector2 = cgmath::Vector2<f32>;

pub trait Vector2Ext {
    fn length(&self) -> f32;

    /// Unit vector in the same direction, or the zero vector when the length is zero.
    fn normalized_or_zero(&self) -> Self;

    /// The vector rotated by +90 degrees.
    fn perpendicular(&self) -> Self;
}

impl Vector2Ext for Vector2 {
    #[inline]
    fn length(&self) -> f32 {
        self.magnitude()
    }

    #[inline]
    fn normalized_or_zero(&self) -> Self {
        let len = self.magnitude();
        if len == 0.0 {
            Vector2::zero()
        } else {
            *self / len
        }
    }

    #[inline]
    fn perpendicular(&self) -> Self {
        Vector2::new(-self.y, self.x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizing_zero_yields_zero() {
        let v = Vector2::zero().normalized_or_zero();
        assert_eq!(v, Vector2::zero());
        assert!(v.x.is_finite() && v.y.is_finite());
    }

    #[test]
    fn normalized_has_unit_length() {
        let v = Vector2::new(3.0, -4.0);
        assert_eq!(v.length(), 5.0);
        let n = v.normalized_or_zero();
        assert!((n.length() - 1.0).abs() < 1e-6);
        assert!((n.x - 0.6).abs() < 1e-6);
        assert!((n.y + 0.8).abs() < 1e-6);
    }

    #[test]
    fn perpendicular_is_orthogonal() {
        let v = Vector2::new(0.0, 0.8);
        let p = v.perpendicular();
        assert_eq!(p, Vector2::new(-0.8, 0.0));
        assert_eq!(v.dot(p), 0.0);
    }
}
