use cgmath::InnerSpace;
use log::debug;

use crate::{
    body::Body,
    constants::{CORRECTION_PERCENT, CORRECTION_SLOP},
    error::SimError,
    vector::Vector2,
};

/// How overlapping bodies respond. Exactly one strategy is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CollisionMode {
    /// Bodies pass through each other.
    #[default]
    Disabled,
    /// Restitution impulse along the contact normal plus positional correction.
    Impulse { restitution: f32 },
    /// Approaching pairs lose a share of their normal approach speed.
    SoftDamping { damping: f32 },
    /// Slow contacts merge into one body, fast ones bounce with `restitution`.
    Merge { merge_speed: f32, restitution: f32 },
}

impl CollisionMode {
    pub fn validate(&self) -> Result<(), SimError> {
        let unit = |v: f32| (0.0..=1.0).contains(&v);
        match *self {
            CollisionMode::Disabled => Ok(()),
            CollisionMode::Impulse { restitution } if !unit(restitution) => {
                Err(SimError::InvalidRestitution(restitution))
            }
            CollisionMode::Impulse { .. } => Ok(()),
            CollisionMode::SoftDamping { damping } if !unit(damping) => {
                Err(SimError::InvalidDamping(damping))
            }
            CollisionMode::SoftDamping { .. } => Ok(()),
            CollisionMode::Merge {
                merge_speed,
                restitution,
            } => {
                if !merge_speed.is_finite() || merge_speed < 0.0 {
                    Err(SimError::InvalidMergeSpeed(merge_speed))
                } else if !unit(restitution) {
                    Err(SimError::InvalidRestitution(restitution))
                } else {
                    Ok(())
                }
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, CollisionMode::Disabled)
    }
}

/// An overlapping pair, `first < second`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub first: usize,
    pub second: usize,
    /// Unit vector from `first` towards `second`.
    pub normal: Vector2,
    pub penetration: f32,
    /// Relative velocity along the normal. Negative while approaching.
    pub normal_speed: f32,
}

/// Indices refer to the body list as it was before compaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeEvent {
    pub survivor: usize,
    pub absorbed: usize,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CollisionReport {
    pub contacts: usize,
    pub merges: Vec<MergeEvent>,
}

impl CollisionReport {
    /// Maps an index from before the step onto the compacted list. `None` if that body was
    /// absorbed.
    pub fn remap_index(&self, idx: usize) -> Option<usize> {
        let mut removed_before = 0;
        for merge in &self.merges {
            if merge.absorbed == idx {
                return None;
            }
            if merge.absorbed < idx {
                removed_before += 1;
            }
        }
        Some(idx - removed_before)
    }
}

/// Finds every overlapping pair in ascending `(first, second)` order.
pub fn detect_contacts(bodies: &[Body]) -> Vec<Contact> {
    let mut contacts = Vec::new();
    for (i, obj) in bodies.iter().enumerate() {
        for (j, other) in bodies.iter().enumerate().skip(i + 1) {
            let rel = other.position - obj.position;
            let dist = rel.magnitude();
            let reach = obj.radius + other.radius;
            if dist >= reach {
                continue;
            }
            // Coincident centres have no direction, any fixed axis keeps the result deterministic.
            let normal = if dist > 0.0 {
                rel / dist
            } else {
                Vector2::unit_x()
            };
            contacts.push(Contact {
                first: i,
                second: j,
                normal,
                penetration: reach - dist,
                normal_speed: (other.velocity - obj.velocity).dot(normal),
            });
        }
    }
    contacts
}

/// Detects contacts, resolves them in order, then drops absorbed bodies in one compaction.
pub fn resolve(bodies: &mut Vec<Body>, mode: &CollisionMode) -> CollisionReport {
    if !mode.is_enabled() {
        return CollisionReport::default();
    }

    let contacts = detect_contacts(bodies);
    let mut report = CollisionReport {
        contacts: contacts.len(),
        merges: Vec::new(),
    };
    if contacts.is_empty() {
        return report;
    }

    let mut absorbed = vec![false; bodies.len()];
    for contact in &contacts {
        if absorbed[contact.first] || absorbed[contact.second] {
            continue;
        }
        let (obj, other) = pair_mut(bodies, contact.first, contact.second);
        match *mode {
            CollisionMode::Disabled => (),
            CollisionMode::Impulse { restitution } => {
                apply_impulse(obj, other, contact.normal, restitution)
            }
            CollisionMode::SoftDamping { damping } => {
                apply_damping(obj, other, contact.normal, damping)
            }
            CollisionMode::Merge {
                merge_speed,
                restitution,
            } => {
                let speed = (other.velocity - obj.velocity).dot(contact.normal);
                if speed.abs() < merge_speed {
                    debug!(
                        "merging {} ({}) into {} ({})",
                        other.name, contact.second, obj.name, contact.first
                    );
                    obj.absorb(other);
                    absorbed[contact.second] = true;
                    report.merges.push(MergeEvent {
                        survivor: contact.first,
                        absorbed: contact.second,
                    });
                } else {
                    apply_impulse(obj, other, contact.normal, restitution);
                }
            }
        }
    }

    if !report.merges.is_empty() {
        let mut idx = 0;
        bodies.retain(|_| {
            let keep = !absorbed[idx];
            idx += 1;
            keep
        });
    }

    report
}

fn pair_mut(bodies: &mut [Body], first: usize, second: usize) -> (&mut Body, &mut Body) {
    debug_assert!(first < second);
    let (head, tail) = bodies.split_at_mut(second);
    (&mut head[first], &mut tail[0])
}

fn apply_impulse(obj: &mut Body, other: &mut Body, normal: Vector2, restitution: f32) {
    let normal_speed = (other.velocity - obj.velocity).dot(normal);
    if normal_speed > 0.0 {
        return;
    }

    let inv_obj = 1.0 / obj.mass;
    let inv_other = 1.0 / other.mass;
    let inv_sum = inv_obj + inv_other;

    let impulse = -(1.0 + restitution) * normal_speed / inv_sum;
    obj.velocity -= normal * (impulse * inv_obj);
    other.velocity += normal * (impulse * inv_other);

    let penetration = obj.radius + other.radius - (other.position - obj.position).dot(normal);
    let excess = (penetration - CORRECTION_SLOP).max(0.0);
    if excess > 0.0 {
        let correction = normal * (excess / inv_sum * CORRECTION_PERCENT);
        obj.position -= correction * inv_obj;
        other.position += correction * inv_other;
    }
}

fn apply_damping(obj: &mut Body, other: &mut Body, normal: Vector2, damping: f32) {
    let normal_speed = (other.velocity - obj.velocity).dot(normal);
    if normal_speed >= 0.0 {
        return;
    }

    let inv_obj = 1.0 / obj.mass;
    let inv_other = 1.0 / other.mass;
    let impulse = -damping * normal_speed / (inv_obj + inv_other);
    obj.velocity -= normal * (impulse * inv_obj);
    other.velocity += normal * (impulse * inv_other);
}
