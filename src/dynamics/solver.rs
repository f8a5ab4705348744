use glam::Vec2;

use crate::collision::Collision;
use crate::core::RigidBody;

/// 2D cross product (z component of the 3D cross).
fn cross(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Velocity of a body at a world-space point, including rotation.
fn point_velocity(body: &RigidBody, r: Vec2) -> Vec2 {
    body.velocity + body.angular_velocity * Vec2::new(-r.y, r.x)
}

/// Impulse-based contact solver with Coulomb friction and positional
/// correction. Dragged bodies act as immovable kinematic obstacles: their
/// inverse mass is zero and their state is never written.
#[derive(Debug, Clone)]
pub struct ContactSolver {
    /// Fraction of the remaining penetration corrected per resolve.
    pub correction_percent: f32,
    /// Penetration depth tolerated before positional correction applies.
    pub slop: f32,
}

impl Default for ContactSolver {
    fn default() -> Self {
        Self {
            correction_percent: 0.8,
            slop: 0.01,
        }
    }
}

impl ContactSolver {
    /// Resolves one contact between `a` and `b`. The collision normal is
    /// expected to point from `b` toward `a`.
    pub fn resolve(&self, a: &mut RigidBody, b: &mut RigidBody, contact: &Collision) {
        let normal = contact.normal;
        let r_a = contact.contact_point - a.pivot();
        let r_b = contact.contact_point - b.pivot();

        let relative_velocity = point_velocity(a, r_a) - point_velocity(b, r_b);
        let vel_along_normal = relative_velocity.dot(normal);

        // Already separating; an impulse here would add energy.
        if vel_along_normal > 0.0 {
            return;
        }

        let inv_mass_a = a.inv_mass();
        let inv_mass_b = b.inv_mass();
        let inv_inertia_a = a.inv_inertia();
        let inv_inertia_b = b.inv_inertia();

        let r_a_cross_n = cross(r_a, normal);
        let r_b_cross_n = cross(r_b, normal);
        let denom = inv_mass_a
            + inv_mass_b
            + r_a_cross_n * r_a_cross_n * inv_inertia_a
            + r_b_cross_n * r_b_cross_n * inv_inertia_b;
        if denom <= f32::EPSILON {
            return;
        }

        let restitution = a.restitution.min(b.restitution);
        let j = -(1.0 + restitution) * vel_along_normal / denom;
        let impulse = j * normal;

        if !a.is_dragging {
            a.velocity += impulse * inv_mass_a;
            a.angular_velocity += inv_inertia_a * cross(r_a, impulse);
        }
        if !b.is_dragging {
            b.velocity -= impulse * inv_mass_b;
            b.angular_velocity -= inv_inertia_b * cross(r_b, impulse);
        }

        // Friction impulse along the contact tangent, clamped by the normal
        // impulse magnitude (Coulomb cone).
        let tangent = Vec2::new(-normal.y, normal.x);
        let relative_velocity = point_velocity(a, r_a) - point_velocity(b, r_b);
        let vel_along_tangent = relative_velocity.dot(tangent);

        let r_a_cross_t = cross(r_a, tangent);
        let r_b_cross_t = cross(r_b, tangent);
        let tangent_denom = inv_mass_a
            + inv_mass_b
            + r_a_cross_t * r_a_cross_t * inv_inertia_a
            + r_b_cross_t * r_b_cross_t * inv_inertia_b;

        if tangent_denom > f32::EPSILON {
            let friction = a.friction.min(b.friction);
            let max_friction = j.abs() * friction;
            let jt = (-vel_along_tangent / tangent_denom).clamp(-max_friction, max_friction);
            let friction_impulse = jt * tangent;

            if !a.is_dragging {
                a.velocity += friction_impulse * inv_mass_a;
                a.angular_velocity += inv_inertia_a * cross(r_a, friction_impulse);
            }
            if !b.is_dragging {
                b.velocity -= friction_impulse * inv_mass_b;
                b.angular_velocity -= inv_inertia_b * cross(r_b, friction_impulse);
            }
        }

        self.correct_positions(a, b, contact);
    }

    /// Splits the remaining penetration between the bodies by inverse-mass
    /// share so stacked contacts settle without jitter.
    fn correct_positions(&self, a: &mut RigidBody, b: &mut RigidBody, contact: &Collision) {
        let inv_mass_a = a.inv_mass();
        let inv_mass_b = b.inv_mass();
        let total_inv_mass = inv_mass_a + inv_mass_b;
        if total_inv_mass <= f32::EPSILON {
            return;
        }

        let depth = (contact.penetration - self.slop).max(0.0);
        let correction = contact.normal * (depth / total_inv_mass * self.correction_percent);

        if !a.is_dragging {
            a.position += correction * inv_mass_a;
        }
        if !b.is_dragging {
            b.position -= correction * inv_mass_b;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::check_collision;
    use crate::core::BodyId;
    use glam::Vec2;

    fn overlapping_pair() -> (RigidBody, RigidBody) {
        let mut a = RigidBody::new(BodyId(1), Vec2::new(0.0, 0.0), 10.0, 10.0);
        let mut b = RigidBody::new(BodyId(2), Vec2::new(8.0, 0.0), 10.0, 10.0);
        a.velocity = Vec2::new(50.0, 0.0);
        b.velocity = Vec2::new(-50.0, 0.0);
        (a, b)
    }

    #[test]
    fn head_on_collision_reverses_approach() {
        let (mut a, mut b) = overlapping_pair();
        let contact = check_collision(&a, &b).expect("overlap");
        let solver = ContactSolver::default();
        solver.resolve(&mut a, &mut b, &contact);

        // After the impulse the bodies must no longer be approaching.
        let relative = a.velocity - b.velocity;
        assert!(relative.dot(contact.normal) >= 0.0);
    }

    #[test]
    fn separating_bodies_are_untouched() {
        let (mut a, mut b) = overlapping_pair();
        a.velocity = Vec2::new(-50.0, 0.0);
        b.velocity = Vec2::new(50.0, 0.0);
        let contact = check_collision(&a, &b).expect("overlap");

        let before = (a.velocity, b.velocity, a.position, b.position);
        ContactSolver::default().resolve(&mut a, &mut b, &contact);
        assert_eq!(a.velocity, before.0);
        assert_eq!(b.velocity, before.1);
        assert_eq!(a.position, before.2);
        assert_eq!(b.position, before.3);
    }

    #[test]
    fn dragged_body_is_never_mutated() {
        let (mut a, mut b) = overlapping_pair();
        b.is_dragging = true;
        let contact = check_collision(&a, &b).expect("overlap");
        let b_before = b.clone();

        ContactSolver::default().resolve(&mut a, &mut b, &contact);

        assert_eq!(b.position, b_before.position);
        assert_eq!(b.velocity, b_before.velocity);
        assert_eq!(b.angular_velocity, b_before.angular_velocity);
        // The free body takes the full correction instead.
        assert!(a.velocity.x < 50.0);
    }

    #[test]
    fn two_dragged_bodies_are_a_no_op() {
        let (mut a, mut b) = overlapping_pair();
        a.is_dragging = true;
        b.is_dragging = true;
        let contact = check_collision(&a, &b).expect("overlap");
        let before = (a.clone(), b.clone());

        ContactSolver::default().resolve(&mut a, &mut b, &contact);

        assert_eq!(a.position, before.0.position);
        assert_eq!(b.position, before.1.position);
    }

    #[test]
    fn positional_correction_reduces_penetration() {
        let (mut a, mut b) = overlapping_pair();
        a.velocity = Vec2::ZERO;
        b.velocity = Vec2::ZERO;
        let contact = check_collision(&a, &b).expect("overlap");

        ContactSolver::default().resolve(&mut a, &mut b, &contact);

        let after = check_collision(&a, &b);
        match after {
            Some(c) => assert!(c.penetration < contact.penetration),
            None => {}
        }
    }
}
