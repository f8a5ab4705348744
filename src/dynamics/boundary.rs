use glam::Vec2;

use crate::collision::corners;
use crate::core::RigidBody;

/// Axis-aligned table surface the bodies may be kept inside of.
///
/// The simulation loop itself runs on an unbounded plane; hosts that want a
/// walled table call [`Boundary::reflect`] on each body after integration.
#[derive(Debug, Clone, Copy)]
pub struct Boundary {
    pub min: Vec2,
    pub max: Vec2,
}

impl Boundary {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Pushes the body back inside the bounds and reflects the offending
    /// velocity component, scaled by the body's restitution. A small angular
    /// kick proportional to the tangential speed keeps wall hits from looking
    /// perfectly elastic.
    pub fn reflect(&self, body: &mut RigidBody) {
        if body.is_dragging {
            return;
        }

        let pts = corners(body);
        let mut lo = pts[0];
        let mut hi = pts[0];
        for p in &pts[1..] {
            lo = lo.min(*p);
            hi = hi.max(*p);
        }

        // The reflected component always points back into the table, even if
        // the body was already moving inward when it strayed past a wall.
        if lo.x < self.min.x {
            body.position.x += self.min.x - lo.x;
            body.velocity.x = body.velocity.x.abs() * body.restitution;
            body.angular_velocity += body.velocity.y * 0.001;
        } else if hi.x > self.max.x {
            body.position.x -= hi.x - self.max.x;
            body.velocity.x = -body.velocity.x.abs() * body.restitution;
            body.angular_velocity += body.velocity.y * 0.001;
        }

        if lo.y < self.min.y {
            body.position.y += self.min.y - lo.y;
            body.velocity.y = body.velocity.y.abs() * body.restitution;
            body.angular_velocity -= body.velocity.x * 0.001;
        } else if hi.y > self.max.y {
            body.position.y -= hi.y - self.max.y;
            body.velocity.y = -body.velocity.y.abs() * body.restitution;
            body.angular_velocity -= body.velocity.x * 0.001;
        }
    }
}
