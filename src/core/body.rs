use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Stable identifier for a simulated body, unique for the body's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub u32);

impl std::fmt::Display for BodyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which controller owns the body while it is being dragged.
///
/// The two modes share the same body data; they differ only in the pivot the
/// rectangle rotates about (and the matching moment of inertia).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DragMode {
    /// Drag by a handle; the body rotates about its geometric center.
    #[default]
    Handle,
    /// Pendulum-style drag; the center of mass sits at the bottom middle and
    /// the inertia is parallel-axis corrected for that pivot.
    Pendulum,
}

/// Core rigid body record: kinematic state, mass properties, and geometry.
///
/// `position` is the top-left corner of the unrotated rectangle, in pixels.
/// Rotation is applied about [`RigidBody::pivot`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RigidBody {
    pub id: BodyId,
    pub position: Vec2,
    /// Radians, normalized to (-π, π].
    pub rotation: f32,
    /// Pixels per second.
    pub velocity: Vec2,
    /// Radians per second.
    pub angular_velocity: f32,
    pub mass: f32,
    pub moment_of_inertia: f32,
    /// Bounciness, 0 to 1.
    pub restitution: f32,
    /// Coulomb friction coefficient, 0 to 1.
    pub friction: f32,
    pub width: f32,
    pub height: f32,
    /// While set, the integrator skips the body and the solver treats it as
    /// immovable (infinite mass and inertia).
    pub is_dragging: bool,
    pub drag_mode: DragMode,
}

/// Moment of inertia of a solid rectangle about its center.
pub fn rect_moment_of_inertia(mass: f32, width: f32, height: f32) -> f32 {
    mass * (width * width + height * height) / 12.0
}

impl RigidBody {
    pub fn new(id: BodyId, position: Vec2, width: f32, height: f32) -> Self {
        let mass = 1.0;
        Self {
            id,
            position,
            rotation: 0.0,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            mass,
            moment_of_inertia: rect_moment_of_inertia(mass, width, height),
            restitution: 0.5,
            friction: 0.4,
            width,
            height,
            is_dragging: false,
            drag_mode: DragMode::Handle,
        }
    }

    /// Geometric center of the rectangle, ignoring rotation.
    pub fn center(&self) -> Vec2 {
        self.position + Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// Offset from the top-left corner to the rotation pivot.
    pub fn pivot_offset(&self) -> Vec2 {
        match self.drag_mode {
            DragMode::Handle => Vec2::new(self.width * 0.5, self.height * 0.5),
            DragMode::Pendulum => Vec2::new(self.width * 0.5, self.height),
        }
    }

    /// World-space rotation pivot.
    pub fn pivot(&self) -> Vec2 {
        self.position + self.pivot_offset()
    }

    pub fn set_mass(&mut self, mass: f32) {
        self.mass = mass;
        self.recompute_inertia();
    }

    pub fn set_drag_mode(&mut self, mode: DragMode) {
        self.drag_mode = mode;
        self.recompute_inertia();
    }

    /// Inverse mass, zero while dragging so the body is immovable.
    pub fn inv_mass(&self) -> f32 {
        if self.is_dragging || self.mass <= f32::EPSILON {
            0.0
        } else {
            1.0 / self.mass
        }
    }

    /// Inverse moment of inertia, zero while dragging.
    pub fn inv_inertia(&self) -> f32 {
        if self.is_dragging || self.moment_of_inertia <= f32::EPSILON {
            0.0
        } else {
            1.0 / self.moment_of_inertia
        }
    }

    fn recompute_inertia(&mut self) {
        let center_inertia = rect_moment_of_inertia(self.mass, self.width, self.height);
        self.moment_of_inertia = match self.drag_mode {
            DragMode::Handle => center_inertia,
            DragMode::Pendulum => {
                // Parallel-axis correction: pivot sits half a height below the center.
                let d = self.height * 0.5;
                center_inertia + self.mass * d * d
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_inertia_matches_formula() {
        let inertia = rect_moment_of_inertia(2.0, 3.0, 4.0);
        assert!((inertia - 2.0 * 25.0 / 12.0).abs() < 1e-6);
    }

    #[test]
    fn pendulum_mode_applies_parallel_axis_correction() {
        let mut body = RigidBody::new(BodyId(1), Vec2::ZERO, 10.0, 20.0);
        let center_inertia = body.moment_of_inertia;
        body.set_drag_mode(DragMode::Pendulum);
        assert!((body.moment_of_inertia - (center_inertia + 100.0)).abs() < 1e-4);
        assert_eq!(body.pivot(), Vec2::new(5.0, 20.0));
    }

    #[test]
    fn dragging_body_reports_infinite_mass() {
        let mut body = RigidBody::new(BodyId(1), Vec2::ZERO, 10.0, 20.0);
        assert!(body.inv_mass() > 0.0);
        body.is_dragging = true;
        assert_eq!(body.inv_mass(), 0.0);
        assert_eq!(body.inv_inertia(), 0.0);
    }
}
