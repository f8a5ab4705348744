use std::f32::consts::PI;

use crate::core::RigidBody;

/// Semi-implicit Euler integrator with exponential damping and sleep clamps.
#[derive(Debug, Clone)]
pub struct Integrator {
    /// Per-tick linear velocity damping factor.
    pub linear_damping: f32,
    /// Per-tick angular velocity damping factor.
    pub angular_damping: f32,
    /// Linear speeds (px/s) below this snap to zero.
    pub sleep_linear_threshold: f32,
    /// Angular speeds (rad/s) below this snap to zero.
    pub sleep_angular_threshold: f32,
}

impl Default for Integrator {
    fn default() -> Self {
        Self {
            linear_damping: crate::config::DEFAULT_LINEAR_DAMPING,
            angular_damping: crate::config::DEFAULT_ANGULAR_DAMPING,
            sleep_linear_threshold: 0.5,
            sleep_angular_threshold: 0.01,
        }
    }
}

impl Integrator {
    /// Advances one body by `dt` seconds. Dragged bodies are owned by their
    /// controller and are not touched.
    pub fn step(&self, body: &mut RigidBody, dt: f32) {
        if body.is_dragging {
            return;
        }

        body.velocity *= self.linear_damping;
        body.angular_velocity *= self.angular_damping;

        // Each axis sleeps on its own: slow diagonal drift stops too.
        if body.velocity.x.abs() < self.sleep_linear_threshold {
            body.velocity.x = 0.0;
        }
        if body.velocity.y.abs() < self.sleep_linear_threshold {
            body.velocity.y = 0.0;
        }
        if body.angular_velocity.abs() < self.sleep_angular_threshold {
            body.angular_velocity = 0.0;
        }

        body.position += body.velocity * dt;
        body.rotation += body.angular_velocity * dt;
        body.rotation = normalize_angle(body.rotation);
    }
}

/// Wraps an angle into (-π, π].
pub fn normalize_angle(mut angle: f32) -> f32 {
    while angle > PI {
        angle -= 2.0 * PI;
    }
    while angle <= -PI {
        angle += 2.0 * PI;
    }
    angle
}
