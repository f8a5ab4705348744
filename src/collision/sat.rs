use glam::Vec2;

use crate::core::RigidBody;

/// Result of a positive narrow-phase test between two bodies.
#[derive(Debug, Clone, Copy)]
pub struct Collision {
    /// Unit contact normal, oriented from the second body toward the first.
    pub normal: Vec2,
    /// Overlap depth along the normal, in pixels.
    pub penetration: f32,
    /// Approximate contact location: the midpoint between the two pivots.
    pub contact_point: Vec2,
}

/// World-space corners of the body's oriented rectangle, rotated about its pivot.
pub fn corners(body: &RigidBody) -> [Vec2; 4] {
    let pivot = body.pivot();
    let offset = body.pivot_offset();
    let (sin, cos) = body.rotation.sin_cos();
    let rotate = |local: Vec2| {
        Vec2::new(local.x * cos - local.y * sin, local.x * sin + local.y * cos) + pivot
    };

    [
        rotate(Vec2::ZERO - offset),
        rotate(Vec2::new(body.width, 0.0) - offset),
        rotate(Vec2::new(body.width, body.height) - offset),
        rotate(Vec2::new(0.0, body.height) - offset),
    ]
}

fn project(corners: &[Vec2; 4], axis: Vec2) -> (f32, f32) {
    let mut min = corners[0].dot(axis);
    let mut max = min;
    for corner in &corners[1..] {
        let p = corner.dot(axis);
        min = min.min(p);
        max = max.max(p);
    }
    (min, max)
}

fn push_edge_normals(corners: &[Vec2; 4], axes: &mut Vec<Vec2>) {
    for i in 0..4 {
        let edge = corners[(i + 1) % 4] - corners[i];
        let len = edge.length();
        // Degenerate edges produce no usable axis.
        if len > 0.0 {
            axes.push(Vec2::new(-edge.y, edge.x) / len);
        }
    }
}

/// Separating-axis test for two oriented rectangles.
///
/// Exact for convex quads: the candidate axes are the 8 edge normals (4 per
/// body). The axis of minimum overlap becomes the contact normal and the
/// overlap magnitude the penetration depth.
pub fn check_collision(a: &RigidBody, b: &RigidBody) -> Option<Collision> {
    let corners_a = corners(a);
    let corners_b = corners(b);

    let mut axes = Vec::with_capacity(8);
    push_edge_normals(&corners_a, &mut axes);
    push_edge_normals(&corners_b, &mut axes);

    let mut min_overlap = f32::INFINITY;
    let mut min_axis = Vec2::ZERO;

    for axis in axes {
        let (min_a, max_a) = project(&corners_a, axis);
        let (min_b, max_b) = project(&corners_b, axis);

        if max_a < min_b || max_b < min_a {
            return None;
        }

        let overlap = (max_a - min_b).min(max_b - min_a);
        if overlap < min_overlap {
            min_overlap = overlap;
            min_axis = axis;
        }
    }

    // Orient the normal from b toward a.
    let pivot_a = a.pivot();
    let pivot_b = b.pivot();
    let mut normal = min_axis;
    if (pivot_a - pivot_b).dot(normal) < 0.0 {
        normal = -normal;
    }

    Some(Collision {
        normal,
        penetration: min_overlap,
        contact_point: (pivot_a + pivot_b) * 0.5,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BodyId;

    fn body_at(id: u32, x: f32, y: f32, w: f32, h: f32) -> RigidBody {
        RigidBody::new(BodyId(id), Vec2::new(x, y), w, h)
    }

    #[test]
    fn axis_aligned_overlap_is_detected() {
        let a = body_at(1, 0.0, 0.0, 10.0, 10.0);
        let b = body_at(2, 8.0, 0.0, 10.0, 10.0);

        let hit = check_collision(&a, &b).expect("overlapping rectangles should collide");
        assert!(hit.penetration > 0.0);
        // Normal points from b toward a, i.e. -X.
        assert!(hit.normal.x < -0.9);
        assert!(hit.normal.y.abs() < 1e-5);
    }

    #[test]
    fn separated_rectangles_do_not_collide() {
        let a = body_at(1, 0.0, 0.0, 10.0, 10.0);
        let b = body_at(2, 20.0, 0.0, 10.0, 10.0);
        assert!(check_collision(&a, &b).is_none());
    }

    #[test]
    fn rotation_closes_an_axis_aligned_gap() {
        let a = body_at(1, 0.0, 0.0, 10.0, 10.0);
        let mut b = body_at(2, 10.5, 0.0, 10.0, 10.0);
        assert!(check_collision(&a, &b).is_none());

        // At 45° the half-width along X grows to ~7.07, closing the 0.5 px gap.
        b.rotation = std::f32::consts::FRAC_PI_4;
        let hit = check_collision(&a, &b).expect("rotated rectangle should reach");
        assert!(hit.penetration > 0.0);
    }

    #[test]
    fn contact_point_is_pivot_midpoint() {
        let a = body_at(1, 0.0, 0.0, 10.0, 10.0);
        let b = body_at(2, 6.0, 0.0, 10.0, 10.0);
        let hit = check_collision(&a, &b).expect("overlap");
        let expected = (a.pivot() + b.pivot()) * 0.5;
        assert!((hit.contact_point - expected).length() < 1e-5);
    }
}
