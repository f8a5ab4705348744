//! Core types describing simulated bodies.

pub mod body;

pub use body::{rect_moment_of_inertia, BodyId, DragMode, RigidBody};
