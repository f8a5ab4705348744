//! Narrow-phase collision detection between oriented rectangles.

pub mod sat;

pub use sat::{check_collision, corners, Collision};
