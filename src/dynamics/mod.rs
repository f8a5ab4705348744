//! Motion integration and contact resolution.

pub mod boundary;
pub mod integrator;
pub mod solver;

pub use boundary::Boundary;
pub use integrator::{normalize_angle, Integrator};
pub use solver::ContactSolver;
