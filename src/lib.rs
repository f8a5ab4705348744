//! GroupDrop: a 2D rigid-body table simulation driving proximity-based group
//! formation.
//!
//! Rectangular bodies (phones lying on a shared table) are pushed around by
//! drag gestures, collide and settle under an impulse solver, and report which
//! other bodies sit within proximity range. Bodies that cluster together form
//! potential groups; once every member confirms, the group is promoted to a
//! confirmed group.
//!
//! # Quick start
//!
//! ```
//! use groupdrop::{Simulation, SimulationConfig};
//!
//! let mut sim = Simulation::new(SimulationConfig::default());
//! let a = sim.add_body().unwrap();
//! let b = sim.add_body().unwrap();
//!
//! // 60 Hz driver loop.
//! for _ in 0..60 {
//!     sim.tick(1.0 / 60.0);
//! }
//!
//! for entry in sim.proximity(a) {
//!     println!("{} is {:.1} cm {} of {}", entry.id, entry.distance_cm, entry.direction, a);
//! }
//! # let _ = b;
//! ```

pub mod collision;
pub mod config;
pub mod core;
pub mod dynamics;
pub mod grouping;
pub mod input;
pub mod proximity;
pub mod utils;
pub mod world;

pub use crate::collision::{check_collision, Collision};
pub use crate::config::SimulationConfig;
pub use crate::core::{BodyId, DragMode, RigidBody};
pub use crate::dynamics::{Boundary, ContactSolver, Integrator};
pub use crate::grouping::{ConfirmedGroup, GroupEngine, GroupId, PotentialGroup};
pub use crate::input::DragCommand;
pub use crate::proximity::{Direction, ProximityEntry};
pub use crate::world::Simulation;

pub use glam::Vec2;
