//! Host-facing input commands.
//!
//! Pointer interaction arrives as queued commands instead of direct mutation,
//! so a host can feed input from any thread or transport and the simulation
//! applies it at a well-defined point in the tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::core::BodyId;

/// A drag gesture event targeting one body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DragCommand {
    /// Pointer grabbed the body: velocities zero out and physics lets go of it.
    Start { id: BodyId },
    /// Pointer moved; the body's top-left corner follows directly, and a
    /// rotation gesture may rewrite the orientation in the same stroke.
    Move {
        id: BodyId,
        position: Vec2,
        rotation: Option<f32>,
    },
    /// Pointer released: the body re-enters physics with a release velocity
    /// estimated from its recent motion.
    End { id: BodyId },
}

impl DragCommand {
    pub fn body_id(&self) -> BodyId {
        match self {
            DragCommand::Start { id } | DragCommand::Move { id, .. } | DragCommand::End { id } => {
                *id
            }
        }
    }
}
