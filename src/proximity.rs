//! Edge-to-edge proximity queries between bodies.
//!
//! Distances are reported in centimeters using a fixed pixel scale, floored so
//! overlapping bodies never read zero. Besides direct neighbors, the query
//! daisy-chains one hop through a direct neighbor to surface bodies just out
//! of direct range.

use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::core::{BodyId, RigidBody};

/// Compass bearing of a neighbor, relative to the subject's own rotation.
///
/// Screen coordinates are y-down, so south is toward the bottom of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Direction::North => "N",
            Direction::NorthEast => "NE",
            Direction::East => "E",
            Direction::SouthEast => "SE",
            Direction::South => "S",
            Direction::SouthWest => "SW",
            Direction::West => "W",
            Direction::NorthWest => "NW",
        };
        f.write_str(s)
    }
}

impl Direction {
    /// Buckets a bearing in degrees (y-down frame, 0° along +X) into one of
    /// eight 45° sectors.
    pub fn from_degrees(degrees: f32) -> Self {
        match degrees {
            d if !(22.5..337.5).contains(&d) => Direction::East,
            d if d < 67.5 => Direction::SouthEast,
            d if d < 112.5 => Direction::South,
            d if d < 157.5 => Direction::SouthWest,
            d if d < 202.5 => Direction::West,
            d if d < 247.5 => Direction::NorthWest,
            d if d < 292.5 => Direction::North,
            _ => Direction::NorthEast,
        }
    }
}

/// One neighbor in a body's proximity list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProximityEntry {
    pub id: BodyId,
    /// Reported edge-to-edge distance, floored at the configured minimum.
    pub distance_cm: f32,
    /// Bearing sector in the subject's local frame.
    pub direction: Direction,
    /// Bearing rounded to a whole degree, [0, 360).
    pub degrees: f32,
    /// Offset to the neighbor's center in the subject's rotated frame, px.
    pub relative: Vec2,
    /// For daisy-chained entries, the direct neighbor the chain runs through.
    pub via: Option<BodyId>,
}

impl ProximityEntry {
    pub fn is_direct(&self) -> bool {
        self.via.is_none()
    }
}

/// Edge-to-edge distance in centimeters, floored at the configured minimum.
///
/// The edge gap is approximated from center distance minus the half-widths.
pub fn edge_distance_cm(a: &RigidBody, b: &RigidBody, config: &SimulationConfig) -> f32 {
    let center_distance = (a.center() - b.center()).length();
    let edge_px = (center_distance - a.width * 0.5 - b.width * 0.5).max(0.0);
    (edge_px * config.cm_per_pixel).max(config.min_distance_cm)
}

/// Offset to `to`'s center expressed in `from`'s rotated frame, in pixels.
pub fn local_offset(from: &RigidBody, to: &RigidBody) -> Vec2 {
    let offset = to.center() - from.center();
    let (sin, cos) = (-from.rotation).sin_cos();
    Vec2::new(
        offset.x * cos - offset.y * sin,
        offset.x * sin + offset.y * cos,
    )
}

/// Bearing of `to` as seen from `from`, in `from`'s rotated frame.
/// Returns degrees in [0, 360).
pub fn bearing_degrees(from: &RigidBody, to: &RigidBody) -> f32 {
    let local = local_offset(from, to);
    let mut degrees = local.y.atan2(local.x).to_degrees();
    if degrees < 0.0 {
        degrees += 360.0;
    }
    degrees
}

/// Rounds a bearing to a whole degree; 359.5 and up wrap back to 0.
fn whole_degrees(degrees: f32) -> f32 {
    degrees.round() % 360.0
}

/// Computes the proximity list for `subject`: every other live body within the
/// direct threshold, plus one-hop daisy-chained bodies whose summed chain
/// distance stays within the indirect threshold. Recently-removed bodies are
/// suppressed entirely. Entries are sorted nearest first.
pub fn proximity_for(
    bodies: &[RigidBody],
    subject: BodyId,
    recently_removed: &HashSet<BodyId>,
    config: &SimulationConfig,
) -> Vec<ProximityEntry> {
    let Some(me) = bodies.iter().find(|b| b.id == subject) else {
        return Vec::new();
    };

    let candidates: Vec<&RigidBody> = bodies
        .iter()
        .filter(|b| b.id != subject && !recently_removed.contains(&b.id))
        .collect();

    let mut entries = Vec::new();
    let mut direct_ids = HashSet::new();

    for &other in &candidates {
        let distance = edge_distance_cm(me, other, config);
        if distance <= config.proximity_threshold_cm {
            let degrees = bearing_degrees(me, other);
            entries.push(ProximityEntry {
                id: other.id,
                distance_cm: distance,
                direction: Direction::from_degrees(degrees),
                degrees: whole_degrees(degrees),
                relative: local_offset(me, other),
                via: None,
            });
            direct_ids.insert(other.id);
        }
    }

    // One-hop chaining: a body out of direct range is still listed when a
    // direct neighbor bridges to it and the summed chain distance fits.
    let indirect_threshold = config.indirect_threshold_cm();
    for &bridge in &candidates {
        if !direct_ids.contains(&bridge.id) {
            continue;
        }
        let hop1 = edge_distance_cm(me, bridge, config);
        for &far in &candidates {
            if far.id == bridge.id || direct_ids.contains(&far.id) {
                continue;
            }
            if entries.iter().any(|e| e.id == far.id) {
                continue;
            }
            let hop2 = edge_distance_cm(bridge, far, config);
            if hop2 > config.proximity_threshold_cm {
                continue;
            }
            let total = hop1 + hop2;
            if total <= indirect_threshold {
                // Bearing and offset stay geometric (straight line to the far
                // body) even though the distance is the chained sum.
                let degrees = bearing_degrees(me, far);
                entries.push(ProximityEntry {
                    id: far.id,
                    distance_cm: total,
                    direction: Direction::from_degrees(degrees),
                    degrees: whole_degrees(degrees),
                    relative: local_offset(me, far),
                    via: Some(bridge.id),
                });
            }
        }
    }

    entries.sort_by(|a, b| a.distance_cm.total_cmp(&b.distance_cm));
    entries
}
