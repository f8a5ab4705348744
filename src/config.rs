//! Global configuration constants and tunables for the GroupDrop simulation.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Default simulation tick rate target (Hz).
pub const DEFAULT_TICK_RATE: f32 = 60.0;

/// Upper clamp on the per-tick delta time (in seconds). Protects the
/// integrator when the host loop stalls (e.g. a backgrounded tab).
pub const DEFAULT_MAX_DT: f32 = 0.033;

/// Edge-to-edge distance (cm) under which two bodies count as directly proximate.
pub const DEFAULT_PROXIMITY_THRESHOLD_CM: f32 = 8.5;

/// Indirect (daisy-chained) entries are allowed up to this multiple of the
/// direct threshold, applied to the summed hop distance.
pub const DEFAULT_INDIRECT_THRESHOLD_MULTIPLIER: f32 = 2.0;

/// Looser threshold (cm) used to clear the recently-removed suppression flag.
pub const DEFAULT_REMOVAL_HYSTERESIS_CM: f32 = 6.5;

/// Linear pixel-to-centimeter scale for displayed distances.
pub const DEFAULT_CM_PER_PIXEL: f32 = 0.0125;

/// Floor for displayed distances (cm) so overlapping bodies never read 0.
pub const DEFAULT_MIN_DISTANCE_CM: f32 = 2.0;

/// Grouping reconciliation runs every this many ticks.
pub const DEFAULT_GROUPING_INTERVAL: u64 = 10;

/// Per-tick exponential damping applied to linear velocity.
pub const DEFAULT_LINEAR_DAMPING: f32 = 0.92;

/// Per-tick exponential damping applied to angular velocity.
pub const DEFAULT_ANGULAR_DAMPING: f32 = 0.90;

/// Simulation parameters. Every constant the legacy table tuned by feel lives
/// here so hosts can override it wholesale or field by field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Direct proximity threshold in centimeters.
    pub proximity_threshold_cm: f32,
    /// Multiplier on the direct threshold for daisy-chained entries.
    pub indirect_threshold_multiplier: f32,
    /// Secondary threshold (cm) below which a recently-removed body stays suppressed.
    pub removal_hysteresis_cm: f32,
    /// Pixel-to-centimeter conversion for edge distances.
    pub cm_per_pixel: f32,
    /// Minimum displayed distance in centimeters.
    pub min_distance_cm: f32,
    /// Ticks between grouping reconciliation passes.
    pub grouping_interval: u64,
    /// Upper clamp on per-tick delta time (seconds).
    pub max_dt: f32,
    /// Per-tick linear velocity damping factor.
    pub linear_damping: f32,
    /// Per-tick angular velocity damping factor.
    pub angular_damping: f32,
    /// Linear speeds below this (px/s) snap to zero.
    pub sleep_linear_threshold: f32,
    /// Angular speeds below this (rad/s) snap to zero.
    pub sleep_angular_threshold: f32,
    /// Positional correction factor (Baumgarte).
    pub correction_percent: f32,
    /// Penetration slop tolerated before positional correction kicks in.
    pub correction_slop: f32,
    /// Scale applied to the release velocity when a drag ends.
    pub release_momentum: f32,
    /// Default body width in pixels.
    pub body_width: f32,
    /// Default body height in pixels.
    pub body_height: f32,
    /// Default body mass.
    pub body_mass: f32,
    /// Default restitution for new bodies.
    pub body_restitution: f32,
    /// Default friction for new bodies.
    pub body_friction: f32,
    /// Maximum number of bodies; `add_body` is refused beyond this.
    pub max_bodies: usize,
    /// Minimum number of bodies; `remove_body` is refused at or below this.
    pub min_bodies: usize,
    /// Nominal spawn center for new bodies without an explicit pose.
    pub spawn_center: Vec2,
    /// Uniform positional jitter (± px per axis) applied to spawned bodies.
    pub spawn_jitter: f32,
    /// Uniform rotational jitter (± rad) applied to spawned bodies.
    pub spawn_rotation_jitter: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            proximity_threshold_cm: DEFAULT_PROXIMITY_THRESHOLD_CM,
            indirect_threshold_multiplier: DEFAULT_INDIRECT_THRESHOLD_MULTIPLIER,
            removal_hysteresis_cm: DEFAULT_REMOVAL_HYSTERESIS_CM,
            cm_per_pixel: DEFAULT_CM_PER_PIXEL,
            min_distance_cm: DEFAULT_MIN_DISTANCE_CM,
            grouping_interval: DEFAULT_GROUPING_INTERVAL,
            max_dt: DEFAULT_MAX_DT,
            linear_damping: DEFAULT_LINEAR_DAMPING,
            angular_damping: DEFAULT_ANGULAR_DAMPING,
            sleep_linear_threshold: 0.5,
            sleep_angular_threshold: 0.01,
            correction_percent: 0.8,
            correction_slop: 0.01,
            release_momentum: 0.3,
            body_width: 310.469,
            body_height: 675.0,
            body_mass: 1.0,
            body_restitution: 0.5,
            body_friction: 0.4,
            max_bodies: 16,
            min_bodies: 1,
            spawn_center: Vec2::new(960.0, 540.0),
            spawn_jitter: 100.0,
            spawn_rotation_jitter: 0.25,
        }
    }
}

impl SimulationConfig {
    /// Threshold (cm) applied to the summed hop distance of indirect entries.
    pub fn indirect_threshold_cm(&self) -> f32 {
        self.proximity_threshold_cm * self.indirect_threshold_multiplier
    }
}
