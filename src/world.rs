//! The simulation driver tying bodies, contacts, proximity, and grouping
//! together behind a single tick loop.

use std::collections::{HashMap, VecDeque};
use std::time::Instant;

use glam::Vec2;
use log::{debug, warn};

use crate::collision::check_collision;
use crate::config::SimulationConfig;
use crate::core::{BodyId, RigidBody};
use crate::dynamics::{normalize_angle, Boundary, ContactSolver, Integrator};
use crate::grouping::GroupEngine;
use crate::input::DragCommand;
use crate::proximity::{proximity_for, ProximityEntry};
use crate::utils::logging::warn_if_tick_budget_exceeded;
use crate::utils::{ScopedTimer, XorShift64};

/// Per-drag bookkeeping used to estimate the release velocity.
#[derive(Debug, Clone, Copy)]
struct DragTracker {
    last_position: Vec2,
    last_time: f64,
    velocity_estimate: Vec2,
}

/// Owns all simulation state and advances it one tick at a time.
///
/// The loop per tick: clamp the timestep, apply queued drag commands,
/// integrate free bodies, resolve every overlapping pair, and on a throttled
/// cadence reconcile the grouping state against the new layout.
pub struct Simulation {
    config: SimulationConfig,
    bodies: Vec<RigidBody>,
    integrator: Integrator,
    solver: ContactSolver,
    boundary: Option<Boundary>,
    engine: GroupEngine,
    commands: VecDeque<DragCommand>,
    drags: HashMap<BodyId, DragTracker>,
    tick_count: u64,
    /// Simulated seconds elapsed.
    time: f64,
    next_body_id: u32,
    rng: XorShift64,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Self {
        Self::with_seed(config, 0x9E37_79B9_7F4A_7C15)
    }

    /// Seeds the spawn jitter generator; identical seeds reproduce identical
    /// spawn layouts.
    pub fn with_seed(config: SimulationConfig, seed: u64) -> Self {
        let integrator = Integrator {
            linear_damping: config.linear_damping,
            angular_damping: config.angular_damping,
            sleep_linear_threshold: config.sleep_linear_threshold,
            sleep_angular_threshold: config.sleep_angular_threshold,
        };
        let solver = ContactSolver {
            correction_percent: config.correction_percent,
            slop: config.correction_slop,
        };
        Self {
            config,
            bodies: Vec::new(),
            integrator,
            solver,
            boundary: None,
            engine: GroupEngine::new(),
            commands: VecDeque::new(),
            drags: HashMap::new(),
            tick_count: 0,
            time: 0.0,
            next_body_id: 0,
            rng: XorShift64::new(seed),
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn bodies(&self) -> &[RigidBody] {
        &self.bodies
    }

    pub fn body(&self, id: BodyId) -> Option<&RigidBody> {
        self.bodies.iter().find(|b| b.id == id)
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut RigidBody> {
        self.bodies.iter_mut().find(|b| b.id == id)
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn grouping(&self) -> &GroupEngine {
        &self.engine
    }

    /// Installs a walled table; bodies reflect off its edges after integration.
    pub fn set_boundary(&mut self, boundary: Option<Boundary>) {
        self.boundary = boundary;
    }

    /// Spawns a body near the configured spawn center with positional and
    /// rotational jitter. Refused once the body cap is reached.
    pub fn add_body(&mut self) -> Option<BodyId> {
        let jitter = Vec2::new(self.rng.symmetric(), self.rng.symmetric()) * self.config.spawn_jitter;
        let center = self.config.spawn_center + jitter;
        let position =
            center - Vec2::new(self.config.body_width * 0.5, self.config.body_height * 0.5);
        let rotation = self.rng.symmetric() * self.config.spawn_rotation_jitter;
        self.add_body_at(position, rotation)
    }

    /// Spawns a body with an explicit pose. Refused once the body cap is
    /// reached.
    pub fn add_body_at(&mut self, position: Vec2, rotation: f32) -> Option<BodyId> {
        if self.bodies.len() >= self.config.max_bodies {
            warn!("body cap reached ({}), spawn refused", self.config.max_bodies);
            return None;
        }
        self.next_body_id += 1;
        let id = BodyId(self.next_body_id);

        let mut body = RigidBody::new(
            id,
            position,
            self.config.body_width,
            self.config.body_height,
        );
        body.rotation = rotation;
        body.restitution = self.config.body_restitution;
        body.friction = self.config.body_friction;
        body.set_mass(self.config.body_mass);

        debug!("spawned body {} at {:?}", id, position);
        self.bodies.push(body);
        Some(id)
    }

    /// Removes a body from the table, dropping its grouping state. Refused
    /// while only the minimum population remains.
    pub fn remove_body(&mut self, id: BodyId) -> bool {
        if self.bodies.len() <= self.config.min_bodies {
            warn!(
                "removal of body {} refused: {} bodies is the minimum",
                id, self.config.min_bodies
            );
            return false;
        }
        let Some(index) = self.bodies.iter().position(|b| b.id == id) else {
            return false;
        };
        self.bodies.remove(index);
        self.drags.remove(&id);
        self.engine.forget_body(id);
        true
    }

    /// Queues a drag command; it takes effect at the start of the next tick.
    pub fn push_command(&mut self, command: DragCommand) {
        self.commands.push_back(command);
    }

    /// Proximity list for one body against the current layout.
    pub fn proximity(&self, id: BodyId) -> Vec<ProximityEntry> {
        proximity_for(&self.bodies, id, self.engine.recently_removed(), &self.config)
    }

    pub fn confirm(&mut self, body: BodyId) {
        self.engine.confirm(body);
    }

    pub fn unconfirm(&mut self, body: BodyId) -> bool {
        self.engine.unconfirm(body)
    }

    pub fn remove_member(&mut self, remover: BodyId, target: BodyId) -> bool {
        self.engine.remove_member(remover, target)
    }

    pub fn select_representative(&mut self, body: BodyId, confirmed_id: &str) -> bool {
        self.engine.select_representative(body, confirmed_id)
    }

    pub fn clear_representative(&mut self, body: BodyId) {
        self.engine.clear_representative(body);
    }

    /// Advances the simulation by `dt` seconds (clamped to the configured
    /// maximum so stalls cannot tunnel bodies through each other).
    pub fn tick(&mut self, dt: f32) {
        let _timer = ScopedTimer::new("simulation.tick");
        let started = Instant::now();

        let dt = dt.clamp(0.0, self.config.max_dt);
        self.time += f64::from(dt);

        self.apply_commands();

        for body in &mut self.bodies {
            self.integrator.step(body, dt);
        }
        if let Some(boundary) = self.boundary {
            for body in &mut self.bodies {
                boundary.reflect(body);
            }
        }

        self.resolve_contacts();

        self.tick_count += 1;
        let interval = self.config.grouping_interval.max(1);
        if self.tick_count % interval == 0 {
            self.engine.reconcile(&self.bodies, &self.config);
            self.engine.expire_removed(&self.bodies, &self.config);
        }

        warn_if_tick_budget_exceeded(started.elapsed(), 1000.0 / crate::config::DEFAULT_TICK_RATE);
    }

    /// All-pairs narrow phase plus impulse resolution.
    fn resolve_contacts(&mut self) {
        let n = self.bodies.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let (left, right) = self.bodies.split_at_mut(j);
                let a = &mut left[i];
                let b = &mut right[0];
                if let Some(contact) = check_collision(a, b) {
                    self.solver.resolve(a, b, &contact);
                }
            }
        }
    }

    fn apply_commands(&mut self) {
        while let Some(command) = self.commands.pop_front() {
            match command {
                DragCommand::Start { id } => {
                    let Some(body) = self.bodies.iter_mut().find(|b| b.id == id) else {
                        debug!("drag start for unknown body {id}");
                        continue;
                    };
                    body.is_dragging = true;
                    body.velocity = Vec2::ZERO;
                    body.angular_velocity = 0.0;
                    self.drags.insert(
                        id,
                        DragTracker {
                            last_position: body.position,
                            last_time: self.time,
                            velocity_estimate: Vec2::ZERO,
                        },
                    );
                }
                DragCommand::Move {
                    id,
                    position,
                    rotation,
                } => {
                    let Some(body) =
                        self.bodies.iter_mut().find(|b| b.id == id && b.is_dragging)
                    else {
                        continue;
                    };
                    body.position = position;
                    if let Some(rotation) = rotation {
                        body.rotation = normalize_angle(rotation);
                    }
                    if let Some(tracker) = self.drags.get_mut(&id) {
                        let elapsed = (self.time - tracker.last_time) as f32;
                        if elapsed > 0.0 {
                            tracker.velocity_estimate =
                                (position - tracker.last_position) / elapsed;
                        }
                        tracker.last_position = position;
                        tracker.last_time = self.time;
                    }
                }
                DragCommand::End { id } => {
                    let Some(body) =
                        self.bodies.iter_mut().find(|b| b.id == id && b.is_dragging)
                    else {
                        continue;
                    };
                    body.is_dragging = false;
                    if let Some(tracker) = self.drags.remove(&id) {
                        // A stale estimate means the pointer sat still before
                        // releasing; the body should not fly off.
                        let stale = self.time - tracker.last_time >= 0.1;
                        body.velocity = if stale {
                            Vec2::ZERO
                        } else {
                            tracker.velocity_estimate * self.config.release_momentum
                        };
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn simulation() -> Simulation {
        Simulation::new(SimulationConfig::default())
    }

    #[test]
    fn add_body_respects_the_cap() {
        let mut config = SimulationConfig::default();
        config.max_bodies = 2;
        let mut sim = Simulation::new(config);

        assert!(sim.add_body().is_some());
        assert!(sim.add_body().is_some());
        assert!(sim.add_body().is_none());
        assert_eq!(sim.bodies().len(), 2);
    }

    #[test]
    fn remove_body_respects_the_minimum() {
        let mut sim = simulation();
        let a = sim.add_body().unwrap();
        let b = sim.add_body().unwrap();

        assert!(sim.remove_body(a));
        // One body left; the floor holds.
        assert!(!sim.remove_body(b));
        assert_eq!(sim.bodies().len(), 1);
    }

    #[test]
    fn remove_unknown_body_is_a_no_op() {
        let mut sim = simulation();
        sim.add_body();
        sim.add_body();
        assert!(!sim.remove_body(BodyId(999)));
        assert_eq!(sim.bodies().len(), 2);
    }

    #[test]
    fn body_ids_are_never_reused() {
        let mut sim = simulation();
        let a = sim.add_body().unwrap();
        sim.add_body();
        sim.remove_body(a);
        let c = sim.add_body().unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn tick_damps_free_bodies() {
        let mut sim = simulation();
        let id = sim.add_body_at(Vec2::ZERO, 0.0).unwrap();
        sim.body_mut(id).unwrap().velocity = Vec2::new(200.0, 0.0);

        sim.tick(DT);

        let body = sim.body(id).unwrap();
        assert!(body.velocity.x < 200.0);
        assert!(body.position.x > 0.0);
    }

    #[test]
    fn oversized_dt_is_clamped() {
        let mut sim = simulation();
        let id = sim.add_body_at(Vec2::ZERO, 0.0).unwrap();
        sim.body_mut(id).unwrap().velocity = Vec2::new(1000.0, 0.0);

        // One stalled two-second frame must not move the body two seconds far.
        sim.tick(2.0);

        let body = sim.body(id).unwrap();
        assert!(body.position.x <= 1000.0 * sim.config().max_dt + 1e-3);
    }

    #[test]
    fn drag_lifecycle_overrides_physics_and_releases_with_momentum() {
        let mut sim = simulation();
        let id = sim.add_body_at(Vec2::ZERO, 0.0).unwrap();

        sim.push_command(DragCommand::Start { id });
        sim.tick(DT);
        assert!(sim.body(id).unwrap().is_dragging);

        sim.push_command(DragCommand::Move {
            id,
            position: Vec2::new(60.0, 0.0),
            rotation: None,
        });
        sim.tick(DT);
        assert_eq!(sim.body(id).unwrap().position, Vec2::new(60.0, 0.0));

        sim.push_command(DragCommand::End { id });
        sim.tick(DT);

        let body = sim.body(id).unwrap();
        assert!(!body.is_dragging);
        // Release momentum scales the estimated pointer velocity down but
        // keeps its direction.
        assert!(body.velocity.x > 0.0);
    }

    #[test]
    fn stale_drag_release_has_no_momentum() {
        let mut sim = simulation();
        let id = sim.add_body_at(Vec2::ZERO, 0.0).unwrap();

        sim.push_command(DragCommand::Start { id });
        sim.tick(DT);
        sim.push_command(DragCommand::Move {
            id,
            position: Vec2::new(60.0, 0.0),
            rotation: None,
        });
        sim.tick(DT);

        // Hold still well past the staleness window, then release.
        for _ in 0..30 {
            sim.tick(DT);
        }
        sim.push_command(DragCommand::End { id });
        sim.tick(DT);

        let body = sim.body(id).unwrap();
        assert_eq!(body.velocity, Vec2::ZERO);
    }

    #[test]
    fn drag_move_can_rewrite_rotation() {
        let mut sim = simulation();
        let id = sim.add_body_at(Vec2::ZERO, 0.0).unwrap();

        sim.push_command(DragCommand::Start { id });
        sim.tick(DT);
        sim.push_command(DragCommand::Move {
            id,
            position: Vec2::new(30.0, 0.0),
            rotation: Some(0.4),
        });
        sim.tick(DT);

        let body = sim.body(id).unwrap();
        assert_eq!(body.position, Vec2::new(30.0, 0.0));
        assert!((body.rotation - 0.4).abs() < 1e-6);

        // Out-of-range angles are wrapped like the integrator does.
        sim.push_command(DragCommand::Move {
            id,
            position: Vec2::new(30.0, 0.0),
            rotation: Some(3.0 * std::f32::consts::PI),
        });
        sim.tick(DT);
        let body = sim.body(id).unwrap();
        assert!((body.rotation - std::f32::consts::PI).abs() < 1e-5);
    }

    #[test]
    fn move_without_drag_start_is_ignored() {
        let mut sim = simulation();
        let id = sim.add_body_at(Vec2::ZERO, 0.0).unwrap();

        sim.push_command(DragCommand::Move {
            id,
            position: Vec2::new(500.0, 500.0),
            rotation: None,
        });
        sim.tick(DT);

        assert_eq!(sim.body(id).unwrap().position, Vec2::ZERO);
    }

    #[test]
    fn grouping_runs_on_the_throttled_cadence() {
        let mut sim = simulation();
        sim.add_body_at(Vec2::new(0.0, 0.0), 0.0).unwrap();
        sim.add_body_at(Vec2::new(sim.config().body_width + 100.0, 0.0), 0.0)
            .unwrap();

        for _ in 0..9 {
            sim.tick(DT);
        }
        assert!(sim.grouping().potential_groups().is_empty());

        sim.tick(DT);
        assert_eq!(sim.grouping().potential_groups().len(), 1);
    }

    #[test]
    fn overlapping_bodies_are_pushed_apart() {
        let mut sim = simulation();
        let a = sim.add_body_at(Vec2::new(0.0, 0.0), 0.0).unwrap();
        let b = sim
            .add_body_at(Vec2::new(sim.config().body_width * 0.5, 0.0), 0.0)
            .unwrap();

        for _ in 0..120 {
            sim.tick(DT);
        }

        let pa = sim.body(a).unwrap();
        let pb = sim.body(b).unwrap();
        let gap = (pb.center() - pa.center()).length();
        assert!(gap > sim.config().body_width * 0.5);
    }
}
