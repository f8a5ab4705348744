//! Group formation over the proximity graph.
//!
//! Bodies that sit within direct proximity of each other form connected
//! components; each component of two or more becomes a *potential* group that
//! every member has to confirm before it is promoted to a *confirmed* group.
//! Groups are identified by their member set, so reshuffling the same bodies
//! does not mint a new group.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::core::{BodyId, RigidBody};
use crate::proximity::edge_distance_cm;

pub type GroupId = String;

/// A component of proximate bodies awaiting confirmation from its members.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PotentialGroup {
    pub id: GroupId,
    pub members: BTreeSet<BodyId>,
    /// Members that have confirmed so far.
    pub confirmed: BTreeSet<BodyId>,
    /// When set, the named member selected one of its confirmed groups and
    /// promotion merges this group's members into it instead of minting a
    /// new one.
    pub representative: Option<(BodyId, GroupId)>,
}

/// A fully confirmed group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmedGroup {
    pub id: GroupId,
    pub members: BTreeSet<BodyId>,
}

/// State machine tracking potential and confirmed groups across ticks.
#[derive(Debug, Default)]
pub struct GroupEngine {
    potential: HashMap<GroupId, PotentialGroup>,
    confirmed: HashMap<GroupId, ConfirmedGroup>,
    /// Bodies suppressed from proximity and grouping after a removal, until
    /// they move away past the hysteresis threshold.
    recently_removed: HashSet<BodyId>,
    /// Confirmed group each body has pre-selected for representative-merge.
    /// Persistent across reconcile cycles; consulted whenever a potential
    /// group is minted or reshaped.
    representative_selections: HashMap<BodyId, GroupId>,
    next_potential: u64,
    next_confirmed: u64,
}

impl GroupEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn potential_groups(&self) -> &HashMap<GroupId, PotentialGroup> {
        &self.potential
    }

    pub fn confirmed_groups(&self) -> &HashMap<GroupId, ConfirmedGroup> {
        &self.confirmed
    }

    pub fn recently_removed(&self) -> &HashSet<BodyId> {
        &self.recently_removed
    }

    pub fn is_recently_removed(&self, id: BodyId) -> bool {
        self.recently_removed.contains(&id)
    }

    /// Rebuilds the potential group set from the current body layout.
    ///
    /// Connected components of the direct-proximity graph become potential
    /// groups. A component identical to an existing potential group keeps
    /// that group (id, confirmations, and representative linkage intact); a
    /// component identical to a confirmed group is skipped. Groups whose
    /// member set no longer matches any component are dropped.
    pub fn reconcile(&mut self, bodies: &[RigidBody], config: &SimulationConfig) {
        let active: Vec<&RigidBody> = bodies
            .iter()
            .filter(|b| !self.recently_removed.contains(&b.id))
            .collect();

        if active.len() < 2 {
            self.potential.clear();
            return;
        }

        let components = Self::components(&active, config);
        let component_sets: HashSet<&BTreeSet<BodyId>> = components.iter().collect();
        let live: HashSet<BodyId> = active.iter().map(|b| b.id).collect();

        // Cleanup existing potential groups before minting new ones.
        let confirmed = &self.confirmed;
        self.potential.retain(|_, group| {
            group.members.retain(|m| live.contains(m));
            let members = group.members.clone();
            group.confirmed.retain(|m| members.contains(m));
            group.members.len() >= 2
                && component_sets.contains(&group.members)
                && !confirmed.values().any(|c| c.members == group.members)
        });

        for component in &components {
            if self.confirmed.values().any(|c| &c.members == component) {
                continue;
            }
            if self.potential.values().any(|g| &g.members == component) {
                continue;
            }
            self.next_potential += 1;
            let id = format!("potential-{}", self.next_potential);
            info!("new potential group {} with {} members", id, component.len());
            self.potential.insert(
                id.clone(),
                PotentialGroup {
                    id,
                    members: component.clone(),
                    confirmed: BTreeSet::new(),
                    representative: None,
                },
            );
        }

        self.relink_groups();
        self.promote_ready();
    }

    /// Records a confirmation from `body` in every potential group it belongs
    /// to, then promotes any group that is now fully confirmed.
    pub fn confirm(&mut self, body: BodyId) {
        for group in self.potential.values_mut() {
            if group.members.contains(&body) {
                group.confirmed.insert(body);
            }
        }
        self.promote_ready();
    }

    /// Withdraws `body`'s pending confirmations. Refused once the body is in
    /// a confirmed group; leaving then goes through [`GroupEngine::remove_member`].
    pub fn unconfirm(&mut self, body: BodyId) -> bool {
        if self.confirmed.values().any(|g| g.members.contains(&body)) {
            warn!("unconfirm refused: body {} is in a confirmed group", body);
            return false;
        }
        for group in self.potential.values_mut() {
            group.confirmed.remove(&body);
        }
        true
    }

    /// Records that `body` pre-selected the confirmed group `confirmed_id` it
    /// belongs to. The selection persists across reconcile cycles: any
    /// potential group containing the body, now or later, is linked to that
    /// confirmed group and merges into it on promotion.
    pub fn select_representative(&mut self, body: BodyId, confirmed_id: &str) -> bool {
        let Some(target) = self.confirmed.get(confirmed_id) else {
            warn!("representative selection refused: no confirmed group {}", confirmed_id);
            return false;
        };
        if !target.members.contains(&body) {
            warn!(
                "representative selection refused: body {} is not in group {}",
                body, confirmed_id
            );
            return false;
        }

        info!("body {} selected confirmed group {} for extension", body, confirmed_id);
        self.representative_selections
            .insert(body, confirmed_id.to_string());
        self.relink_groups();
        true
    }

    /// Drops `body`'s pre-selection and unlinks any group linked through it.
    /// Another member's selection, if present, takes over.
    pub fn clear_representative(&mut self, body: BodyId) {
        self.representative_selections.remove(&body);
        for group in self.potential.values_mut() {
            if group.representative.as_ref().is_some_and(|(b, _)| *b == body) {
                group.representative = None;
            }
        }
        self.relink_groups();
    }

    /// Applies the persistent selections to every unlinked potential group.
    /// A group links to the first member (in id order) whose selection still
    /// points at a confirmed group that member belongs to.
    fn relink_groups(&mut self) {
        for group in self.potential.values_mut() {
            if group.representative.is_some() {
                continue;
            }
            for member in &group.members {
                let Some(gid) = self.representative_selections.get(member) else {
                    continue;
                };
                let valid = self
                    .confirmed
                    .get(gid)
                    .is_some_and(|c| c.members.contains(member));
                if valid {
                    info!("group {} linked to confirmed group {} via {}", group.id, gid, member);
                    group.representative = Some((*member, gid.clone()));
                    break;
                }
            }
        }
    }

    /// Ejects `target` from every group shared with `remover`.
    ///
    /// The target is flagged recently-removed so it stays invisible to
    /// proximity and grouping until it moves away. When the shared group
    /// collapses below two members the removal cascades: the group is
    /// deleted and the remover is flagged and unconfirmed as well.
    pub fn remove_member(&mut self, remover: BodyId, target: BodyId) -> bool {
        if remover == target {
            warn!("removal refused: body {} cannot remove itself", remover);
            return false;
        }

        self.recently_removed.insert(target);
        for group in self.potential.values_mut() {
            group.confirmed.remove(&target);
        }

        let shared: Vec<GroupId> = self
            .potential
            .iter()
            .filter(|(_, g)| g.members.contains(&remover) && g.members.contains(&target))
            .map(|(k, _)| k.clone())
            .collect();

        let mut cascaded = false;
        for key in shared {
            if let Some(group) = self.potential.get_mut(&key) {
                group.members.remove(&target);
                group.confirmed.remove(&target);
                if group.members.len() < 2 {
                    info!("group {} dissolved by removal of {}", key, target);
                    self.potential.remove(&key);
                    cascaded = true;
                }
            }
        }

        if cascaded {
            for group in self.potential.values_mut() {
                group.confirmed.remove(&remover);
            }
            self.recently_removed.insert(remover);
        }
        true
    }

    /// Clears the recently-removed flag for bodies that are gone or that no
    /// longer sit within the hysteresis threshold of any unflagged body.
    ///
    /// Only unflagged neighbors hold the flag, so two bodies marked by the
    /// same removal release each other once nobody else is near.
    pub fn expire_removed(&mut self, bodies: &[RigidBody], config: &SimulationConfig) {
        let flagged = self.recently_removed.clone();
        for id in flagged.iter().copied() {
            let Some(me) = bodies.iter().find(|b| b.id == id) else {
                self.recently_removed.remove(&id);
                continue;
            };
            let still_close = bodies.iter().any(|other| {
                other.id != id
                    && !flagged.contains(&other.id)
                    && edge_distance_cm(me, other, config) <= config.removal_hysteresis_cm
            });
            if !still_close {
                self.recently_removed.remove(&id);
            }
        }
    }

    /// Strips state belonging to a body that left the table entirely.
    pub fn forget_body(&mut self, id: BodyId) {
        self.recently_removed.remove(&id);
        self.representative_selections.remove(&id);
        for group in self.potential.values_mut() {
            group.members.remove(&id);
            group.confirmed.remove(&id);
        }
        self.potential.retain(|_, g| g.members.len() >= 2);
        for group in self.confirmed.values_mut() {
            group.members.remove(&id);
        }
        self.confirmed.retain(|_, g| g.members.len() >= 2);
    }

    /// Promotes every potential group whose full membership has confirmed.
    fn promote_ready(&mut self) {
        let ready: Vec<GroupId> = self
            .potential
            .iter()
            .filter(|(_, g)| g.members.len() >= 2 && g.confirmed == g.members)
            .map(|(k, _)| k.clone())
            .collect();

        for key in ready {
            let Some(group) = self.potential.remove(&key) else {
                continue;
            };
            let linked = group
                .representative
                .as_ref()
                .and_then(|(_, id)| self.confirmed.get_mut(id));
            match linked {
                Some(target) => {
                    info!("merging group {} into confirmed group {}", group.id, target.id);
                    target.members.extend(group.members);
                }
                None => {
                    self.next_confirmed += 1;
                    let id = self.next_confirmed.to_string();
                    info!("promoting group {} to confirmed group {}", group.id, id);
                    self.confirmed.insert(
                        id.clone(),
                        ConfirmedGroup {
                            id,
                            members: group.members,
                        },
                    );
                }
            }
        }
    }

    /// Connected components (size two and up) of the direct-proximity graph.
    fn components(active: &[&RigidBody], config: &SimulationConfig) -> Vec<BTreeSet<BodyId>> {
        let n = active.len();
        let mut adjacency = vec![Vec::new(); n];
        for i in 0..n {
            for j in (i + 1)..n {
                let distance = edge_distance_cm(active[i], active[j], config);
                if distance <= config.proximity_threshold_cm {
                    adjacency[i].push(j);
                    adjacency[j].push(i);
                }
            }
        }

        let mut visited = vec![false; n];
        let mut components = Vec::new();
        for start in 0..n {
            if visited[start] {
                continue;
            }
            visited[start] = true;
            let mut component = BTreeSet::new();
            component.insert(active[start].id);
            let mut queue = VecDeque::from([start]);
            while let Some(i) = queue.pop_front() {
                for &j in &adjacency[i] {
                    if !visited[j] {
                        visited[j] = true;
                        component.insert(active[j].id);
                        queue.push_back(j);
                    }
                }
            }
            if component.len() >= 2 {
                components.push(component);
            }
        }
        components
    }
}
