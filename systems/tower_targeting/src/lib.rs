#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that computes deterministic tower targets from world snapshots.
//!
//! Every tower ranks the creeps it may legally hit by its [`TargetPriority`]
//! and keeps the greatest value. Crowd-control towers (ice and poison) prefer
//! creeps that do not already carry their signature effect, falling back to a
//! saturated creep only when nothing else is in range.

use creep_defence_core::{
    CreepId, CreepSnapshot, CreepView, Element, TargetPriority, TowerBranch, TowerId,
    TowerSnapshot, TowerTarget, TowerView,
};
use creep_defence_system_status_effects::MAX_POISON_STACKS;
use glam::Vec2;

/// Tower targeting system that reuses scratch buffers to avoid repeated allocations.
#[derive(Debug, Default)]
pub struct TowerTargeting {
    creep_workspace: Vec<CreepCandidate>,
}

impl TowerTargeting {
    /// Creates a new tower targeting system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes tower targets for the provided world snapshot.
    ///
    /// The output buffer is cleared before populating it with the latest
    /// assignments. Towers without a legal target are omitted.
    pub fn handle(&mut self, towers: &TowerView, creeps: &CreepView, out: &mut Vec<TowerTarget>) {
        out.clear();

        if towers.iter().next().is_none() {
            return;
        }

        self.prepare_creep_workspace(creeps);
        if self.creep_workspace.is_empty() {
            return;
        }

        for tower in towers.iter() {
            if let Some(creep) = best_target(tower, &self.creep_workspace) {
                out.push(TowerTarget {
                    tower: tower.id,
                    creep,
                });
            }
        }
    }

    fn prepare_creep_workspace(&mut self, creeps: &CreepView) {
        self.creep_workspace.clear();
        self.creep_workspace.extend(
            creeps
                .active()
                .filter(|snapshot| snapshot.targetable)
                .map(CreepCandidate::from_snapshot),
        );
    }
}

/// Selects the creep a single tower should fire at, if any.
#[must_use]
pub fn select_target(tower: &TowerSnapshot, creeps: &CreepView) -> Option<CreepId> {
    let candidates: Vec<CreepCandidate> = creeps
        .active()
        .filter(|snapshot| snapshot.targetable)
        .map(CreepCandidate::from_snapshot)
        .collect();
    best_target(tower, &candidates)
}

fn best_target(tower: &TowerSnapshot, candidates: &[CreepCandidate]) -> Option<CreepId> {
    let range_sq = tower.range * tower.range;
    let element = tower.branch.element();
    let ground_only = tower.branch.is_ground_only();

    let mut best_fresh: Option<Ranked> = None;
    let mut best_saturated: Option<Ranked> = None;

    for candidate in candidates {
        let distance_sq = candidate.position.distance_squared(tower.position);
        if distance_sq > range_sq {
            continue;
        }
        if ground_only && candidate.flying {
            continue;
        }
        if candidate
            .only_damaged_by
            .is_some_and(|required| element != Some(required))
        {
            continue;
        }

        let ranked = Ranked {
            creep: candidate.id,
            value: candidate.value(tower.priority, distance_sq),
        };
        let slot = if candidate.is_saturated_for(tower.branch) {
            &mut best_saturated
        } else {
            &mut best_fresh
        };
        if slot.map_or(true, |existing| ranked.value > existing.value) {
            *slot = Some(ranked);
        }
    }

    best_fresh.or(best_saturated).map(|ranked| ranked.creep)
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct CreepCandidate {
    id: CreepId,
    position: Vec2,
    distance_travelled: f32,
    health: f32,
    flying: bool,
    only_damaged_by: Option<Element>,
    slowed: bool,
    poison_stacks: usize,
}

impl CreepCandidate {
    fn from_snapshot(snapshot: &CreepSnapshot) -> Self {
        Self {
            id: snapshot.id,
            position: snapshot.position,
            distance_travelled: snapshot.distance_travelled,
            health: snapshot.health,
            flying: snapshot.flying,
            only_damaged_by: snapshot.only_damaged_by,
            slowed: snapshot.slowed,
            poison_stacks: snapshot.poison_stacks,
        }
    }

    fn value(&self, priority: TargetPriority, distance_sq: f32) -> f32 {
        match priority {
            TargetPriority::HighestHealth => self.health,
            TargetPriority::FurthestAlongPath => self.distance_travelled,
            TargetPriority::Closest => -distance_sq,
        }
    }

    fn is_saturated_for(&self, branch: TowerBranch) -> bool {
        match branch {
            TowerBranch::Ice => self.slowed,
            TowerBranch::Poison => self.poison_stacks >= MAX_POISON_STACKS,
            _ => false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Ranked {
    creep: CreepId,
    value: f32,
}
