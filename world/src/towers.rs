//! Authoritative tower state management utilities.

use std::{collections::BTreeMap, time::Duration};

use creep_defence_core::{
    TargetPriority, TowerBranch, TowerCooldownSnapshot, TowerId, TowerSnapshot,
};
use glam::Vec2;

/// Snapshot of a tower stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct TowerState {
    /// Identifier allocated by the world for the tower.
    pub(crate) id: TowerId,
    /// Branch the tower was built as.
    pub(crate) branch: TowerBranch,
    /// World position of the tower's centre.
    pub(crate) position: Vec2,
    /// Rule used to rank targets.
    pub(crate) priority: TargetPriority,
    /// Time until the tower may fire again.
    pub(crate) cooldown: Duration,
}

impl TowerState {
    pub(crate) fn snapshot(&self) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            branch: self.branch,
            position: self.position,
            range: self.branch.range(),
            priority: self.priority,
        }
    }

    pub(crate) fn cooldown_snapshot(&self) -> TowerCooldownSnapshot {
        TowerCooldownSnapshot {
            tower: self.id,
            branch: self.branch,
            ready_in: self.cooldown,
        }
    }
}

/// Registry that stores towers and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, TowerState>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    /// Stores a ready-to-fire tower and returns its identifier.
    pub(crate) fn place(
        &mut self,
        branch: TowerBranch,
        position: Vec2,
        priority: TargetPriority,
    ) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().wrapping_add(1));
        let _ = self.entries.insert(
            id,
            TowerState {
                id,
                branch,
                position,
                priority,
                cooldown: Duration::ZERO,
            },
        );
        id
    }

    pub(crate) fn get(&self, id: TowerId) -> Option<&TowerState> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut TowerState> {
        self.entries.get_mut(&id)
    }

    /// Counts every cooldown down by `dt`.
    pub(crate) fn tick(&mut self, dt: Duration) {
        for tower in self.entries.values_mut() {
            tower.cooldown = tower.cooldown.saturating_sub(dt);
        }
    }

    /// Towers in identifier order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &TowerState> {
        self.entries.values()
    }
}
