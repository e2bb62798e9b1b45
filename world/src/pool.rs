//! Fixed-capacity arena of creep slots.

use std::collections::BTreeMap;

use creep_defence_core::{CreepId, Lifecycle};

use crate::creep::Creep;

/// Preallocated creep slots indexed by the identifier of their current life.
#[derive(Debug)]
pub(crate) struct CreepPool {
    slots: Vec<Creep>,
    live: BTreeMap<CreepId, usize>,
    next_creep_id: u32,
}

impl CreepPool {
    /// Allocates `capacity` inactive slots up front.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| Creep::vacant()).collect(),
            live: BTreeMap::new(),
            next_creep_id: 0,
        }
    }

    /// Claims the first inactive slot under a fresh identifier.
    ///
    /// Returns `None` when every slot is active or dying.
    pub(crate) fn acquire(&mut self) -> Option<(CreepId, &mut Creep)> {
        let slot = self
            .slots
            .iter()
            .position(|creep| creep.lifecycle() == Lifecycle::Inactive)?;
        let id = CreepId::new(self.next_creep_id);
        self.next_creep_id = self.next_creep_id.wrapping_add(1);
        let _ = self.live.insert(id, slot);
        Some((id, &mut self.slots[slot]))
    }

    /// Deactivates the creep and frees its slot.
    pub(crate) fn release(&mut self, id: CreepId) {
        if let Some(slot) = self.live.remove(&id) {
            self.slots[slot].deactivate();
        }
    }

    pub(crate) fn get(&self, id: CreepId) -> Option<&Creep> {
        self.live.get(&id).map(|&slot| &self.slots[slot])
    }

    pub(crate) fn get_mut(&mut self, id: CreepId) -> Option<&mut Creep> {
        let slot = *self.live.get(&id)?;
        self.slots.get_mut(slot)
    }

    /// Identifiers of all active and dying creeps in ascending order.
    pub(crate) fn live_ids(&self) -> Vec<CreepId> {
        self.live.keys().copied().collect()
    }

    /// Active and dying creeps in identifier order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Creep> {
        self.live.values().map(|&slot| &self.slots[slot])
    }

    pub(crate) fn active_count(&self) -> usize {
        self.iter().filter(|creep| creep.is_active()).count()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }
}
