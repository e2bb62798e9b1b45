#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that turns tower targets into strike commands.
//!
//! A tower fires when its cooldown has elapsed and the creep it selected is
//! still active. The strike carries the fixed profile of the tower's branch;
//! the world resets the cooldown once the strike lands.

use creep_defence_core::{Command, CreepView, TowerCooldownView, TowerTarget};

/// Tower combat system that queues strikes for ready towers.
#[derive(Debug, Default)]
pub struct TowerCombat {
    ready: Vec<TowerTarget>,
}

impl TowerCombat {
    /// Creates a combat system with an empty ready list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits one `Command::StrikeCreep` per ready tower, in tower order.
    ///
    /// Targets whose tower is unknown, cooling down, or whose creep is no
    /// longer active produce nothing.
    pub fn handle(
        &mut self,
        cooldowns: &TowerCooldownView,
        targets: &[TowerTarget],
        creeps: &CreepView,
        out: &mut Vec<Command>,
    ) {
        self.ready.clear();
        self.ready.extend(targets.iter().copied().filter(|target| {
            creeps
                .get(target.creep)
                .is_some_and(|snapshot| snapshot.is_active())
        }));
        if self.ready.is_empty() {
            return;
        }
        self.ready.sort_unstable_by_key(|target| target.tower);

        for cooldown in cooldowns.iter().filter(|cooldown| cooldown.ready_in.is_zero()) {
            let Ok(index) = self
                .ready
                .binary_search_by_key(&cooldown.tower, |target| target.tower)
            else {
                continue;
            };
            out.push(Command::StrikeCreep {
                tower: cooldown.tower,
                creep: self.ready[index].creep,
                strike: cooldown.branch.strike(),
            });
        }
    }
}
