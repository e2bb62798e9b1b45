#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Creep Defence.
//!
//! The world owns the creep pool, the tower registry and the path. It is
//! mutated exclusively through [`apply`] and observed through the [`query`]
//! module.

mod creep;
mod pool;
mod towers;

use std::time::Duration;

use creep_defence_core::{
    creep_definition, default_creep_definition, Command, CreepId, Event, Path, SimulationConfig,
    SpawnOrigin, Strike, StrikeOutcome, TargetPriority, TowerBranch, TowerId,
};
use glam::Vec2;

use crate::{pool::CreepPool, towers::TowerRegistry};

/// Represents the authoritative Creep Defence world state.
#[derive(Debug)]
pub struct World {
    config: SimulationConfig,
    path: Path,
    creeps: CreepPool,
    towers: TowerRegistry,
    elapsed: Duration,
}

impl World {
    /// Creates a world whose creeps follow `path`.
    #[must_use]
    pub fn new(path: Path, config: SimulationConfig) -> Self {
        Self {
            creeps: CreepPool::with_capacity(config.creep_pool_capacity),
            config,
            path,
            towers: TowerRegistry::new(),
            elapsed: Duration::ZERO,
        }
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.elapsed = self.elapsed.saturating_add(dt);
        out_events.push(Event::TimeAdvanced { dt });
        self.towers.tick(dt);

        let linger = self.config.death_linger();
        for id in self.creeps.live_ids() {
            let Some(creep) = self.creeps.get_mut(id) else {
                continue;
            };
            if creep.advance(dt, &self.path, linger, out_events) {
                self.creeps.release(id);
            }
        }
    }

    fn spawn_creep(
        &mut self,
        creep_type: &'static str,
        wave: u32,
        origin: SpawnOrigin,
        out_events: &mut Vec<Event>,
    ) {
        let definition = creep_definition(creep_type).unwrap_or_else(|| {
            tracing::warn!(creep_type, "unknown creep type, falling back to default");
            default_creep_definition()
        });
        let distance = match origin {
            SpawnOrigin::Group { .. } => 0.0,
            SpawnOrigin::Offspring { distance, .. } => distance,
        };

        let capacity = self.creeps.capacity();
        let Some((id, creep)) = self.creeps.acquire() else {
            tracing::warn!(
                creep_type = definition.key,
                capacity,
                "creep pool exhausted, dropping spawn"
            );
            return;
        };
        creep.spawn(id, definition, wave, distance, &self.path);
        tracing::debug!(creep = id.get(), creep_type = definition.key, wave, "creep spawned");
        out_events.push(Event::CreepSpawned {
            creep: id,
            creep_type: definition.key,
            origin,
        });
    }

    fn strike_creep(
        &mut self,
        tower: TowerId,
        target: CreepId,
        strike: Strike,
        out_events: &mut Vec<Event>,
    ) {
        match self.towers.get(tower) {
            Some(state) if state.cooldown.is_zero() => {}
            Some(_) => {
                tracing::debug!(tower = tower.get(), "strike dropped, tower cooling down");
                return;
            }
            None => {
                tracing::debug!(tower = tower.get(), "strike dropped, unknown tower");
                return;
            }
        }
        let Some(creep) = self.creeps.get_mut(target) else {
            return;
        };

        let mut struck = Vec::new();
        let report = creep.take_damage(strike.damage, strike.magic, strike.branch, &mut struck);
        if matches!(report.outcome, StrikeOutcome::Hit | StrikeOutcome::Shielded) {
            if let Some(effect) = strike.effect {
                let _ = creep.apply_effect(effect, &self.path);
            }
        }

        if let Some(state) = self.towers.get_mut(tower) {
            state.cooldown = state.branch.fire_cooldown();
        }
        out_events.push(Event::CreepStruck {
            tower,
            creep: target,
            dealt: report.dealt,
            outcome: report.outcome,
        });
        out_events.append(&mut struck);
    }

    fn place_tower(
        &mut self,
        branch: TowerBranch,
        position: Vec2,
        priority: TargetPriority,
        out_events: &mut Vec<Event>,
    ) {
        let tower = self.towers.place(branch, position, priority);
        out_events.push(Event::TowerPlaced {
            tower,
            branch,
            position,
        });
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::SpawnCreep {
            creep_type,
            wave,
            origin,
        } => world.spawn_creep(creep_type, wave, origin, out_events),
        Command::StrikeCreep {
            tower,
            creep,
            strike,
        } => world.strike_creep(tower, creep, strike, out_events),
        Command::PlaceTower {
            branch,
            position,
            priority,
        } => world.place_tower(branch, position, priority, out_events),
        Command::SetTargetPriority { tower, priority } => {
            if let Some(state) = world.towers.get_mut(tower) {
                state.priority = priority;
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::World;
    use creep_defence_core::{
        CreepId, CreepSnapshot, CreepView, Path, TowerCooldownView, TowerView,
    };

    /// Provides read-only access to the path creeps follow.
    #[must_use]
    pub fn path(world: &World) -> &Path {
        &world.path
    }

    /// Total simulated time.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }

    /// Captures a read-only view of every active and dying creep.
    #[must_use]
    pub fn creep_view(world: &World) -> CreepView {
        CreepView::from_snapshots(world.creeps.iter().map(|creep| creep.snapshot()).collect())
    }

    /// Captures a single creep, if it is still active or dying.
    #[must_use]
    pub fn creep(world: &World, id: CreepId) -> Option<CreepSnapshot> {
        world.creeps.get(id).map(|creep| creep.snapshot())
    }

    /// Number of creeps currently walking the path.
    #[must_use]
    pub fn active_creep_count(world: &World) -> usize {
        world.creeps.active_count()
    }

    /// Captures a read-only view of the placed towers.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        TowerView::from_snapshots(world.towers.iter().map(|tower| tower.snapshot()).collect())
    }

    /// Captures the time each tower must wait before firing again.
    #[must_use]
    pub fn tower_cooldowns(world: &World) -> TowerCooldownView {
        TowerCooldownView::from_snapshots(
            world
                .towers
                .iter()
                .map(|tower| tower.cooldown_snapshot())
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use creep_defence_core::Lifecycle;

    fn world() -> World {
        World::new(
            Path::straight(Vec2::ZERO, Vec2::new(1_000.0, 0.0)),
            SimulationConfig::default(),
        )
    }

    fn spawn(world: &mut World, creep_type: &'static str) -> CreepId {
        let mut events = Vec::new();
        apply(
            world,
            Command::SpawnCreep {
                creep_type,
                wave: 1,
                origin: SpawnOrigin::Group { wave: 1, group: 0 },
            },
            &mut events,
        );
        match events.as_slice() {
            [Event::CreepSpawned { creep, .. }] => *creep,
            other => panic!("unexpected events {other:?}"),
        }
    }

    fn place(world: &mut World, branch: TowerBranch) -> TowerId {
        let mut events = Vec::new();
        apply(
            world,
            Command::PlaceTower {
                branch,
                position: Vec2::new(0.0, 20.0),
                priority: TargetPriority::default(),
            },
            &mut events,
        );
        match events.as_slice() {
            [Event::TowerPlaced { tower, .. }] => *tower,
            other => panic!("unexpected events {other:?}"),
        }
    }

    #[test]
    fn tick_moves_creeps_by_speed() {
        let mut world = world();
        let creep = spawn(&mut world, "normal");
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(500),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::TimeAdvanced {
                dt: Duration::from_millis(500)
            }]
        );
        let snapshot = query::creep(&world, creep).expect("creep");
        assert!((snapshot.distance_travelled - 30.0).abs() < 1e-4);
        assert_eq!(snapshot.position, Vec2::new(snapshot.distance_travelled, 0.0));
        assert_eq!(query::elapsed(&world), Duration::from_millis(500));
    }

    #[test]
    fn strikes_start_the_tower_cooldown() {
        let mut world = world();
        let creep = spawn(&mut world, "normal");
        let tower = place(&mut world, TowerBranch::Archer);
        let strike = TowerBranch::Archer.strike();

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::StrikeCreep {
                tower,
                creep,
                strike,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::StrikeCreep {
                tower,
                creep,
                strike,
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::CreepStruck {
                tower,
                creep,
                dealt: 12.0,
                outcome: StrikeOutcome::Hit,
            }],
            "the second strike arrives during the cooldown"
        );
        let cooldown = query::tower_cooldowns(&world).into_vec()[0].ready_in;
        assert_eq!(cooldown, TowerBranch::Archer.fire_cooldown());
    }

    #[test]
    fn set_target_priority_updates_tower_view() {
        let mut world = world();
        let tower = place(&mut world, TowerBranch::Fire);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SetTargetPriority {
                tower,
                priority: TargetPriority::Closest,
            },
            &mut events,
        );

        assert!(events.is_empty());
        let view = query::tower_view(&world).into_vec();
        assert_eq!(view[0].priority, TargetPriority::Closest);
    }

    #[test]
    fn killed_creeps_linger_before_their_slot_is_released() {
        let mut world = world();
        let creep = spawn(&mut world, "swarm");
        let tower = place(&mut world, TowerBranch::Arcane);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::StrikeCreep {
                tower,
                creep,
                strike: TowerBranch::Arcane.strike(),
            },
            &mut events,
        );
        assert!(events.contains(&Event::CreepDied {
            creep,
            gold_reward: 2
        }));
        assert_eq!(
            query::creep(&world, creep).map(|snapshot| snapshot.lifecycle),
            Some(Lifecycle::Dying)
        );
        assert_eq!(query::active_creep_count(&world), 0);

        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(299),
            },
            &mut events,
        );
        assert!(query::creep(&world, creep).is_some());
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(1),
            },
            &mut events,
        );
        assert!(query::creep(&world, creep).is_none());
    }
}
