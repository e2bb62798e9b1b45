use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    time::Duration,
};

use creep_defence_core::{
    Command, CreepView, Event, Path, SimulationConfig, SpawnOrigin, TargetPriority, TowerBranch,
    TowerId,
};
use creep_defence_system_tower_combat::TowerCombat;
use creep_defence_system_tower_targeting::TowerTargeting;
use creep_defence_world::{self as world, query, World};
use glam::Vec2;

const FRAME: Duration = Duration::from_millis(100);
const FRAMES: u32 = 300;
const ICE_TOWER: TowerId = TowerId::new(0);
const ARCHER_TOWER: TowerId = TowerId::new(1);

#[test]
fn deterministic_replay_of_a_defended_lane() {
    let first = replay();
    let second = replay();

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.fingerprint(), second.fingerprint());

    assert!(
        first.strikes_by(ICE_TOWER).len() > 1,
        "the ice tower should fire repeatedly"
    );
    assert!(
        first.strikes_by(ARCHER_TOWER).len() > 1,
        "the archer tower should fire repeatedly"
    );
    assert!(first.deaths > 0, "the archer should kill at least one creep");
    assert!(
        !first.ice_ignored_fresh_target,
        "ice picked a slowed creep while an unslowed one was in range"
    );
}

#[test]
fn strikes_respect_branch_cooldowns() {
    let outcome = replay();

    for (tower, branch) in [(ICE_TOWER, TowerBranch::Ice), (ARCHER_TOWER, TowerBranch::Archer)] {
        let frames = outcome.strikes_by(tower);
        for pair in frames.windows(2) {
            let gap = FRAME * (pair[1] - pair[0]);
            assert!(
                gap >= branch.fire_cooldown(),
                "{branch:?} fired again after {gap:?}"
            );
        }
    }
}

fn replay() -> ReplayOutcome {
    let mut world = World::new(
        Path::straight(Vec2::ZERO, Vec2::new(1_000.0, 0.0)),
        SimulationConfig::default(),
    );
    let mut targeting = TowerTargeting::new();
    let mut combat = TowerCombat::new();
    let mut targets = Vec::new();
    let mut outcome = ReplayOutcome::default();

    let mut events = Vec::new();
    for (branch, x, priority) in [
        (TowerBranch::Ice, 150.0, TargetPriority::FurthestAlongPath),
        (TowerBranch::Archer, 300.0, TargetPriority::Closest),
    ] {
        world::apply(
            &mut world,
            Command::PlaceTower {
                branch,
                position: Vec2::new(x, 20.0),
                priority,
            },
            &mut events,
        );
    }
    outcome.record(0, &events);

    for frame in 1..=FRAMES {
        let mut events = Vec::new();
        if frame % 10 == 0 && frame <= 50 {
            world::apply(
                &mut world,
                Command::SpawnCreep {
                    creep_type: "normal",
                    wave: 1,
                    origin: SpawnOrigin::Group { wave: 1, group: 0 },
                },
                &mut events,
            );
        }
        world::apply(&mut world, Command::Tick { dt: FRAME }, &mut events);

        let towers = query::tower_view(&world);
        let creeps = query::creep_view(&world);
        targeting.handle(&towers, &creeps, &mut targets);
        outcome.check_ice_choice(&towers, &creeps, &targets);

        let mut commands = Vec::new();
        combat.handle(&query::tower_cooldowns(&world), &targets, &creeps, &mut commands);
        for command in commands {
            world::apply(&mut world, command, &mut events);
        }

        outcome.record(frame, &events);
    }

    outcome
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
struct ReplayOutcome {
    events: Vec<String>,
    strikes: Vec<(TowerId, u32)>,
    deaths: usize,
    ice_ignored_fresh_target: bool,
}

impl ReplayOutcome {
    fn record(&mut self, frame: u32, events: &[Event]) {
        for event in events {
            match event {
                Event::CreepStruck { tower, .. } => self.strikes.push((*tower, frame)),
                Event::CreepDied { .. } => self.deaths += 1,
                _ => {}
            }
            self.events.push(format!("{frame}: {event:?}"));
        }
    }

    fn check_ice_choice(
        &mut self,
        towers: &creep_defence_core::TowerView,
        creeps: &CreepView,
        targets: &[creep_defence_core::TowerTarget],
    ) {
        let Some(ice) = towers.iter().find(|tower| tower.id == ICE_TOWER) else {
            return;
        };
        let Some(chosen) = targets.iter().find(|target| target.tower == ICE_TOWER) else {
            return;
        };
        let Some(chosen) = creeps.get(chosen.creep) else {
            return;
        };
        if !chosen.slowed {
            return;
        }
        let fresh_in_range = creeps.active().any(|creep| {
            creep.targetable
                && !creep.slowed
                && creep.position.distance(ice.position) <= ice.range
        });
        self.ice_ignored_fresh_target |= fresh_in_range;
    }

    fn strikes_by(&self, tower: TowerId) -> Vec<u32> {
        self.strikes
            .iter()
            .filter(|(striker, _)| *striker == tower)
            .map(|(_, frame)| *frame)
            .collect()
    }

    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}
