#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Creep Defence simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to deterministically. Systems consume event streams,
//! query immutable snapshots such as [`CreepView`], and respond exclusively with
//! new command batches.
//!
//! Static level data lives here as well: the fixed [`Path`] creeps follow, the
//! creep catalog, and the wave table.

mod catalog;
mod path;
mod waves;

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub use catalog::{
    creep_catalog, creep_definition, default_creep_definition, Capabilities, CreepClass,
    CreepDefinition, CreepStats, DigSpec, DispelSpec, GhostSpec, JumpSpec, OffspringSpec,
    ShieldSpec, DEFAULT_CREEP_TYPE,
};
pub use path::{Path, PathError, PathPosition, PathSegment};
pub use waves::{wave, wave_table, WaveCreepGroup, WaveDef, WaveType, WAVE_COUNT};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that a pooled creep slot be spawned onto the path.
    SpawnCreep {
        /// Catalog key of the creep; unknown keys fall back to the default type.
        creep_type: &'static str,
        /// Wave number used to scale the creep's statistics.
        wave: u32,
        /// Who asked for the spawn.
        origin: SpawnOrigin,
    },
    /// Delivers a tower's hit to a creep.
    StrikeCreep {
        /// Tower that fired.
        tower: TowerId,
        /// Creep that was hit.
        creep: CreepId,
        /// Damage and effect payload.
        strike: Strike,
    },
    /// Requests placement of a tower at a world position.
    PlaceTower {
        /// Branch of the tower to construct.
        branch: TowerBranch,
        /// World position of the tower's centre.
        position: Vec2,
        /// Initial targeting priority.
        priority: TargetPriority,
    },
    /// Changes the priority a tower uses when selecting targets.
    SetTargetPriority {
        /// Tower being reconfigured.
        tower: TowerId,
        /// New priority mode.
        priority: TargetPriority,
    },
}

/// Events broadcast by the world and systems after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a pooled slot was activated for a new creep.
    CreepSpawned {
        /// Identifier assigned to the creep for this life.
        creep: CreepId,
        /// Catalog key actually used after fallback resolution.
        creep_type: &'static str,
        /// Origin copied from the spawn command.
        origin: SpawnOrigin,
    },
    /// Reports the outcome of a strike delivered to a creep.
    CreepStruck {
        /// Tower that fired.
        tower: TowerId,
        /// Creep that was hit.
        creep: CreepId,
        /// Health removed by the strike.
        dealt: f32,
        /// How the strike was resolved.
        outcome: StrikeOutcome,
    },
    /// A creep's health reached zero.
    CreepDied {
        /// Creep that died.
        creep: CreepId,
        /// Gold paid for the kill.
        gold_reward: u32,
    },
    /// A creep reached the end of the path and leaked.
    CreepReachedEnd {
        /// Creep that leaked.
        creep: CreepId,
    },
    /// A dying creep releases offspring at its location.
    CreepSpawnedOnDeath {
        /// Creep that died.
        parent: CreepId,
        /// Catalog key of the offspring.
        creep_type: &'static str,
        /// Number of offspring.
        count: u32,
        /// World position of the parent at death.
        position: Vec2,
        /// Path distance of the parent at death.
        distance: f32,
    },
    /// A boss took damage for the first time in its life.
    BossFirstHit {
        /// Boss that was hit.
        creep: CreepId,
    },
    /// A boss dropped to half health or below for the first time.
    BossPainThreshold {
        /// Boss that crossed the threshold.
        creep: CreepId,
    },
    /// One of a creep's ability sub-machines changed state.
    AbilityChanged {
        /// Creep whose ability changed.
        creep: CreepId,
        /// Transition that occurred.
        change: AbilityChange,
    },
    /// Confirms that a tower was placed into the world.
    TowerPlaced {
        /// Identifier assigned to the tower by the world.
        tower: TowerId,
        /// Branch of the tower.
        branch: TowerBranch,
        /// World position of the tower.
        position: Vec2,
    },
    /// A wave started spawning.
    WaveStarted {
        /// One-based wave number.
        wave: u32,
        /// Banner text configured for the wave, if any.
        announcement: Option<&'static str>,
    },
    /// Every creep of a wave was killed or leaked.
    WaveCompleted {
        /// One-based wave number.
        wave: u32,
        /// Creeps killed during the wave.
        killed: u32,
        /// Creeps that leaked during the wave.
        leaked: u32,
    },
    /// The final configured wave completed.
    AllWavesCompleted,
}

/// Unique identifier assigned to a creep for a single life in the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CreepId(u32);

impl CreepId {
    /// Creates a new creep identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Lifecycle of a pooled creep slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// Free for reuse.
    #[default]
    Inactive,
    /// Walking the path; moves, takes damage and can be targeted.
    Active,
    /// Killed and playing out its death; ignored by every system.
    Dying,
}

/// Describes who requested a creep spawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SpawnOrigin {
    /// Spawned by a wave group.
    Group {
        /// One-based wave number.
        wave: u32,
        /// Index of the group within the wave definition.
        group: usize,
    },
    /// Released by a dying parent.
    Offspring {
        /// Creep that released the offspring.
        parent: CreepId,
        /// Path distance at which the offspring starts.
        distance: f32,
    },
}

/// Tower elements some creeps are exclusively vulnerable to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Element {
    /// Frost damage from ice towers.
    Ice,
    /// Toxic damage from poison towers.
    Poison,
}

/// Upgrade branch of a tower, which fixes its stats and signature effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TowerBranch {
    /// Fast single-target physical damage.
    Archer,
    /// Heavy ground-only shots that shred armor.
    Cannon,
    /// Slows its targets.
    Ice,
    /// Ground-only stacking poison.
    Poison,
    /// Stacking burn.
    Fire,
    /// Magic damage that leaves targets brittle.
    Arcane,
}

impl TowerBranch {
    /// Targeting radius in world units.
    #[must_use]
    pub const fn range(self) -> f32 {
        match self {
            Self::Archer => 150.0,
            Self::Cannon => 130.0,
            Self::Ice => 120.0,
            Self::Poison => 130.0,
            Self::Fire => 120.0,
            Self::Arcane => 160.0,
        }
    }

    /// Time between consecutive shots.
    #[must_use]
    pub const fn fire_cooldown(self) -> Duration {
        match self {
            Self::Archer => Duration::from_millis(600),
            Self::Cannon => Duration::from_millis(1_500),
            Self::Ice => Duration::from_millis(1_000),
            Self::Poison => Duration::from_millis(1_200),
            Self::Fire => Duration::from_millis(900),
            Self::Arcane => Duration::from_millis(1_400),
        }
    }

    /// Reports whether the tower can only hit creeps on the ground.
    #[must_use]
    pub const fn is_ground_only(self) -> bool {
        matches!(self, Self::Cannon | Self::Poison)
    }

    /// Element carried by the branch, if any.
    #[must_use]
    pub const fn element(self) -> Option<Element> {
        match self {
            Self::Ice => Some(Element::Ice),
            Self::Poison => Some(Element::Poison),
            _ => None,
        }
    }

    /// Payload delivered by a single shot of this branch.
    #[must_use]
    pub const fn strike(self) -> Strike {
        let (damage, magic, effect) = match self {
            Self::Archer => (12.0, false, None),
            Self::Cannon => (40.0, false, Some(StrikeEffect::ArmorReduction { amount: 5.0 })),
            Self::Ice => (
                6.0,
                false,
                Some(StrikeEffect::Slow {
                    amount: 0.4,
                    duration: Duration::from_millis(2_000),
                }),
            ),
            Self::Poison => (
                4.0,
                false,
                Some(StrikeEffect::Poison {
                    damage_per_second: 8.0,
                    duration: Duration::from_millis(4_000),
                }),
            ),
            Self::Fire => (
                8.0,
                false,
                Some(StrikeEffect::Burn {
                    damage_per_second: 6.0,
                    duration: Duration::from_millis(3_000),
                }),
            ),
            Self::Arcane => (
                25.0,
                true,
                Some(StrikeEffect::Brittle {
                    duration: Duration::from_millis(3_000),
                }),
            ),
        };

        Strike {
            damage,
            magic,
            branch: self,
            effect,
        }
    }
}

/// Rule a tower uses to rank candidate targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetPriority {
    /// Prefer the creep with the most remaining health.
    HighestHealth,
    /// Prefer the creep closest to the exit.
    #[default]
    FurthestAlongPath,
    /// Prefer the creep nearest the tower.
    Closest,
}

/// Damage and effect payload of a single tower hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Strike {
    /// Raw damage before armor and multipliers.
    pub damage: f32,
    /// Magic damage ignores armor and brittleness.
    pub magic: bool,
    /// Branch of the tower that fired.
    pub branch: TowerBranch,
    /// Status effect applied alongside the damage.
    pub effect: Option<StrikeEffect>,
}

/// Status effects a strike may inflict.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StrikeEffect {
    /// Reduces speed by a fraction.
    Slow {
        /// Fraction of speed removed, in `[0, 1]`.
        amount: f32,
        /// How long the slow lasts.
        duration: Duration,
    },
    /// Stops movement entirely.
    Freeze {
        /// How long the freeze lasts.
        duration: Duration,
    },
    /// Adds a poison stack.
    Poison {
        /// Damage dealt each second by the stack.
        damage_per_second: f32,
        /// How long the stack lasts.
        duration: Duration,
    },
    /// Adds a burn stack.
    Burn {
        /// Damage dealt each second by the stack.
        damage_per_second: f32,
        /// How long the stack lasts.
        duration: Duration,
    },
    /// Permanently shreds armor, up to a cap.
    ArmorReduction {
        /// Armor removed.
        amount: f32,
    },
    /// Amplifies incoming physical damage.
    Brittle {
        /// How long the creep stays brittle.
        duration: Duration,
    },
    /// Pushes the creep back along the path.
    Knockback {
        /// Path distance removed.
        distance: f32,
    },
}

/// Resolution of a strike against a creep.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StrikeOutcome {
    /// Damage was applied.
    Hit,
    /// A shield charge absorbed the damage.
    Shielded,
    /// The creep was burrowed or phased out.
    Immune,
    /// The creep only takes damage from a different element.
    Resisted,
    /// The creep was not active.
    Ignored,
}

/// State transitions reported by a creep's ability sub-machines.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AbilityChange {
    /// The last shield charge was consumed.
    ShieldBroken,
    /// The jump warning window opened.
    JumpTelegraphed,
    /// The creep left the ground.
    JumpStarted,
    /// The creep landed further along the path.
    JumpLanded {
        /// Path distance gained.
        distance: f32,
    },
    /// A digger stopped to burrow.
    DigStarted,
    /// A digger went underground.
    Burrowed,
    /// A digger started climbing out.
    Resurfacing,
    /// A digger is back on the surface and walking.
    Surfaced,
    /// The low-health phase started.
    GhostPhaseStarted,
    /// The low-health phase ended.
    GhostPhaseEnded,
    /// The periodic self-cleanse fired.
    SelfCleanse,
}

/// Immutable representation of a single creep's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct CreepSnapshot {
    /// Identifier of the creep's current life.
    pub id: CreepId,
    /// Catalog key of the creep.
    pub creep_type: &'static str,
    /// Normal creep or boss.
    pub class: CreepClass,
    /// Wave the creep belongs to.
    pub wave: u32,
    /// Lifecycle state of the slot.
    pub lifecycle: Lifecycle,
    /// World position on the path.
    pub position: Vec2,
    /// Path distance travelled.
    pub distance_travelled: f32,
    /// Distance travelled divided by total path length.
    pub progress: f32,
    /// Remaining health.
    pub health: f32,
    /// Maximum health.
    pub max_health: f32,
    /// Flying creeps ignore ground-only towers.
    pub flying: bool,
    /// Element the creep is exclusively vulnerable to.
    pub only_damaged_by: Option<Element>,
    /// Whether towers may select the creep.
    pub targetable: bool,
    /// Whether the creep is slowed.
    pub slowed: bool,
    /// Whether the creep is frozen.
    pub frozen: bool,
    /// Active poison stacks.
    pub poison_stacks: usize,
    /// Active burn stacks.
    pub burn_stacks: usize,
    /// Whether the creep is underground.
    pub burrowed: bool,
    /// Whether the creep is in its ghost phase.
    pub ghost_active: bool,
    /// Whether the creep is airborne mid-jump.
    pub jumping: bool,
    /// Remaining shield charges.
    pub shield_hits: u32,
}

impl CreepSnapshot {
    /// Reports whether the creep is walking the path.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.lifecycle == Lifecycle::Active
    }
}

/// Read-only snapshot describing all live creeps.
#[derive(Clone, Debug, Default)]
pub struct CreepView {
    snapshots: Vec<CreepSnapshot>,
}

impl CreepView {
    /// Creates a new creep view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<CreepSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured creep snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &CreepSnapshot> {
        self.snapshots.iter()
    }

    /// Snapshots of creeps currently walking the path.
    pub fn active(&self) -> impl Iterator<Item = &CreepSnapshot> {
        self.snapshots.iter().filter(|snapshot| snapshot.is_active())
    }

    /// Number of creeps currently walking the path.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    /// Looks up a snapshot by identifier.
    #[must_use]
    pub fn get(&self, id: CreepId) -> Option<&CreepSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<CreepSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Branch of the tower.
    pub branch: TowerBranch,
    /// World position of the tower.
    pub position: Vec2,
    /// Targeting radius in world units.
    pub range: f32,
    /// Active targeting priority.
    pub priority: TargetPriority,
}

/// Read-only snapshot describing all towers.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Target selected for a tower during the current frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TowerTarget {
    /// Tower that will fire.
    pub tower: TowerId,
    /// Creep it selected.
    pub creep: CreepId,
}

/// Cooldown state of a single tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TowerCooldownSnapshot {
    /// Tower the cooldown belongs to.
    pub tower: TowerId,
    /// Branch of the tower.
    pub branch: TowerBranch,
    /// Time until the tower may fire again.
    pub ready_in: Duration,
}

/// Read-only snapshot describing tower cooldowns.
#[derive(Clone, Debug, Default)]
pub struct TowerCooldownView {
    snapshots: Vec<TowerCooldownSnapshot>,
}

impl TowerCooldownView {
    /// Creates a new cooldown view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerCooldownSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.tower);
        Self { snapshots }
    }

    /// Iterator over the cooldowns in tower order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerCooldownSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerCooldownSnapshot> {
        self.snapshots
    }
}

/// Tunables of the authoritative world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of creep slots allocated up front.
    pub creep_pool_capacity: usize,
    /// Milliseconds a killed creep lingers before its slot is reusable.
    pub death_linger_ms: u64,
}

impl SimulationConfig {
    /// Time a killed creep lingers before its slot is reusable.
    #[must_use]
    pub const fn death_linger(&self) -> Duration {
        Duration::from_millis(self.death_linger_ms)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            creep_pool_capacity: 256,
            death_linger_ms: 300,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CreepId, SimulationConfig, TargetPriority, TowerBranch, TowerId};
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn identifiers_round_trip_through_bincode() {
        assert_round_trip(&TowerId::new(42));
        assert_round_trip(&CreepId::new(7));
    }

    #[test]
    fn simulation_config_round_trips_through_bincode() {
        assert_round_trip(&SimulationConfig {
            creep_pool_capacity: 12,
            death_linger_ms: 50,
        });
    }

    #[test]
    fn ground_only_branches_are_cannon_and_poison() {
        let ground_only: Vec<_> = [
            TowerBranch::Archer,
            TowerBranch::Cannon,
            TowerBranch::Ice,
            TowerBranch::Poison,
            TowerBranch::Fire,
            TowerBranch::Arcane,
        ]
        .into_iter()
        .filter(|branch| branch.is_ground_only())
        .collect();
        assert_eq!(ground_only, vec![TowerBranch::Cannon, TowerBranch::Poison]);
    }

    #[test]
    fn only_arcane_strikes_are_magic() {
        assert!(TowerBranch::Arcane.strike().magic);
        assert!(!TowerBranch::Cannon.strike().magic);
        assert_eq!(TowerBranch::Fire.strike().branch, TowerBranch::Fire);
    }

    #[test]
    fn default_priority_is_furthest_along_path() {
        assert_eq!(TargetPriority::default(), TargetPriority::FurthestAlongPath);
    }
}
