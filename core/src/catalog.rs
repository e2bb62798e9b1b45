//! Static creep definitions keyed by the type names used in the wave table.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Element;

/// Key of the definition used when a wave references an unknown creep type.
pub const DEFAULT_CREEP_TYPE: &str = "normal";

/// Health multiplier added per wave beyond the first.
const HEALTH_GROWTH_PER_WAVE: f32 = 0.15;
/// Armor added per wave beyond the first.
const ARMOR_GROWTH_PER_WAVE: f32 = 0.5;
/// Waves required before the gold reward grows by one.
const WAVES_PER_GOLD_STEP: u32 = 5;

/// Classification used by orchestration layers to treat bosses specially.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CreepClass {
    /// Ordinary wave fodder.
    Normal,
    /// Boss creep that reports first-hit and pain-threshold events.
    Boss,
}

/// Damage-absorbing shield that blocks a fixed number of hits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShieldSpec {
    /// Number of hits the shield absorbs before breaking.
    pub hits: u32,
}

impl ShieldSpec {
    /// Shield carried by every shielded creep in the catalog.
    pub const STANDARD: Self = Self { hits: 5 };
}

/// Timing of the periodic leap forward along the path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JumpSpec {
    /// Time spent walking between jumps.
    pub cooldown: Duration,
    /// Telegraph window shown before leaving the ground.
    pub warning: Duration,
    /// Time spent airborne before landing.
    pub airtime: Duration,
    /// Path distance gained by a single jump.
    pub distance: f32,
}

impl JumpSpec {
    /// Jump profile carried by jumping creeps in the catalog.
    pub const STANDARD: Self = Self {
        cooldown: Duration::from_millis(4_000),
        warning: Duration::from_millis(600),
        airtime: Duration::from_millis(400),
        distance: 80.0,
    };
}

/// Durations of the four burrowing phases.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DigSpec {
    /// Time spent walking on the surface.
    pub walk: Duration,
    /// Time spent stopping before going under.
    pub stop: Duration,
    /// Time spent burrowed and immune.
    pub burrow: Duration,
    /// Time spent climbing back to the surface.
    pub resurface: Duration,
}

impl DigSpec {
    /// Burrow cycle carried by digging creeps in the catalog.
    pub const STANDARD: Self = Self {
        walk: Duration::from_millis(3_000),
        stop: Duration::from_millis(500),
        burrow: Duration::from_millis(2_000),
        resurface: Duration::from_millis(500),
    };
}

/// One-shot phasing triggered once health drops low enough.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GhostSpec {
    /// Health fraction at or below which the phase starts.
    pub health_threshold: f32,
    /// How long the creep stays phased out.
    pub duration: Duration,
}

impl GhostSpec {
    /// Ghost phase carried by phasing creeps in the catalog.
    pub const STANDARD: Self = Self {
        health_threshold: 0.25,
        duration: Duration::from_millis(3_000),
    };
}

/// Periodic self-cleanse of all status effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispelSpec {
    /// Time between cleanse attempts.
    pub interval: Duration,
    /// Immunity window opened by a cleanse.
    pub immunity: Duration,
}

impl DispelSpec {
    /// Cleanse cadence carried by dispelling creeps in the catalog.
    pub const STANDARD: Self = Self {
        interval: Duration::from_millis(5_000),
        immunity: Duration::from_millis(1_500),
    };
}

/// Creeps released when the carrier dies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OffspringSpec {
    /// Catalog key of the spawned creeps.
    pub creep_type: &'static str,
    /// Number of creeps released.
    pub count: u32,
}

/// Optional abilities carried by a creep definition.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Capabilities {
    /// Hit-absorbing shield.
    pub shield: Option<ShieldSpec>,
    /// Periodic jump.
    pub jump: Option<JumpSpec>,
    /// Burrow cycle.
    pub dig: Option<DigSpec>,
    /// Low-health phasing.
    pub ghost: Option<GhostSpec>,
    /// Periodic self-cleanse.
    pub dispel: Option<DispelSpec>,
}

impl Capabilities {
    /// Definition without any ability.
    pub const NONE: Self = Self {
        shield: None,
        jump: None,
        dig: None,
        ghost: None,
        dispel: None,
    };
}

/// Base statistics and abilities of a creep type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CreepDefinition {
    /// Catalog key referenced by the wave table.
    pub key: &'static str,
    /// Health at wave one.
    pub health: f32,
    /// Path units travelled per second.
    pub speed: f32,
    /// Armor at wave one.
    pub armor: f32,
    /// Gold paid on death at wave one.
    pub gold_reward: u32,
    /// Normal creep or boss.
    pub class: CreepClass,
    /// Flying creeps ignore ground-only towers.
    pub flying: bool,
    /// Restricts damage and targeting to a single tower element.
    pub only_damaged_by: Option<Element>,
    /// Creeps released on death.
    pub spawn_on_death: Option<OffspringSpec>,
    /// Optional abilities.
    pub capabilities: Capabilities,
}

/// Statistics of a creep after wave scaling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CreepStats {
    /// Starting and maximum health.
    pub max_health: f32,
    /// Path units travelled per second.
    pub speed: f32,
    /// Armor before reductions.
    pub armor: f32,
    /// Gold paid on death.
    pub gold_reward: u32,
}

impl CreepDefinition {
    /// Reports whether the definition describes a boss.
    #[must_use]
    pub const fn is_boss(&self) -> bool {
        matches!(self.class, CreepClass::Boss)
    }

    /// Scales the base statistics for the provided wave number.
    ///
    /// Wave zero is treated as wave one.
    #[must_use]
    pub fn scaled_for_wave(&self, wave: u32) -> CreepStats {
        let waves_beyond_first = wave.max(1) - 1;
        let growth = waves_beyond_first as f32;
        CreepStats {
            max_health: self.health * (1.0 + HEALTH_GROWTH_PER_WAVE * growth),
            speed: self.speed,
            armor: self.armor + ARMOR_GROWTH_PER_WAVE * growth,
            gold_reward: self.gold_reward + waves_beyond_first / WAVES_PER_GOLD_STEP,
        }
    }
}

macro_rules! creep {
    ($key:literal, $health:literal, $speed:literal, $armor:literal, $gold:literal) => {
        creep!($key, $health, $speed, $armor, $gold, {})
    };
    (
        $key:literal,
        $health:literal,
        $speed:literal,
        $armor:literal,
        $gold:literal,
        { $($field:ident: $value:expr),* $(,)? }
    ) => {
        CreepDefinition {
            key: $key,
            health: $health,
            speed: $speed,
            armor: $armor,
            gold_reward: $gold,
            $($field: $value,)*
            ..BASE
        }
    };
}

const BASE: CreepDefinition = CreepDefinition {
    key: DEFAULT_CREEP_TYPE,
    health: 60.0,
    speed: 60.0,
    armor: 0.0,
    gold_reward: 5,
    class: CreepClass::Normal,
    flying: false,
    only_damaged_by: None,
    spawn_on_death: None,
    capabilities: Capabilities::NONE,
};

static CATALOG: [CreepDefinition; 18] = [
    creep!("normal", 60.0, 60.0, 0.0, 5),
    creep!("fast", 40.0, 110.0, 0.0, 5),
    creep!("tank", 220.0, 40.0, 20.0, 12),
    creep!("swarm", 25.0, 80.0, 0.0, 2),
    creep!("flying", 50.0, 75.0, 0.0, 6, { flying: true }),
    creep!("shielded", 90.0, 55.0, 5.0, 8, {
        capabilities: Capabilities { shield: Some(ShieldSpec::STANDARD), ..Capabilities::NONE },
    }),
    creep!("jumper", 80.0, 60.0, 5.0, 9, {
        capabilities: Capabilities { jump: Some(JumpSpec::STANDARD), ..Capabilities::NONE },
    }),
    creep!("digger", 110.0, 50.0, 10.0, 10, {
        capabilities: Capabilities { dig: Some(DigSpec::STANDARD), ..Capabilities::NONE },
    }),
    creep!("ghost", 100.0, 65.0, 0.0, 10, {
        capabilities: Capabilities { ghost: Some(GhostSpec::STANDARD), ..Capabilities::NONE },
    }),
    creep!("breeder", 120.0, 45.0, 5.0, 10, {
        spawn_on_death: Some(OffspringSpec { creep_type: "baby", count: 2 }),
    }),
    creep!("baby", 20.0, 90.0, 0.0, 1),
    creep!("cleanser", 100.0, 55.0, 5.0, 10, {
        capabilities: Capabilities { dispel: Some(DispelSpec::STANDARD), ..Capabilities::NONE },
    }),
    creep!("frost_wraith", 90.0, 65.0, 0.0, 12, { only_damaged_by: Some(Element::Ice) }),
    creep!("toxic_slime", 120.0, 50.0, 0.0, 12, { only_damaged_by: Some(Element::Poison) }),
    creep!("boss_golem", 2_500.0, 30.0, 40.0, 150, {
        class: CreepClass::Boss,
        capabilities: Capabilities { shield: Some(ShieldSpec::STANDARD), ..Capabilities::NONE },
    }),
    creep!("boss_wyrm", 1_800.0, 45.0, 15.0, 150, {
        class: CreepClass::Boss,
        flying: true,
    }),
    creep!("boss_lich", 2_200.0, 40.0, 10.0, 200, {
        class: CreepClass::Boss,
        capabilities: Capabilities {
            ghost: Some(GhostSpec::STANDARD),
            dispel: Some(DispelSpec::STANDARD),
            ..Capabilities::NONE
        },
    }),
    creep!("boss_broodmother", 3_000.0, 35.0, 25.0, 250, {
        class: CreepClass::Boss,
        spawn_on_death: Some(OffspringSpec { creep_type: "breeder", count: 4 }),
    }),
];

/// Every creep definition known to the simulation.
#[must_use]
pub fn creep_catalog() -> &'static [CreepDefinition] {
    &CATALOG
}

/// Looks up a creep definition by its catalog key.
#[must_use]
pub fn creep_definition(key: &str) -> Option<&'static CreepDefinition> {
    CATALOG.iter().find(|definition| definition.key == key)
}

/// Definition used when a requested key is unknown.
#[must_use]
pub fn default_creep_definition() -> &'static CreepDefinition {
    &CATALOG[0]
}
