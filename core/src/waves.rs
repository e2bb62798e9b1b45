//! Level design: the ordered table of waves the sequencer plays through.

/// Number of waves in a full match.
pub const WAVE_COUNT: usize = 35;

/// Flavour of a wave surfaced to announcement layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WaveType {
    /// Mixed ground creeps.
    Standard,
    /// Large numbers of weak creeps.
    Swarm,
    /// Flying creeps dominate.
    Air,
    /// Heavily armored creeps.
    Armored,
    /// Creeps only certain elements can harm.
    Elemental,
    /// Wave featuring a boss.
    Boss,
    /// Closing wave.
    Finale,
}

/// Homogeneous batch of creeps spawned at a fixed interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveCreepGroup {
    /// Catalog key of the spawned creeps.
    pub creep_type: &'static str,
    /// Number of creeps in the group; always positive.
    pub count: u32,
    /// Milliseconds between consecutive spawns.
    pub interval_ms: u32,
}

/// Single entry of the wave table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveDef {
    /// One-based wave number.
    pub wave_number: u32,
    /// Groups in spawn order.
    pub creeps: &'static [WaveCreepGroup],
    /// Optional flavour for announcement layers.
    pub wave_type: Option<WaveType>,
    /// Optional banner text shown when the wave starts.
    pub announcement: Option<&'static str>,
    /// Spawns every group concurrently instead of one after another.
    pub parallel_spawn: bool,
}

impl WaveDef {
    /// Total number of creeps listed by the wave's groups.
    #[must_use]
    pub fn creep_total(&self) -> u32 {
        self.creeps.iter().map(|group| group.count).sum()
    }
}

macro_rules! group {
    ($creep_type:literal, $count:literal, $interval_ms:literal) => {
        WaveCreepGroup {
            creep_type: $creep_type,
            count: $count,
            interval_ms: $interval_ms,
        }
    };
}

macro_rules! wave {
    ($number:literal, [$($group:expr),+ $(,)?]) => {
        wave!($number, None, None, false, [$($group),+])
    };
    ($number:literal, $wave_type:expr, $announcement:expr, [$($group:expr),+ $(,)?]) => {
        wave!($number, $wave_type, $announcement, false, [$($group),+])
    };
    (
        $number:literal,
        $wave_type:expr,
        $announcement:expr,
        $parallel:literal,
        [$($group:expr),+ $(,)?]
    ) => {
        WaveDef {
            wave_number: $number,
            creeps: &[$($group),+],
            wave_type: $wave_type,
            announcement: $announcement,
            parallel_spawn: $parallel,
        }
    };
}

static WAVES: [WaveDef; WAVE_COUNT] = [
    wave!(1, [group!("normal", 10, 1000)]),
    wave!(2, [group!("normal", 12, 900), group!("fast", 4, 700)]),
    wave!(3, [group!("fast", 12, 600)]),
    wave!(4, [group!("normal", 10, 800), group!("shielded", 4, 1200)]),
    wave!(
        5,
        Some(WaveType::Air),
        Some("Flyers incoming!"),
        [group!("flying", 8, 900)]
    ),
    wave!(6, [group!("normal", 15, 700), group!("jumper", 5, 1000)]),
    wave!(
        7,
        Some(WaveType::Armored),
        None,
        [group!("tank", 5, 1500), group!("normal", 10, 700)]
    ),
    wave!(
        8,
        Some(WaveType::Swarm),
        Some("A swarm approaches"),
        [group!("swarm", 30, 250)]
    ),
    wave!(9, [group!("digger", 6, 1200), group!("fast", 10, 500)]),
    wave!(
        10,
        Some(WaveType::Boss),
        Some("The Golem awakens"),
        [group!("normal", 10, 800), group!("boss_golem", 1, 0)]
    ),
    wave!(11, [group!("breeder", 6, 1400), group!("normal", 12, 600)]),
    wave!(12, [group!("ghost", 8, 1000), group!("shielded", 6, 900)]),
    wave!(
        13,
        Some(WaveType::Elemental),
        Some("Only frost can touch the wraiths"),
        [group!("frost_wraith", 8, 1000)]
    ),
    wave!(14, [group!("cleanser", 6, 1200), group!("tank", 6, 1300)]),
    wave!(
        15,
        Some(WaveType::Air),
        None,
        [group!("flying", 14, 600), group!("jumper", 8, 800)]
    ),
    wave!(
        16,
        Some(WaveType::Elemental),
        Some("Toxic slimes thrive on poison alone"),
        [group!("toxic_slime", 8, 1000), group!("swarm", 20, 250)]
    ),
    wave!(17, [group!("digger", 10, 900), group!("ghost", 8, 1000)]),
    wave!(
        18,
        Some(WaveType::Armored),
        None,
        [group!("tank", 10, 1000), group!("cleanser", 8, 1000)]
    ),
    wave!(
        19,
        Some(WaveType::Swarm),
        None,
        [group!("swarm", 40, 200), group!("breeder", 8, 1000)]
    ),
    wave!(
        20,
        Some(WaveType::Boss),
        Some("The Wyrm takes flight"),
        [group!("shielded", 10, 700), group!("boss_wyrm", 1, 0)]
    ),
    wave!(21, [group!("fast", 25, 350), group!("jumper", 12, 700)]),
    wave!(
        22,
        Some(WaveType::Elemental),
        None,
        [group!("frost_wraith", 10, 800), group!("toxic_slime", 10, 800)]
    ),
    wave!(23, [group!("ghost", 14, 800), group!("digger", 12, 800)]),
    wave!(
        24,
        Some(WaveType::Armored),
        None,
        [group!("tank", 14, 900), group!("shielded", 14, 700)]
    ),
    wave!(
        25,
        Some(WaveType::Boss),
        Some("Twin Golems"),
        [group!("flying", 24, 450), group!("boss_golem", 2, 4000)]
    ),
    wave!(26, [group!("breeder", 14, 800), group!("cleanser", 12, 800)]),
    wave!(
        27,
        Some(WaveType::Swarm),
        Some("The horde"),
        [group!("swarm", 60, 150)]
    ),
    wave!(
        28,
        [
            group!("jumper", 18, 600),
            group!("ghost", 16, 700),
            group!("digger", 14, 700)
        ]
    ),
    wave!(
        29,
        Some(WaveType::Elemental),
        None,
        [
            group!("tank", 18, 800),
            group!("frost_wraith", 12, 700),
            group!("toxic_slime", 12, 700)
        ]
    ),
    wave!(
        30,
        Some(WaveType::Boss),
        Some("The Lich rises"),
        [group!("cleanser", 10, 900), group!("boss_lich", 1, 0)]
    ),
    wave!(
        31,
        Some(WaveType::Air),
        None,
        [group!("fast", 40, 250), group!("flying", 30, 350)]
    ),
    wave!(32, [group!("shielded", 20, 600), group!("breeder", 18, 700)]),
    wave!(
        33,
        [
            group!("ghost", 20, 600),
            group!("digger", 20, 600),
            group!("jumper", 20, 600)
        ]
    ),
    wave!(
        34,
        Some(WaveType::Boss),
        None,
        [
            group!("tank", 24, 700),
            group!("boss_wyrm", 2, 3000),
            group!("boss_golem", 2, 3000)
        ]
    ),
    wave!(
        35,
        Some(WaveType::Finale),
        Some("Everything at once"),
        true,
        [
            group!("boss_broodmother", 1, 0),
            group!("boss_lich", 1, 0),
            group!("swarm", 50, 200),
            group!("flying", 30, 400)
        ]
    ),
];

/// The full wave table in play order.
#[must_use]
pub fn wave_table() -> &'static [WaveDef] {
    &WAVES
}

/// Looks up a wave by its one-based number.
#[must_use]
pub fn wave(number: u32) -> Option<&'static WaveDef> {
    let index = usize::try_from(number.checked_sub(1)?).ok()?;
    WAVES.get(index)
}
