//! TOML configuration of a headless run.

use std::{fs, path::Path as FilePath, time::Duration};

use anyhow::{ensure, Context, Result};
use creep_defence_core::{Path, SimulationConfig, TargetPriority, TowerBranch};
use creep_defence_system_wave_sequencer::MAX_GAME_SPEED;
use glam::Vec2;
use serde::Deserialize;

/// Lane used when the configuration does not provide waypoints.
const DEFAULT_LANE: [[f32; 2]; 6] = [
    [0.0, 300.0],
    [400.0, 300.0],
    [400.0, 100.0],
    [800.0, 100.0],
    [800.0, 500.0],
    [1_200.0, 500.0],
];

/// Complete configuration of a run.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct RunConfig {
    /// Host loop and world tunables.
    pub(crate) simulation: SessionSettings,
    /// Waypoints creeps follow, in travel order.
    pub(crate) path: Vec<[f32; 2]>,
    /// Towers placed before the first wave.
    pub(crate) towers: Vec<TowerPlacement>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            simulation: SessionSettings::default(),
            path: DEFAULT_LANE.to_vec(),
            towers: default_towers(),
        }
    }
}

impl RunConfig {
    /// Reads and validates a configuration file.
    pub(crate) fn load(path: &FilePath) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid config file at {}", path.display()))
    }

    /// Parses and validates configuration text.
    pub(crate) fn parse(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).context("failed to parse config toml")?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the host loop cannot run with.
    pub(crate) fn validate(&self) -> Result<()> {
        let simulation = &self.simulation;
        ensure!(simulation.tick_ms > 0, "tick_ms must be positive");
        ensure!(
            simulation.game_speed > 0.0 && simulation.game_speed <= MAX_GAME_SPEED,
            "game_speed must be in (0, {MAX_GAME_SPEED}], got {}",
            simulation.game_speed
        );
        ensure!(simulation.starting_lives > 0, "starting_lives must be positive");
        ensure!(
            simulation.world.creep_pool_capacity > 0,
            "creep_pool_capacity must be positive"
        );
        let _ = self.lane()?;
        Ok(())
    }

    /// Builds the lane creeps walk.
    pub(crate) fn lane(&self) -> Result<Path> {
        let points: Vec<Vec2> = self.path.iter().copied().map(Vec2::from).collect();
        Path::from_points(&points).context("invalid path waypoints")
    }
}

/// Host loop tunables.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct SessionSettings {
    /// Simulated milliseconds per frame.
    pub(crate) tick_ms: u64,
    /// Multiplier applied to spawn pacing.
    pub(crate) game_speed: f32,
    /// Leaks tolerated before the run is lost.
    pub(crate) starting_lives: u32,
    /// Pause between waves in milliseconds.
    pub(crate) wave_countdown_ms: u64,
    /// Hard stop for runaway runs.
    pub(crate) max_frames: u64,
    /// World tunables.
    #[serde(flatten)]
    pub(crate) world: SimulationConfig,
}

impl SessionSettings {
    pub(crate) const fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub(crate) const fn wave_countdown(&self) -> Duration {
        Duration::from_millis(self.wave_countdown_ms)
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            tick_ms: 50,
            game_speed: 1.0,
            starting_lives: 20,
            wave_countdown_ms: 5_000,
            max_frames: 500_000,
            world: SimulationConfig::default(),
        }
    }
}

/// Tower placed before the first wave.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub(crate) struct TowerPlacement {
    pub(crate) branch: TowerBranch,
    pub(crate) x: f32,
    pub(crate) y: f32,
    #[serde(default)]
    pub(crate) priority: TargetPriority,
}

impl TowerPlacement {
    pub(crate) fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

fn default_towers() -> Vec<TowerPlacement> {
    [
        (TowerBranch::Ice, 340.0, 220.0, TargetPriority::FurthestAlongPath),
        (TowerBranch::Archer, 460.0, 200.0, TargetPriority::FurthestAlongPath),
        (TowerBranch::Cannon, 600.0, 160.0, TargetPriority::HighestHealth),
        (TowerBranch::Fire, 720.0, 200.0, TargetPriority::FurthestAlongPath),
        (TowerBranch::Poison, 880.0, 300.0, TargetPriority::FurthestAlongPath),
        (TowerBranch::Arcane, 740.0, 420.0, TargetPriority::HighestHealth),
        (TowerBranch::Archer, 960.0, 440.0, TargetPriority::Closest),
    ]
    .into_iter()
    .map(|(branch, x, y, priority)| TowerPlacement {
        branch,
        x,
        y,
        priority,
    })
    .collect()
}
