//! Headless host loop that plays the wave table against a fixed tower layout.

use std::{mem, time::Duration};

use anyhow::{Context, Result};
use creep_defence_core::{wave_table, Command, Event, TowerTarget, WaveDef};
use creep_defence_system_tower_combat::TowerCombat;
use creep_defence_system_tower_targeting::TowerTargeting;
use creep_defence_system_wave_sequencer::WaveSequencer;
use creep_defence_world::{self as world, query, World};
use serde::Serialize;

use crate::config::{RunConfig, SessionSettings};

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Outcome {
    /// Every wave completed with lives to spare.
    Victory,
    /// Leaks exhausted the lives.
    Defeat,
    /// The frame limit was reached first.
    TimedOut,
}

/// Result of a single completed wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub(crate) struct WaveReport {
    pub(crate) wave: u32,
    pub(crate) killed: u32,
    pub(crate) leaked: u32,
}

/// Aggregate statistics of a run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct RunSummary {
    pub(crate) outcome: Outcome,
    pub(crate) frames: u64,
    pub(crate) elapsed_ms: u64,
    pub(crate) gold: u64,
    pub(crate) lives: u32,
    pub(crate) kills: u32,
    pub(crate) leaks: u32,
    pub(crate) boss_hits: u32,
    pub(crate) waves: Vec<WaveReport>,
}

/// Owns the world and every system for one run.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    targeting: TowerTargeting,
    combat: TowerCombat,
    sequencer: WaveSequencer,
    settings: SessionSettings,
    inbox: Vec<Event>,
    targets: Vec<TowerTarget>,
    commands: Vec<Command>,
    countdown: Option<Duration>,
    outcome: Option<Outcome>,
    frames: u64,
    gold: u64,
    lives: u32,
    kills: u32,
    leaks: u32,
    boss_hits: u32,
    waves: Vec<WaveReport>,
}

impl Session {
    /// Builds the world, places the configured towers and starts the first wave.
    pub(crate) fn new(config: &RunConfig, waves: &'static [WaveDef]) -> Result<Self> {
        let settings = config.simulation;
        let mut sequencer = WaveSequencer::with_waves(waves);
        sequencer
            .set_game_speed(settings.game_speed)
            .context("failed to configure wave pacing")?;

        let mut session = Self {
            world: World::new(config.lane()?, settings.world),
            targeting: TowerTargeting::new(),
            combat: TowerCombat::new(),
            sequencer,
            settings,
            inbox: Vec::new(),
            targets: Vec::new(),
            commands: Vec::new(),
            countdown: None,
            outcome: None,
            frames: 0,
            gold: 0,
            lives: settings.starting_lives,
            kills: 0,
            leaks: 0,
            boss_hits: 0,
            waves: Vec::new(),
        };

        for placement in &config.towers {
            world::apply(
                &mut session.world,
                Command::PlaceTower {
                    branch: placement.branch,
                    position: placement.position(),
                    priority: placement.priority,
                },
                &mut session.inbox,
            );
        }
        tracing::info!(
            towers = config.towers.len(),
            waves = waves.len(),
            "session ready"
        );

        session.start_wave()?;
        Ok(session)
    }

    /// Runs frames until the match is decided or the frame limit is hit.
    pub(crate) fn run(mut self) -> Result<RunSummary> {
        while self.outcome.is_none() {
            if self.frames >= self.settings.max_frames {
                tracing::warn!(frames = self.frames, "frame limit reached");
                self.outcome = Some(Outcome::TimedOut);
                break;
            }
            self.step()?;
        }
        Ok(self.summary())
    }

    fn step(&mut self) -> Result<()> {
        let dt = self.settings.tick();
        self.frames += 1;
        world::apply(&mut self.world, Command::Tick { dt }, &mut self.inbox);

        let events = mem::take(&mut self.inbox);
        self.settle(&events);

        let mut wave_events = Vec::new();
        self.sequencer.handle(
            &events,
            &query::creep_view(&self.world),
            &mut self.commands,
            &mut wave_events,
        );
        self.execute();

        let creeps = query::creep_view(&self.world);
        self.targeting
            .handle(&query::tower_view(&self.world), &creeps, &mut self.targets);
        self.combat.handle(
            &query::tower_cooldowns(&self.world),
            &self.targets,
            &creeps,
            &mut self.commands,
        );
        self.execute();

        if self.lives == 0 {
            self.outcome = Some(Outcome::Defeat);
            return Ok(());
        }
        self.on_wave_events(&wave_events);
        self.count_down(dt)
    }

    fn execute(&mut self) {
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.inbox);
        }
    }

    /// Pays out kills and charges leaks.
    fn settle(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::CreepDied { gold_reward, .. } => {
                    self.kills += 1;
                    self.gold += u64::from(*gold_reward);
                }
                Event::CreepReachedEnd { creep } => {
                    self.leaks += 1;
                    self.lives = self.lives.saturating_sub(1);
                    tracing::debug!(creep = creep.get(), lives = self.lives, "creep leaked");
                }
                Event::BossFirstHit { creep } => {
                    self.boss_hits += 1;
                    tracing::info!(creep = creep.get(), "boss engaged");
                }
                Event::BossPainThreshold { creep } => {
                    tracing::info!(creep = creep.get(), "boss below half health");
                }
                _ => {}
            }
        }
    }

    fn on_wave_events(&mut self, wave_events: &[Event]) {
        for event in wave_events {
            match event {
                Event::WaveCompleted {
                    wave,
                    killed,
                    leaked,
                } => {
                    self.waves.push(WaveReport {
                        wave: *wave,
                        killed: *killed,
                        leaked: *leaked,
                    });
                    self.countdown = Some(self.settings.wave_countdown());
                }
                Event::AllWavesCompleted => {
                    self.countdown = None;
                    self.outcome = Some(Outcome::Victory);
                }
                _ => {}
            }
        }
    }

    fn count_down(&mut self, dt: Duration) -> Result<()> {
        let Some(remaining) = self.countdown else {
            return Ok(());
        };
        let remaining = remaining.saturating_sub(dt);
        if remaining.is_zero() {
            self.countdown = None;
            self.start_wave()
        } else {
            self.countdown = Some(remaining);
            Ok(())
        }
    }

    fn start_wave(&mut self) -> Result<()> {
        let mut wave_events = Vec::new();
        let wave = self
            .sequencer
            .start_next_wave(&mut self.commands, &mut wave_events)
            .context("failed to start the next wave")?;
        for event in &wave_events {
            if let Event::WaveStarted {
                announcement: Some(text),
                ..
            } = event
            {
                tracing::info!(wave, "{text}");
            }
        }
        self.execute();
        Ok(())
    }

    fn summary(&self) -> RunSummary {
        RunSummary {
            outcome: self.outcome.unwrap_or(Outcome::TimedOut),
            frames: self.frames,
            elapsed_ms: u64::try_from(query::elapsed(&self.world).as_millis())
                .unwrap_or(u64::MAX),
            gold: self.gold,
            lives: self.lives,
            kills: self.kills,
            leaks: self.leaks,
            boss_hits: self.boss_hits,
            waves: self.waves.clone(),
        }
    }
}

/// Selects the first `count` waves of the table, or all of them.
pub(crate) fn waves(count: Option<usize>) -> &'static [WaveDef] {
    let table = wave_table();
    match count {
        Some(count) => &table[..count.min(table.len())],
        None => table,
    }
}
