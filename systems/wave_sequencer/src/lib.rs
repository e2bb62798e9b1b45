#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave sequencing system that paces group spawns from battlefield conditions.
//!
//! A wave's groups spawn one after another. Once a group has spawned its last
//! creep, the next group only starts when none of the group's creeps remain
//! active, or when the group's most recently spawned creep has covered half of
//! the path. Waves flagged for parallel spawning start every group at once.
//!
//! The sequencer follows the usual system contract: it consumes the events the
//! world produced since the previous call, reads a [`CreepView`], and emits
//! [`Command`] values. Spawn confirmations therefore arrive one call after the
//! corresponding command was emitted.

use std::{
    collections::{BTreeSet, VecDeque},
    time::Duration,
};

use creep_defence_core::{
    wave_table, Command, CreepId, CreepView, Event, SpawnOrigin, WaveCreepGroup, WaveDef,
};
use thiserror::Error;

/// Path progress the last spawned creep of a group must reach to release the next group.
pub const GROUP_GATE_PROGRESS: f32 = 0.5;

/// Largest accepted game speed multiplier.
pub const MAX_GAME_SPEED: f32 = 100.0;

/// Errors reported by host-facing sequencer operations.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum SequencerError {
    /// A wave is still running.
    #[error("wave {wave} is still in progress")]
    WaveInProgress {
        /// Wave currently running.
        wave: u32,
    },
    /// Every configured wave has already been started.
    #[error("no waves remain")]
    NoWavesRemaining,
    /// Game speed must be positive and at most [`MAX_GAME_SPEED`].
    #[error("invalid game speed {speed}")]
    InvalidGameSpeed {
        /// Rejected multiplier.
        speed: f32,
    },
}

/// Bookkeeping of the running wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveSummary {
    /// One-based wave number.
    pub wave: u32,
    /// Creeps the wave must resolve, including offspring.
    pub to_spawn: u32,
    /// Spawns confirmed by the world.
    pub spawned: u32,
    /// Creeps killed.
    pub killed: u32,
    /// Creeps that reached the exit.
    pub leaked: u32,
}

/// Drives the wave table, emitting spawn commands and wave lifecycle events.
#[derive(Debug)]
pub struct WaveSequencer {
    waves: &'static [WaveDef],
    next_wave: usize,
    game_speed: f32,
    active: Option<ActiveWave>,
}

impl Default for WaveSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl WaveSequencer {
    /// Creates a sequencer over the full wave table.
    #[must_use]
    pub fn new() -> Self {
        Self::with_waves(wave_table())
    }

    /// Creates a sequencer over a custom wave table.
    #[must_use]
    pub fn with_waves(waves: &'static [WaveDef]) -> Self {
        Self {
            waves,
            next_wave: 0,
            game_speed: 1.0,
            active: None,
        }
    }

    /// Sets the multiplier applied to spawn intervals' elapsed time.
    ///
    /// Accepts values in `(0, MAX_GAME_SPEED]`.
    pub fn set_game_speed(&mut self, speed: f32) -> Result<(), SequencerError> {
        if !(speed > 0.0 && speed <= MAX_GAME_SPEED) {
            return Err(SequencerError::InvalidGameSpeed { speed });
        }
        self.game_speed = speed;
        Ok(())
    }

    /// Current game speed multiplier.
    #[must_use]
    pub const fn game_speed(&self) -> f32 {
        self.game_speed
    }

    /// Number of the running wave, if any.
    #[must_use]
    pub fn current_wave(&self) -> Option<u32> {
        self.active.as_ref().map(|active| active.def.wave_number)
    }

    /// Reports whether another wave can be started.
    #[must_use]
    pub fn has_remaining_waves(&self) -> bool {
        self.next_wave < self.waves.len()
    }

    /// Bookkeeping of the running wave, if any.
    #[must_use]
    pub fn summary(&self) -> Option<WaveSummary> {
        self.active.as_ref().map(ActiveWave::summary)
    }

    /// Starts the next wave and emits its first spawns.
    ///
    /// Returns the number of the started wave.
    pub fn start_next_wave(
        &mut self,
        out: &mut Vec<Command>,
        out_events: &mut Vec<Event>,
    ) -> Result<u32, SequencerError> {
        if let Some(active) = &self.active {
            return Err(SequencerError::WaveInProgress {
                wave: active.def.wave_number,
            });
        }
        let def = self
            .waves
            .get(self.next_wave)
            .ok_or(SequencerError::NoWavesRemaining)?;
        self.next_wave += 1;

        tracing::debug!(
            wave = def.wave_number,
            groups = def.creeps.len(),
            parallel = def.parallel_spawn,
            "wave started"
        );
        out_events.push(Event::WaveStarted {
            wave: def.wave_number,
            announcement: def.announcement,
        });
        self.active = Some(ActiveWave::start(def, out));
        Ok(def.wave_number)
    }

    /// Consumes world events and the creep view, emitting spawn commands.
    ///
    /// Wave completion is reported through `out_events`.
    pub fn handle(
        &mut self,
        events: &[Event],
        creeps: &CreepView,
        out: &mut Vec<Command>,
        out_events: &mut Vec<Event>,
    ) {
        let Some(active) = self.active.as_mut() else {
            return;
        };

        let mut elapsed = Duration::ZERO;
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => elapsed = elapsed.saturating_add(*dt),
                Event::CreepSpawned { creep, origin, .. } => active.confirm_spawn(*creep, *origin),
                Event::CreepDied { creep, .. } => {
                    if active.resolve(*creep) {
                        active.killed += 1;
                    }
                }
                Event::CreepReachedEnd { creep } => {
                    if active.resolve(*creep) {
                        active.leaked += 1;
                    }
                }
                Event::CreepSpawnedOnDeath {
                    parent,
                    creep_type,
                    count,
                    distance,
                    ..
                } => active.release_offspring(*parent, *creep_type, *count, *distance, out),
                _ => {}
            }
        }

        let gate_armed = active.current_group_finished();
        active.spawn_due(scaled(elapsed, self.game_speed), out);
        if gate_armed {
            active.try_advance_group(creeps, out);
        }

        if active.is_complete(creeps) {
            let summary = active.summary();
            self.active = None;
            tracing::info!(
                wave = summary.wave,
                killed = summary.killed,
                leaked = summary.leaked,
                "wave completed"
            );
            out_events.push(Event::WaveCompleted {
                wave: summary.wave,
                killed: summary.killed,
                leaked: summary.leaked,
            });
            if !self.has_remaining_waves() {
                out_events.push(Event::AllWavesCompleted);
            }
        }
    }
}

#[derive(Debug)]
struct GroupSpawnState {
    index: usize,
    group: &'static WaveCreepGroup,
    spawned: u32,
    since_last: Duration,
    finished: bool,
    last_spawned: Option<CreepId>,
    members: BTreeSet<CreepId>,
}

impl GroupSpawnState {
    fn new(index: usize, group: &'static WaveCreepGroup) -> Self {
        Self {
            index,
            group,
            spawned: 0,
            since_last: Duration::ZERO,
            finished: false,
            last_spawned: None,
            members: BTreeSet::new(),
        }
    }

    fn interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.group.interval_ms))
    }

    fn emit(&mut self, wave: u32, count: u32, out: &mut Vec<Command>) {
        for _ in 0..count {
            out.push(Command::SpawnCreep {
                creep_type: self.group.creep_type,
                wave,
                origin: SpawnOrigin::Group {
                    wave,
                    group: self.index,
                },
            });
            self.spawned += 1;
        }
        if self.spawned >= self.group.count {
            self.finished = true;
        }
    }

    fn due(&mut self, dt: Duration) -> u32 {
        if self.finished {
            return 0;
        }
        self.since_last = self.since_last.saturating_add(dt);
        let interval = self.interval();
        let mut due = 0;
        while self.spawned + due < self.group.count && self.since_last >= interval {
            self.since_last -= interval;
            due += 1;
        }
        due
    }

    /// Only the most recently spawned member is checked, so an earlier member
    /// that is already past the gate does not release the next group.
    fn gate_open(&self, creeps: &CreepView) -> bool {
        if self.members.is_empty() {
            return true;
        }
        self.last_spawned
            .filter(|id| self.members.contains(id))
            .and_then(|id| creeps.get(id))
            .is_some_and(|snapshot| {
                snapshot.is_active() && snapshot.progress >= GROUP_GATE_PROGRESS
            })
    }
}

/// Scales elapsed time by the game speed, saturating on overflow.
fn scaled(elapsed: Duration, speed: f32) -> Duration {
    Duration::try_from_secs_f64(elapsed.as_secs_f64() * f64::from(speed)).unwrap_or(Duration::MAX)
}

#[derive(Debug)]
struct ActiveWave {
    def: &'static WaveDef,
    pending: VecDeque<GroupSpawnState>,
    spawning: Vec<GroupSpawnState>,
    roster: BTreeSet<CreepId>,
    live: BTreeSet<CreepId>,
    to_spawn: u32,
    spawned: u32,
    killed: u32,
    leaked: u32,
}

impl ActiveWave {
    fn start(def: &'static WaveDef, out: &mut Vec<Command>) -> Self {
        let mut groups: VecDeque<GroupSpawnState> = def
            .creeps
            .iter()
            .enumerate()
            .map(|(index, group)| GroupSpawnState::new(index, group))
            .collect();

        let mut spawning: Vec<GroupSpawnState> = if def.parallel_spawn {
            groups.drain(..).collect()
        } else {
            groups.pop_front().into_iter().collect()
        };
        for group in &mut spawning {
            group.emit(def.wave_number, 1, out);
        }

        Self {
            def,
            pending: groups,
            spawning,
            roster: BTreeSet::new(),
            live: BTreeSet::new(),
            to_spawn: def.creep_total(),
            spawned: 0,
            killed: 0,
            leaked: 0,
        }
    }

    fn summary(&self) -> WaveSummary {
        WaveSummary {
            wave: self.def.wave_number,
            to_spawn: self.to_spawn,
            spawned: self.spawned,
            killed: self.killed,
            leaked: self.leaked,
        }
    }

    fn confirm_spawn(&mut self, creep: CreepId, origin: SpawnOrigin) {
        match origin {
            SpawnOrigin::Group { wave, group } if wave == self.def.wave_number => {
                if let Some(state) = self.spawning.iter_mut().find(|state| state.index == group) {
                    let _ = state.members.insert(creep);
                    state.last_spawned = Some(creep);
                }
            }
            SpawnOrigin::Offspring { parent, .. } if self.roster.contains(&parent) => {}
            _ => return,
        }
        self.spawned += 1;
        let _ = self.roster.insert(creep);
        let _ = self.live.insert(creep);
    }

    /// Forgets a creep that died or leaked; returns whether it belonged to the wave.
    fn resolve(&mut self, creep: CreepId) -> bool {
        if !self.live.remove(&creep) {
            return false;
        }
        for state in &mut self.spawning {
            let _ = state.members.remove(&creep);
        }
        true
    }

    fn release_offspring(
        &mut self,
        parent: CreepId,
        creep_type: &'static str,
        count: u32,
        distance: f32,
        out: &mut Vec<Command>,
    ) {
        if !self.roster.contains(&parent) {
            return;
        }
        self.to_spawn += count;
        tracing::debug!(
            wave = self.def.wave_number,
            parent = parent.get(),
            count,
            to_spawn = self.to_spawn,
            "offspring added to wave"
        );
        for _ in 0..count {
            out.push(Command::SpawnCreep {
                creep_type,
                wave: self.def.wave_number,
                origin: SpawnOrigin::Offspring { parent, distance },
            });
        }
    }

    fn current_group_finished(&self) -> bool {
        !self.def.parallel_spawn && self.spawning.first().is_some_and(|state| state.finished)
    }

    fn spawn_due(&mut self, dt: Duration, out: &mut Vec<Command>) {
        let wave = self.def.wave_number;
        for state in &mut self.spawning {
            let due = state.due(dt);
            if due > 0 {
                state.emit(wave, due, out);
            }
        }
    }

    fn try_advance_group(&mut self, creeps: &CreepView, out: &mut Vec<Command>) {
        if self.pending.is_empty() {
            return;
        }
        let open = self
            .spawning
            .first()
            .is_some_and(|state| state.gate_open(creeps));
        if !open {
            return;
        }
        let Some(mut next) = self.pending.pop_front() else {
            return;
        };
        tracing::debug!(
            wave = self.def.wave_number,
            group = next.index,
            creep_type = next.group.creep_type,
            "group started"
        );
        next.emit(self.def.wave_number, 1, out);
        self.spawning.clear();
        self.spawning.push(next);
    }

    fn is_complete(&self, creeps: &CreepView) -> bool {
        self.pending.is_empty()
            && self.spawning.iter().all(|state| state.finished)
            && self.killed + self.leaked >= self.to_spawn
            && creeps.active_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use creep_defence_core::wave;

    fn spawn_types(commands: &[Command]) -> Vec<&'static str> {
        commands
            .iter()
            .filter_map(|command| match command {
                Command::SpawnCreep { creep_type, .. } => Some(*creep_type),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn sequential_wave_starts_with_a_single_spawn() {
        let mut sequencer = WaveSequencer::new();
        let mut commands = Vec::new();
        let mut events = Vec::new();

        assert_eq!(sequencer.start_next_wave(&mut commands, &mut events), Ok(1));
        assert_eq!(spawn_types(&commands), vec!["normal"]);
        assert_eq!(
            events,
            vec![Event::WaveStarted {
                wave: 1,
                announcement: None
            }]
        );
        assert_eq!(
            sequencer.summary().map(|summary| summary.to_spawn),
            Some(10)
        );
    }

    #[test]
    fn parallel_finale_starts_every_group() {
        let mut sequencer = WaveSequencer::with_waves(&wave_table()[34..]);
        let mut commands = Vec::new();
        let mut events = Vec::new();

        assert_eq!(sequencer.start_next_wave(&mut commands, &mut events), Ok(35));
        assert_eq!(
            spawn_types(&commands),
            vec!["boss_broodmother", "boss_lich", "swarm", "flying"]
        );
        assert_eq!(
            sequencer.summary().map(|summary| summary.to_spawn),
            wave(35).map(WaveDef::creep_total)
        );
    }

    #[test]
    fn starting_twice_reports_the_running_wave() {
        let mut sequencer = WaveSequencer::new();
        let mut commands = Vec::new();
        let mut events = Vec::new();
        assert_eq!(sequencer.start_next_wave(&mut commands, &mut events), Ok(1));
        assert_eq!(
            sequencer.start_next_wave(&mut commands, &mut events),
            Err(SequencerError::WaveInProgress { wave: 1 })
        );
        assert_eq!(sequencer.current_wave(), Some(1));
    }

    #[test]
    fn exhausted_tables_refuse_to_start() {
        let mut sequencer = WaveSequencer::with_waves(&wave_table()[..0]);
        let mut commands = Vec::new();
        let mut events = Vec::new();
        assert!(!sequencer.has_remaining_waves());
        assert_eq!(
            sequencer.start_next_wave(&mut commands, &mut events),
            Err(SequencerError::NoWavesRemaining)
        );
        assert!(commands.is_empty());
        assert!(events.is_empty());
    }

    #[test]
    fn game_speed_must_be_positive() {
        let mut sequencer = WaveSequencer::new();
        assert_eq!(
            sequencer.set_game_speed(0.0),
            Err(SequencerError::InvalidGameSpeed { speed: 0.0 })
        );
        assert!(sequencer.set_game_speed(f32::NAN).is_err());
        assert_eq!(sequencer.set_game_speed(2.0), Ok(()));
        assert_eq!(sequencer.game_speed(), 2.0);
    }

    #[test]
    fn game_speed_above_the_cap_is_rejected() {
        let mut sequencer = WaveSequencer::new();
        assert_eq!(
            sequencer.set_game_speed(1.0e30),
            Err(SequencerError::InvalidGameSpeed { speed: 1.0e30 })
        );
        assert!(sequencer.set_game_speed(f32::INFINITY).is_err());
        assert_eq!(sequencer.game_speed(), 1.0);
        assert_eq!(sequencer.set_game_speed(MAX_GAME_SPEED), Ok(()));
    }

    #[test]
    fn scaled_elapsed_time_saturates() {
        assert_eq!(
            scaled(Duration::from_millis(500), 2.0),
            Duration::from_secs(1)
        );
        assert_eq!(scaled(Duration::MAX, MAX_GAME_SPEED), Duration::MAX);
    }

    #[test]
    fn game_speed_shortens_spawn_intervals() {
        let mut sequencer = WaveSequencer::new();
        sequencer.set_game_speed(2.0).expect("valid speed");
        let mut commands = Vec::new();
        let mut events = Vec::new();
        let _ = sequencer
            .start_next_wave(&mut commands, &mut events)
            .expect("first wave");
        commands.clear();

        let tick = [Event::TimeAdvanced {
            dt: Duration::from_millis(500),
        }];
        sequencer.handle(&tick, &CreepView::default(), &mut commands, &mut events);
        assert_eq!(spawn_types(&commands), vec!["normal"]);
    }

    #[test]
    fn group_spawns_stop_at_the_group_count() {
        let mut sequencer = WaveSequencer::new();
        let mut commands = Vec::new();
        let mut events = Vec::new();
        let _ = sequencer
            .start_next_wave(&mut commands, &mut events)
            .expect("first wave");

        let tick = [Event::TimeAdvanced {
            dt: Duration::from_secs(60),
        }];
        sequencer.handle(&tick, &CreepView::default(), &mut commands, &mut events);
        assert_eq!(spawn_types(&commands).len(), 10);
        assert!(
            !events
                .iter()
                .any(|event| matches!(event, Event::WaveCompleted { .. })),
            "no spawn has been confirmed yet"
        );
    }
}
