//! Pooled creep entity: health, movement and the per-creep engines.

use std::time::Duration;

use creep_defence_core::{
    default_creep_definition, AbilityChange, CreepDefinition, CreepId, CreepSnapshot, Event,
    Lifecycle, Path, StrikeEffect, StrikeOutcome, TowerBranch,
};
use creep_defence_system_abilities::Abilities;
use creep_defence_system_status_effects::StatusEffects;
use glam::Vec2;

/// Health fraction at or below which bosses report their pain threshold.
const BOSS_PAIN_FRACTION: f32 = 0.5;
/// Knockback multiplier applied to bosses.
const BOSS_KNOCKBACK_FACTOR: f32 = 0.5;

/// Result of delivering damage to a creep.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct StrikeReport {
    /// Health actually removed.
    pub(crate) dealt: f32,
    /// How the damage was resolved.
    pub(crate) outcome: StrikeOutcome,
}

impl StrikeReport {
    const fn blocked(outcome: StrikeOutcome) -> Self {
        Self {
            dealt: 0.0,
            outcome,
        }
    }
}

/// Single slot of the creep pool.
#[derive(Clone, Debug)]
pub(crate) struct Creep {
    id: CreepId,
    definition: &'static CreepDefinition,
    wave: u32,
    lifecycle: Lifecycle,
    health: f32,
    max_health: f32,
    speed: f32,
    armor: f32,
    gold_reward: u32,
    distance: f32,
    position: Vec2,
    progress: f32,
    status: StatusEffects,
    abilities: Abilities,
    boss_hit: bool,
    boss_in_pain: bool,
    dying_for: Duration,
}

impl Creep {
    /// Creates an inactive slot carrying no state from any previous life.
    pub(crate) fn vacant() -> Self {
        Self {
            id: CreepId::new(0),
            definition: default_creep_definition(),
            wave: 0,
            lifecycle: Lifecycle::Inactive,
            health: 0.0,
            max_health: 0.0,
            speed: 0.0,
            armor: 0.0,
            gold_reward: 0,
            distance: 0.0,
            position: Vec2::ZERO,
            progress: 0.0,
            status: StatusEffects::new(),
            abilities: Abilities::default(),
            boss_hit: false,
            boss_in_pain: false,
            dying_for: Duration::ZERO,
        }
    }

    /// Reinitialises every field for a fresh life and marks the slot active.
    pub(crate) fn spawn(
        &mut self,
        id: CreepId,
        definition: &'static CreepDefinition,
        wave: u32,
        distance: f32,
        path: &Path,
    ) {
        let stats = definition.scaled_for_wave(wave);
        let located = path.position_at(distance);
        *self = Self {
            id,
            definition,
            wave,
            lifecycle: Lifecycle::Active,
            health: stats.max_health,
            max_health: stats.max_health,
            speed: stats.speed,
            armor: stats.armor,
            gold_reward: stats.gold_reward,
            distance: distance.clamp(0.0, path.total_length()),
            position: located.position,
            progress: located.progress,
            abilities: Abilities::from_capabilities(&definition.capabilities),
            ..Self::vacant()
        };
    }

    /// Returns the slot to the pool, discarding all sub-state.
    pub(crate) fn deactivate(&mut self) {
        *self = Self::vacant();
    }

    pub(crate) const fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub(crate) fn is_active(&self) -> bool {
        self.lifecycle == Lifecycle::Active
    }

    /// Advances the creep by `dt`; returns `true` once the slot should be released.
    ///
    /// Active creeps tick their status effects, then their abilities, then
    /// move with this tick's speed multiplier, then check for the exit.
    pub(crate) fn advance(
        &mut self,
        dt: Duration,
        path: &Path,
        death_linger: Duration,
        out_events: &mut Vec<Event>,
    ) -> bool {
        match self.lifecycle {
            Lifecycle::Inactive => false,
            Lifecycle::Dying => {
                self.dying_for = self.dying_for.saturating_add(dt);
                self.dying_for >= death_linger
            }
            Lifecycle::Active => self.advance_active(dt, path, out_events),
        }
    }

    fn advance_active(&mut self, dt: Duration, path: &Path, out_events: &mut Vec<Event>) -> bool {
        let mut damage_ticks: Vec<f32> = Vec::new();
        self.status
            .update(dt, |_, amount| damage_ticks.push(amount));
        for amount in damage_ticks {
            if self.abilities.is_immune() {
                break;
            }
            self.lose_health(amount, out_events);
            if self.health <= 0.0 {
                self.die(out_events);
                return false;
            }
        }

        let mut changes = Vec::new();
        self.abilities
            .update(dt, self.health_fraction(), &mut changes);
        for change in changes {
            match change {
                AbilityChange::JumpLanded { distance } => self.distance += distance,
                AbilityChange::SelfCleanse => {
                    let immunity = self.abilities.dispel_immunity().unwrap_or_default();
                    let _ = self.status.dispel_all(immunity);
                }
                _ => {}
            }
            out_events.push(Event::AbilityChanged {
                creep: self.id,
                change,
            });
        }

        let multiplier = self.status.speed_multiplier() * self.abilities.movement_factor();
        self.distance += self.speed * multiplier * dt.as_secs_f32();
        self.relocate(path);

        if path.has_reached_end(self.distance) {
            out_events.push(Event::CreepReachedEnd { creep: self.id });
            return true;
        }
        false
    }

    /// Applies tower damage after element, immunity, shield and armor rules.
    pub(crate) fn take_damage(
        &mut self,
        amount: f32,
        magic: bool,
        branch: TowerBranch,
        out_events: &mut Vec<Event>,
    ) -> StrikeReport {
        if !self.is_active() {
            return StrikeReport::blocked(StrikeOutcome::Ignored);
        }
        if !self.vulnerable_to(branch) {
            return StrikeReport::blocked(StrikeOutcome::Resisted);
        }
        if self.abilities.is_immune() {
            return StrikeReport::blocked(StrikeOutcome::Immune);
        }

        let mut changes = Vec::new();
        let shielded = self.abilities.try_block_with_shield(&mut changes);
        self.report_changes(changes, out_events);
        if shielded {
            return StrikeReport::blocked(StrikeOutcome::Shielded);
        }

        let damage = if magic {
            amount
        } else {
            let armor = (self.armor - self.status.armor_reduction()).max(0.0);
            amount * 100.0 / (100.0 + armor) * self.status.damage_multiplier(false)
        };
        let dealt = damage.max(0.0).min(self.health);
        self.lose_health(dealt, out_events);

        if self.health <= 0.0 {
            self.die(out_events);
        } else {
            let mut changes = Vec::new();
            self.abilities
                .observe_health(self.health_fraction(), &mut changes);
            self.report_changes(changes, out_events);
        }

        StrikeReport {
            dealt,
            outcome: StrikeOutcome::Hit,
        }
    }

    /// Applies a strike's status effect; returns whether it took hold.
    pub(crate) fn apply_effect(&mut self, effect: StrikeEffect, path: &Path) -> bool {
        if !self.is_active() || self.abilities.is_immune() {
            return false;
        }
        match effect {
            StrikeEffect::Slow { amount, duration } => self.status.apply_slow(amount, duration),
            StrikeEffect::Freeze { duration } => self.status.apply_freeze(duration),
            StrikeEffect::Poison {
                damage_per_second,
                duration,
            } => self.status.apply_poison(damage_per_second, duration),
            StrikeEffect::Burn {
                damage_per_second,
                duration,
            } => self.status.apply_burn(damage_per_second, duration),
            StrikeEffect::ArmorReduction { amount } => self.status.apply_armor_reduction(amount),
            StrikeEffect::Brittle { duration } => self.status.apply_brittle(duration),
            StrikeEffect::Knockback { distance } => self.knock_back(distance, path),
        }
    }

    /// Reports whether a tower of `branch` may harm the creep at all.
    pub(crate) fn vulnerable_to(&self, branch: TowerBranch) -> bool {
        match self.definition.only_damaged_by {
            Some(element) => branch.element() == Some(element),
            None => true,
        }
    }

    pub(crate) fn snapshot(&self) -> CreepSnapshot {
        CreepSnapshot {
            id: self.id,
            creep_type: self.definition.key,
            class: self.definition.class,
            wave: self.wave,
            lifecycle: self.lifecycle,
            position: self.position,
            distance_travelled: self.distance,
            progress: self.progress,
            health: self.health,
            max_health: self.max_health,
            flying: self.definition.flying,
            only_damaged_by: self.definition.only_damaged_by,
            targetable: self.is_active() && self.abilities.can_be_targeted(),
            slowed: self.status.is_slowed(),
            frozen: self.status.is_frozen(),
            poison_stacks: self.status.poison_stacks().len(),
            burn_stacks: self.status.burn_stacks().len(),
            burrowed: self.abilities.is_burrowed(),
            ghost_active: self.abilities.ghost_active(),
            jumping: self.abilities.is_jumping(),
            shield_hits: self.abilities.shield_hits(),
        }
    }

    fn knock_back(&mut self, distance: f32, path: &Path) -> bool {
        if self.abilities.is_jumping() {
            return false;
        }
        let factor = if self.definition.is_boss() {
            BOSS_KNOCKBACK_FACTOR
        } else {
            1.0
        };
        self.distance = (self.distance - distance.max(0.0) * factor).max(0.0);
        self.relocate(path);
        true
    }

    fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            return 0.0;
        }
        self.health / self.max_health
    }

    fn relocate(&mut self, path: &Path) {
        let located = path.position_at(self.distance);
        self.position = located.position;
        self.progress = located.progress;
    }

    fn lose_health(&mut self, amount: f32, out_events: &mut Vec<Event>) {
        if amount <= 0.0 {
            return;
        }
        self.health = (self.health - amount).max(0.0);

        if !self.definition.is_boss() {
            return;
        }
        if !self.boss_hit {
            self.boss_hit = true;
            out_events.push(Event::BossFirstHit { creep: self.id });
        }
        if !self.boss_in_pain && self.health <= self.max_health * BOSS_PAIN_FRACTION {
            self.boss_in_pain = true;
            out_events.push(Event::BossPainThreshold { creep: self.id });
        }
    }

    fn die(&mut self, out_events: &mut Vec<Event>) {
        self.lifecycle = Lifecycle::Dying;
        self.dying_for = Duration::ZERO;
        out_events.push(Event::CreepDied {
            creep: self.id,
            gold_reward: self.gold_reward,
        });
        if let Some(offspring) = self.definition.spawn_on_death {
            out_events.push(Event::CreepSpawnedOnDeath {
                parent: self.id,
                creep_type: offspring.creep_type,
                count: offspring.count,
                position: self.position,
                distance: self.distance,
            });
        }
    }

    fn report_changes(&self, changes: Vec<AbilityChange>, out_events: &mut Vec<Event>) {
        out_events.extend(changes.into_iter().map(|change| Event::AbilityChanged {
            creep: self.id,
            change,
        }));
    }
}
