#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-creep status effect engine.
//!
//! [`StatusEffects`] owns every debuff a creep can carry: slow and freeze
//! windows, stacking poison and burn, armor shred, brittleness, and the
//! immunity window opened by a cleanse. The engine keeps its own monotonic
//! clock that only advances through [`StatusEffects::update`], so a fixed
//! sequence of deltas always replays to the same state.

use std::collections::VecDeque;
use std::time::Duration;

/// Maximum number of concurrent poison stacks.
pub const MAX_POISON_STACKS: usize = 3;
/// Maximum number of concurrent burn stacks.
pub const MAX_BURN_STACKS: usize = 3;
/// Cap on cumulative armor reduction.
pub const MAX_ARMOR_REDUCTION: f32 = 25.0;
/// Multiplier applied to non-magic damage while brittle.
pub const BRITTLE_DAMAGE_MULTIPLIER: f32 = 1.3;
/// Interval at which damage over time is reported.
pub const DAMAGE_TICK: Duration = Duration::from_secs(1);

/// Kind of damage over time reported by [`StatusEffects::update`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DamageOverTime {
    /// Sum of all live poison stacks.
    Poison,
    /// Sum of all live burn stacks.
    Burn,
}

/// Single poison or burn application.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageStack {
    /// Damage dealt each second while the stack lives.
    pub damage_per_second: f32,
    /// Engine time at which the stack expires.
    pub end_time: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct SlowWindow {
    amount: f32,
    end_time: Duration,
}

/// Status effects carried by a single creep.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatusEffects {
    now: Duration,
    tick_accumulator: Duration,
    slow: Option<SlowWindow>,
    freeze_end: Option<Duration>,
    poison: Vec<DamageStack>,
    burn: VecDeque<DamageStack>,
    armor_reduction: f32,
    brittle_end: Option<Duration>,
    immunity_end: Option<Duration>,
}

impl StatusEffects {
    /// Creates an engine without any active effect.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current engine time.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Returns the engine to its pristine state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Reports whether a cleanse immunity window is open.
    #[must_use]
    pub fn is_immune(&self) -> bool {
        self.is_open(self.immunity_end)
    }

    /// Overwrites the slow window. Returns `false` while immune.
    pub fn apply_slow(&mut self, amount: f32, duration: Duration) -> bool {
        if self.is_immune() {
            return false;
        }
        self.slow = Some(SlowWindow {
            amount: amount.clamp(0.0, 1.0),
            end_time: self.now.saturating_add(duration),
        });
        true
    }

    /// Overwrites the freeze window. Returns `false` while immune.
    pub fn apply_freeze(&mut self, duration: Duration) -> bool {
        if self.is_immune() {
            return false;
        }
        self.freeze_end = Some(self.now.saturating_add(duration));
        true
    }

    /// Adds a poison stack, overwriting slot zero once the cap is reached.
    ///
    /// Returns `false` while immune.
    pub fn apply_poison(&mut self, damage_per_second: f32, duration: Duration) -> bool {
        if self.is_immune() {
            return false;
        }
        let stack = DamageStack {
            damage_per_second,
            end_time: self.now.saturating_add(duration),
        };
        if self.poison.len() < MAX_POISON_STACKS {
            self.poison.push(stack);
        } else {
            self.poison[0] = stack;
        }
        true
    }

    /// Adds a burn stack, evicting the oldest once the cap is reached.
    ///
    /// Returns `false` while immune.
    pub fn apply_burn(&mut self, damage_per_second: f32, duration: Duration) -> bool {
        if self.is_immune() {
            return false;
        }
        if self.burn.len() >= MAX_BURN_STACKS {
            let _ = self.burn.pop_front();
        }
        self.burn.push_back(DamageStack {
            damage_per_second,
            end_time: self.now.saturating_add(duration),
        });
        true
    }

    /// Adds armor reduction up to [`MAX_ARMOR_REDUCTION`]. Returns `false` while immune.
    pub fn apply_armor_reduction(&mut self, amount: f32) -> bool {
        if self.is_immune() {
            return false;
        }
        self.armor_reduction = (self.armor_reduction + amount.max(0.0)).min(MAX_ARMOR_REDUCTION);
        true
    }

    /// Sets or refreshes the brittle window. Returns `false` while immune.
    pub fn apply_brittle(&mut self, duration: Duration) -> bool {
        if self.is_immune() {
            return false;
        }
        self.brittle_end = Some(self.now.saturating_add(duration));
        true
    }

    /// Clears every debuff and optionally opens an immunity window.
    ///
    /// Returns whether anything was cleared.
    pub fn dispel_all(&mut self, immunity: Duration) -> bool {
        let cleared = self.is_slowed()
            || self.is_frozen()
            || self.is_poisoned()
            || self.is_burning()
            || self.is_brittle()
            || self.armor_reduction > 0.0;

        self.slow = None;
        self.freeze_end = None;
        self.poison.clear();
        self.burn.clear();
        self.armor_reduction = 0.0;
        self.brittle_end = None;

        if !immunity.is_zero() {
            self.immunity_end = Some(self.now.saturating_add(immunity));
        }

        cleared
    }

    /// Advances the engine clock and reports damage over time.
    ///
    /// Every full [`DAMAGE_TICK`] drops expired stacks and then invokes
    /// `on_damage` once for the poison sum and once for the burn sum, skipping
    /// kinds without live stacks.
    pub fn update<F>(&mut self, dt: Duration, mut on_damage: F)
    where
        F: FnMut(DamageOverTime, f32),
    {
        self.now = self.now.saturating_add(dt);
        self.expire_windows();

        self.tick_accumulator = self.tick_accumulator.saturating_add(dt);
        while self.tick_accumulator >= DAMAGE_TICK {
            self.tick_accumulator -= DAMAGE_TICK;

            let now = self.now;
            self.poison.retain(|stack| stack.end_time > now);
            self.burn.retain(|stack| stack.end_time > now);

            if !self.poison.is_empty() {
                let total = self.poison.iter().map(|stack| stack.damage_per_second).sum();
                on_damage(DamageOverTime::Poison, total);
            }
            if !self.burn.is_empty() {
                let total = self.burn.iter().map(|stack| stack.damage_per_second).sum();
                on_damage(DamageOverTime::Burn, total);
            }
        }
    }

    /// Movement multiplier derived from freeze and slow.
    #[must_use]
    pub fn speed_multiplier(&self) -> f32 {
        if self.is_frozen() {
            return 0.0;
        }
        match self.slow {
            Some(slow) if slow.end_time > self.now => 1.0 - slow.amount,
            _ => 1.0,
        }
    }

    /// Multiplier applied to incoming damage.
    #[must_use]
    pub fn damage_multiplier(&self, magic: bool) -> f32 {
        if !magic && self.is_brittle() {
            BRITTLE_DAMAGE_MULTIPLIER
        } else {
            1.0
        }
    }

    /// Reports whether a slow is active.
    #[must_use]
    pub fn is_slowed(&self) -> bool {
        self.slow.is_some_and(|slow| slow.end_time > self.now)
    }

    /// Reports whether a freeze is active.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.is_open(self.freeze_end)
    }

    /// Reports whether any poison stack is live.
    #[must_use]
    pub fn is_poisoned(&self) -> bool {
        self.poison.iter().any(|stack| stack.end_time > self.now)
    }

    /// Reports whether any burn stack is live.
    #[must_use]
    pub fn is_burning(&self) -> bool {
        self.burn.iter().any(|stack| stack.end_time > self.now)
    }

    /// Reports whether the brittle window is open.
    #[must_use]
    pub fn is_brittle(&self) -> bool {
        self.is_open(self.brittle_end)
    }

    /// Poison stacks in slot order.
    #[must_use]
    pub fn poison_stacks(&self) -> &[DamageStack] {
        &self.poison
    }

    /// Burn stacks from oldest to newest.
    pub fn burn_stacks(&self) -> impl ExactSizeIterator<Item = &DamageStack> {
        self.burn.iter()
    }

    /// Cumulative armor reduction.
    #[must_use]
    pub const fn armor_reduction(&self) -> f32 {
        self.armor_reduction
    }

    fn is_open(&self, end: Option<Duration>) -> bool {
        end.is_some_and(|end| end > self.now)
    }

    fn expire_windows(&mut self) {
        let now = self.now;
        if self.slow.is_some_and(|slow| slow.end_time <= now) {
            self.slow = None;
        }
        if self.freeze_end.is_some_and(|end| end <= now) {
            self.freeze_end = None;
        }
        if self.brittle_end.is_some_and(|end| end <= now) {
            self.brittle_end = None;
        }
        if self.immunity_end.is_some_and(|end| end <= now) {
            self.immunity_end = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn collect_ticks(effects: &mut StatusEffects, dt: Duration) -> Vec<(DamageOverTime, f32)> {
        let mut ticks = Vec::new();
        effects.update(dt, |kind, amount| ticks.push((kind, amount)));
        ticks
    }

    #[test]
    fn fourth_poison_overwrites_slot_zero() {
        let mut effects = StatusEffects::new();
        assert!(effects.apply_poison(1.0, ms(5_000)));
        effects.update(ms(100), |_, _| {});
        assert!(effects.apply_poison(2.0, ms(1_000)));
        assert!(effects.apply_poison(3.0, ms(3_000)));
        assert!(effects.apply_poison(4.0, ms(4_000)));

        let stacks = effects.poison_stacks();
        assert_eq!(stacks.len(), 3);
        assert_eq!(stacks[0].damage_per_second, 4.0);
        assert_eq!(stacks[0].end_time, ms(4_100));
        assert_eq!(
            stacks[1].damage_per_second, 2.0,
            "the stack expiring soonest must survive the overwrite"
        );
        assert_eq!(stacks[2].damage_per_second, 3.0);
    }

    #[test]
    fn fourth_burn_evicts_the_first() {
        let mut effects = StatusEffects::new();
        for dps in [1.0, 2.0, 3.0, 4.0] {
            assert!(effects.apply_burn(dps, ms(5_000)));
        }

        let remaining: Vec<f32> = effects
            .burn_stacks()
            .map(|stack| stack.damage_per_second)
            .collect();
        assert_eq!(remaining, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn armor_reduction_is_clamped() {
        let mut effects = StatusEffects::new();
        for _ in 0..3 {
            assert!(effects.apply_armor_reduction(10.0));
        }
        assert_eq!(effects.armor_reduction(), MAX_ARMOR_REDUCTION);
    }

    #[test]
    fn dispel_clears_everything_and_opens_immunity() {
        let mut effects = StatusEffects::new();
        assert!(effects.apply_slow(0.5, ms(5_000)));
        assert!(effects.apply_freeze(ms(5_000)));
        assert!(effects.apply_poison(3.0, ms(5_000)));
        assert!(effects.apply_burn(3.0, ms(5_000)));
        assert!(effects.apply_brittle(ms(5_000)));
        assert!(effects.apply_armor_reduction(5.0));

        assert!(effects.dispel_all(ms(2_000)));
        assert!(!effects.is_slowed());
        assert!(!effects.is_frozen());
        assert!(!effects.is_poisoned());
        assert!(!effects.is_burning());
        assert!(!effects.is_brittle());
        assert_eq!(effects.armor_reduction(), 0.0);
        assert!(effects.is_immune());

        assert!(!effects.apply_slow(0.5, ms(1_000)));
        effects.update(ms(1_999), |_, _| {});
        assert!(!effects.apply_slow(0.5, ms(1_000)));
        assert!(!effects.is_slowed());

        effects.update(ms(1), |_, _| {});
        assert!(!effects.is_immune());
        assert!(effects.apply_slow(0.5, ms(1_000)));
        assert!(effects.is_slowed());
    }

    #[test]
    fn dispel_reports_when_nothing_was_cleared() {
        let mut effects = StatusEffects::new();
        assert!(!effects.dispel_all(Duration::ZERO));
        assert!(!effects.is_immune());
        assert!(effects.apply_freeze(ms(100)));
    }

    #[test]
    fn damage_over_time_reports_once_per_second() {
        let mut effects = StatusEffects::new();
        assert!(effects.apply_poison(5.0, ms(2_500)));
        assert!(effects.apply_poison(2.0, ms(10_000)));
        assert!(effects.apply_burn(4.0, ms(1_500)));

        assert!(collect_ticks(&mut effects, ms(999)).is_empty());
        assert_eq!(
            collect_ticks(&mut effects, ms(1)),
            vec![(DamageOverTime::Poison, 7.0), (DamageOverTime::Burn, 4.0)]
        );
        assert_eq!(
            collect_ticks(&mut effects, ms(1_000)),
            vec![(DamageOverTime::Poison, 7.0)],
            "burn expired at 1.5s"
        );
        assert_eq!(
            collect_ticks(&mut effects, ms(1_000)),
            vec![(DamageOverTime::Poison, 2.0)]
        );
    }

    #[test]
    fn large_deltas_roll_over_multiple_ticks() {
        let mut effects = StatusEffects::new();
        assert!(effects.apply_burn(3.0, ms(10_000)));
        let ticks = collect_ticks(&mut effects, ms(2_500));
        assert_eq!(ticks.len(), 2);
        assert_eq!(collect_ticks(&mut effects, ms(500)).len(), 1);
    }

    #[test]
    fn speed_multiplier_prefers_freeze_over_slow() {
        let mut effects = StatusEffects::new();
        assert_eq!(effects.speed_multiplier(), 1.0);

        assert!(effects.apply_slow(0.25, ms(2_000)));
        assert!((effects.speed_multiplier() - 0.75).abs() < f32::EPSILON);

        assert!(effects.apply_freeze(ms(500)));
        assert_eq!(effects.speed_multiplier(), 0.0);

        effects.update(ms(500), |_, _| {});
        assert!((effects.speed_multiplier() - 0.75).abs() < f32::EPSILON);

        effects.update(ms(1_500), |_, _| {});
        assert_eq!(effects.speed_multiplier(), 1.0);
        assert!(!effects.is_slowed());
    }

    #[test]
    fn slow_overwrites_instead_of_stacking() {
        let mut effects = StatusEffects::new();
        assert!(effects.apply_slow(0.6, ms(3_000)));
        assert!(effects.apply_slow(0.2, ms(500)));
        effects.update(ms(600), |_, _| {});
        assert!(!effects.is_slowed(), "the shorter window replaced the longer one");
    }

    #[test]
    fn brittle_only_amplifies_physical_damage() {
        let mut effects = StatusEffects::new();
        assert!(effects.apply_brittle(ms(1_000)));
        assert_eq!(effects.damage_multiplier(false), BRITTLE_DAMAGE_MULTIPLIER);
        assert_eq!(effects.damage_multiplier(true), 1.0);

        effects.update(ms(1_000), |_, _| {});
        assert_eq!(effects.damage_multiplier(false), 1.0);
    }

    #[test]
    fn reset_restores_pristine_state() {
        let mut effects = StatusEffects::new();
        assert!(effects.apply_poison(1.0, ms(1_000)));
        assert!(effects.apply_armor_reduction(4.0));
        let _ = effects.dispel_all(ms(3_000));
        effects.update(ms(250), |_, _| {});

        effects.reset();
        assert_eq!(effects, StatusEffects::default());
    }
}
