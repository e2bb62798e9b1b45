#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-creep ability state machines.
//!
//! A creep's [`Abilities`] is a composite of independent sub-machines, one
//! per capability declared by its catalog definition. Each sub-machine
//! advances with its own countdown and reports at most one
//! [`AbilityChange`] per [`Transition`]. Leftover time is carried into the
//! next phase so large deltas never skip a transition.

use std::time::Duration;

use creep_defence_core::{
    AbilityChange, Capabilities, DigSpec, DispelSpec, GhostSpec, JumpSpec, ShieldSpec,
};

/// Upper bound on transitions a single sub-machine may report per update.
const MAX_TRANSITIONS_PER_UPDATE: usize = 16;

/// Change reported by a sub-machine together with the unconsumed delta.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transition {
    /// Transition that occurred.
    pub change: AbilityChange,
    /// Portion of the delta left after the transition.
    pub leftover: Duration,
}

impl Transition {
    const fn new(change: AbilityChange, leftover: Duration) -> Self {
        Self { change, leftover }
    }
}

/// Counts down `remaining` by `dt`, returning the leftover once it elapses.
fn count_down(remaining: &mut Duration, dt: Duration) -> Option<Duration> {
    if dt.is_zero() {
        return None;
    }
    if dt >= *remaining {
        let leftover = dt - *remaining;
        *remaining = Duration::ZERO;
        Some(leftover)
    } else {
        *remaining -= dt;
        None
    }
}

/// Hit-absorbing shield.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Shield {
    hits_remaining: u32,
}

impl Shield {
    /// Creates a fully charged shield.
    #[must_use]
    pub const fn new(spec: ShieldSpec) -> Self {
        Self {
            hits_remaining: spec.hits,
        }
    }

    /// Consumes a charge, returning whether the hit was blocked.
    pub fn try_block(&mut self) -> bool {
        if self.hits_remaining == 0 {
            return false;
        }
        self.hits_remaining -= 1;
        true
    }

    /// Charges left.
    #[must_use]
    pub const fn hits_remaining(&self) -> u32 {
        self.hits_remaining
    }
}

/// Phase of the jump cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JumpPhase {
    /// Walking until the next jump.
    Cooldown,
    /// Telegraphing the upcoming jump.
    Warning,
    /// In the air; normal movement is suspended.
    Airborne,
}

/// Periodic leap forward along the path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JumpCycle {
    spec: JumpSpec,
    phase: JumpPhase,
    remaining: Duration,
}

impl JumpCycle {
    /// Starts the cycle at the beginning of its cooldown.
    #[must_use]
    pub const fn new(spec: JumpSpec) -> Self {
        Self {
            spec,
            phase: JumpPhase::Cooldown,
            remaining: spec.cooldown,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> JumpPhase {
        self.phase
    }

    /// Advances the countdown, performing at most one phase change.
    pub fn advance(&mut self, dt: Duration) -> Option<Transition> {
        let leftover = count_down(&mut self.remaining, dt)?;
        let change = match self.phase {
            JumpPhase::Cooldown => {
                self.phase = JumpPhase::Warning;
                self.remaining = self.spec.warning;
                AbilityChange::JumpTelegraphed
            }
            JumpPhase::Warning => {
                self.phase = JumpPhase::Airborne;
                self.remaining = self.spec.airtime;
                AbilityChange::JumpStarted
            }
            JumpPhase::Airborne => {
                self.phase = JumpPhase::Cooldown;
                self.remaining = self.spec.cooldown;
                AbilityChange::JumpLanded {
                    distance: self.spec.distance,
                }
            }
        };
        Some(Transition::new(change, leftover))
    }
}

/// Phase of the burrow cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiggerPhase {
    /// Moving on the surface.
    Walking,
    /// Halting before going underground.
    Stopping,
    /// Underground, immune and untargetable.
    Burrowed,
    /// Climbing back out.
    Resurfacing,
}

/// Strict walking, stopping, burrowed, resurfacing cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiggerCycle {
    spec: DigSpec,
    phase: DiggerPhase,
    remaining: Duration,
}

impl DiggerCycle {
    /// Starts the cycle at the beginning of a walk.
    #[must_use]
    pub const fn new(spec: DigSpec) -> Self {
        Self {
            spec,
            phase: DiggerPhase::Walking,
            remaining: spec.walk,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> DiggerPhase {
        self.phase
    }

    /// Advances the countdown, performing at most one phase change.
    pub fn advance(&mut self, dt: Duration) -> Option<Transition> {
        let leftover = count_down(&mut self.remaining, dt)?;
        let (next, duration, change) = match self.phase {
            DiggerPhase::Walking => (
                DiggerPhase::Stopping,
                self.spec.stop,
                AbilityChange::DigStarted,
            ),
            DiggerPhase::Stopping => (
                DiggerPhase::Burrowed,
                self.spec.burrow,
                AbilityChange::Burrowed,
            ),
            DiggerPhase::Burrowed => (
                DiggerPhase::Resurfacing,
                self.spec.resurface,
                AbilityChange::Resurfacing,
            ),
            DiggerPhase::Resurfacing => {
                (DiggerPhase::Walking, self.spec.walk, AbilityChange::Surfaced)
            }
        };
        self.phase = next;
        self.remaining = duration;
        Some(Transition::new(change, leftover))
    }
}

/// One-shot phasing triggered by low health.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GhostPhase {
    spec: GhostSpec,
    triggered: bool,
    remaining: Option<Duration>,
}

impl GhostPhase {
    /// Creates an armed, untriggered phase.
    #[must_use]
    pub const fn new(spec: GhostSpec) -> Self {
        Self {
            spec,
            triggered: false,
            remaining: None,
        }
    }

    /// Starts the phase the first time `health_fraction` is at or below the threshold.
    ///
    /// The latch never re-arms for the rest of the creep's life.
    pub fn observe_health(&mut self, health_fraction: f32) -> Option<AbilityChange> {
        if self.triggered || health_fraction > self.spec.health_threshold {
            return None;
        }
        self.triggered = true;
        self.remaining = Some(self.spec.duration);
        Some(AbilityChange::GhostPhaseStarted)
    }

    /// Counts down an active phase.
    pub fn advance(&mut self, dt: Duration) -> Option<Transition> {
        let remaining = self.remaining.as_mut()?;
        let leftover = count_down(remaining, dt)?;
        self.remaining = None;
        Some(Transition::new(AbilityChange::GhostPhaseEnded, leftover))
    }

    /// Reports whether the phase has ever started.
    #[must_use]
    pub const fn triggered(&self) -> bool {
        self.triggered
    }

    /// Reports whether the creep is currently phased out.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.remaining.is_some()
    }
}

/// Fixed-interval self-cleanse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispelTimer {
    spec: DispelSpec,
    remaining: Duration,
}

impl DispelTimer {
    /// Starts a full interval before the first cleanse.
    #[must_use]
    pub const fn new(spec: DispelSpec) -> Self {
        Self {
            spec,
            remaining: spec.interval,
        }
    }

    /// Immunity window opened by each cleanse.
    #[must_use]
    pub const fn immunity(&self) -> Duration {
        self.spec.immunity
    }

    /// Counts down to the next cleanse and restarts the interval.
    pub fn advance(&mut self, dt: Duration) -> Option<Transition> {
        let leftover = count_down(&mut self.remaining, dt)?;
        self.remaining = self.spec.interval;
        Some(Transition::new(AbilityChange::SelfCleanse, leftover))
    }
}

/// Drives a sub-machine until it stops transitioning or runs out of time.
fn drain<F>(dt: Duration, out: &mut Vec<AbilityChange>, mut advance: F)
where
    F: FnMut(Duration) -> Option<Transition>,
{
    let mut budget = dt;
    for _ in 0..MAX_TRANSITIONS_PER_UPDATE {
        match advance(budget) {
            Some(transition) => {
                out.push(transition.change);
                budget = transition.leftover;
            }
            None => return,
        }
    }
}

/// Composite of every ability a creep carries.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Abilities {
    shield: Option<Shield>,
    jump: Option<JumpCycle>,
    digger: Option<DiggerCycle>,
    ghost: Option<GhostPhase>,
    dispel: Option<DispelTimer>,
}

impl Abilities {
    /// Builds fresh sub-machines for each declared capability.
    #[must_use]
    pub fn from_capabilities(capabilities: &Capabilities) -> Self {
        Self {
            shield: capabilities.shield.map(Shield::new),
            jump: capabilities.jump.map(JumpCycle::new),
            digger: capabilities.dig.map(DiggerCycle::new),
            ghost: capabilities.ghost.map(GhostPhase::new),
            dispel: capabilities.dispel.map(DispelTimer::new),
        }
    }

    /// Drops every sub-machine.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Lets the shield absorb a hit.
    ///
    /// Reports [`AbilityChange::ShieldBroken`] when the last charge is used.
    pub fn try_block_with_shield(&mut self, out: &mut Vec<AbilityChange>) -> bool {
        let Some(shield) = self.shield.as_mut() else {
            return false;
        };
        let blocked = shield.try_block();
        if blocked && shield.hits_remaining() == 0 {
            out.push(AbilityChange::ShieldBroken);
        }
        blocked
    }

    /// Feeds the current health fraction to the ghost latch.
    pub fn observe_health(&mut self, health_fraction: f32, out: &mut Vec<AbilityChange>) {
        if let Some(change) = self
            .ghost
            .as_mut()
            .and_then(|ghost| ghost.observe_health(health_fraction))
        {
            out.push(change);
        }
    }

    /// Advances every sub-machine in digger, jump, ghost, dispel order.
    pub fn update(&mut self, dt: Duration, health_fraction: f32, out: &mut Vec<AbilityChange>) {
        if let Some(digger) = self.digger.as_mut() {
            drain(dt, out, |budget| digger.advance(budget));
        }
        if let Some(jump) = self.jump.as_mut() {
            drain(dt, out, |budget| jump.advance(budget));
        }
        if let Some(ghost) = self.ghost.as_mut() {
            drain(dt, out, |budget| ghost.advance(budget));
        }
        self.observe_health(health_fraction, out);
        if let Some(dispel) = self.dispel.as_mut() {
            drain(dt, out, |budget| dispel.advance(budget));
        }
    }

    /// Burrowed or phased out; blocks damage and new effects.
    #[must_use]
    pub fn is_immune(&self) -> bool {
        self.is_burrowed() || self.ghost_active()
    }

    /// Whether towers may select the creep.
    #[must_use]
    pub fn can_be_targeted(&self) -> bool {
        !self.is_immune()
    }

    /// Whether the digger is underground.
    #[must_use]
    pub fn is_burrowed(&self) -> bool {
        self.digger_phase() == Some(DiggerPhase::Burrowed)
    }

    /// Whether the creep is mid-jump.
    #[must_use]
    pub fn is_jumping(&self) -> bool {
        self.jump
            .is_some_and(|jump| jump.phase() == JumpPhase::Airborne)
    }

    /// Whether the ghost phase is running.
    #[must_use]
    pub fn ghost_active(&self) -> bool {
        self.ghost.is_some_and(|ghost| ghost.is_active())
    }

    /// Whether the ghost phase has fired during this life.
    #[must_use]
    pub fn ghost_triggered(&self) -> bool {
        self.ghost.is_some_and(|ghost| ghost.triggered())
    }

    /// Current digger phase, if the creep digs.
    #[must_use]
    pub fn digger_phase(&self) -> Option<DiggerPhase> {
        self.digger.map(|digger| digger.phase())
    }

    /// Immunity opened by the periodic self-cleanse, if the creep has one.
    #[must_use]
    pub fn dispel_immunity(&self) -> Option<Duration> {
        self.dispel.map(|dispel| dispel.immunity())
    }

    /// Remaining shield charges; zero without a shield.
    #[must_use]
    pub fn shield_hits(&self) -> u32 {
        self.shield.map_or(0, |shield| shield.hits_remaining())
    }

    /// Movement multiplier imposed by the abilities.
    ///
    /// Walking and burrowed diggers move; stopping and resurfacing ones hold
    /// position. Airborne jumpers wait for their landing.
    #[must_use]
    pub fn movement_factor(&self) -> f32 {
        if self.is_jumping() {
            return 0.0;
        }
        match self.digger_phase() {
            Some(DiggerPhase::Stopping | DiggerPhase::Resurfacing) => 0.0,
            _ => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(100);

    fn capabilities(configure: impl FnOnce(&mut Capabilities)) -> Capabilities {
        let mut capabilities = Capabilities::NONE;
        configure(&mut capabilities);
        capabilities
    }

    #[test]
    fn shield_blocks_exactly_five_hits() {
        let mut abilities = Abilities::from_capabilities(&capabilities(|caps| {
            caps.shield = Some(ShieldSpec::STANDARD);
        }));
        let mut changes = Vec::new();

        let blocked = (0..8)
            .filter(|_| abilities.try_block_with_shield(&mut changes))
            .count();

        assert_eq!(blocked, 5);
        assert_eq!(abilities.shield_hits(), 0);
        assert_eq!(changes, vec![AbilityChange::ShieldBroken]);
    }

    #[test]
    fn creeps_without_shield_never_block() {
        let mut abilities = Abilities::from_capabilities(&Capabilities::NONE);
        let mut changes = Vec::new();
        assert!(!abilities.try_block_with_shield(&mut changes));
        assert!(changes.is_empty());
    }

    #[test]
    fn digger_cycle_returns_to_walking() {
        let spec = DigSpec::STANDARD;
        let mut abilities = Abilities::from_capabilities(&capabilities(|caps| {
            caps.dig = Some(spec);
        }));
        let cycle = spec.walk + spec.stop + spec.burrow + spec.resurface;
        let burrow_start = spec.walk + spec.stop;
        let burrow_end = burrow_start + spec.burrow;

        let mut elapsed = Duration::ZERO;
        let mut changes = Vec::new();
        while elapsed < cycle {
            abilities.update(TICK, 1.0, &mut changes);
            elapsed += TICK;
            let in_burrow_window = elapsed >= burrow_start && elapsed < burrow_end;
            assert_eq!(
                abilities.is_burrowed(),
                in_burrow_window,
                "burrowed state at {elapsed:?}"
            );
            assert_eq!(abilities.is_immune(), in_burrow_window);
        }

        assert_eq!(abilities.digger_phase(), Some(DiggerPhase::Walking));
        assert_eq!(
            changes,
            vec![
                AbilityChange::DigStarted,
                AbilityChange::Burrowed,
                AbilityChange::Resurfacing,
                AbilityChange::Surfaced,
            ]
        );
    }

    #[test]
    fn large_delta_carries_overflow_through_every_phase() {
        let spec = DigSpec::STANDARD;
        let mut digger = DiggerCycle::new(spec);
        let mut changes = Vec::new();
        let cycle = spec.walk + spec.stop + spec.burrow + spec.resurface;

        drain(cycle, &mut changes, |budget| digger.advance(budget));

        assert_eq!(changes.len(), 4);
        assert_eq!(digger.phase(), DiggerPhase::Walking);
    }

    #[test]
    fn stopping_and_resurfacing_diggers_hold_position() {
        let spec = DigSpec::STANDARD;
        let mut abilities = Abilities::from_capabilities(&capabilities(|caps| {
            caps.dig = Some(spec);
        }));
        let mut changes = Vec::new();
        assert_eq!(abilities.movement_factor(), 1.0);

        abilities.update(spec.walk, 1.0, &mut changes);
        assert_eq!(abilities.digger_phase(), Some(DiggerPhase::Stopping));
        assert_eq!(abilities.movement_factor(), 0.0);

        abilities.update(spec.stop, 1.0, &mut changes);
        assert_eq!(abilities.movement_factor(), 1.0);

        abilities.update(spec.burrow, 1.0, &mut changes);
        assert_eq!(abilities.digger_phase(), Some(DiggerPhase::Resurfacing));
        assert_eq!(abilities.movement_factor(), 0.0);
    }

    #[test]
    fn jump_cycle_telegraphs_then_lands() {
        let spec = JumpSpec::STANDARD;
        let mut abilities = Abilities::from_capabilities(&capabilities(|caps| {
            caps.jump = Some(spec);
        }));
        let mut changes = Vec::new();

        abilities.update(spec.cooldown, 1.0, &mut changes);
        assert_eq!(changes, vec![AbilityChange::JumpTelegraphed]);
        assert!(!abilities.is_jumping());

        abilities.update(spec.warning, 1.0, &mut changes);
        assert!(abilities.is_jumping());
        assert_eq!(abilities.movement_factor(), 0.0);
        assert!(abilities.can_be_targeted());

        abilities.update(spec.airtime, 1.0, &mut changes);
        assert!(!abilities.is_jumping());
        assert_eq!(
            changes,
            vec![
                AbilityChange::JumpTelegraphed,
                AbilityChange::JumpStarted,
                AbilityChange::JumpLanded {
                    distance: spec.distance
                },
            ]
        );
    }

    #[test]
    fn ghost_phase_triggers_once() {
        let spec = GhostSpec::STANDARD;
        let mut abilities = Abilities::from_capabilities(&capabilities(|caps| {
            caps.ghost = Some(spec);
        }));
        let mut changes = Vec::new();

        abilities.observe_health(0.2, &mut changes);
        abilities.observe_health(0.1, &mut changes);
        abilities.update(TICK, 0.1, &mut changes);
        assert_eq!(changes, vec![AbilityChange::GhostPhaseStarted]);
        assert!(abilities.ghost_triggered());
        assert!(abilities.ghost_active());
        assert!(!abilities.can_be_targeted());

        abilities.update(spec.duration - TICK, 0.1, &mut changes);
        assert!(!abilities.ghost_active());
        assert!(abilities.can_be_targeted());

        abilities.update(TICK, 0.05, &mut changes);
        assert!(!abilities.ghost_active(), "the latch never re-arms");
        assert_eq!(
            changes,
            vec![
                AbilityChange::GhostPhaseStarted,
                AbilityChange::GhostPhaseEnded
            ]
        );
    }

    #[test]
    fn ghost_ignores_health_above_threshold() {
        let mut ghost = GhostPhase::new(GhostSpec::STANDARD);
        assert_eq!(ghost.observe_health(0.5), None);
        assert!(!ghost.triggered());
        assert_eq!(ghost.advance(TICK), None);
    }

    #[test]
    fn dispel_fires_on_every_interval() {
        let spec = DispelSpec::STANDARD;
        let mut abilities = Abilities::from_capabilities(&capabilities(|caps| {
            caps.dispel = Some(spec);
        }));
        let mut changes = Vec::new();

        abilities.update(spec.interval - TICK, 1.0, &mut changes);
        assert!(changes.is_empty());
        abilities.update(TICK, 1.0, &mut changes);
        abilities.update(spec.interval, 1.0, &mut changes);
        assert_eq!(
            changes,
            vec![AbilityChange::SelfCleanse, AbilityChange::SelfCleanse]
        );
        assert_eq!(abilities.dispel_immunity(), Some(spec.immunity));
    }

    #[test]
    fn reset_clears_every_sub_machine() {
        let mut abilities = Abilities::from_capabilities(&capabilities(|caps| {
            caps.dig = Some(DigSpec::STANDARD);
            caps.ghost = Some(GhostSpec::STANDARD);
        }));
        let mut changes = Vec::new();
        abilities.observe_health(0.1, &mut changes);
        abilities.update(Duration::from_millis(3_600), 0.1, &mut changes);
        assert!(abilities.is_immune());

        abilities.reset();
        assert_eq!(abilities, Abilities::default());
        assert!(!abilities.is_immune());
        assert_eq!(abilities.digger_phase(), None);
    }

    #[test]
    fn zero_delta_is_a_no_op() {
        let mut jump = JumpCycle::new(JumpSpec {
            cooldown: Duration::ZERO,
            ..JumpSpec::STANDARD
        });
        assert_eq!(jump.advance(Duration::ZERO), None);
        assert_eq!(jump.phase(), JumpPhase::Cooldown);
    }
}
