//! Monster AI: a finite-state controller over a [`CombatantState`].
//!
//! Each tick the monster receives the player observation (if the player can
//! be tracked at all) and walks the state table:
//!
//! - `Idle` turns into `Searching` once the patrol cycle has elapsed, or
//!   `Chasing` when the target is inside detection range.
//! - `Searching` falls back to `Idle` after the search duration, or chases a
//!   detected target.
//! - `Chasing` follows the target, attacks it once inside attack range and
//!   gives up when it leaves detection range.
//! - `Attacking` waits out the cooldown, then attacks again or resumes the chase.
//! - `Hit` is a short stagger; recovery is a scheduled action.
//! - `Dead` is terminal.
//!
//! Fatal damage moves any state to `Dead` immediately.

use std::time::Duration;

use dungeon_shared::{
    AnimationCue, AttackPattern, AudioCue, DropTable, MonsterTemplate, SpawnSiteDef,
    DEATH_CLEANUP_SECS, HIT_RECOVERY_SECS,
};
use log::debug;

use super::combatant::{CombatantState, DamageOutcome};
use crate::drops::{self, LootResult};
use crate::rng::RandomSource;
use crate::secs;
use crate::world::drivers::{AnimationSink, AudioSink, MovementDriver};
use crate::world::scheduler::{Owner, ScheduledAction, Scheduler};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonsterState {
    Idle,
    Searching,
    Chasing,
    Attacking,
    Hit,
    Dead,
}

/// Where the target is relative to the monster this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetObservation {
    pub position: [f32; 3],
    pub distance: f32,
}

/// An attack the world should apply to the target
#[derive(Debug, Clone, PartialEq)]
pub struct AttackIntent {
    pub monster: u64,
    pub pattern: String,
    pub damage: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DamageReport {
    pub outcome: DamageOutcome,
    /// Present only on the killing blow
    pub loot: Option<LootResult>,
}

/// Health and damage scale applied when a monster is created
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaling {
    pub health: f32,
    pub damage: f32,
}

impl Scaling {
    pub const NONE: Scaling = Scaling {
        health: 1.0,
        damage: 1.0,
    };

    pub fn from_site(site: &SpawnSiteDef) -> Self {
        Self {
            health: site.health_scale(),
            damage: site.damage_scale(),
        }
    }
}

/// Everything a monster touches outside itself during a tick
pub struct BehaviorContext<'a> {
    pub now: Duration,
    pub rng: &'a mut dyn RandomSource,
    pub movement: &'a mut dyn MovementDriver,
    pub animation: &'a mut dyn AnimationSink,
    pub audio: &'a mut dyn AudioSink,
    pub scheduler: &'a mut Scheduler,
}

#[derive(Debug, Clone)]
pub struct Monster {
    pub id: u64,
    pub name: String,
    pub boss: bool,
    /// Spawn site this monster counts against
    pub site: Option<String>,
    pub combat: CombatantState,
    attacks: Vec<AttackPattern>,
    drops: DropTable,
    patrol_cycle: Duration,
    search_duration: Duration,
    state: MonsterState,
    /// `None` until the first transition, so the first patrol cycle is already due
    last_transition: Option<Duration>,
    last_attack_index: Option<usize>,
}

impl Monster {
    pub fn new(id: u64, template: &MonsterTemplate, scaling: Scaling) -> Self {
        Self {
            id,
            name: template.name.clone(),
            boss: template.boss,
            site: None,
            combat: CombatantState::scaled(&template.stats, scaling.health, scaling.damage),
            attacks: template.attacks.clone(),
            drops: template.drops.clone(),
            patrol_cycle: secs(template.patrol_cycle_secs),
            search_duration: secs(template.search_duration_secs),
            state: MonsterState::Idle,
            last_transition: None,
            last_attack_index: None,
        }
    }

    pub fn with_site(mut self, site: &str) -> Self {
        self.site = Some(site.into());
        self
    }

    /// Re-arm a pooled monster under a fresh id
    pub fn reinitialize(
        &mut self,
        id: u64,
        template: &MonsterTemplate,
        scaling: Scaling,
        site: Option<&str>,
    ) {
        self.id = id;
        self.name.clone_from(&template.name);
        self.boss = template.boss;
        self.site = site.map(str::to_owned);
        self.combat = CombatantState::scaled(&template.stats, scaling.health, scaling.damage);
        self.attacks.clone_from(&template.attacks);
        self.drops.clone_from(&template.drops);
        self.patrol_cycle = secs(template.patrol_cycle_secs);
        self.search_duration = secs(template.search_duration_secs);
        self.state = MonsterState::Idle;
        self.last_transition = None;
        self.last_attack_index = None;
    }

    pub fn state(&self) -> MonsterState {
        self.state
    }

    pub fn is_alive(&self) -> bool {
        self.combat.is_alive()
    }

    pub fn last_attack_index(&self) -> Option<usize> {
        self.last_attack_index
    }

    pub fn attacks(&self) -> &[AttackPattern] {
        &self.attacks
    }

    fn detects(&self, target: Option<&TargetObservation>) -> bool {
        target.is_some_and(|t| t.distance <= self.combat.stats().detection_range)
    }

    fn in_attack_range(&self, target: Option<&TargetObservation>) -> bool {
        target.is_some_and(|t| t.distance <= self.combat.stats().attack_range)
    }

    /// Advance the state machine by one tick
    pub fn tick(
        &mut self,
        target: Option<TargetObservation>,
        ctx: &mut BehaviorContext,
    ) -> Option<AttackIntent> {
        let target = target.as_ref();
        let elapsed = self
            .last_transition
            .map_or(Duration::MAX, |at| ctx.now.saturating_sub(at));

        match self.state {
            MonsterState::Idle => {
                if elapsed >= self.patrol_cycle {
                    self.transition(MonsterState::Searching, target, ctx)
                } else if self.detects(target) {
                    self.transition(MonsterState::Chasing, target, ctx)
                } else {
                    None
                }
            }
            MonsterState::Searching => {
                if elapsed >= self.search_duration {
                    self.transition(MonsterState::Idle, target, ctx)
                } else if self.detects(target) {
                    self.transition(MonsterState::Chasing, target, ctx)
                } else {
                    None
                }
            }
            MonsterState::Chasing => {
                if !self.detects(target) {
                    self.transition(MonsterState::Idle, target, ctx)
                } else if self.in_attack_range(target) {
                    self.transition(MonsterState::Attacking, target, ctx)
                } else {
                    if let Some(t) = target {
                        ctx.movement.move_toward(self.id, t.position);
                    }
                    None
                }
            }
            MonsterState::Attacking => {
                if !self.combat.ready_to_attack(ctx.now) {
                    None
                } else if !self.in_attack_range(target) {
                    self.transition(MonsterState::Chasing, target, ctx)
                } else {
                    target.and_then(|t| self.attack(t, ctx))
                }
            }
            MonsterState::Hit | MonsterState::Dead => None,
        }
    }

    fn transition(
        &mut self,
        next: MonsterState,
        target: Option<&TargetObservation>,
        ctx: &mut BehaviorContext,
    ) -> Option<AttackIntent> {
        if next == self.state || self.state == MonsterState::Dead {
            return None;
        }

        debug!("{} #{}: {:?} -> {:?}", self.name, self.id, self.state, next);
        self.state = next;
        self.last_transition = Some(ctx.now);

        match next {
            MonsterState::Idle => {
                ctx.movement.stop(self.id);
                ctx.animation.trigger(self.id, AnimationCue::Idle);
                None
            }
            MonsterState::Searching => {
                ctx.movement.stop(self.id);
                ctx.animation.trigger(self.id, AnimationCue::LookFor);
                ctx.audio.play(self.id, AudioCue::Search);
                None
            }
            MonsterState::Chasing => {
                ctx.animation.trigger(self.id, AnimationCue::Walk);
                if let Some(t) = target {
                    ctx.movement.move_toward(self.id, t.position);
                }
                None
            }
            MonsterState::Attacking => {
                ctx.movement.stop(self.id);
                let t = target?;
                if self.combat.ready_to_attack(ctx.now) {
                    self.attack(t, ctx)
                } else {
                    ctx.movement.face(self.id, t.position);
                    None
                }
            }
            MonsterState::Hit => {
                ctx.movement.stop(self.id);
                ctx.animation.trigger(self.id, AnimationCue::Hit);
                ctx.audio.play(self.id, AudioCue::Hit);
                ctx.scheduler.schedule(
                    ctx.now + secs(HIT_RECOVERY_SECS),
                    Owner::Monster(self.id),
                    ScheduledAction::RecoverFromHit(self.id),
                );
                None
            }
            // Death goes through `die`
            MonsterState::Dead => None,
        }
    }

    fn attack(
        &mut self,
        target: &TargetObservation,
        ctx: &mut BehaviorContext,
    ) -> Option<AttackIntent> {
        ctx.movement.face(self.id, target.position);

        let index = select_attack(
            &self.attacks,
            self.last_attack_index,
            target.distance,
            self.combat.stats().attack_range,
            ctx.rng,
        )?;
        let pattern = &self.attacks[index];

        self.last_attack_index = Some(index);
        self.combat.record_attack(ctx.now);
        ctx.animation.trigger(self.id, AnimationCue::Attack(pattern.cue));
        ctx.audio.play(self.id, AudioCue::Attack);

        let multiplier = pattern.damage_multiplier.max(0.0);
        let damage = (self.combat.stats().attack_power as f32 * multiplier).round() as u32;
        Some(AttackIntent {
            monster: self.id,
            pattern: pattern.name.clone(),
            damage,
        })
    }

    /// Apply damage; a killing blow runs the death sequence and returns the loot
    pub fn apply_damage(&mut self, amount: u32, ctx: &mut BehaviorContext) -> DamageReport {
        let outcome = self.combat.apply_damage(amount);
        if outcome.died {
            let loot = self.die(ctx);
            return DamageReport {
                outcome,
                loot: Some(loot),
            };
        }

        if self.combat.is_alive() {
            self.transition(MonsterState::Hit, None, ctx);
        }
        DamageReport { outcome, loot: None }
    }

    fn die(&mut self, ctx: &mut BehaviorContext) -> LootResult {
        self.state = MonsterState::Dead;
        self.last_transition = Some(ctx.now);

        // Pending recovery must not fire on a corpse
        ctx.scheduler.cancel_owner(&Owner::Monster(self.id));

        ctx.animation.trigger(self.id, AnimationCue::Die);
        ctx.audio.play(self.id, AudioCue::Death);
        ctx.movement.stop(self.id);
        ctx.movement.set_collision(self.id, false);

        let loot = drops::resolve(&self.drops, self.boss, ctx.rng);

        ctx.scheduler.schedule(
            ctx.now + secs(DEATH_CLEANUP_SECS),
            Owner::Monster(self.id),
            ScheduledAction::Despawn(self.id),
        );
        loot
    }

    /// Scheduled end of the hit stagger
    pub fn recover_from_hit(
        &mut self,
        target: Option<TargetObservation>,
        ctx: &mut BehaviorContext,
    ) {
        if self.state != MonsterState::Hit {
            return;
        }
        let next = if self.detects(target.as_ref()) {
            MonsterState::Chasing
        } else {
            MonsterState::Idle
        };
        self.transition(next, target.as_ref(), ctx);
    }
}

/// Pick the next attack pattern.
///
/// The previous pattern is excluded unless it is the only unlimited-range
/// pattern, or the only pattern at all. Remaining patterns must be usable at
/// `distance`; one is chosen uniformly. `None` means no attack this tick.
pub fn select_attack(
    patterns: &[AttackPattern],
    last: Option<usize>,
    distance: f32,
    attack_range: f32,
    rng: &mut dyn RandomSource,
) -> Option<usize> {
    let unlimited = patterns.iter().filter(|p| p.unlimited_range).count();
    let repeat_allowed = |index: usize| {
        patterns.len() == 1 || (patterns[index].unlimited_range && unlimited == 1)
    };

    let candidates: Vec<usize> = patterns
        .iter()
        .enumerate()
        .filter(|(index, _)| Some(*index) != last || repeat_allowed(*index))
        .filter(|(_, pattern)| pattern.unlimited_range || distance <= attack_range)
        .map(|(index, _)| index)
        .collect();

    let pick = rng.pick_index(candidates.len())?;
    Some(candidates[pick])
}
