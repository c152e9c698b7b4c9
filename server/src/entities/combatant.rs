//! Health and attack cooldown bookkeeping shared by monsters and the player.

use std::time::Duration;

use dungeon_shared::CombatantStats;

use crate::secs;

/// Result of applying damage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageOutcome {
    pub new_health: u32,
    /// True only on the call that killed the combatant
    pub died: bool,
}

#[derive(Debug, Clone)]
pub struct CombatantState {
    stats: CombatantStats,
    health: u32,
    dead: bool,
    last_attack: Option<Duration>,
}

impl CombatantState {
    pub fn new(stats: CombatantStats) -> Self {
        let mut stats = stats;
        stats.max_health = stats.max_health.max(1);
        Self {
            health: stats.max_health,
            stats,
            dead: false,
            last_attack: None,
        }
    }

    /// Build from base stats with health and attack power scaled (rounded, at least 1 health)
    pub fn scaled(stats: &CombatantStats, hp_multiplier: f32, damage_multiplier: f32) -> Self {
        let mut scaled = stats.clone();
        scaled.max_health = scale(stats.max_health, hp_multiplier).max(1);
        scaled.attack_power = scale(stats.attack_power, damage_multiplier);
        Self::new(scaled)
    }

    pub fn stats(&self) -> &CombatantStats {
        &self.stats
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn max_health(&self) -> u32 {
        self.stats.max_health
    }

    pub fn is_alive(&self) -> bool {
        !self.dead
    }

    pub fn apply_damage(&mut self, amount: u32) -> DamageOutcome {
        if self.dead {
            return DamageOutcome {
                new_health: self.health,
                died: false,
            };
        }

        self.health = self.health.saturating_sub(amount);
        let died = self.health == 0;
        if died {
            self.dead = true;
        }
        DamageOutcome {
            new_health: self.health,
            died,
        }
    }

    pub fn heal(&mut self, amount: u32) -> u32 {
        if !self.dead {
            self.health = self.health.saturating_add(amount).min(self.stats.max_health);
        }
        self.health
    }

    pub fn ready_to_attack(&self, now: Duration) -> bool {
        match self.last_attack {
            None => true,
            Some(last) => now >= last + secs(self.stats.attack_cooldown_secs),
        }
    }

    pub fn record_attack(&mut self, now: Duration) {
        self.last_attack = Some(now);
    }

    pub fn last_attack(&self) -> Option<Duration> {
        self.last_attack
    }

    /// Full health, alive, cooldown cleared. Only for pooled or revived combatants.
    pub fn reset(&mut self) {
        self.health = self.stats.max_health;
        self.dead = false;
        self.last_attack = None;
    }
}

fn scale(value: u32, multiplier: f32) -> u32 {
    let scaled = (value as f32 * multiplier.max(0.0)).round();
    if scaled >= u32::MAX as f32 {
        u32::MAX
    } else {
        scaled as u32
    }
}
