//! Combat content definitions: stats, monster templates, drop tables and spawn sites.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Base combat stats for a monster or the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatantStats {
    pub max_health: u32,
    /// Base damage per attack
    pub attack_power: u32,
    pub attack_range: f32,
    pub detection_range: f32,
    pub attack_cooldown_secs: f32,
    pub move_speed: f32,
}

impl Default for CombatantStats {
    fn default() -> Self {
        Self {
            max_health: 100,
            attack_power: 10,
            attack_range: 2.0,
            detection_range: 15.0,
            attack_cooldown_secs: 2.0,
            move_speed: 3.5,
        }
    }
}

/// One attack a monster can perform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackPattern {
    pub name: String,
    /// Animation cue index played for this attack
    #[serde(default)]
    pub cue: u8,
    #[serde(default = "default_multiplier")]
    pub damage_multiplier: f32,
    /// Can be used at any distance (e.g. spells)
    #[serde(default)]
    pub unlimited_range: bool,
}

impl AttackPattern {
    pub fn new(name: &str, cue: u8) -> Self {
        Self {
            name: name.into(),
            cue,
            damage_multiplier: 1.0,
            unlimited_range: false,
        }
    }

    pub fn with_multiplier(mut self, multiplier: f32) -> Self {
        self.damage_multiplier = multiplier;
        self
    }

    pub fn unlimited(mut self) -> Self {
        self.unlimited_range = true;
        self
    }
}

fn default_multiplier() -> f32 {
    1.0
}

/// Drop table entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropEntry {
    pub item_id: u32,
    #[serde(default = "default_quantity")]
    pub min_quantity: u32,
    #[serde(default = "default_quantity")]
    pub max_quantity: u32,
    /// Percent, 0.0 - 100.0
    #[serde(default = "default_drop_chance")]
    pub drop_chance: f32,
    #[serde(default)]
    pub boss_only: bool,
}

fn default_quantity() -> u32 {
    1
}

fn default_drop_chance() -> f32 {
    50.0
}

impl DropEntry {
    pub fn new(item_id: u32, min_quantity: u32, max_quantity: u32, drop_chance: f32) -> Self {
        Self {
            item_id,
            min_quantity,
            max_quantity,
            drop_chance,
            boss_only: false,
        }
    }

    pub fn boss_only(mut self) -> Self {
        self.boss_only = true;
        self
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.min_quantity == 0 || self.max_quantity < self.min_quantity {
            return Err(ConfigError::InvalidQuantityRange {
                item_id: self.item_id,
                min: self.min_quantity,
                max: self.max_quantity,
            });
        }
        if !(0.0..=100.0).contains(&self.drop_chance) {
            return Err(ConfigError::InvalidDropChance {
                item_id: self.item_id,
                chance: self.drop_chance,
            });
        }
        Ok(())
    }

    /// Fix invalid ranges in place, returning what was wrong
    fn clamp_invalid(&mut self) -> Vec<ConfigError> {
        let mut fixed = Vec::new();
        if self.min_quantity == 0 || self.max_quantity < self.min_quantity {
            fixed.push(ConfigError::InvalidQuantityRange {
                item_id: self.item_id,
                min: self.min_quantity,
                max: self.max_quantity,
            });
            self.min_quantity = self.min_quantity.max(1);
            if self.max_quantity < self.min_quantity {
                self.max_quantity = self.min_quantity;
            }
        }
        if !(0.0..=100.0).contains(&self.drop_chance) {
            fixed.push(ConfigError::InvalidDropChance {
                item_id: self.item_id,
                chance: self.drop_chance,
            });
            self.drop_chance = if self.drop_chance.is_nan() {
                0.0
            } else {
                self.drop_chance.clamp(0.0, 100.0)
            };
        }
        fixed
    }
}

/// Gold range plus ordered item entries resolved on a monster's death
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DropTable {
    #[serde(default)]
    pub min_gold: u32,
    #[serde(default)]
    pub max_gold: u32,
    #[serde(default)]
    pub entries: Vec<DropEntry>,
}

impl DropTable {
    /// Strict constructor: rejects invalid ranges instead of fixing them
    pub fn try_new(
        min_gold: u32,
        max_gold: u32,
        entries: Vec<DropEntry>,
    ) -> Result<Self, ConfigError> {
        if max_gold < min_gold {
            return Err(ConfigError::InvalidGoldRange {
                min: min_gold,
                max: max_gold,
            });
        }
        for entry in &entries {
            entry.check()?;
        }
        Ok(Self {
            min_gold,
            max_gold,
            entries,
        })
    }

    /// Clamp invalid ranges the way content edits are corrected
    /// (`max_gold = min_gold`, `max_quantity = min_quantity`, chance into 0..=100).
    /// Returns one error per correction so the caller can report it.
    pub fn clamp_invalid(&mut self) -> Vec<ConfigError> {
        let mut fixed = Vec::new();
        if self.max_gold < self.min_gold {
            fixed.push(ConfigError::InvalidGoldRange {
                min: self.min_gold,
                max: self.max_gold,
            });
            self.max_gold = self.min_gold;
        }
        for entry in &mut self.entries {
            fixed.extend(entry.clamp_invalid());
        }
        fixed
    }
}

/// Monster template, loaded from content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterTemplate {
    pub name: String,
    #[serde(default)]
    pub boss: bool,
    #[serde(default)]
    pub stats: CombatantStats,
    #[serde(default = "default_patrol_cycle")]
    pub patrol_cycle_secs: f32,
    #[serde(default = "default_search_duration")]
    pub search_duration_secs: f32,
    #[serde(default = "default_attacks")]
    pub attacks: Vec<AttackPattern>,
    #[serde(default)]
    pub drops: DropTable,
}

fn default_patrol_cycle() -> f32 {
    5.0
}

fn default_search_duration() -> f32 {
    3.0
}

fn default_attacks() -> Vec<AttackPattern> {
    vec![AttackPattern::new("strike", 0)]
}

impl MonsterTemplate {
    pub fn new(name: &str, stats: CombatantStats) -> Self {
        Self {
            name: name.into(),
            boss: false,
            stats,
            patrol_cycle_secs: default_patrol_cycle(),
            search_duration_secs: default_search_duration(),
            attacks: default_attacks(),
            drops: DropTable::default(),
        }
    }
}

/// Spawn site placed in the level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnSiteDef {
    pub id: String,
    /// Monster template name
    pub monster: String,
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default = "default_max_population")]
    pub max_population: u32,
    #[serde(default = "default_respawn_delay")]
    pub respawn_delay_secs: f32,
    /// 1 - 10, multiplies both scaling factors
    #[serde(default = "default_difficulty")]
    pub difficulty_level: u32,
    #[serde(default = "default_multiplier")]
    pub hp_multiplier: f32,
    #[serde(default = "default_multiplier")]
    pub damage_multiplier: f32,
    /// Random spawn offset radius on X/Z
    #[serde(default = "default_spawn_jitter")]
    pub spawn_jitter: f32,
}

fn default_max_population() -> u32 {
    3
}

fn default_respawn_delay() -> f32 {
    30.0
}

fn default_difficulty() -> u32 {
    1
}

fn default_spawn_jitter() -> f32 {
    2.0
}

pub const MIN_DIFFICULTY: u32 = 1;
pub const MAX_DIFFICULTY: u32 = 10;

impl SpawnSiteDef {
    pub fn new(id: &str, monster: &str, position: [f32; 3]) -> Self {
        Self {
            id: id.into(),
            monster: monster.into(),
            position,
            max_population: default_max_population(),
            respawn_delay_secs: default_respawn_delay(),
            difficulty_level: default_difficulty(),
            hp_multiplier: 1.0,
            damage_multiplier: 1.0,
            spawn_jitter: default_spawn_jitter(),
        }
    }

    /// Effective health scale (`hp_multiplier * difficulty_level`)
    pub fn health_scale(&self) -> f32 {
        self.hp_multiplier * self.difficulty_level as f32
    }

    /// Effective damage scale (`damage_multiplier * difficulty_level`)
    pub fn damage_scale(&self) -> f32 {
        self.damage_multiplier * self.difficulty_level as f32
    }

    /// Returns true if anything had to be corrected
    pub fn clamp_invalid(&mut self) -> bool {
        let before = self.clone();
        self.difficulty_level = self.difficulty_level.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY);
        self.respawn_delay_secs = non_negative(self.respawn_delay_secs);
        self.hp_multiplier = non_negative(self.hp_multiplier);
        self.damage_multiplier = non_negative(self.damage_multiplier);
        self.spawn_jitter = non_negative(self.spawn_jitter);
        *self != before
    }
}

fn non_negative(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.max(0.0)
    }
}
