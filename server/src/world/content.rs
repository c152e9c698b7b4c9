//! World content: items, monster templates, spawn sites and the player setup.
//!
//! Content is read from a JSON file. Invalid ranges are clamped with a
//! warning, dangling references are rejected.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use dungeon_shared::{
    get_item_definitions, AttackPattern, CombatantStats, ConfigError, DropEntry, DropTable,
    ItemCatalog, ItemDef, MonsterTemplate, SpawnSiteDef, DEFAULT_POOL_SIZE,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::entities::PlayerDef;
use crate::error::ContentError;

/// Monster templates by name
#[derive(Debug, Clone, Default)]
pub struct MonsterCatalog {
    templates: HashMap<String, MonsterTemplate>,
}

impl MonsterCatalog {
    pub fn new(templates: impl IntoIterator<Item = MonsterTemplate>) -> Self {
        Self {
            templates: templates.into_iter().map(|t| (t.name.clone(), t)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&MonsterTemplate> {
        self.templates.get(name)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldContent {
    #[serde(default)]
    pub items: Vec<ItemDef>,
    #[serde(default)]
    pub monsters: Vec<MonsterTemplate>,
    #[serde(default)]
    pub spawn_sites: Vec<SpawnSiteDef>,
    #[serde(default)]
    pub player: PlayerDef,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

fn default_pool_size() -> usize {
    DEFAULT_POOL_SIZE
}

impl WorldContent {
    /// Load and validate content from a JSON file
    pub fn load_from_json<P: AsRef<Path>>(path: P) -> Result<Self, ContentError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let content = Self::from_json_str(&text)?;
        info!(
            "Loaded {} items, {} monsters, {} spawn sites from {:?}",
            content.items.len(),
            content.monsters.len(),
            content.spawn_sites.len(),
            path
        );
        Ok(content)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ContentError> {
        let mut content: WorldContent = serde_json::from_str(text)?;
        content.validate()?;
        Ok(content)
    }

    /// Clamp fixable values and reject broken references
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.pool_size == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.player.inventory_size == 0 {
            return Err(ConfigError::ZeroCapacity);
        }

        let mut item_ids = HashSet::new();
        for item in &self.items {
            if !item_ids.insert(item.id) {
                return Err(ConfigError::Duplicate {
                    kind: "item",
                    id: item.id.to_string(),
                });
            }
        }

        let mut monster_names = HashSet::new();
        for monster in &mut self.monsters {
            if !monster_names.insert(monster.name.clone()) {
                return Err(ConfigError::Duplicate {
                    kind: "monster",
                    id: monster.name.clone(),
                });
            }
            for fixed in monster.drops.clamp_invalid() {
                warn!("Monster '{}': {}, clamped", monster.name, fixed);
            }
            let unknown = monster.drops.entries.iter().find(|e| !item_ids.contains(&e.item_id));
            if let Some(entry) = unknown {
                return Err(ConfigError::UnknownItem(entry.item_id));
            }
            if monster.attacks.is_empty() {
                warn!("Monster '{}' has no attacks, it will never strike", monster.name);
            }
        }

        let mut site_ids = HashSet::new();
        for site in &mut self.spawn_sites {
            if !site_ids.insert(site.id.clone()) {
                return Err(ConfigError::Duplicate {
                    kind: "spawn site",
                    id: site.id.clone(),
                });
            }
            if !monster_names.contains(&site.monster) {
                return Err(ConfigError::UnknownMonster(site.monster.clone()));
            }
            if site.clamp_invalid() {
                warn!("Spawn site '{}' had out-of-range settings, clamped", site.id);
            }
        }

        Ok(())
    }

    pub fn item_catalog(&self) -> ItemCatalog {
        ItemCatalog::new(self.items.iter().cloned())
    }

    pub fn monster_catalog(&self) -> MonsterCatalog {
        MonsterCatalog::new(self.monsters.iter().cloned())
    }

    /// Built-in dungeon: a slime meadow, a skeleton crypt and the reaper's sanctum
    pub fn with_defaults() -> Self {
        Self {
            items: get_item_definitions(),
            monsters: default_monsters(),
            spawn_sites: default_sites(),
            player: PlayerDef::default(),
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

impl Default for WorldContent {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn default_monsters() -> Vec<MonsterTemplate> {
    let slime = MonsterTemplate {
        attacks: vec![AttackPattern::new("bite", 0)],
        drops: DropTable {
            min_gold: 5,
            max_gold: 15,
            entries: vec![DropEntry::new(2, 1, 3, 60.0), DropEntry::new(1, 1, 1, 25.0)],
        },
        ..MonsterTemplate::new(
            "slime",
            CombatantStats {
                max_health: 30,
                attack_power: 5,
                attack_range: 2.0,
                detection_range: 12.0,
                attack_cooldown_secs: 2.0,
                move_speed: 3.0,
            },
        )
    };

    let skeleton = MonsterTemplate {
        attacks: vec![
            AttackPattern::new("slash", 0),
            AttackPattern::new("overhead", 1).with_multiplier(1.3),
            AttackPattern::new("shield_bash", 2).with_multiplier(0.8),
        ],
        drops: DropTable {
            min_gold: 15,
            max_gold: 30,
            entries: vec![
                DropEntry::new(3, 1, 4, 70.0),
                DropEntry::new(1, 1, 2, 30.0),
                DropEntry::new(4, 1, 1, 10.0),
            ],
        },
        ..MonsterTemplate::new(
            "skeleton",
            CombatantStats {
                max_health: 60,
                attack_power: 9,
                attack_range: 2.2,
                detection_range: 15.0,
                attack_cooldown_secs: 1.8,
                move_speed: 3.5,
            },
        )
    };

    let reaper = MonsterTemplate {
        boss: true,
        patrol_cycle_secs: 8.0,
        search_duration_secs: 4.0,
        attacks: vec![
            AttackPattern::new("sweep", 0),
            AttackPattern::new("cleave", 1).with_multiplier(1.2),
            AttackPattern::new("uppercut", 2).with_multiplier(1.1),
            AttackPattern::new("soul_bolt", 3).with_multiplier(0.8).unlimited(),
            AttackPattern::new("whirlwind", 4).with_multiplier(1.5),
            AttackPattern::new("execute", 5).with_multiplier(2.0),
        ],
        drops: DropTable {
            min_gold: 200,
            max_gold: 400,
            entries: vec![
                DropEntry::new(5, 1, 1, 100.0).boss_only(),
                DropEntry::new(6, 2, 5, 100.0),
                DropEntry::new(1, 2, 3, 80.0),
            ],
        },
        ..MonsterTemplate::new(
            "reaper",
            CombatantStats {
                max_health: 400,
                attack_power: 18,
                attack_range: 3.0,
                detection_range: 25.0,
                attack_cooldown_secs: 2.5,
                move_speed: 4.0,
            },
        )
    };

    vec![slime, skeleton, reaper]
}

fn default_sites() -> Vec<SpawnSiteDef> {
    vec![
        SpawnSiteDef {
            respawn_delay_secs: 20.0,
            ..SpawnSiteDef::new("meadow", "slime", [12.0, 0.0, 6.0])
        },
        SpawnSiteDef {
            max_population: 2,
            difficulty_level: 2,
            ..SpawnSiteDef::new("crypt", "skeleton", [-15.0, 0.0, 10.0])
        },
        SpawnSiteDef {
            max_population: 1,
            respawn_delay_secs: 120.0,
            spawn_jitter: 0.0,
            ..SpawnSiteDef::new("sanctum", "reaper", [0.0, 0.0, -30.0])
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "items": [{"id": 1, "name": "Health Potion", "stackable": true, "max_stack": 20}],
        "monsters": [{
            "name": "slime",
            "stats": {"max_health": 30, "attack_power": 5, "attack_range": 2.0,
                      "detection_range": 15.0, "attack_cooldown_secs": 2.0, "move_speed": 3.5},
            "attacks": [{"name": "bite", "cue": 0}],
            "drops": {"min_gold": 30, "max_gold": 15,
                      "entries": [{"item_id": 1, "min_quantity": 3, "max_quantity": 1,
                                   "drop_chance": 50.0}]}
        }],
        "spawn_sites": [{"id": "meadow", "monster": "slime", "position": [10.0, 0.0, 5.0],
                         "difficulty_level": 40}]
    }"#;

    #[test]
    fn test_parse_and_clamp() {
        let content = WorldContent::from_json_str(MINIMAL).unwrap();
        let slime = &content.monsters[0];
        assert_eq!((slime.drops.min_gold, slime.drops.max_gold), (30, 30));
        assert_eq!(slime.drops.entries[0].max_quantity, 3);
        assert_eq!(content.spawn_sites[0].difficulty_level, 10);
        assert_eq!(content.spawn_sites[0].max_population, 3);
        assert_eq!(content.pool_size, DEFAULT_POOL_SIZE);
        assert_eq!(content.player, PlayerDef::default());
    }

    #[test]
    fn test_unknown_references_rejected() {
        let bad_item = MINIMAL.replace(r#""item_id": 1"#, r#""item_id": 77"#);
        assert!(matches!(
            WorldContent::from_json_str(&bad_item),
            Err(ContentError::Config(ConfigError::UnknownItem(77)))
        ));

        let bad_monster = MINIMAL.replace(r#""monster": "slime""#, r#""monster": "wyrm""#);
        assert!(matches!(
            WorldContent::from_json_str(&bad_monster),
            Err(ContentError::Config(ConfigError::UnknownMonster(name))) if name == "wyrm"
        ));
    }

    #[test]
    fn test_duplicates_and_zero_pool_rejected() {
        let mut content = WorldContent::with_defaults();
        content.spawn_sites.push(content.spawn_sites[0].clone());
        assert!(matches!(
            content.validate(),
            Err(ConfigError::Duplicate { kind: "spawn site", .. })
        ));

        let mut content = WorldContent::with_defaults();
        content.pool_size = 0;
        assert_eq!(content.validate(), Err(ConfigError::ZeroCapacity));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            WorldContent::from_json_str("{ not json"),
            Err(ContentError::Parse(_))
        ));
        assert!(matches!(
            WorldContent::load_from_json("/nonexistent/dungeon.json"),
            Err(ContentError::Io(_))
        ));
    }

    #[test]
    fn test_defaults_round_trip() {
        let mut defaults = WorldContent::with_defaults();
        defaults.validate().unwrap();

        let text = serde_json::to_string_pretty(&defaults).unwrap();
        let parsed = WorldContent::from_json_str(&text).unwrap();
        assert_eq!(parsed, defaults);

        let reaper = parsed.monster_catalog().get("reaper").cloned().unwrap();
        assert!(reaper.boss);
        assert_eq!(reaper.attacks.len(), 6);
        assert_eq!(reaper.attacks.iter().filter(|a| a.unlimited_range).count(), 1);
        assert!(parsed.item_catalog().contains(5));
    }
}
