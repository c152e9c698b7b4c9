//! The player: the single consumer of loot and target of monster attacks.

use dungeon_shared::{CombatantStats, ConfigError, ItemCatalog};
use log::info;
use serde::{Deserialize, Serialize};

use super::combatant::CombatantState;
use super::inventory::Inventory;

/// Gold held by the player
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Wallet {
    gold: u64,
}

impl Wallet {
    pub fn gold(&self) -> u64 {
        self.gold
    }

    pub fn add_gold(&mut self, amount: u32) {
        if amount == 0 {
            return;
        }
        self.gold = self.gold.saturating_add(amount as u64);
    }
}

/// Player setup read from content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerDef {
    pub name: String,
    pub position: [f32; 3],
    pub stats: CombatantStats,
    pub inventory_size: usize,
}

impl Default for PlayerDef {
    fn default() -> Self {
        Self {
            name: "Adventurer".into(),
            position: [0.0, 0.0, 0.0],
            stats: CombatantStats {
                max_health: 250,
                attack_power: 12,
                attack_range: 2.5,
                detection_range: 0.0,
                attack_cooldown_secs: 0.8,
                move_speed: 5.0,
            },
            inventory_size: dungeon_shared::DEFAULT_INVENTORY_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    pub name: String,
    pub position: [f32; 3],
    pub spawn_point: [f32; 3],
    pub combat: CombatantState,
    pub inventory: Inventory,
    pub wallet: Wallet,
}

impl Player {
    pub fn new(def: &PlayerDef) -> Result<Self, ConfigError> {
        Ok(Self {
            name: def.name.clone(),
            position: def.position,
            spawn_point: def.position,
            combat: CombatantState::new(def.stats.clone()),
            inventory: Inventory::new(def.inventory_size)?,
            wallet: Wallet::default(),
        })
    }

    pub fn is_alive(&self) -> bool {
        self.combat.is_alive()
    }

    /// Back to full health at the spawn point; inventory and gold are kept
    pub fn revive(&mut self) {
        self.combat.reset();
        self.position = self.spawn_point;
        info!("{} revived at {:?}", self.name, self.spawn_point);
    }

    /// Consume one unit of a healing item from the inventory
    pub fn use_potion(&mut self, catalog: &ItemCatalog, item_id: u32, heal: u32) -> bool {
        if !self.is_alive() || !catalog.contains(item_id) {
            return false;
        }
        if !self.inventory.remove_item(item_id, 1) {
            return false;
        }
        self.combat.heal(heal);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dungeon_shared::get_item_definitions;

    #[test]
    fn test_wallet() {
        let mut wallet = Wallet::default();
        wallet.add_gold(0);
        assert_eq!(wallet.gold(), 0);

        wallet.add_gold(40);
        wallet.add_gold(u32::MAX);
        assert_eq!(wallet.gold(), 40 + u32::MAX as u64);
    }

    #[test]
    fn test_player_revive() {
        let mut player = Player::new(&PlayerDef::default()).unwrap();
        player.position = [8.0, 0.0, 8.0];
        player.combat.apply_damage(10_000);
        assert!(!player.is_alive());

        player.revive();
        assert!(player.is_alive());
        assert_eq!(player.position, [0.0, 0.0, 0.0]);
        assert_eq!(player.combat.health(), 250);
    }

    #[test]
    fn test_zero_inventory_rejected() {
        let def = PlayerDef {
            inventory_size: 0,
            ..Default::default()
        };
        assert!(Player::new(&def).is_err());
    }

    #[test]
    fn test_use_potion() {
        let catalog = ItemCatalog::new(get_item_definitions());
        let mut player = Player::new(&PlayerDef::default()).unwrap();
        player.combat.apply_damage(100);

        assert!(!player.use_potion(&catalog, 1, 50));
        let potion = catalog.get(1).unwrap().clone();
        player.inventory.add_item(&potion, 1);
        assert!(player.use_potion(&catalog, 1, 50));
        assert_eq!(player.combat.health(), 200);
        assert_eq!(player.inventory.count(1), 0);
    }
}
