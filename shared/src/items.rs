//! Item definitions and the item catalog.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Item definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDef {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub item_type: ItemType,
    #[serde(default = "default_stackable")]
    pub stackable: bool,
    #[serde(default = "default_max_stack")]
    pub max_stack: u32,
}

fn default_stackable() -> bool {
    true
}

fn default_max_stack() -> u32 {
    99
}

impl ItemDef {
    /// How many units of this item fit in a single inventory slot
    pub fn slot_capacity(&self) -> u32 {
        if self.stackable {
            self.max_stack.max(1)
        } else {
            1
        }
    }
}

/// Item types
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Consumable,
    Weapon,
    Armor,
    #[default]
    Material,
    Quest,
}

/// Lookup table of item definitions by id
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    items: HashMap<u32, ItemDef>,
}

impl ItemCatalog {
    pub fn new(defs: impl IntoIterator<Item = ItemDef>) -> Self {
        Self {
            items: defs.into_iter().map(|def| (def.id, def)).collect(),
        }
    }

    pub fn get(&self, id: u32) -> Option<&ItemDef> {
        self.items.get(&id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.items.contains_key(&id)
    }

    /// Display name, falling back to the id for unknown items
    pub fn name_of(&self, id: u32) -> String {
        self.items
            .get(&id)
            .map(|def| def.name.clone())
            .unwrap_or_else(|| format!("item#{}", id))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Built-in item definitions used when no content file is loaded
pub fn get_item_definitions() -> Vec<ItemDef> {
    vec![
        ItemDef {
            id: 1,
            name: "Health Potion".into(),
            description: "Restores 50 health.".into(),
            item_type: ItemType::Consumable,
            stackable: true,
            max_stack: 20,
        },
        ItemDef {
            id: 2,
            name: "Slime Jelly".into(),
            description: "Sticky residue left behind by a slime.".into(),
            item_type: ItemType::Material,
            stackable: true,
            max_stack: 99,
        },
        ItemDef {
            id: 3,
            name: "Bone Fragment".into(),
            description: "A splinter of an animated skeleton.".into(),
            item_type: ItemType::Material,
            stackable: true,
            max_stack: 50,
        },
        ItemDef {
            id: 4,
            name: "Rusty Sword".into(),
            description: "A worn blade. Better than nothing.".into(),
            item_type: ItemType::Weapon,
            stackable: false,
            max_stack: 1,
        },
        ItemDef {
            id: 5,
            name: "Reaper's Scythe".into(),
            description: "Taken from the keeper of the sanctum.".into(),
            item_type: ItemType::Weapon,
            stackable: false,
            max_stack: 1,
        },
        ItemDef {
            id: 6,
            name: "Soul Shard".into(),
            description: "Hums faintly. Collectors pay well for these.".into(),
            item_type: ItemType::Quest,
            stackable: true,
            max_stack: 10,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_capacity() {
        let items = ItemCatalog::new(get_item_definitions());
        assert_eq!(items.get(1).map(ItemDef::slot_capacity), Some(20));
        assert_eq!(items.get(4).map(ItemDef::slot_capacity), Some(1));

        let broken = ItemDef {
            id: 99,
            name: "Broken".into(),
            description: String::new(),
            item_type: ItemType::Material,
            stackable: true,
            max_stack: 0,
        };
        assert_eq!(broken.slot_capacity(), 1);
    }

    #[test]
    fn test_item_defaults_from_json() {
        let def: ItemDef = serde_json::from_str(r#"{"id": 7, "name": "Pebble"}"#).unwrap();
        assert!(def.stackable);
        assert_eq!(def.max_stack, 99);
        assert_eq!(def.item_type, ItemType::Material);
    }

    #[test]
    fn test_name_of_unknown_item() {
        let items = ItemCatalog::new(get_item_definitions());
        assert_eq!(items.name_of(2), "Slime Jelly");
        assert_eq!(items.name_of(404), "item#404");
    }
}
