//! Fixed-capacity slot inventory with stacking rules.

use std::cmp::Ordering;

use dungeon_shared::{ConfigError, InventorySlot, ItemCatalog, ItemDef};
use log::warn;

#[derive(Debug, Clone)]
pub struct Inventory {
    slots: Vec<Option<InventorySlot>>,
}

impl Inventory {
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(Self {
            slots: vec![None; capacity],
        })
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[Option<InventorySlot>] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&InventorySlot> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Total quantity of `item_id` across all slots
    pub fn count(&self, item_id: u32) -> u32 {
        self.slots
            .iter()
            .flatten()
            .filter(|slot| slot.item_id == item_id)
            .map(|slot| slot.quantity)
            .sum()
    }

    /// Add `quantity` units, returning true only if everything was placed
    pub fn add_item(&mut self, item: &ItemDef, quantity: u32) -> bool {
        quantity > 0 && self.insert(item, quantity) == 0
    }

    /// Place as many units as fit and return how many were left over.
    ///
    /// Stackable items top up existing stacks in slot order first, then fill
    /// empty slots up to the stack limit. Non-stackable items place a single
    /// unit per call.
    pub fn insert(&mut self, item: &ItemDef, quantity: u32) -> u32 {
        if quantity == 0 {
            return 0;
        }

        if !item.stackable {
            let Some(empty) = self.slots.iter_mut().find(|slot| slot.is_none()) else {
                return quantity;
            };
            *empty = Some(InventorySlot {
                item_id: item.id,
                quantity: 1,
            });
            let leftover = quantity - 1;
            if leftover > 0 {
                warn!(
                    "'{}' is not stackable: placed 1, {} left unplaced",
                    item.name, leftover
                );
            }
            return leftover;
        }

        let max_stack = item.slot_capacity();
        let mut remaining = quantity;

        for slot in self.slots.iter_mut().flatten() {
            if remaining == 0 {
                break;
            }
            if slot.item_id == item.id && slot.quantity < max_stack {
                let added = (max_stack - slot.quantity).min(remaining);
                slot.quantity += added;
                remaining -= added;
            }
        }

        for slot in &mut self.slots {
            if remaining == 0 {
                break;
            }
            if slot.is_none() {
                let added = remaining.min(max_stack);
                *slot = Some(InventorySlot {
                    item_id: item.id,
                    quantity: added,
                });
                remaining -= added;
            }
        }

        remaining
    }

    /// Remove up to `quantity` from one slot, clearing it when it empties.
    /// Returns the amount actually removed.
    pub fn remove_from_slot(&mut self, index: usize, quantity: u32) -> u32 {
        let Some(entry) = self.slots.get_mut(index) else {
            return 0;
        };
        let Some(slot) = entry.as_mut() else {
            return 0;
        };

        let removed = quantity.min(slot.quantity);
        slot.quantity -= removed;
        if slot.quantity == 0 {
            *entry = None;
        }
        removed
    }

    /// Remove `quantity` from the first slot holding at least that many units.
    /// Partial stacks are not combined.
    pub fn remove_item(&mut self, item_id: u32, quantity: u32) -> bool {
        if quantity == 0 {
            return false;
        }
        let index = self.slots.iter().position(|slot| {
            slot.as_ref()
                .is_some_and(|s| s.item_id == item_id && s.quantity >= quantity)
        });
        match index {
            Some(index) => self.remove_from_slot(index, quantity) == quantity,
            None => false,
        }
    }

    pub fn swap_slots(&mut self, a: usize, b: usize) -> bool {
        if a >= self.slots.len() || b >= self.slots.len() {
            return false;
        }
        self.slots.swap(a, b);
        true
    }

    /// Stable sort by item name with empty slots last
    pub fn sort_by_name(&mut self, catalog: &ItemCatalog) {
        self.slots.sort_by(|a, b| match (a, b) {
            (Some(a), Some(b)) => catalog.name_of(a.item_id).cmp(&catalog.name_of(b.item_id)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dungeon_shared::{get_item_definitions, ItemType};
    use proptest::prelude::*;

    fn item(id: u32, name: &str, stackable: bool, max_stack: u32) -> ItemDef {
        ItemDef {
            id,
            name: name.into(),
            description: String::new(),
            item_type: ItemType::Material,
            stackable,
            max_stack,
        }
    }

    fn slot(item_id: u32, quantity: u32) -> Option<InventorySlot> {
        Some(InventorySlot { item_id, quantity })
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(Inventory::new(0).unwrap_err(), ConfigError::ZeroCapacity);
    }

    #[test]
    fn test_stack_fill() {
        let a = item(1, "A", true, 10);
        let mut inventory = Inventory::new(2).unwrap();

        assert!(inventory.add_item(&a, 7));
        assert_eq!(inventory.slots(), &[slot(1, 7), None]);

        assert!(inventory.add_item(&a, 5));
        assert_eq!(inventory.slots(), &[slot(1, 10), slot(1, 2)]);
    }

    #[test]
    fn test_full_inventory_rejects() {
        let a = item(1, "A", true, 10);
        let mut inventory = Inventory::new(1).unwrap();
        assert!(inventory.add_item(&a, 10));

        assert!(!inventory.add_item(&a, 1));
        assert_eq!(inventory.slots(), &[slot(1, 10)]);
        assert!(inventory.is_full());
    }

    #[test]
    fn test_partial_add_reports_leftover() {
        let a = item(1, "A", true, 10);
        let mut inventory = Inventory::new(2).unwrap();
        assert_eq!(inventory.insert(&a, 25), 5);
        assert_eq!(inventory.count(1), 20);
    }

    #[test]
    fn test_zero_quantity_is_noop() {
        let a = item(1, "A", true, 10);
        let mut inventory = Inventory::new(2).unwrap();
        assert!(!inventory.add_item(&a, 0));
        assert_eq!(inventory.slots(), &[None, None]);
    }

    #[test]
    fn test_non_stackable_places_one_per_call() {
        let sword = item(4, "Sword", false, 1);
        let mut inventory = Inventory::new(3).unwrap();

        assert!(inventory.add_item(&sword, 1));
        assert!(!inventory.add_item(&sword, 3));
        assert_eq!(inventory.slots(), &[slot(4, 1), slot(4, 1), None]);
        assert_eq!(inventory.insert(&sword, 2), 1);
        assert!(inventory.is_full());
        assert_eq!(inventory.insert(&sword, 1), 1);
    }

    #[test]
    fn test_remove_from_slot() {
        let a = item(1, "A", true, 10);
        let mut inventory = Inventory::new(2).unwrap();
        inventory.add_item(&a, 6);

        assert_eq!(inventory.remove_from_slot(0, 4), 4);
        assert_eq!(inventory.slots(), &[slot(1, 2), None]);
        assert_eq!(inventory.remove_from_slot(0, 9), 2);
        assert_eq!(inventory.slots(), &[None, None]);
        assert_eq!(inventory.remove_from_slot(0, 1), 0);
        assert_eq!(inventory.remove_from_slot(7, 1), 0);
    }

    #[test]
    fn test_remove_item_needs_single_slot() {
        let a = item(1, "A", true, 10);
        let mut inventory = Inventory::new(3).unwrap();
        inventory.add_item(&a, 14);
        assert_eq!(inventory.slots(), &[slot(1, 10), slot(1, 4), None]);

        // 12 units exist but no single slot holds them
        assert!(!inventory.remove_item(1, 12));
        assert_eq!(inventory.count(1), 14);

        assert!(inventory.remove_item(1, 4));
        assert_eq!(inventory.slots(), &[slot(1, 6), slot(1, 4), None]);
        assert!(!inventory.remove_item(2, 1));
    }

    #[test]
    fn test_sort_by_name_is_stable() {
        let catalog = ItemCatalog::new(get_item_definitions());
        let mut inventory = Inventory::new(5).unwrap();
        let potion = catalog.get(1).unwrap().clone();
        let jelly = catalog.get(2).unwrap().clone();
        let bone = catalog.get(3).unwrap().clone();

        inventory.add_item(&jelly, 3);
        inventory.add_item(&potion, 25);
        inventory.add_item(&bone, 1);
        inventory.remove_from_slot(0, 3);
        // [None, Potion 20, Potion 5, Bone 1, None]

        inventory.sort_by_name(&catalog);
        assert_eq!(
            inventory.slots(),
            &[slot(3, 1), slot(1, 20), slot(1, 5), None, None]
        );
    }

    #[test]
    fn test_swap_slots() {
        let a = item(1, "A", true, 10);
        let mut inventory = Inventory::new(2).unwrap();
        inventory.add_item(&a, 1);
        assert!(inventory.swap_slots(0, 1));
        assert_eq!(inventory.slots(), &[None, slot(1, 1)]);
        assert!(!inventory.swap_slots(0, 2));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(usize, u32),
        RemoveSlot(usize, u32),
        RemoveItem(usize, u32),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..3, 1u32..30).prop_map(|(i, q)| Op::Add(i, q)),
            (0usize..6, 1u32..15).prop_map(|(s, q)| Op::RemoveSlot(s, q)),
            (0usize..3, 1u32..15).prop_map(|(i, q)| Op::RemoveItem(i, q)),
        ]
    }

    proptest! {
        #[test]
        fn test_stacking_invariant(ops in prop::collection::vec(op(), 1..60)) {
            let items = [
                item(1, "Ore", true, 10),
                item(2, "Herb", true, 3),
                item(3, "Shield", false, 1),
            ];
            let mut inventory = Inventory::new(6).unwrap();
            let mut expected = [0u32; 3];

            for op in ops {
                match op {
                    Op::Add(i, q) => {
                        let leftover = inventory.insert(&items[i], q);
                        expected[i] += q - leftover;
                    }
                    Op::RemoveSlot(s, q) => {
                        let held = inventory.slot(s).map(|slot| slot.item_id);
                        let removed = inventory.remove_from_slot(s, q);
                        if let Some(id) = held {
                            expected[(id - 1) as usize] -= removed;
                        }
                    }
                    Op::RemoveItem(i, q) => {
                        if inventory.remove_item(items[i].id, q) {
                            expected[i] -= q;
                        }
                    }
                }

                for (i, def) in items.iter().enumerate() {
                    prop_assert_eq!(inventory.count(def.id), expected[i]);
                }
                for slot in inventory.slots().iter().flatten() {
                    let def = &items[(slot.item_id - 1) as usize];
                    prop_assert!(slot.quantity >= 1);
                    prop_assert!(slot.quantity <= def.slot_capacity());
                }
            }
        }
    }
}
