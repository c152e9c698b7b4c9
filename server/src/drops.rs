//! Drop table resolution.

use dungeon_shared::{DropTable, LootItem};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::rng::RandomSource;

/// Concrete loot produced by one death
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootResult {
    pub gold: u32,
    pub items: Vec<LootItem>,
}

impl LootResult {
    pub fn is_empty(&self) -> bool {
        self.gold == 0 && self.items.is_empty()
    }
}

/// Roll a drop table once.
///
/// Gold is drawn from `min_gold..=max_gold`. Each entry, in table order, is
/// skipped when boss-only outside a boss context, otherwise rolls `[0, 100)`
/// against its drop chance and, on success, draws a quantity from its range.
pub fn resolve(table: &DropTable, is_boss: bool, rng: &mut dyn RandomSource) -> LootResult {
    let gold = rng.range_inclusive(table.min_gold, table.max_gold);

    let mut items = Vec::new();
    for entry in &table.entries {
        if entry.boss_only && !is_boss {
            continue;
        }

        let roll = rng.unit() * 100.0;
        if roll <= entry.drop_chance {
            let quantity = rng
                .range_inclusive(entry.min_quantity, entry.max_quantity)
                .max(1);
            items.push(LootItem {
                item_id: entry.item_id,
                quantity,
            });
        }
    }

    debug!("Resolved drops: {} gold, {} item stacks", gold, items.len());
    LootResult { gold, items }
}
