//! Loot containers dropped by dead monsters.

use std::time::Duration;

use dungeon_shared::{ItemCatalog, LootItem};
use log::error;

use super::inventory::Inventory;
use super::player::Wallet;
use crate::drops::LootResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimStatus {
    /// Everything was taken, the container can be removed
    Complete,
    /// Inventory ran out of room; the remainder stays in the container
    Partial,
}

/// What a single claim moved out of the container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub status: ClaimStatus,
    pub gold: u32,
    pub items: Vec<LootItem>,
}

/// Resolved loot waiting in the world until claimed or expired
#[derive(Debug, Clone)]
pub struct LootContainer {
    pub id: u64,
    /// Monster whose death produced this loot
    pub source: u64,
    pub position: [f32; 3],
    pub expires_at: Duration,
    gold: u32,
    items: Vec<LootItem>,
    being_looted: bool,
}

impl LootContainer {
    pub fn new(
        id: u64,
        source: u64,
        position: [f32; 3],
        loot: LootResult,
        expires_at: Duration,
    ) -> Self {
        Self {
            id,
            source,
            position,
            expires_at,
            gold: loot.gold,
            items: loot.items,
            being_looted: false,
        }
    }

    pub fn gold(&self) -> u32 {
        self.gold
    }

    pub fn items(&self) -> &[LootItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.gold == 0 && self.items.is_empty()
    }

    pub fn is_being_looted(&self) -> bool {
        self.being_looted
    }

    /// Start the loot channel. Fails when already channelling or empty.
    pub fn begin_loot(&mut self) -> bool {
        if self.being_looted || self.is_empty() {
            return false;
        }
        self.being_looted = true;
        true
    }

    pub fn cancel_loot(&mut self) {
        self.being_looted = false;
    }

    /// Move gold into the wallet and items into the inventory in order,
    /// stopping at the first entry that does not fit.
    pub fn complete_loot(
        &mut self,
        inventory: &mut Inventory,
        wallet: &mut Wallet,
        catalog: &ItemCatalog,
    ) -> Claim {
        self.being_looted = false;

        let gold = std::mem::take(&mut self.gold);
        wallet.add_gold(gold);

        let mut taken = Vec::new();
        let mut status = ClaimStatus::Complete;
        while let Some(entry) = self.items.first().copied() {
            let Some(def) = catalog.get(entry.item_id) else {
                error!(
                    "Loot container {} holds unknown item {}, discarding",
                    self.id, entry.item_id
                );
                self.items.remove(0);
                continue;
            };

            let leftover = inventory.insert(def, entry.quantity);
            let placed = entry.quantity - leftover;
            if placed > 0 {
                taken.push(LootItem {
                    item_id: entry.item_id,
                    quantity: placed,
                });
            }

            if leftover > 0 {
                self.items[0].quantity = leftover;
                status = ClaimStatus::Partial;
                break;
            }
            self.items.remove(0);
        }

        Claim {
            status,
            gold,
            items: taken,
        }
    }
}
