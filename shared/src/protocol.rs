//! Simulation constants, presentation cues and world events.

use serde::{Deserialize, Serialize};

/// Simulation tick rate in Hz
pub const SIM_TICK_RATE: u32 = 20;

/// Delay before a monster recovers from a hit stagger
pub const HIT_RECOVERY_SECS: f32 = 0.5;

/// Time a corpse stays in the world before it is cleaned up
pub const DEATH_CLEANUP_SECS: f32 = 5.0;

/// Lifetime of an unclaimed loot container
pub const LOOT_LIFETIME_SECS: f32 = 30.0;

/// Channel time for looting a container
pub const LOOT_CHANNEL_SECS: f32 = 2.0;

/// Max distance between the player and a container while looting
pub const LOOT_REACH: f32 = 2.5;

pub const DEFAULT_INVENTORY_SIZE: usize = 15;

/// Monsters kept alive or pooled at once
pub const DEFAULT_POOL_SIZE: usize = 20;

// =============================================================================
// Presentation Cues
// =============================================================================

/// Animation triggered on a monster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationCue {
    Idle,
    Walk,
    LookFor,
    /// Attack animation by pattern cue index
    Attack(u8),
    Hit,
    Die,
}

/// Sound triggered on a monster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioCue {
    Attack,
    Hit,
    Death,
    Search,
}

// =============================================================================
// Inventory Types
// =============================================================================

/// An occupied inventory slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySlot {
    pub item_id: u32,
    pub quantity: u32,
}

/// Item stack inside a loot result or container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootItem {
    pub item_id: u32,
    pub quantity: u32,
}

// =============================================================================
// World Events
// =============================================================================

/// Why a spawn attempt did not produce a monster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnSkipReason {
    AtCapacity,
    PoolExhausted,
    UnknownMonster,
}

/// Things that happened during an update, drained by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldEvent {
    MonsterSpawned {
        monster: u64,
        site: String,
        name: String,
        position: [f32; 3],
    },
    MonsterAttacked {
        monster: u64,
        pattern: String,
        damage: u32,
        player_health: u32,
    },
    MonsterDamaged {
        monster: u64,
        amount: u32,
        health: u32,
    },
    MonsterDied {
        monster: u64,
        name: String,
    },
    LootDropped {
        loot: u64,
        monster: u64,
        position: [f32; 3],
        gold: u32,
        items: Vec<LootItem>,
    },
    LootClaimed {
        loot: u64,
        items: Vec<LootItem>,
        complete: bool,
    },
    LootExpired {
        loot: u64,
    },
    GoldAwarded {
        amount: u32,
        total: u64,
    },
    MonsterDespawned {
        monster: u64,
    },
    PlayerDied,
    SpawnSkipped {
        site: String,
        reason: SpawnSkipReason,
    },
}
