//! Simulation entities: combatants, monsters, the player, inventory and loot.

pub mod combatant;
pub mod inventory;
pub mod loot;
pub mod monster;
pub mod player;

pub use combatant::{CombatantState, DamageOutcome};
pub use inventory::Inventory;
pub use loot::{Claim, ClaimStatus, LootContainer};
pub use monster::{
    AttackIntent, BehaviorContext, DamageReport, Monster, MonsterState, Scaling, TargetObservation,
};
pub use player::{Player, PlayerDef, Wallet};
