//! Errors raised while building content definitions.

use thiserror::Error;

/// Invalid content configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("drop entry for item {item_id}: quantity range {min}..={max} is invalid")]
    InvalidQuantityRange { item_id: u32, min: u32, max: u32 },

    #[error("max gold {max} is below min gold {min}")]
    InvalidGoldRange { min: u32, max: u32 },

    #[error("drop chance {chance} for item {item_id} is outside 0..=100")]
    InvalidDropChance { item_id: u32, chance: f32 },

    #[error("capacity must be at least 1")]
    ZeroCapacity,

    #[error("unknown item id {0}")]
    UnknownItem(u32),

    #[error("unknown monster template '{0}'")]
    UnknownMonster(String),

    #[error("duplicate {kind} '{id}'")]
    Duplicate { kind: &'static str, id: String },
}
