//! Dungeon combat simulation: monster AI, loot, inventory and spawning.

pub mod drops;
pub mod entities;
pub mod error;
pub mod rng;
pub mod runner;
pub mod world;

use std::time::Duration;

pub use error::ContentError;
pub use rng::{RandSource, RandomSource, ScriptedSource};
pub use world::GameWorld;

/// Convert content seconds into a duration, treating negative or NaN values as zero
pub fn secs(value: f32) -> Duration {
    Duration::try_from_secs_f32(value.max(0.0)).unwrap_or(Duration::ZERO)
}
