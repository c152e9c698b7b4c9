//! Content loading errors.

use dungeon_shared::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read content file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse content: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid content: {0}")]
    Config(#[from] ConfigError),
}
