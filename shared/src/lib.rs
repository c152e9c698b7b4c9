pub mod protocol;
pub mod entities;
pub mod items;
pub mod error;

pub use protocol::*;
pub use entities::*;
pub use items::*;
pub use error::ConfigError;
