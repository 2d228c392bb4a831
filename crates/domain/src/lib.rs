//! Keycache Domain Layer
pub mod change_event;
pub mod config;
pub mod errors;
pub mod key_document;

pub use change_event::{ChangeEvent, ChangeKind};
pub use config::{CliOverrides, Config, ConfigError};
pub use errors::DomainError;
pub use key_document::{validate_key, KeyDocument};
