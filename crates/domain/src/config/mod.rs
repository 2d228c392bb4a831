//! Configuration module for keycache
//!
//! - `root`: Main configuration and CLI overrides
//! - `cache`: TTL and change buffer settings
//! - `remote`: Remote key store location and polling
//! - `fallback`: Static fallback source settings
//! - `logging`: Logging settings
//! - `errors`: Configuration errors

pub mod cache;
pub mod errors;
pub mod fallback;
pub mod logging;
pub mod remote;
pub mod root;

pub use cache::CacheConfig;
pub use errors::ConfigError;
pub use fallback::FallbackConfig;
pub use logging::LoggingConfig;
pub use remote::RemoteConfig;
pub use root::{CliOverrides, Config};
