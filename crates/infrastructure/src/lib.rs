//! Keycache Infrastructure Layer
//!
//! - `keys`: cache store, single-flight initialization, change reconciliation,
//!   the cached resolver, the static fallback layer and the `KeyService` facade
//! - `remote`: `RemoteKeyStore` adapters (in-memory, JSON document file)
//! - `static_source`: `StaticKeySource` adapters (environment, fixed map)
pub mod keys;
pub mod remote;
pub mod static_source;
