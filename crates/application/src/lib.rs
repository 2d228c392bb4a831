//! Keycache Application Layer
//!
//! Ports implemented by the infrastructure layer: the remote key store, the
//! static fallback source and the caller-facing resolver contract.
pub mod ports;
