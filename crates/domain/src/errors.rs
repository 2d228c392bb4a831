use thiserror::Error;

/// Errors surfaced by the resolution chain and its ports.
///
/// `Clone` because a single initialization outcome is handed to every caller
/// waiting on the same attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Key store unreachable while resolving {key}: {reason}")]
    Unreachable { key: String, reason: String },

    #[error("Key store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Invalid key: {0:?}")]
    InvalidKey(String),

    #[error("Invalid document {key}: {reason}")]
    InvalidDocument { key: String, reason: String },
}

impl DomainError {
    /// Whether the remote store answered authoritatively that the key does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DomainError::KeyNotFound(_))
    }

    /// Whether a later call may succeed without any change on the remote side.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DomainError::InitializationFailed(_)
                | DomainError::Unreachable { .. }
                | DomainError::StoreUnavailable(_)
        )
    }
}
