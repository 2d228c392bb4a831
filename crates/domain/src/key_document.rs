use crate::DomainError;
use serde::{Deserialize, Serialize};

const MAX_KEY_LEN: usize = 256;

/// A single credential document as delivered by a remote key store.
///
/// The document id is the key; `value` is the only payload field a store
/// adapter must provide. Adapters translate whatever their backend returns
/// into this shape and reject documents without a value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct KeyDocument {
    pub key: String,
    pub value: String,
}

impl KeyDocument {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Check both the key and the payload.
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_key(&self.key)?;
        if self.value.is_empty() {
            return Err(DomainError::InvalidDocument {
                key: self.key.clone(),
                reason: "value is empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Keys are non-empty, bounded and free of whitespace and control characters.
pub fn validate_key(key: &str) -> Result<(), DomainError> {
    if key.is_empty()
        || key.len() > MAX_KEY_LEN
        || key.chars().any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(DomainError::InvalidKey(key.to_string()));
    }
    Ok(())
}
