use crate::{DomainError, KeyDocument};
use std::fmt;

/// Kind of change reported by a key store subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Incremental change pushed by a key store subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    Added { key: String, value: String },
    Modified { key: String, value: String },
    Removed { key: String },
}

impl ChangeEvent {
    pub fn added(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Added {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn modified(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Modified {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn removed(key: impl Into<String>) -> Self {
        Self::Removed { key: key.into() }
    }

    pub fn kind(&self) -> ChangeKind {
        match self {
            Self::Added { .. } => ChangeKind::Added,
            Self::Modified { .. } => ChangeKind::Modified,
            Self::Removed { .. } => ChangeKind::Removed,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::Added { key, .. } | Self::Modified { key, .. } | Self::Removed { key } => key,
        }
    }

    /// Payload carried by additions and modifications.
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Added { value, .. } | Self::Modified { value, .. } => Some(value),
            Self::Removed { .. } => None,
        }
    }

    /// Reject events that cannot be applied to the cache.
    pub fn validate(&self) -> Result<(), DomainError> {
        match self {
            Self::Added { key, value } | Self::Modified { key, value } => {
                KeyDocument::new(key.as_str(), value.as_str()).validate()
            }
            Self::Removed { key } => crate::validate_key(key),
        }
    }
}
