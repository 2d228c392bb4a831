use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Static fallback configuration
///
/// Consulted only when the remote chain (fresh cache, point fetch, stale cache)
/// yields nothing. Disable it where static defaults would be unsafe.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FallbackConfig {
    /// Whether the static source is consulted at all (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Prefix prepended to the key when reading the process environment
    /// (e.g. "APP_" makes key "GROQ_URL" read "APP_GROQ_URL")
    #[serde(default)]
    pub env_prefix: Option<String>,

    /// Fixed values checked before the environment
    #[serde(default)]
    pub values: HashMap<String, String>,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            env_prefix: None,
            values: HashMap::new(),
        }
    }
}

fn default_true() -> bool {
    true
}
