use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Remote key store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteConfig {
    /// Path to the JSON document collection (`{"KEY": {"value": "..."}}`).
    /// If None, the CLI starts with an empty in-memory store.
    #[serde(default)]
    pub documents_path: Option<String>,

    /// How often the file-backed subscription checks for changes, in
    /// milliseconds (default: 1000)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl RemoteConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            documents_path: None,
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    1000
}
