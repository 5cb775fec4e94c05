//! Record store configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_path() -> String {
    ".capstone/capstone.db".to_string()
}

const fn default_timeout_ms() -> u64 {
    2_000
}

const fn default_lock_timeout_ms() -> u64 {
    5_000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// libSQL database file, or `:memory:`.
    #[serde(default = "default_path")]
    pub path: String,

    /// Upper bound for a single store call.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Upper bound for acquiring the workflow locks of one operation.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

impl StoreConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    #[must_use]
    pub const fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.path == ":memory:"
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            timeout_ms: default_timeout_ms(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}
