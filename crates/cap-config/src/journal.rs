//! Domain event journal configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct JournalConfig {
    /// Directory for `events.jsonl`. Empty disables the journal.
    #[serde(default)]
    pub dir: String,
}

impl JournalConfig {
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.dir.is_empty()
    }

    #[must_use]
    pub fn dir_path(&self) -> Option<PathBuf> {
        self.is_configured().then(|| PathBuf::from(&self.dir))
    }
}
