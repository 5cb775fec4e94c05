//! JSONL domain event journal.
//!
//! Appends committed [`DomainEvent`]s to `{dir}/events.jsonl`. Uses
//! `serde_jsonlines::append_json_lines` for per-line appends. The journal is a
//! feed for external notification systems, not a source of truth: a failed
//! append is logged and the already committed mutation stands.

use std::path::{Path, PathBuf};

use cap_core::events::{DomainEvent, EventRecord};
use chrono::Utc;

/// Current journal line format version.
const RECORD_VERSION: u32 = 1;

const FILE_NAME: &str = "events.jsonl";

pub struct EventJournal {
    dir: PathBuf,
    enabled: bool,
}

impl EventJournal {
    /// Create a journal writing into `dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns `std::io::Error` if the directory cannot be created.
    pub fn new(dir: PathBuf) -> std::io::Result<Self> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, enabled: true })
    }

    /// A journal that drops every event.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            dir: PathBuf::new(),
            enabled: false,
        }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.dir.join(FILE_NAME)
    }

    /// Append one event.
    ///
    /// # Errors
    ///
    /// Returns `std::io::Error` if the file write fails.
    pub fn append(&self, event: &DomainEvent) -> std::io::Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let record = EventRecord {
            v: RECORD_VERSION,
            ts: Utc::now(),
            event: event.clone(),
        };
        serde_jsonlines::append_json_lines(self.path(), [&record])
    }

    /// Read every journaled event in append order.
    ///
    /// # Errors
    ///
    /// Returns `std::io::Error` if the file cannot be read or a line is not a
    /// valid record. A journal that was never written reads as empty.
    pub fn read_all(&self) -> std::io::Result<Vec<EventRecord>> {
        if !self.enabled {
            return Ok(Vec::new());
        }
        read_journal(&self.path())
    }
}

fn read_journal(path: &Path) -> std::io::Result<Vec<EventRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    serde_jsonlines::json_lines(path)?.collect()
}
