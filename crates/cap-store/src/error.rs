use cap_core::enums::EntityType;
use thiserror::Error;

/// Uniform error type for all record store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend unreachable, locked, or timed out. Safe to retry.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("{kind} {id} not found")]
    NotFound { kind: EntityType, id: String },

    /// Duplicate id or unique key within a kind.
    #[error("{kind} with key {key} already exists")]
    Conflict { kind: EntityType, key: String },

    /// A stored body could not be encoded or decoded.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Corrupt(err.to_string())
    }
}
