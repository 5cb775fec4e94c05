//! # cap-store
//!
//! Storage abstraction for Capstone.
//!
//! Backends (the in-process [`MemoryStore`] here, `LibsqlStore` in `cap-db`)
//! implement [`RecordStore`] so the workflow crate never depends on a specific
//! database engine. Every entity is one JSON record filed under its
//! [`EntityType`](cap_core::enums::EntityType) and id.
//!
//! Writes go through [`WriteBatch`]: a batch is applied atomically, so a
//! multi-record mutation and its audit entry either all land or none do.

mod batch;
mod error;
mod filter;
mod memory;
mod patch;
mod typed;

pub use batch::{Mutation, WriteBatch};
pub use error::StoreError;
pub use filter::{Condition, RecordFilter};
pub use memory::MemoryStore;
pub use patch::merge_patch;
pub use typed::RecordStoreExt;

use async_trait::async_trait;
use cap_core::enums::EntityType;
use serde_json::Value;

/// Persistence port used by the workflow.
///
/// Implementations must apply a [`WriteBatch`] all-or-nothing and must enforce
/// uniqueness of `(kind, id)` and of `(kind, unique_key)` for keyed records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch a single record body.
    async fn find_by_id(&self, kind: EntityType, id: &str) -> Result<Option<Value>, StoreError>;

    /// All records of `kind` matching `filter`, in insertion order unless the
    /// filter asks for newest first.
    async fn list(&self, kind: EntityType, filter: &RecordFilter)
    -> Result<Vec<Value>, StoreError>;

    /// Apply every mutation in `batch` atomically.
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;
}
