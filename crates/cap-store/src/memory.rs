//! In-process record store.
//!
//! Suitable for tests, single-process embedders, and development. Records are
//! lost when the store is dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use cap_core::enums::EntityType;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::{Mutation, RecordFilter, RecordStore, StoreError, WriteBatch, merge_patch};

type Key = (EntityType, String);

#[derive(Debug, Clone)]
struct Stored {
    seq: u64,
    unique_key: Option<String>,
    body: Value,
}

#[derive(Debug, Default)]
struct Tables {
    records: HashMap<Key, Stored>,
    unique: HashMap<Key, String>,
    next_seq: u64,
}

impl Tables {
    /// Swap the slot for `key`, keeping the unique index in step. Returns the
    /// previous occupant so callers can undo.
    fn put(&mut self, key: Key, value: Option<Stored>) -> Option<Stored> {
        let previous = match value {
            Some(stored) => {
                if let Some(unique_key) = &stored.unique_key {
                    self.unique.insert((key.0, unique_key.clone()), key.1.clone());
                }
                self.records.insert(key.clone(), stored)
            }
            None => self.records.remove(&key),
        };
        if let Some(old_key) = previous.as_ref().and_then(|p| p.unique_key.clone()) {
            let still_used = self
                .records
                .get(&key)
                .is_some_and(|s| s.unique_key.as_deref() == Some(old_key.as_str()));
            if !still_used {
                self.unique.remove(&(key.0, old_key));
            }
        }
        previous
    }

    fn check_unique(&self, kind: EntityType, id: &str, unique_key: Option<&String>) -> Result<(), StoreError> {
        if let Some(unique_key) = unique_key {
            if let Some(owner) = self.unique.get(&(kind, unique_key.clone())) {
                if owner != id {
                    return Err(StoreError::Conflict {
                        kind,
                        key: unique_key.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn apply(&mut self, mutation: Mutation) -> Result<(Key, Option<Stored>), StoreError> {
        match mutation {
            Mutation::Insert {
                kind,
                id,
                unique_key,
                body,
            } => {
                let key = (kind, id);
                if self.records.contains_key(&key) {
                    return Err(StoreError::Conflict { kind, key: key.1 });
                }
                self.check_unique(kind, &key.1, unique_key.as_ref())?;
                let seq = self.next_seq;
                self.next_seq += 1;
                let previous = self.put(key.clone(), Some(Stored { seq, unique_key, body }));
                Ok((key, previous))
            }
            Mutation::Replace {
                kind,
                id,
                unique_key,
                body,
            } => {
                let key = (kind, id);
                let seq = self.existing(&key)?.seq;
                self.check_unique(kind, &key.1, unique_key.as_ref())?;
                let previous = self.put(key.clone(), Some(Stored { seq, unique_key, body }));
                Ok((key, previous))
            }
            Mutation::Patch { kind, id, patch } => {
                let key = (kind, id);
                let mut stored = self.existing(&key)?.clone();
                merge_patch(&mut stored.body, &patch);
                let previous = self.put(key.clone(), Some(stored));
                Ok((key, previous))
            }
            Mutation::Delete { kind, id } => {
                let key = (kind, id);
                self.existing(&key)?;
                let previous = self.put(key.clone(), None);
                Ok((key, previous))
            }
        }
    }

    fn existing(&self, key: &Key) -> Result<&Stored, StoreError> {
        self.records.get(key).ok_or_else(|| StoreError::NotFound {
            kind: key.0,
            id: key.1.clone(),
        })
    }
}

/// Record store backed by a `HashMap` behind a tokio `RwLock`.
///
/// A commit holds the write lock for the whole batch and rolls back already
/// applied mutations if a later one fails.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    failures: AtomicU32,
    latency_ms: AtomicU64,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` calls fail with `StoreError::Unavailable`.
    pub fn fail_next(&self, count: u32) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        let millis = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.latency_ms.store(millis, Ordering::SeqCst);
    }

    /// Number of stored records of `kind`.
    pub async fn count(&self, kind: EntityType) -> usize {
        self.tables
            .read()
            .await
            .records
            .keys()
            .filter(|(k, _)| *k == kind)
            .count()
    }

    async fn gate(&self) -> Result<(), StoreError> {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        let injected = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if injected.is_ok() {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find_by_id(&self, kind: EntityType, id: &str) -> Result<Option<Value>, StoreError> {
        self.gate().await?;
        let tables = self.tables.read().await;
        Ok(tables
            .records
            .get(&(kind, id.to_string()))
            .map(|s| s.body.clone()))
    }

    async fn list(
        &self,
        kind: EntityType,
        filter: &RecordFilter,
    ) -> Result<Vec<Value>, StoreError> {
        filter.validate()?;
        self.gate().await?;
        let tables = self.tables.read().await;
        let mut hits: Vec<&Stored> = tables
            .records
            .iter()
            .filter(|((k, _), stored)| *k == kind && filter.matches(&stored.body))
            .map(|(_, stored)| stored)
            .collect();
        hits.sort_by_key(|s| s.seq);
        if filter.is_newest_first() {
            hits.reverse();
        }
        let limit = filter.max_results().unwrap_or(usize::MAX);
        Ok(hits.into_iter().take(limit).map(|s| s.body.clone()).collect())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        self.gate().await?;
        let mut tables = self.tables.write().await;
        let seq_before = tables.next_seq;
        let mut undo: Vec<(Key, Option<Stored>)> = Vec::with_capacity(batch.len());

        for mutation in batch.into_mutations() {
            match tables.apply(mutation) {
                Ok(entry) => undo.push(entry),
                Err(err) => {
                    for (key, previous) in undo.into_iter().rev() {
                        tables.put(key, previous);
                    }
                    tables.next_seq = seq_before;
                    tracing::debug!(error = %err, "memory store: batch rolled back");
                    return Err(err);
                }
            }
        }
        Ok(())
    }
}
