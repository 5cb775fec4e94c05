//! Typed per-entity operations layered over [`RecordStore`].

use async_trait::async_trait;
use cap_core::entities::Entity;
use serde_json::Value;

use crate::{RecordFilter, RecordStore, StoreError, WriteBatch};

fn decode<T: Entity>(body: Value) -> Result<T, StoreError> {
    serde_json::from_value(body)
        .map_err(|e| StoreError::Corrupt(format!("{} record: {e}", T::KIND)))
}

/// `create / find / list / update / delete` for any [`Entity`].
#[async_trait]
pub trait RecordStoreExt: RecordStore {
    /// Persist a new entity and return it.
    async fn create<T: Entity>(&self, entity: T) -> Result<T, StoreError> {
        let mut batch = WriteBatch::new();
        batch.insert(&entity)?;
        self.commit(batch).await?;
        Ok(entity)
    }

    async fn find<T: Entity>(&self, id: &str) -> Result<Option<T>, StoreError> {
        self.find_by_id(T::KIND, id).await?.map(decode).transpose()
    }

    /// Like [`find`](Self::find) but absence is an error.
    async fn get<T: Entity>(&self, id: &str) -> Result<T, StoreError> {
        self.find::<T>(id).await?.ok_or_else(|| StoreError::NotFound {
            kind: T::KIND,
            id: id.to_string(),
        })
    }

    async fn list_of<T: Entity>(&self, filter: &RecordFilter) -> Result<Vec<T>, StoreError> {
        self.list(T::KIND, filter)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    /// Apply a JSON merge patch and return the updated entity.
    async fn update<T: Entity>(&self, id: &str, patch: Value) -> Result<T, StoreError> {
        let mut batch = WriteBatch::new();
        batch.patch::<T>(id, patch);
        self.commit(batch).await?;
        self.get::<T>(id).await
    }

    async fn delete<T: Entity>(&self, id: &str) -> Result<(), StoreError> {
        let mut batch = WriteBatch::new();
        batch.delete::<T>(id);
        self.commit(batch).await
    }
}

impl<S: RecordStore + ?Sized> RecordStoreExt for S {}
