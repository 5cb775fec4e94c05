//! Atomic multi-record write batches.

use cap_core::entities::Entity;
use cap_core::enums::EntityType;
use serde_json::Value;

use crate::StoreError;

/// A single record write.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Create a record. Fails with `Conflict` if the id or unique key is taken.
    Insert {
        kind: EntityType,
        id: String,
        unique_key: Option<String>,
        body: Value,
    },
    /// Overwrite an existing record body. Fails with `NotFound` if absent.
    Replace {
        kind: EntityType,
        id: String,
        unique_key: Option<String>,
        body: Value,
    },
    /// Apply a JSON merge patch (RFC 7396) to an existing record.
    Patch {
        kind: EntityType,
        id: String,
        patch: Value,
    },
    /// Hard delete. Fails with `NotFound` if absent.
    Delete { kind: EntityType, id: String },
}

impl Mutation {
    #[must_use]
    pub const fn kind(&self) -> EntityType {
        match self {
            Self::Insert { kind, .. }
            | Self::Replace { kind, .. }
            | Self::Patch { kind, .. }
            | Self::Delete { kind, .. } => *kind,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Insert { id, .. }
            | Self::Replace { id, .. }
            | Self::Patch { id, .. }
            | Self::Delete { id, .. } => id,
        }
    }
}

/// Ordered list of mutations committed as one unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    mutations: Vec<Mutation>,
}

impl WriteBatch {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            mutations: Vec::new(),
        }
    }

    /// Queue creation of `entity`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Corrupt` if the entity cannot be serialized.
    pub fn insert<T: Entity>(&mut self, entity: &T) -> Result<&mut Self, StoreError> {
        self.mutations.push(Mutation::Insert {
            kind: T::KIND,
            id: entity.id().to_string(),
            unique_key: entity.unique_key(),
            body: serde_json::to_value(entity)?,
        });
        Ok(self)
    }

    /// Queue a full overwrite of `entity`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Corrupt` if the entity cannot be serialized.
    pub fn replace<T: Entity>(&mut self, entity: &T) -> Result<&mut Self, StoreError> {
        self.mutations.push(Mutation::Replace {
            kind: T::KIND,
            id: entity.id().to_string(),
            unique_key: entity.unique_key(),
            body: serde_json::to_value(entity)?,
        });
        Ok(self)
    }

    pub fn patch<T: Entity>(&mut self, id: &str, patch: Value) -> &mut Self {
        self.mutations.push(Mutation::Patch {
            kind: T::KIND,
            id: id.to_string(),
            patch,
        });
        self
    }

    pub fn delete<T: Entity>(&mut self, id: &str) -> &mut Self {
        self.mutations.push(Mutation::Delete {
            kind: T::KIND,
            id: id.to_string(),
        });
        self
    }

    pub fn push(&mut self, mutation: Mutation) -> &mut Self {
        self.mutations.push(mutation);
        self
    }

    #[must_use]
    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    #[must_use]
    pub fn into_mutations(self) -> Vec<Mutation> {
        self.mutations
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}
