//! Service layer orchestrating record store mutations with audit and events.
//!
//! `PortalService` wraps a [`RecordStore`] (persistence), a [`LockTable`]
//! (check-then-act exclusion), a broadcast channel (domain events), and an
//! [`EventJournal`] (JSONL event feed). All workflow operations are
//! implemented as `impl PortalService` blocks under [`crate::flows`].

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use cap_config::{CapConfig, StoreConfig, WorkflowConfig};
use cap_core::audit_detail::StatusChangedDetail;
use cap_core::entities::{AuditEntry, Entity};
use cap_core::enums::{AuditAction, EntityType};
use cap_core::errors::CoreError;
use cap_core::events::DomainEvent;
use cap_core::ids::{PREFIX_AUDIT, generate_id};
use cap_store::{RecordFilter, RecordStore, RecordStoreExt, StoreError, WriteBatch};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::journal::EventJournal;
use crate::locks::{LockKey, LockSet, LockTable};
use crate::WorkflowError;

/// The workflow engine.
///
/// Every mutation method follows this protocol:
/// 1. Acquire locks (bounded by the lock timeout)
/// 2. Re-read and validate
/// 3. Stage mutations and audit entries in a [`Changeset`]
/// 4. Commit the batch (bounded by the store timeout)
/// 5. Publish events
pub struct PortalService {
    store: Arc<dyn RecordStore>,
    locks: LockTable,
    limits: WorkflowConfig,
    store_timeout: Duration,
    lock_timeout: Duration,
    events: broadcast::Sender<DomainEvent>,
    journal: EventJournal,
}

impl PortalService {
    /// Create a service over `store` configured from `config`.
    ///
    /// # Errors
    ///
    /// Returns `std::io::Error` if the configured journal directory cannot be
    /// created.
    pub fn new(store: Arc<dyn RecordStore>, config: &CapConfig) -> std::io::Result<Self> {
        let journal = match config.journal.dir_path() {
            Some(dir) => EventJournal::new(dir)?,
            None => EventJournal::disabled(),
        };
        Ok(Self::from_parts(
            store,
            config.workflow.clone(),
            &config.store,
            journal,
        ))
    }

    /// Create from explicit parts (for testing and embedders).
    #[must_use]
    pub fn from_parts(
        store: Arc<dyn RecordStore>,
        limits: WorkflowConfig,
        store_config: &StoreConfig,
        journal: EventJournal,
    ) -> Self {
        let (events, _) = broadcast::channel(limits.event_channel_capacity.max(1));
        Self {
            store,
            locks: LockTable::new(),
            limits,
            store_timeout: store_config.timeout(),
            lock_timeout: store_config.lock_timeout(),
            events,
            journal,
        }
    }

    /// Receive every domain event published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.events.subscribe()
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    #[must_use]
    pub const fn limits(&self) -> &WorkflowConfig {
        &self.limits
    }

    #[must_use]
    pub const fn journal(&self) -> &EventJournal {
        &self.journal
    }

    pub(crate) fn max_group_size(&self) -> usize {
        self.limits.max_group_size as usize
    }

    pub(crate) async fn lock(
        &self,
        keys: impl IntoIterator<Item = LockKey>,
    ) -> Result<LockSet, WorkflowError> {
        self.locks.acquire(keys, self.lock_timeout).await
    }

    /// Bound a store call by the configured store timeout.
    pub(crate) async fn timed<T, F>(&self, call: F) -> Result<T, WorkflowError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        tokio::time::timeout(self.store_timeout, call)
            .await
            .map_err(|_| {
                WorkflowError::StoreUnavailable(format!(
                    "store call exceeded {:?}",
                    self.store_timeout
                ))
            })?
            .map_err(WorkflowError::from)
    }

    pub(crate) async fn find<T: Entity>(&self, id: &str) -> Result<Option<T>, WorkflowError> {
        self.timed(self.store.find::<T>(id)).await
    }

    pub(crate) async fn load<T: Entity>(&self, id: &str) -> Result<T, WorkflowError> {
        self.timed(self.store.get::<T>(id)).await
    }

    pub(crate) async fn query<T: Entity>(
        &self,
        filter: &RecordFilter,
    ) -> Result<Vec<T>, WorkflowError> {
        self.timed(self.store.list_of::<T>(filter)).await
    }

    /// Commit a changeset and publish its events.
    ///
    /// If the commit times out the outcome is unknown to the caller: the
    /// backend may still have applied it. No events are published in that
    /// case.
    pub(crate) async fn apply(&self, changes: Changeset) -> Result<(), WorkflowError> {
        let Changeset { batch, events, .. } = changes;
        let size = batch.len();
        self.timed(self.store.commit(batch)).await?;
        tracing::debug!(mutations = size, events = events.len(), "changeset committed");
        for event in events {
            self.publish(event);
        }
        Ok(())
    }

    fn publish(&self, event: DomainEvent) {
        if let Err(e) = self.journal.append(&event) {
            tracing::warn!(event = event.name(), error = %e, "failed to journal domain event");
        }
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// Reject a status change the entity's state machine does not allow.
pub(crate) fn ensure_transition(
    kind: EntityType,
    id: &str,
    from: impl Display,
    to: impl Display,
    allowed: bool,
) -> Result<(), WorkflowError> {
    if allowed {
        return Ok(());
    }
    Err(CoreError::InvalidTransition {
        entity_type: kind.to_string(),
        id: id.to_string(),
        from: from.to_string(),
        to: to.to_string(),
    }
    .into())
}

/// Mutations, audit entries, and events of one operation.
pub(crate) struct Changeset {
    actor: Option<String>,
    now: DateTime<Utc>,
    batch: WriteBatch,
    events: Vec<DomainEvent>,
}

impl Changeset {
    pub(crate) fn new(actor: Option<&str>) -> Self {
        Self {
            actor: actor.map(str::to_string),
            now: Utc::now(),
            batch: WriteBatch::new(),
            events: Vec::new(),
        }
    }

    /// Timestamp shared by every record this changeset touches.
    pub(crate) const fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub(crate) fn created<T: Entity>(&mut self, entity: &T) -> Result<(), WorkflowError> {
        self.batch.insert(entity)?;
        self.audit(T::KIND, entity.id(), AuditAction::Created, None)
    }

    pub(crate) fn updated<T: Entity>(
        &mut self,
        entity: &T,
        detail: Option<Value>,
    ) -> Result<(), WorkflowError> {
        self.batch.replace(entity)?;
        self.audit(T::KIND, entity.id(), AuditAction::Updated, detail)
    }

    pub(crate) fn status_changed<T: Entity>(
        &mut self,
        entity: &T,
        from: impl Display,
        to: impl Display,
        reason: Option<&str>,
    ) -> Result<(), WorkflowError> {
        self.batch.replace(entity)?;
        let detail = StatusChangedDetail {
            from: from.to_string(),
            to: to.to_string(),
            reason: reason.map(str::to_string),
        };
        self.audit(
            T::KIND,
            entity.id(),
            AuditAction::StatusChanged,
            Some(serde_json::to_value(detail).map_err(StoreError::from)?),
        )
    }

    pub(crate) fn deleted<T: Entity>(&mut self, id: &str) -> Result<(), WorkflowError> {
        self.batch.delete::<T>(id);
        self.audit(T::KIND, id, AuditAction::Deleted, None)
    }

    pub(crate) fn emit(&mut self, event: DomainEvent) {
        self.events.push(event);
    }

    fn audit(
        &mut self,
        kind: EntityType,
        entity_id: &str,
        action: AuditAction,
        detail: Option<Value>,
    ) -> Result<(), WorkflowError> {
        let entry = AuditEntry {
            id: generate_id(PREFIX_AUDIT)?,
            entity_type: kind,
            entity_id: entity_id.to_string(),
            action,
            actor_id: self.actor.clone(),
            detail,
            created_at: self.now,
        };
        self.batch.insert(&entry)?;
        Ok(())
    }
}

/// Serialize an audit detail payload.
pub(crate) fn detail<T: serde::Serialize>(value: &T) -> Result<Option<Value>, WorkflowError> {
    Ok(Some(serde_json::to_value(value).map_err(StoreError::from)?))
}
