//! # cap-db
//!
//! libSQL record store for Capstone.
//!
//! Implements [`RecordStore`] over a single `records` table: one JSON body per
//! `(kind, id)`, an optional per-kind `unique_key` guarded by a partial
//! `UNIQUE` index, and filters evaluated with `json_extract`. A
//! [`WriteBatch`] runs inside one SQL transaction.
//!
//! Uses the `libsql` crate (C `SQLite` fork, v0.9.29) in local mode.

pub mod error;
pub mod helpers;
mod migrations;
pub mod classify;

use async_trait::async_trait;
use cap_config::StoreConfig;
use cap_core::enums::EntityType;
use cap_store::{Mutation, RecordFilter, RecordStore, StoreError, WriteBatch};
use error::DatabaseError;
use libsql::Builder;
use serde_json::Value;
use tokio::sync::Mutex;

/// Record store persisted in a libSQL database file (or `:memory:`).
///
/// All statements share one connection. Access is serialized so a batch's
/// transaction never interleaves with another caller's statements.
pub struct LibsqlStore {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: Mutex<libsql::Connection>,
}

impl LibsqlStore {
    /// Open a local database at the given path.
    ///
    /// Runs migrations automatically on first open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;
        Self::run_migrations(&conn).await?;
        tracing::debug!(path, "libsql store opened");
        Ok(Self {
            db,
            conn: Mutex::new(conn),
        })
    }

    /// Open the database described by `config`, creating its directory and
    /// applying the configured busy timeout.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the directory, database, or migrations fail.
    pub async fn open(config: &StoreConfig) -> Result<Self, DatabaseError> {
        if !config.is_in_memory() {
            if let Some(parent) = std::path::Path::new(&config.path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }
        let store = Self::open_local(&config.path).await?;
        {
            let conn = store.conn.lock().await;
            // PRAGMA busy_timeout reports the new value as a row.
            conn.query(&format!("PRAGMA busy_timeout = {}", config.timeout_ms), ())
                .await?;
        }
        Ok(store)
    }

    /// Number of stored records of `kind`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the query fails.
    pub async fn count(&self, kind: EntityType) -> Result<u64, StoreError> {
        let conn = self.conn.lock().await;
        let mut rows = conn
            .query("SELECT COUNT(*) FROM records WHERE kind = ?1", [kind.as_str()])
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let row = rows
            .next()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
            .ok_or_else(|| StoreError::Corrupt("COUNT returned no row".to_string()))?;
        let count = row
            .get::<i64>(0)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

/// Execute one mutation inside an open transaction.
async fn apply(conn: &libsql::Connection, mutation: Mutation) -> Result<(), StoreError> {
    let kind = mutation.kind();
    let id = mutation.id().to_string();
    let (affected, unique_key) = match mutation {
        Mutation::Insert {
            unique_key, body, ..
        } => {
            let body = serde_json::to_string(&body)?;
            let affected = conn
                .execute(
                    "INSERT INTO records (kind, id, unique_key, body) VALUES (?1, ?2, ?3, ?4)",
                    libsql::params![kind.as_str(), id.as_str(), unique_key.as_deref(), body.as_str()],
                )
                .await
                .map_err(|e| classify::classify(e, kind, &id, unique_key.as_deref()))?;
            (affected, unique_key)
        }
        Mutation::Replace {
            unique_key, body, ..
        } => {
            let body = serde_json::to_string(&body)?;
            let affected = conn
                .execute(
                    "UPDATE records SET body = ?1, unique_key = ?2, updated_at = datetime('now') \
                     WHERE kind = ?3 AND id = ?4",
                    libsql::params![body.as_str(), unique_key.as_deref(), kind.as_str(), id.as_str()],
                )
                .await
                .map_err(|e| classify::classify(e, kind, &id, unique_key.as_deref()))?;
            (affected, unique_key)
        }
        Mutation::Patch { patch, .. } => {
            let patch = serde_json::to_string(&patch)?;
            let affected = conn
                .execute(
                    "UPDATE records SET body = json_patch(body, ?1), updated_at = datetime('now') \
                     WHERE kind = ?2 AND id = ?3",
                    libsql::params![patch.as_str(), kind.as_str(), id.as_str()],
                )
                .await
                .map_err(|e| classify::classify(e, kind, &id, None))?;
            (affected, None)
        }
        Mutation::Delete { .. } => {
            let affected = conn
                .execute(
                    "DELETE FROM records WHERE kind = ?1 AND id = ?2",
                    libsql::params![kind.as_str(), id.as_str()],
                )
                .await
                .map_err(|e| classify::classify(e, kind, &id, None))?;
            (affected, None)
        }
    };
    if affected == 0 {
        return Err(StoreError::NotFound { kind, id });
    }
    tracing::trace!(%kind, id, unique_key = ?unique_key, "record written");
    Ok(())
}

#[async_trait]
impl RecordStore for LibsqlStore {
    async fn find_by_id(&self, kind: EntityType, id: &str) -> Result<Option<Value>, StoreError> {
        let conn = self.conn.lock().await;
        let mut rows = conn
            .query(
                "SELECT body FROM records WHERE kind = ?1 AND id = ?2",
                libsql::params![kind.as_str(), id],
            )
            .await
            .map_err(|e| classify::classify(e, kind, id, None))?;
        match rows
            .next()
            .await
            .map_err(|e| classify::classify(e, kind, id, None))?
        {
            Some(row) => Ok(Some(helpers::parse_body(&row)?)),
            None => Ok(None),
        }
    }

    async fn list(
        &self,
        kind: EntityType,
        filter: &RecordFilter,
    ) -> Result<Vec<Value>, StoreError> {
        let (sql, params) = helpers::list_query(kind.as_str(), filter)?;
        let conn = self.conn.lock().await;
        let mut rows = conn
            .query(&sql, libsql::params::Params::Positional(params))
            .await
            .map_err(|e| StoreError::Unavailable(format!("list {kind}: {e}")))?;
        let mut out = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| StoreError::Unavailable(format!("list {kind}: {e}")))?
        {
            out.push(helpers::parse_body(&row)?);
        }
        Ok(out)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        let size = batch.len();
        let conn = self.conn.lock().await;
        let tx = conn
            .transaction()
            .await
            .map_err(|e| StoreError::Unavailable(format!("begin: {e}")))?;

        for mutation in batch.into_mutations() {
            if let Err(err) = apply(&tx, mutation).await {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "rollback failed");
                }
                tracing::debug!(error = %err, "libsql store: batch rolled back");
                return Err(err);
            }
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Unavailable(format!("commit: {e}")))?;
        tracing::debug!(mutations = size, "libsql store: batch committed");
        Ok(())
    }
}
