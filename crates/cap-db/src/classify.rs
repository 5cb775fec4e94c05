//! Classification of libSQL failures into store error kinds.
//!
//! The store never retries on its own. It reports lock contention as
//! `StoreError::Unavailable` so callers can decide, and maps constraint
//! violations to `StoreError::Conflict`.

use cap_core::enums::EntityType;
use cap_store::StoreError;

/// Detect transient local lock contention.
///
/// The predicate is intentionally narrow to avoid retrying genuine SQL or
/// constraint errors.
pub fn is_transient_libsql_error(e: &libsql::Error) -> bool {
    let msg = e.to_string();
    msg.contains("database is locked")
        || msg.contains("database table is locked")
        || msg.contains("SQLITE_BUSY")
        || msg.contains("SQLITE_LOCKED")
}

/// Detect a `UNIQUE` or primary-key violation.
pub fn is_unique_violation(e: &libsql::Error) -> bool {
    let msg = e.to_string();
    msg.contains("UNIQUE constraint failed") || msg.contains("PRIMARY KEY")
}

/// Map a failed statement on record `(kind, id)` to a store error.
pub fn classify(e: libsql::Error, kind: EntityType, id: &str, unique_key: Option<&str>) -> StoreError {
    if is_unique_violation(&e) {
        let on_unique_key = e.to_string().contains("unique_key");
        let key = match unique_key {
            Some(k) if on_unique_key => k.to_string(),
            _ => id.to_string(),
        };
        return StoreError::Conflict { kind, key };
    }
    if is_transient_libsql_error(&e) {
        return StoreError::Unavailable(e.to_string());
    }
    StoreError::Unavailable(format!("{kind} {id}: {e}"))
}
