//! Database error types for cap-db.

use cap_store::StoreError;
use thiserror::Error;

/// Errors from opening and migrating the database.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// The database directory could not be created.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),
}

impl From<DatabaseError> for StoreError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::LibSql(e) if crate::classify::is_transient_libsql_error(&e) => {
                Self::Unavailable(e.to_string())
            }
            other => Self::Unavailable(other.to_string()),
        }
    }
}
