//! Storage gateway: connection bootstrap, schema setup and transactional
//! statement execution.
//!
//! # Responsibility
//! - Open the embedded SQLite file (default) or a network store selected
//!   through [`StoreConfig`](crate::config::StoreConfig).
//! - Ensure the fixed three-table schema exists before any other call.
//! - Expose `execute` / `query` / `scalar` with one transaction per call.
//!
//! # Invariants
//! - Schema version is tracked in the single-row `schema_version` table.
//! - Callers never see a connection whose schema init failed.
//! - Constraint violations surface as [`DbError::Integrity`], never as a
//!   backend-specific error.

use std::path::PathBuf;
use thiserror::Error;

mod database;
pub mod migrations;
#[cfg(feature = "postgres")]
mod network;
pub mod recovery;
mod value;

pub use database::{BackendKind, Database, BUSY_TIMEOUT};
pub use recovery::{open_embedded_with_recovery, quarantine_path, RecoveredDatabase};
pub use value::{DbValue, Row};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),
    #[cfg(feature = "postgres")]
    #[error("{0}")]
    Postgres(#[from] postgres::Error),
    /// The store rejected a write because of a constraint (duplicate id).
    #[error("integrity error: {0}")]
    Integrity(String),
    #[error("io error on `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    #[error("{0} backend is not compiled into this build")]
    BackendUnavailable(&'static str),
    #[error("database connection lock poisoned")]
    ConnectionPoisoned,
    #[error("unexpected column value: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}

impl DbError {
    /// Returns whether this error is a constraint violation.
    pub fn is_integrity(&self) -> bool {
        matches!(self, Self::Integrity(_))
    }
}

/// Maps SQLite constraint failures onto [`DbError::Integrity`].
pub(crate) fn classify_sqlite(err: rusqlite::Error) -> DbError {
    match &err {
        rusqlite::Error::SqliteFailure(code, message)
            if code.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DbError::Integrity(
                message
                    .clone()
                    .unwrap_or_else(|| "constraint violation".to_string()),
            )
        }
        _ => DbError::Sqlite(err),
    }
}

#[cfg(test)]
mod tests {
    use super::{classify_sqlite, DbError};
    use rusqlite::Connection;

    #[test]
    fn primary_key_violation_maps_to_integrity() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t(id TEXT PRIMARY KEY); INSERT INTO t VALUES ('a');")
            .unwrap();
        let err = conn
            .execute("INSERT INTO t VALUES ('a');", [])
            .map_err(classify_sqlite)
            .unwrap_err();
        assert!(err.is_integrity(), "unexpected error: {err}");
        assert!(err.to_string().starts_with("integrity error"));
    }

    #[test]
    fn syntax_errors_stay_backend_errors() {
        let conn = Connection::open_in_memory().unwrap();
        let err = conn
            .execute("INSERT INTO missing VALUES (1);", [])
            .map_err(classify_sqlite)
            .unwrap_err();
        assert!(matches!(err, DbError::Sqlite(_)));
    }
}
