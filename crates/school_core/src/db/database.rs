//! Connection ownership and per-call transaction scoping.
//!
//! # Responsibility
//! - Open the embedded or network backend and run schema bootstrap.
//! - Wrap every `execute` / `query` in its own transaction.
//! - Checkpoint the WAL after embedded writes so external readers see them.
//!
//! # Invariants
//! - One connection per `Database`, guarded by a mutex; a call holds it for
//!   the whole transaction. Nested calls are not supported.
//! - Failed statements roll back before the error is returned.

use super::migrations;
use super::value::{DbValue, Row};
use super::{classify_sqlite, DbError, DbResult};
use crate::config::StoreConfig;
use log::{debug, error, info, warn};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Lock-wait window for the embedded store.
///
/// Generous so an inspection tool holding the file does not fail writes.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// Which backend a [`Database`] talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Single-file SQLite store (or an in-memory one in tests).
    Embedded,
    /// Network-addressed PostgreSQL store, autocommit.
    Network,
}

enum Backend {
    Embedded(Connection),
    #[cfg(feature = "postgres")]
    Network(postgres::Client),
}

/// Transactional execution surface shared by all repository calls.
pub struct Database {
    backend: Mutex<Backend>,
    kind: BackendKind,
    sqlite_path: Option<PathBuf>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("kind", &self.kind)
            .field("sqlite_path", &self.sqlite_path)
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Opens the backend described by `config` and bootstraps the schema.
    pub fn open(config: &StoreConfig) -> DbResult<Self> {
        match config {
            StoreConfig::Embedded { path } => Self::open_embedded(path),
            StoreConfig::Network { connection_string } => Self::open_network(connection_string),
        }
    }

    /// Opens (or creates) the SQLite file at `path`.
    ///
    /// # Side effects
    /// - Switches the file to WAL journaling.
    /// - Emits `db_open` logging events with duration and status.
    pub fn open_embedded(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref();
        let started_at = Instant::now();
        info!(
            "event=db_open module=db status=start mode=file path={}",
            path.display()
        );

        let opened = Connection::open(path)
            .map_err(DbError::from)
            .and_then(|mut conn| configure_embedded(&mut conn).map(|()| conn));
        let conn = log_open_result("file", started_at, opened)?;

        Ok(Self {
            backend: Mutex::new(Backend::Embedded(conn)),
            kind: BackendKind::Embedded,
            sqlite_path: Some(path.to_path_buf()),
        })
    }

    /// Opens a private in-memory SQLite store with the full schema.
    pub fn open_in_memory() -> DbResult<Self> {
        let started_at = Instant::now();
        info!("event=db_open module=db status=start mode=memory");

        let opened = Connection::open_in_memory()
            .map_err(DbError::from)
            .and_then(|mut conn| configure_embedded(&mut conn).map(|()| conn));
        let conn = log_open_result("memory", started_at, opened)?;

        Ok(Self {
            backend: Mutex::new(Backend::Embedded(conn)),
            kind: BackendKind::Embedded,
            sqlite_path: None,
        })
    }

    /// Connects to a PostgreSQL server with autocommit semantics.
    #[cfg(feature = "postgres")]
    pub fn open_network(connection_string: &str) -> DbResult<Self> {
        let started_at = Instant::now();
        info!("event=db_open module=db status=start mode=network");

        let opened = super::network::connect(connection_string).and_then(|mut client| {
            migrations::apply_postgres(&mut client).map(|_| client)
        });
        let client = log_open_result("network", started_at, opened)?;

        Ok(Self {
            backend: Mutex::new(Backend::Network(client)),
            kind: BackendKind::Network,
            sqlite_path: None,
        })
    }

    /// Network backend placeholder for builds without the `postgres` feature.
    #[cfg(not(feature = "postgres"))]
    pub fn open_network(_connection_string: &str) -> DbResult<Self> {
        error!(
            "event=db_open module=db status=error mode=network error_code=backend_unavailable"
        );
        Err(DbError::BackendUnavailable("postgres"))
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    /// Path of the embedded file, `None` for network and in-memory stores.
    pub fn sqlite_path(&self) -> Option<&Path> {
        self.sqlite_path.as_deref()
    }

    /// Runs one mutating statement in its own transaction.
    ///
    /// Returns the number of rows the statement changed.
    ///
    /// # Errors
    /// - [`DbError::Integrity`] when a constraint rejects the write.
    /// - Any other backend error after rolling back.
    pub fn execute(&self, sql: &str, params: &[DbValue]) -> DbResult<usize> {
        let started_at = Instant::now();
        let mut backend = self.lock()?;
        let result = match &mut *backend {
            Backend::Embedded(conn) => execute_embedded(conn, sql, params),
            #[cfg(feature = "postgres")]
            Backend::Network(client) => super::network::execute(client, sql, params),
        };

        match &result {
            Ok(changed) => debug!(
                "event=db_execute module=db status=ok rows={} duration_ms={}",
                changed,
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=db_execute module=db status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    /// Runs one read statement in its own transaction and collects all rows.
    pub fn query(&self, sql: &str, params: &[DbValue]) -> DbResult<Vec<Row>> {
        let mut backend = self.lock()?;
        let result = match &mut *backend {
            Backend::Embedded(conn) => query_embedded(conn, sql, params),
            #[cfg(feature = "postgres")]
            Backend::Network(client) => super::network::query(client, sql, params),
        };

        if let Err(err) = &result {
            warn!("event=db_query module=db status=error error={err}");
        }
        result
    }

    /// First column of the first row, or `None` when no row matched.
    pub fn scalar(&self, sql: &str, params: &[DbValue]) -> DbResult<Option<DbValue>> {
        let rows = self.query(sql, params)?;
        Ok(rows.into_iter().next().and_then(|row| row.into_iter().next()))
    }

    /// Returns the persisted schema-version marker.
    pub fn schema_version(&self) -> DbResult<u32> {
        let value = self
            .scalar("SELECT v FROM schema_version LIMIT 1", &[])?
            .unwrap_or(DbValue::Integer(0));
        Ok(u32::try_from(value.as_i64()?).unwrap_or(0))
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Backend>> {
        self.backend.lock().map_err(|_| DbError::ConnectionPoisoned)
    }
}

fn configure_embedded(conn: &mut Connection) -> DbResult<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    let journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
    conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
    let version = migrations::apply_sqlite(conn)?;
    debug!(
        "event=db_bootstrap module=db status=ok journal_mode={} schema_version={}",
        journal_mode, version
    );
    Ok(())
}

fn log_open_result<T>(mode: &str, started_at: Instant, result: DbResult<T>) -> DbResult<T> {
    match result {
        Ok(handle) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            );
            Ok(handle)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bind(params: &[DbValue]) -> impl Iterator<Item = Value> + '_ {
    params.iter().map(Value::from)
}

fn execute_embedded(conn: &mut Connection, sql: &str, params: &[DbValue]) -> DbResult<usize> {
    // Dropping an uncommitted transaction rolls it back.
    let tx = conn.transaction()?;
    let changed = tx
        .execute(sql, params_from_iter(bind(params)))
        .map_err(classify_sqlite)?;
    tx.commit().map_err(classify_sqlite)?;
    checkpoint(conn);
    Ok(changed)
}

fn query_embedded(conn: &mut Connection, sql: &str, params: &[DbValue]) -> DbResult<Vec<Row>> {
    let tx = conn.transaction()?;
    let collected = {
        let mut stmt = tx.prepare(sql)?;
        let column_count = stmt.column_count();
        let mut rows = stmt.query(params_from_iter(bind(params)))?;
        let mut collected = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(column_count);
            for index in 0..column_count {
                values.push(DbValue::from(row.get_ref(index)?));
            }
            collected.push(values);
        }
        collected
    };
    tx.commit()?;
    Ok(collected)
}

fn checkpoint(conn: &Connection) {
    if let Err(err) = conn.query_row("PRAGMA wal_checkpoint(TRUNCATE);", [], |_| Ok(())) {
        debug!("event=db_checkpoint module=db status=error error={err}");
    }
}
