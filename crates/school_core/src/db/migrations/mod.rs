//! Schema bootstrap and migration registry.
//!
//! # Responsibility
//! - Create the `teacher`, `assistant` and `student` tables when absent.
//! - Maintain the single-row `schema_version` marker.
//! - Apply registered additive migrations above the stored version.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Bootstrap and migrations run in one transaction per open.
//! - A stored version newer than [`latest_version`] is refused.

use crate::db::{DbError, DbResult};
use rusqlite::Connection;

const SQLITE_SCHEMA: &str = include_str!("sqlite_schema.sql");
#[cfg(feature = "postgres")]
const POSTGRES_SCHEMA: &str = include_str!("postgres_schema.sql");

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

// Version 1 only establishes the marker; later additive changes go here.
const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: "",
}];

/// Returns the latest schema version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

fn pending_migrations(current: u32) -> DbResult<impl Iterator<Item = &'static Migration>> {
    let latest = latest_version();
    if current > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: latest,
        });
    }
    Ok(MIGRATIONS
        .iter()
        .filter(move |migration| migration.version > current))
}

/// Ensures the schema exists on an embedded connection.
///
/// Returns the schema version after bootstrap.
pub(crate) fn apply_sqlite(conn: &mut Connection) -> DbResult<u32> {
    let tx = conn.transaction()?;
    tx.execute_batch(SQLITE_SCHEMA)?;

    let markers: i64 = tx.query_row("SELECT COUNT(*) FROM schema_version;", [], |row| {
        row.get(0)
    })?;
    if markers == 0 {
        tx.execute("INSERT INTO schema_version (v) VALUES (0);", [])?;
    }

    let mut version: u32 =
        tx.query_row("SELECT v FROM schema_version LIMIT 1;", [], |row| row.get(0))?;
    for migration in pending_migrations(version)? {
        if !migration.sql.is_empty() {
            tx.execute_batch(migration.sql)?;
        }
        tx.execute("UPDATE schema_version SET v = ?1;", [migration.version])?;
        version = migration.version;
    }

    tx.commit()?;
    Ok(version)
}

/// Ensures the schema exists on a network connection.
#[cfg(feature = "postgres")]
pub(crate) fn apply_postgres(client: &mut postgres::Client) -> DbResult<u32> {
    let mut tx = client.transaction()?;
    tx.batch_execute(POSTGRES_SCHEMA)?;

    let markers: i64 = tx
        .query_one("SELECT COUNT(*) FROM schema_version", &[])?
        .get(0);
    if markers == 0 {
        tx.execute("INSERT INTO schema_version (v) VALUES (0)", &[])?;
    }

    let stored: i32 = tx
        .query_one("SELECT v FROM schema_version LIMIT 1", &[])?
        .get(0);
    let mut version = u32::try_from(stored).unwrap_or(0);
    for migration in pending_migrations(version)? {
        if !migration.sql.is_empty() {
            tx.batch_execute(migration.sql)?;
        }
        let next = i32::try_from(migration.version).unwrap_or(i32::MAX);
        tx.execute("UPDATE schema_version SET v = $1", &[&next])?;
        version = migration.version;
    }

    tx.commit()?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::{apply_sqlite, latest_version, pending_migrations};
    use crate::db::DbError;
    use rusqlite::Connection;

    #[test]
    fn pending_is_empty_at_latest() {
        assert_eq!(pending_migrations(latest_version()).unwrap().count(), 0);
        assert_eq!(pending_migrations(0).unwrap().count(), MIGRATION_COUNT);
    }

    const MIGRATION_COUNT: usize = super::MIGRATIONS.len();

    #[test]
    fn apply_twice_keeps_a_single_marker_row() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert_eq!(apply_sqlite(&mut conn).unwrap(), latest_version());
        assert_eq!(apply_sqlite(&mut conn).unwrap(), latest_version());

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn newer_marker_is_refused_and_rolled_back() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE schema_version (v INTEGER NOT NULL);
             INSERT INTO schema_version (v) VALUES (42);",
        )
        .unwrap();

        let err = apply_sqlite(&mut conn).unwrap_err();
        assert!(matches!(
            err,
            DbError::UnsupportedSchemaVersion { db_version: 42, .. }
        ));

        let teacher_tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'teacher';",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(teacher_tables, 0);
    }
}
