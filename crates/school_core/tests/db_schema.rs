use rusqlite::{Connection, OpenFlags};
use school_core::db::migrations::latest_version;
use school_core::db::{BackendKind, Database, DbError, DbValue};
use school_core::StoreConfig;

#[test]
fn in_memory_store_has_all_tables_at_latest_version() {
    let db = Database::open_in_memory().unwrap();

    assert_eq!(db.kind(), BackendKind::Embedded);
    assert_eq!(db.schema_version().unwrap(), latest_version());
    for table in ["teacher", "assistant", "student", "schema_version"] {
        assert_table_exists(&db, table);
    }
}

#[test]
fn reopening_a_file_keeps_data_and_one_version_row() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("school.db");

    let first = Database::open(&StoreConfig::embedded(&path)).unwrap();
    first
        .execute(
            "INSERT INTO student (id, name, grade, speciality) VALUES (?1, ?2, ?3, ?4)",
            &["S1".into(), "Ion".into(), 9_i64.into(), "Physics".into()],
        )
        .unwrap();
    assert_eq!(first.sqlite_path(), Some(path.as_path()));
    drop(first);

    let second = Database::open_embedded(&path).unwrap();
    assert_eq!(second.schema_version().unwrap(), latest_version());
    assert_eq!(
        second
            .scalar("SELECT COUNT(*) FROM schema_version", &[])
            .unwrap(),
        Some(DbValue::Integer(1))
    );
    assert_eq!(
        second.scalar("SELECT name FROM student", &[]).unwrap(),
        Some(DbValue::Text("Ion".into()))
    );
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE schema_version (v INTEGER NOT NULL);
         INSERT INTO schema_version (v) VALUES (999);",
    )
    .unwrap();
    drop(conn);

    match Database::open_embedded(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn duplicate_primary_key_maps_to_integrity() {
    let db = Database::open_in_memory().unwrap();
    let insert = "INSERT INTO assistant (id, name, salary, department) VALUES (?1, ?2, ?3, ?4)";
    let params: [DbValue; 4] = ["A1".into(), "Ann".into(), 900.0_f64.into(), "Finance".into()];

    assert_eq!(db.execute(insert, &params).unwrap(), 1);
    let err = db.execute(insert, &params).unwrap_err();
    assert!(err.is_integrity(), "expected integrity error, got {err}");
}

#[test]
fn not_null_violation_maps_to_integrity_and_leaves_table_unchanged() {
    let db = Database::open_in_memory().unwrap();
    let err = db
        .execute(
            "INSERT INTO student (id, name, grade, speciality) VALUES (?1, ?2, ?3, ?4)",
            &["S1".into(), DbValue::Null, 7_i64.into(), "Physics".into()],
        )
        .unwrap_err();

    assert!(matches!(err, DbError::Integrity(_)));
    assert_eq!(
        db.scalar("SELECT COUNT(*) FROM student", &[]).unwrap(),
        Some(DbValue::Integer(0))
    );
}

#[test]
fn scalar_distinguishes_no_row_from_null() {
    let db = Database::open_in_memory().unwrap();

    assert_eq!(
        db.scalar("SELECT name FROM teacher WHERE id = ?1", &["nope".into()])
            .unwrap(),
        None
    );
    assert_eq!(
        db.scalar("SELECT NULL", &[]).unwrap(),
        Some(DbValue::Null)
    );
}

#[test]
fn query_returns_rows_with_typed_values() {
    let db = Database::open_in_memory().unwrap();
    db.execute(
        "INSERT INTO teacher (id, name, salary, department, subject) VALUES (?1, ?2, ?3, ?4, ?5)",
        &[
            "T1".into(),
            "Ana".into(),
            1250.5_f64.into(),
            "Engineering".into(),
            "Physics".into(),
        ],
    )
    .unwrap();

    let rows = db
        .query("SELECT id, salary FROM teacher WHERE id = ?1", &["T1".into()])
        .unwrap();
    assert_eq!(rows, vec![vec![DbValue::Text("T1".into()), DbValue::Real(1250.5)]]);
}

#[test]
fn writes_are_checkpointed_and_visible_to_an_external_reader() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("school.db");
    let db = Database::open_embedded(&path).unwrap();

    db.execute(
        "INSERT INTO student (id, name, grade, speciality) VALUES (?1, ?2, ?3, ?4)",
        &["S1".into(), "Eve".into(), 8_i64.into(), "Chemistry".into()],
    )
    .unwrap();

    let wal = dir.path().join("school.db-wal");
    let wal_len = std::fs::metadata(&wal).map(|m| m.len()).unwrap_or(0);
    assert_eq!(wal_len, 0, "WAL should be truncated after a write");

    let reader = Connection::open_with_flags(&path, OpenFlags::SQLITE_OPEN_READ_ONLY).unwrap();
    let count: i64 = reader
        .query_row("SELECT COUNT(*) FROM student", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn reads_are_not_blocked_by_an_open_external_write() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("school.db");
    let db = Database::open_embedded(&path).unwrap();
    db.execute(
        "INSERT INTO student (id, name, grade, speciality) VALUES (?1, ?2, ?3, ?4)",
        &["S1".into(), "Eve".into(), 8_i64.into(), "Physics".into()],
    )
    .unwrap();

    let writer = Connection::open(&path).unwrap();
    writer
        .execute_batch(
            "BEGIN IMMEDIATE;
             INSERT INTO student (id, name, grade, speciality) VALUES ('S2', 'Ion', 9, 'Physics');",
        )
        .unwrap();

    let count = |db: &Database| db.scalar("SELECT COUNT(*) FROM student", &[]).unwrap();
    assert_eq!(count(&db), Some(DbValue::Integer(1)));

    writer.execute_batch("COMMIT;").unwrap();
    assert_eq!(count(&db), Some(DbValue::Integer(2)));
}

#[test]
fn database_can_be_shared_across_threads() {
    let db = std::sync::Arc::new(Database::open_in_memory().unwrap());

    let handles: Vec<_> = (0..4)
        .map(|n| {
            let db = std::sync::Arc::clone(&db);
            std::thread::spawn(move || {
                db.execute(
                    "INSERT INTO student (id, name, grade, speciality) VALUES (?1, ?2, ?3, ?4)",
                    &[
                        format!("S{n}").into(),
                        "Kid".into(),
                        (n as i64).into(),
                        "Unknown".into(),
                    ],
                )
                .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(
        db.scalar("SELECT COUNT(*) FROM student", &[]).unwrap(),
        Some(DbValue::Integer(4))
    );
}

#[cfg(not(feature = "postgres"))]
#[test]
fn network_backend_is_unavailable_without_feature() {
    let err = Database::open(&StoreConfig::from_connection_string("host=localhost")).unwrap_err();
    assert!(matches!(err, DbError::BackendUnavailable("postgres")));
}

fn assert_table_exists(db: &Database, table: &str) {
    let exists = db
        .scalar(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
            &[table.into()],
        )
        .unwrap();
    assert_eq!(exists, Some(DbValue::Integer(1)), "missing table {table}");
}
