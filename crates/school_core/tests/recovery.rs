use rusqlite::Connection;
use school_core::db::{open_embedded_with_recovery, quarantine_path, DbError, DbValue};

#[test]
fn healthy_file_opens_without_quarantine() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("school.db");

    let recovered = open_embedded_with_recovery(&path).unwrap();
    assert!(recovered.quarantined.is_none());
    assert!(path.exists());
}

#[test]
fn garbage_file_is_moved_aside_and_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("school.db");
    std::fs::write(&path, vec![0xA5_u8; 1024]).unwrap();

    let recovered = open_embedded_with_recovery(&path).unwrap();

    let backup = quarantine_path(&path);
    assert_eq!(recovered.quarantined.as_deref(), Some(backup.as_path()));
    assert_eq!(std::fs::read(&backup).unwrap(), vec![0xA5_u8; 1024]);
    assert_eq!(
        recovered
            .database
            .scalar("SELECT COUNT(*) FROM teacher", &[])
            .unwrap(),
        Some(DbValue::Integer(0))
    );
}

#[test]
fn newer_schema_is_not_quarantined() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("school.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE schema_version (v INTEGER NOT NULL);
         INSERT INTO schema_version (v) VALUES (7);",
    )
    .unwrap();
    drop(conn);

    let err = open_embedded_with_recovery(&path).unwrap_err();
    assert!(matches!(err, DbError::UnsupportedSchemaVersion { .. }));
    assert!(!quarantine_path(&path).exists());
}
