use coach_intel::db;
use tempfile::TempDir;

#[test]
fn open_creates_new_db_at_nonexistent_path() {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("subdir").join("new.db");

    assert!(!db_path.exists());

    let conn = db::open_database(&db_path).unwrap();

    assert!(db_path.exists());
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM intel_items", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn health_check_passes_on_valid_db() {
    let tmp = TempDir::new().unwrap();
    let conn = db::open_database(tmp.path().join("health.db")).unwrap();

    let report = db::check_database_health(&conn).unwrap();
    assert!(report.integrity_ok);
    assert_eq!(report.schema_version, db::migrations::CURRENT_SCHEMA_VERSION);
    assert_eq!(report.journal_mode, "wal");
    assert_eq!(report.item_count, 0);
    assert_eq!(report.run_count, 0);
}

#[test]
fn busy_timeout_is_set() {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("test.db");

    let conn = db::open_database(&db_path).unwrap();

    let timeout: i64 = conn
        .pragma_query_value(None, "busy_timeout", |row| row.get(0))
        .unwrap();
    assert_eq!(timeout, 5000);
}

#[test]
fn reader_sees_rows_while_writer_connection_is_open() {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("shared.db");

    let writer = db::open_database(&db_path).unwrap();
    writer
        .execute(
            "INSERT INTO intel_items (source, external_id, title, url, fetched_at) \
             VALUES ('devto', '1', 't', 'u', '2026-03-01T00:00:00.000000Z')",
            [],
        )
        .unwrap();

    let reader = rusqlite::Connection::open(&db_path).unwrap();
    let count: i64 = reader
        .query_row("SELECT COUNT(*) FROM intel_items", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}
