use rusqlite::Connection;
use shardscope::commands::analyze::analyze_backend;
use shardscope::storage::{Backend, SqliteBackend, schema};
use shardscope::{Error, queue};
use std::path::Path;
use tempfile::TempDir;

fn seed(path: &Path, workers: usize, items: &[(usize, &str)]) {
    let conn = Connection::open(path).unwrap();
    schema::create_tables(&conn).unwrap();
    schema::set_setting(&conn, "number_of_queue_workers", &workers.to_string()).unwrap();
    for (shard, payload) in items {
        schema::push_item(&conn, &queue::list_key(*shard), payload.as_bytes()).unwrap();
    }
}

#[test]
fn analyze_reports_drift_across_shards() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("queue.db");
    seed(
        &path,
        2,
        &[
            // cid starts with '0' -> shard 0; sha1("alice") starts with '5' -> shard 1
            (
                0,
                r#"{"requests":[{"cid":"0123456789abcdef"},{"uid":"alice"}]}"#,
            ),
            // md5("127.0.0.1") starts with 'f' -> shard 1
            (1, r#"{"requests":[{"cip":"127.0.0.1"}],"env":{"server":{}}}"#),
            (1, "not json"),
        ],
    );

    let backend = SqliteBackend::open(&path).unwrap();
    backend.test_connection().unwrap();

    let mut out = Vec::new();
    analyze_backend(&backend, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains("Currently analyzing queue 1 of 2 (1 of about 1 request sets)"));
    assert!(text.contains("Currently analyzing queue 2 of 2 (2 of about 2 request sets)"));
    assert!(text.contains("OldDistribution: 2 + 1, NewDistribution: 1 + 2"));
    assert!(text.contains("invalidRequests: 1"));
    assert!(text.contains("Analysed 3 requests within 2 request sets"));
    assert!(text.contains("Drift: relocated 1 of 3 requests (33.3%)"));
    assert!(text.contains("trackingQueueV1_1"));
}

#[test]
fn analyze_empty_queue() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("queue.db");
    seed(&path, 4, &[]);

    let backend = SqliteBackend::open(&path).unwrap();
    let mut out = Vec::new();
    analyze_backend(&backend, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(!text.contains("Currently analyzing"));
    assert!(text.contains("Analysed 0 requests within 0 request sets"));
    assert!(text.contains("Drift: relocated 0 of 0 requests (0.0%)"));
}

#[test]
fn missing_database_is_unavailable() {
    let dir = TempDir::new().unwrap();
    let err = SqliteBackend::open(&dir.path().join("absent.db"))
        .err()
        .unwrap();
    assert!(matches!(err, Error::BackendUnavailable(_)));
    assert_eq!(err.exit_code(), shardscope::error::exit_code::BACKEND_UNAVAILABLE);
}

#[test]
fn database_without_queue_tables_is_unavailable() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("other.db");
    Connection::open(&path)
        .unwrap()
        .execute_batch("CREATE TABLE unrelated (id INTEGER);")
        .unwrap();

    let backend = SqliteBackend::open(&path).unwrap();
    assert!(matches!(
        backend.test_connection(),
        Err(Error::BackendUnavailable(_))
    ));
}
