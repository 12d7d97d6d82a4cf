//! Integration tests for the audit trail.

use std::path::PathBuf;
use std::sync::Arc;

use moodsync_relay::audit::{AuditLog, AuditRecord, AuditRecorder};
use moodsync_relay::config::AuditConfig;
use moodsync_relay::relay::{ErrorKind, RelayError, RequestKind};
use tempfile::TempDir;

/// Helper to create a unique database path in a temp directory.
fn temp_db_path(temp_dir: &TempDir, name: &str) -> PathBuf {
    temp_dir
        .path()
        .join(format!("{}-{}.db", name, std::process::id()))
}

fn success(kind: RequestKind, caller: &str) -> AuditRecord {
    AuditRecord::builder(kind, format!("prompt for {caller}"))
        .caller_id(Some(caller.to_string()))
        .model("gemini-1.5-flash")
        .latency_ms(180)
        .response("Advice text", Some(0.5), Some("STOP".to_string()))
        .build()
}

/// Records survive closing and reopening the database file.
#[tokio::test]
async fn test_records_persist_across_reopen() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_db_path(&temp_dir, "persist");

    {
        let log = AuditLog::open(&db_path).await.expect("Failed to open audit log");
        log.log_record(&success(RequestKind::Journal, "m-1"))
            .await
            .expect("Failed to write record");
        let failure = AuditRecord::builder(RequestKind::Doctor, "p")
            .model("gemini-1.5-flash")
            .failure(&RelayError::RateLimited("HTTP 429".to_string()))
            .build();
        log.log_record(&failure).await.expect("Failed to write record");
    }

    let log = AuditLog::open(&db_path).await.expect("Failed to reopen audit log");
    assert_eq!(log.count_records().await.unwrap(), 2);
    assert_eq!(log.count_failures().await.unwrap(), 1);
    assert_eq!(log.count_by_kind(RequestKind::Doctor).await.unwrap(), 1);

    let records = log.recent(10).await.unwrap();
    let failure = records
        .iter()
        .find(|r| r.kind == RequestKind::Doctor)
        .expect("Missing doctor row");
    assert_eq!(failure.error_kind, Some(ErrorKind::RateLimited));
    assert_eq!(failure.outcome(), "rate_limited");
}

/// Background writes through the recorder all land once flushed.
#[tokio::test]
async fn test_recorder_concurrent_writes() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log = Arc::new(
        AuditLog::open(temp_db_path(&temp_dir, "concurrent"))
            .await
            .expect("Failed to open audit log"),
    );
    let recorder = AuditRecorder::new(log.clone());

    for i in 0..25 {
        let kind = RequestKind::ALL[i % RequestKind::ALL.len()];
        recorder.record(success(kind, &format!("caller-{i}")));
    }
    recorder.flush().await;

    assert_eq!(recorder.pending(), 0);
    assert_eq!(log.count_records().await.unwrap(), 25);
    assert_eq!(log.count_by_kind(RequestKind::Journal).await.unwrap(), 7);
    assert_eq!(log.count_by_kind(RequestKind::Insight).await.unwrap(), 6);
}

/// The admin view sees at most the requested number of rows, newest first.
#[tokio::test]
async fn test_recent_caps_and_orders() {
    let log = AuditLog::open_in_memory().await.expect("Failed to open audit log");
    let base = chrono::Utc::now();
    for i in 0..120 {
        let record = AuditRecord::builder(RequestKind::Empathy, format!("prompt {i}"))
            .model("m")
            .timestamp(base + chrono::Duration::milliseconds(i))
            .response("ok", None, None)
            .build();
        log.log_record(&record).await.unwrap();
    }

    let records = log.recent(100).await.unwrap();
    assert_eq!(records.len(), 100);
    assert_eq!(records[0].prompt, "prompt 119");
    assert_eq!(records[99].prompt, "prompt 20");
    assert!(records
        .windows(2)
        .all(|pair| pair[0].timestamp >= pair[1].timestamp));
}

/// Caller-scoped history only returns that caller's rows.
#[tokio::test]
async fn test_recent_for_caller_filters() {
    let log = AuditLog::open_in_memory().await.expect("Failed to open audit log");
    for caller in ["a", "b", "a", "c", "a"] {
        log.log_record(&success(RequestKind::Journal, caller))
            .await
            .unwrap();
    }

    let records = log.recent_for_caller("a", 10).await.unwrap();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.caller_id.as_deref() == Some("a")));
}

/// A configured trail that cannot be opened disables auditing instead of failing.
#[tokio::test]
async fn test_open_configured_unopenable_path_disables_audit() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let blocker = temp_dir.path().join("file");
    std::fs::write(&blocker, b"not a directory").expect("Failed to write file");

    let config = AuditConfig {
        enabled: true,
        path: Some(blocker.join("sub").join("audit.db")),
    };
    assert!(AuditLog::open_configured(&config).await.is_none());
}

#[tokio::test]
async fn test_open_configured_disabled_creates_nothing() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_db_path(&temp_dir, "disabled");

    let config = AuditConfig {
        enabled: false,
        path: Some(db_path.clone()),
    };
    assert!(AuditLog::open_configured(&config).await.is_none());
    assert!(!db_path.exists());
}

#[tokio::test]
async fn test_open_configured_opens_enabled_trail() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_db_path(&temp_dir, "enabled");

    let config = AuditConfig {
        enabled: true,
        path: Some(db_path.clone()),
    };
    let audit = AuditLog::open_configured(&config)
        .await
        .expect("enabled trail should open");
    assert_eq!(audit.path(), Some(db_path.as_path()));
    assert_eq!(audit.count_records().await.unwrap(), 0);
}
