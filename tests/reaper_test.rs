//! Integration tests for the expired-session reaper.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use dynamodb_sessions::backend::MemoryBackend;
use dynamodb_sessions::record::{ExpiryFilter, RecordPatch, ScanItem, SessionRecord};
use dynamodb_sessions::{
    DynamoSessionStore, ErrorKind, KeyValueBackend, SessionStore, StoreConfig, StoreError,
    StoreResult,
};

const TABLE: &str = "sessions";

fn quiet_config() -> StoreConfig {
    StoreConfig {
        reap_interval_ms: 0,
        ..StoreConfig::default()
    }
}

async fn seed(backend: &MemoryBackend, key: &str, expires: i64) {
    let record = SessionRecord::new(key.to_string(), r#"{"user":"x"}"#.to_string(), expires);
    backend.put_item(TABLE, &record).await.unwrap();
}

#[tokio::test]
async fn test_reap_removes_only_expired_records() {
    let backend = Arc::new(MemoryBackend::new());
    let store = DynamoSessionStore::new(&quiet_config(), backend.clone());

    let now = Utc::now().timestamp_millis();
    seed(&backend, "sess:expired-long", now - 1_000).await;
    seed(&backend, "sess:live", now + 1_000).await;
    seed(&backend, "sess:expired-just", now - 1).await;

    let removed = store.reap().await.unwrap();
    assert_eq!(removed, 2);
    assert!(!backend.contains(TABLE, "sess:expired-long"));
    assert!(!backend.contains(TABLE, "sess:expired-just"));
    assert!(backend.contains(TABLE, "sess:live"));
}

#[tokio::test]
async fn test_reap_on_empty_table_removes_nothing() {
    let backend = Arc::new(MemoryBackend::new());
    let store = DynamoSessionStore::new(&quiet_config(), backend);
    assert_eq!(store.reap().await.unwrap(), 0);
}

#[tokio::test]
async fn test_reaped_session_reads_absent_afterwards() {
    let backend = Arc::new(MemoryBackend::new());
    let store = DynamoSessionStore::new(&quiet_config(), backend.clone());

    store
        .set("sid-1", &json!({"cookie": {"maxAge": -1_000}}))
        .await
        .unwrap();
    assert!(backend.contains(TABLE, "sess:sid-1"));

    store.reap().await.unwrap();
    assert!(!backend.contains(TABLE, "sess:sid-1"));
    assert_eq!(store.get("sid-1").await.unwrap(), None);
}

/// Backend whose scan always fails; counts deletion attempts.
#[derive(Debug, Default)]
struct FailingScanBackend {
    deletes: AtomicUsize,
}

#[async_trait]
impl KeyValueBackend for FailingScanBackend {
    fn backend_type(&self) -> &str {
        "failing-scan"
    }

    async fn get_item(&self, _table: &str, _key: &str) -> StoreResult<Option<SessionRecord>> {
        Ok(None)
    }

    async fn put_item(&self, _table: &str, _record: &SessionRecord) -> StoreResult<()> {
        Ok(())
    }

    async fn update_item(&self, _table: &str, _key: &str, _patch: &RecordPatch) -> StoreResult<()> {
        Ok(())
    }

    async fn delete_item(&self, _table: &str, _key: &str) -> StoreResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn scan(
        &self,
        _table: &str,
        _filter: &ExpiryFilter,
        _projection: &[&str],
    ) -> StoreResult<Vec<ScanItem>> {
        Err(StoreError::backend("simulated scan outage"))
    }
}

#[tokio::test]
async fn test_scan_failure_aborts_pass_before_any_deletion() {
    let backend = Arc::new(FailingScanBackend::default());
    let store = DynamoSessionStore::new(&quiet_config(), backend.clone());

    let err = store.reap().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Scan);
    assert_eq!(backend.deletes.load(Ordering::SeqCst), 0);
}

/// Backend that refuses to delete one specific key.
#[derive(Debug)]
struct FlakyDeleteBackend {
    inner: MemoryBackend,
    fail_key: String,
}

#[async_trait]
impl KeyValueBackend for FlakyDeleteBackend {
    fn backend_type(&self) -> &str {
        "flaky-delete"
    }

    async fn get_item(&self, table: &str, key: &str) -> StoreResult<Option<SessionRecord>> {
        self.inner.get_item(table, key).await
    }

    async fn put_item(&self, table: &str, record: &SessionRecord) -> StoreResult<()> {
        self.inner.put_item(table, record).await
    }

    async fn update_item(&self, table: &str, key: &str, patch: &RecordPatch) -> StoreResult<()> {
        self.inner.update_item(table, key, patch).await
    }

    async fn delete_item(&self, table: &str, key: &str) -> StoreResult<()> {
        if key == self.fail_key {
            return Err(StoreError::backend("simulated delete failure"));
        }
        self.inner.delete_item(table, key).await
    }

    async fn scan(
        &self,
        table: &str,
        filter: &ExpiryFilter,
        projection: &[&str],
    ) -> StoreResult<Vec<ScanItem>> {
        self.inner.scan(table, filter, projection).await
    }
}

#[tokio::test]
async fn test_single_delete_failure_does_not_abort_the_pass() {
    let backend = Arc::new(FlakyDeleteBackend {
        inner: MemoryBackend::new(),
        fail_key: "sess:stuck".to_string(),
    });
    let store = DynamoSessionStore::new(&quiet_config(), backend.clone());

    let now = Utc::now().timestamp_millis();
    seed(&backend.inner, "sess:stuck", now - 1_000).await;
    seed(&backend.inner, "sess:gone", now - 1_000).await;

    let removed = store.reap().await.unwrap();
    assert_eq!(removed, 1);
    assert!(backend.inner.contains(TABLE, "sess:stuck"));
    assert!(!backend.inner.contains(TABLE, "sess:gone"));
}

#[tokio::test(start_paused = true)]
async fn test_periodic_reaper_fires_on_interval() {
    let backend = Arc::new(MemoryBackend::new());
    let config = StoreConfig {
        reap_interval_ms: 60_000,
        ..StoreConfig::default()
    };
    let now = Utc::now().timestamp_millis();
    seed(&backend, "sess:expired", now - 1_000).await;

    let store = DynamoSessionStore::new(&config, backend.clone());

    // Before the first interval elapses nothing has been swept.
    tokio::time::sleep(Duration::from_millis(1_000)).await;
    assert!(backend.contains(TABLE, "sess:expired"));

    tokio::time::sleep(Duration::from_millis(61_000)).await;
    for _ in 0..50 {
        if !backend.contains(TABLE, "sess:expired") {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert!(!backend.contains(TABLE, "sess:expired"));

    store.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_the_timer() {
    let backend = Arc::new(MemoryBackend::new());
    let config = StoreConfig {
        reap_interval_ms: 60_000,
        ..StoreConfig::default()
    };
    let store = DynamoSessionStore::new(&config, backend.clone());
    store.shutdown().await;

    let now = Utc::now().timestamp_millis();
    seed(&backend, "sess:expired", now - 1_000).await;

    // Two full intervals pass; no sweep happens once the reaper is gone.
    tokio::time::sleep(Duration::from_millis(130_000)).await;
    assert!(backend.contains(TABLE, "sess:expired"));
}

#[tokio::test(start_paused = true)]
async fn test_nonpositive_interval_disables_the_reaper() {
    let backend = Arc::new(MemoryBackend::new());
    let store = DynamoSessionStore::new(&quiet_config(), backend.clone());

    let now = Utc::now().timestamp_millis();
    seed(&backend, "sess:expired", now - 1_000).await;

    tokio::time::sleep(Duration::from_millis(3_600_000)).await;
    assert!(backend.contains(TABLE, "sess:expired"));

    // Manual passes still work while the timer is disabled.
    assert_eq!(store.reap().await.unwrap(), 1);
}
