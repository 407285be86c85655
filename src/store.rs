//! The session store façade: prefixing, TTL policy, and the CRUD mapping
//! onto the key-value backend.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing;

use crate::config::StoreConfig;
use crate::reaper::{self, ReaperHandle};
use crate::record::{RecordPatch, SessionRecord};
use crate::result::StoreResult;
use crate::traits::{KeyValueBackend, SessionStore};

/// One day in milliseconds — default TTL when the payload carries no
/// `cookie.maxAge`.
pub const ONE_DAY_MS: i64 = 86_400_000;

/// Session store over a key-value table, with lazy expiry on read and a
/// periodic reaper for physical deletion.
///
/// The backend handle is shared and never mutated after construction. The
/// reaper task is owned by the store; call [`SessionStore::shutdown`]
/// before discarding the store to let an in-flight reap pass finish (the
/// task is aborted if the store is dropped without shutdown).
pub struct DynamoSessionStore {
    backend: Arc<dyn KeyValueBackend>,
    table: String,
    prefix: String,
    reaper: Mutex<Option<ReaperHandle>>,
}

impl fmt::Debug for DynamoSessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamoSessionStore")
            .field("backend", &self.backend.backend_type())
            .field("table", &self.table)
            .field("prefix", &self.prefix)
            .finish()
    }
}

impl DynamoSessionStore {
    /// Create a store over a pre-constructed backend. Spawns the periodic
    /// reaper when `config.reap_interval_ms` is positive.
    pub fn new(config: &StoreConfig, backend: Arc<dyn KeyValueBackend>) -> Self {
        let handle = config.reaping_enabled().then(|| {
            reaper::spawn(
                Arc::clone(&backend),
                config.table.clone(),
                config.prefix.clone(),
                config.reap_interval_ms,
            )
        });

        Self {
            backend,
            table: config.table.clone(),
            prefix: config.prefix.clone(),
            reaper: Mutex::new(handle),
        }
    }

    /// Create a store backed by DynamoDB, building the client from the
    /// configured credentials (or the SDK default provider chain).
    #[cfg(feature = "dynamodb")]
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let backend = crate::backend::DynamoDbBackend::connect(config).await?;
        Ok(Self::new(config, Arc::new(backend)))
    }

    /// Run one reap pass immediately, independent of the periodic timer.
    /// Returns the number of expired records removed.
    pub async fn reap(&self) -> StoreResult<u64> {
        reaper::reap_once(self.backend.as_ref(), &self.table, &self.prefix).await
    }

    fn key(&self, sid: &str) -> String {
        format!("{}{}", self.prefix, sid)
    }
}

#[async_trait]
impl SessionStore for DynamoSessionStore {
    async fn get(&self, sid: &str) -> StoreResult<Option<Value>> {
        let key = self.key(sid);
        tracing::debug!(key = %key, "get session");

        let Some(record) = self.backend.get_item(&self.table, &key).await? else {
            return Ok(None);
        };

        let now = Utc::now().timestamp_millis();
        if record.is_expired(now) {
            // Expired records read as absent; physical deletion is the
            // reaper's job.
            tracing::debug!(key = %key, expires = record.expires, "session expired");
            return Ok(None);
        }

        let session: Value = serde_json::from_str(&record.sess)?;
        Ok(Some(session))
    }

    async fn set(&self, sid: &str, session: &Value) -> StoreResult<()> {
        let key = self.key(sid);
        let now = Utc::now().timestamp_millis();
        let expires = now + max_age_ms(session).unwrap_or(ONE_DAY_MS);
        let sess = serde_json::to_string(session)?;
        tracing::debug!(key = %key, expires, "set session");

        let existing = match self.backend.get_item(&self.table, &key).await {
            Ok(existing) => existing,
            Err(err) => {
                // A failed lookup falls through to an insert rather than
                // failing the set; log it so backend outages stay visible.
                tracing::warn!(key = %key, error = %err, "session lookup failed, inserting fresh record");
                None
            }
        };

        match existing {
            Some(_) => {
                let patch = RecordPatch { sess, expires };
                self.backend.update_item(&self.table, &key, &patch).await
            }
            None => {
                let record = SessionRecord::new(key, sess, expires);
                self.backend.put_item(&self.table, &record).await
            }
        }
    }

    async fn destroy(&self, sid: &str) -> StoreResult<()> {
        let key = self.key(sid);
        tracing::debug!(key = %key, "destroy session");
        self.backend.delete_item(&self.table, &key).await
    }

    async fn shutdown(&self) {
        let handle = self.reaper.lock().await.take();
        if let Some(handle) = handle {
            handle.stop().await;
        }
    }
}

/// Extract a numeric `cookie.maxAge` (milliseconds) from the payload.
fn max_age_ms(session: &Value) -> Option<i64> {
    match session.get("cookie")?.get("maxAge")? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        _ => None,
    }
}
