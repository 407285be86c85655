//! In-memory key-value backend backed by dashmap.
//!
//! Used by the test suite and for local development; semantics mirror the
//! DynamoDB backend, including upsert-on-update.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::StoreError;
use crate::record::{ExpiryFilter, RecordPatch, ScanItem, SessionRecord};
use crate::result::StoreResult;
use crate::traits::KeyValueBackend;

/// In-process key-value backend, keyed by (table, primary key).
#[derive(Debug, Default)]
pub struct MemoryBackend {
    items: DashMap<(String, String), SessionRecord>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held in `table`.
    pub fn len(&self, table: &str) -> usize {
        self.items.iter().filter(|e| e.key().0 == table).count()
    }

    /// Whether a record physically exists at `key`, expired or not.
    pub fn contains(&self, table: &str, key: &str) -> bool {
        self.items
            .contains_key(&(table.to_string(), key.to_string()))
    }
}

#[async_trait]
impl KeyValueBackend for MemoryBackend {
    fn backend_type(&self) -> &str {
        "memory"
    }

    async fn get_item(&self, table: &str, key: &str) -> StoreResult<Option<SessionRecord>> {
        Ok(self
            .items
            .get(&(table.to_string(), key.to_string()))
            .map(|entry| entry.value().clone()))
    }

    async fn put_item(&self, table: &str, record: &SessionRecord) -> StoreResult<()> {
        self.items
            .insert((table.to_string(), record.id.clone()), record.clone());
        Ok(())
    }

    async fn update_item(&self, table: &str, key: &str, patch: &RecordPatch) -> StoreResult<()> {
        let map_key = (table.to_string(), key.to_string());
        match self.items.get_mut(&map_key) {
            Some(mut entry) => {
                let record = entry.value_mut();
                record.sess = patch.sess.clone();
                record.expires = patch.expires;
            }
            // UpdateItem on a missing key upserts, as DynamoDB does.
            None => {
                self.items.insert(
                    map_key,
                    SessionRecord::new(key.to_string(), patch.sess.clone(), patch.expires),
                );
            }
        }
        Ok(())
    }

    async fn delete_item(&self, table: &str, key: &str) -> StoreResult<()> {
        self.items.remove(&(table.to_string(), key.to_string()));
        Ok(())
    }

    async fn scan(
        &self,
        table: &str,
        filter: &ExpiryFilter,
        projection: &[&str],
    ) -> StoreResult<Vec<ScanItem>> {
        if filter.attribute != "expires" {
            return Err(StoreError::backend(format!(
                "memory backend cannot filter on attribute `{}`",
                filter.attribute
            )));
        }

        let want = |name: &str| projection.is_empty() || projection.contains(&name);
        let mut matches = Vec::new();
        for entry in self.items.iter() {
            if entry.key().0 != table {
                continue;
            }
            let record = entry.value();
            if record.expires >= filter.less_than {
                continue;
            }
            matches.push(ScanItem {
                id: want("id").then(|| record.id.clone()),
                sess: want("sess").then(|| record.sess.clone()),
                expires: want("expires").then_some(record.expires),
            });
        }
        Ok(matches)
    }
}
