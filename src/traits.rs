//! Capability traits: the session store surface exposed to middleware,
//! and the key-value backend it consumes.

use async_trait::async_trait;
use serde_json::Value;

use crate::record::{ExpiryFilter, RecordPatch, ScanItem, SessionRecord};
use crate::result::StoreResult;

/// The session store surface consumed by session middleware.
///
/// Session payloads are opaque JSON: the store round-trips them without
/// imposing any schema beyond the optional `cookie.maxAge` TTL hint read
/// by `set`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch the session for `sid`. Missing and expired sessions both
    /// surface as `Ok(None)`; an expired record is left in place for the
    /// reaper. A stored payload that fails to deserialize is an error,
    /// distinct from absence.
    async fn get(&self, sid: &str) -> StoreResult<Option<Value>>;

    /// Store the session payload for `sid`, fully replacing any previous
    /// payload and expiry. The expiry is `now + cookie.maxAge` when the
    /// payload carries a numeric `cookie.maxAge` (milliseconds), else
    /// `now + 86_400_000`.
    async fn set(&self, sid: &str, session: &Value) -> StoreResult<()>;

    /// Delete the session for `sid`. Idempotent; deleting a session that
    /// does not exist succeeds.
    async fn destroy(&self, sid: &str) -> StoreResult<()>;

    /// Stop the periodic reaper. Idempotent: safe to call any number of
    /// times, and a no-op when reaping was never enabled.
    async fn shutdown(&self);
}

/// Trait for key-value table backends.
///
/// The store issues one independent request per call; the backend owns all
/// networking, retries, and authentication. Any storage engine that can
/// satisfy these five calls (including a less-than numeric scan filter on
/// one attribute) can be substituted.
#[async_trait]
pub trait KeyValueBackend: Send + Sync + std::fmt::Debug + 'static {
    /// Return the backend type name (e.g., "dynamodb", "memory").
    fn backend_type(&self) -> &str;

    /// Fetch a record by primary key. Absence is `Ok(None)`, not an error.
    async fn get_item(&self, table: &str, key: &str) -> StoreResult<Option<SessionRecord>>;

    /// Insert or fully replace a record.
    async fn put_item(&self, table: &str, record: &SessionRecord) -> StoreResult<()>;

    /// Patch `sess` and `expires` on the record at `key`. The key is
    /// supplied separately and is never part of the patch payload.
    async fn update_item(&self, table: &str, key: &str, patch: &RecordPatch) -> StoreResult<()>;

    /// Delete the record at `key`. Idempotent.
    async fn delete_item(&self, table: &str, key: &str) -> StoreResult<()>;

    /// Scan the table for records matching `filter`, returning only the
    /// attributes named in `projection` (all attributes when empty).
    async fn scan(
        &self,
        table: &str,
        filter: &ExpiryFilter,
        projection: &[&str],
    ) -> StoreResult<Vec<ScanItem>>;
}
