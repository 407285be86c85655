//! # dynamodb-sessions
//!
//! A session store for HTTP session middleware that persists sessions into
//! a DynamoDB table. Sessions are stored as JSON strings under a prefixed
//! key, expire after a per-session TTL, and are physically removed by a
//! periodic background reaper.
//!
//! The storage seam is the [`KeyValueBackend`] trait. The default backend
//! talks to DynamoDB through `aws-sdk-dynamodb` (feature `dynamodb`, on by
//! default); an in-memory backend is available for tests and local
//! development.
//!
//! ```no_run
//! use dynamodb_sessions::{DynamoSessionStore, SessionStore, StoreConfig};
//!
//! # async fn demo() -> dynamodb_sessions::StoreResult<()> {
//! let store = DynamoSessionStore::connect(&StoreConfig::default()).await?;
//! store.set("sid-1", &serde_json::json!({"user": "alice"})).await?;
//! let session = store.get("sid-1").await?;
//! store.destroy("sid-1").await?;
//! store.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! The store owns a background reaper task while reaping is enabled.
//! Call [`SessionStore::shutdown`] before discarding the store; the task
//! is aborted if the store is dropped without shutdown, but an explicit
//! shutdown lets an in-flight reap pass finish cleanly.

pub mod backend;
pub mod config;
pub mod error;
pub mod reaper;
pub mod record;
pub mod result;
pub mod store;
pub mod traits;

pub use config::StoreConfig;
pub use error::{ErrorKind, StoreError};
pub use result::StoreResult;
pub use store::DynamoSessionStore;
pub use traits::{KeyValueBackend, SessionStore};
