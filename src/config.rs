//! Session store configuration.

use serde::{Deserialize, Serialize};

/// Session store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// String prepended to every session id before storage.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Target table name.
    #[serde(default = "default_table")]
    pub table: String,
    /// Milliseconds between reap passes. A non-positive value disables the
    /// reaper entirely.
    #[serde(default = "default_reap_interval")]
    pub reap_interval_ms: i64,
    /// AWS access key id, used when no pre-built backend is supplied.
    /// When absent the SDK's default credential provider chain is used.
    #[serde(default)]
    pub access_key_id: Option<String>,
    /// AWS secret access key, paired with `access_key_id`.
    #[serde(default)]
    pub secret_access_key: Option<String>,
    /// AWS region override.
    #[serde(default)]
    pub region: Option<String>,
    /// Endpoint override, e.g. for DynamoDB Local.
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

impl StoreConfig {
    /// Whether the periodic reaper should run.
    pub fn reaping_enabled(&self) -> bool {
        self.reap_interval_ms > 0
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            table: default_table(),
            reap_interval_ms: default_reap_interval(),
            access_key_id: None,
            secret_access_key: None,
            region: None,
            endpoint_url: None,
        }
    }
}

fn default_prefix() -> String {
    "sess:".to_string()
}

fn default_table() -> String {
    "sessions".to_string()
}

fn default_reap_interval() -> i64 {
    600_000
}
