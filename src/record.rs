//! Stored record shapes and scan filter types.

use serde::{Deserialize, Serialize};

/// Tag written into every record's `type` attribute. Identifies records
/// written by this adapter; provenance only, never filtered on.
pub const RECORD_TYPE: &str = "session";

/// A session record as stored in the key-value table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// The prefixed session key; primary key in the table.
    pub id: String,
    /// JSON-serialized opaque session payload.
    pub sess: String,
    /// Epoch-milliseconds after which the record is considered stale.
    pub expires: i64,
    /// Constant adapter tag, stored under the attribute name `type`.
    #[serde(rename = "type")]
    pub record_type: String,
}

impl SessionRecord {
    /// Create a freshly tagged record.
    pub fn new(id: String, sess: String, expires: i64) -> Self {
        Self {
            id,
            sess,
            expires,
            record_type: RECORD_TYPE.to_string(),
        }
    }

    /// Whether the record is stale at the given epoch-milliseconds instant.
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.expires <= now_ms
    }
}

/// Partial update applied to an existing record. The primary key is never
/// part of the patch; it travels separately in the update call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPatch {
    /// Replacement serialized payload.
    pub sess: String,
    /// Replacement expiry, epoch-milliseconds.
    pub expires: i64,
}

/// A numeric less-than filter on a single attribute — the only filter
/// shape the scan capability needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryFilter {
    /// Attribute the comparison applies to.
    pub attribute: String,
    /// Matches records whose attribute value is strictly below this.
    pub less_than: i64,
}

impl ExpiryFilter {
    /// Filter for records whose `expires` attribute lies strictly before
    /// the given epoch-milliseconds instant.
    pub fn expires_before(now_ms: i64) -> Self {
        Self {
            attribute: "expires".to_string(),
            less_than: now_ms,
        }
    }
}

/// One projected scan result. Every field is optional: a projection of
/// `["id"]` yields items carrying only `id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanItem {
    /// The prefixed session key, when projected.
    pub id: Option<String>,
    /// The serialized payload, when projected.
    pub sess: Option<String>,
    /// The expiry timestamp, when projected.
    pub expires: Option<i64>,
}
