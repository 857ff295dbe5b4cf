use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One appended row per handled moderation request.
///
/// `token` is a plain string reference, not a foreign key: the record must
/// survive token revocation and tolerates dangling values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    pub token: String,
    pub endpoint: String,
    pub method: String,
    pub status_code: Option<i16>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl UsageRecord {
    pub fn new(
        token: String,
        endpoint: &str,
        method: &str,
        status_code: Option<i16>,
        metadata: Option<serde_json::Value>,
    ) -> Self {
        Self {
            token,
            endpoint: endpoint.to_string(),
            method: method.to_string(),
            status_code,
            metadata,
            created_at: Utc::now(),
        }
    }
}
