use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A bearer token as stored and as returned to admins.
///
/// The secret doubles as the primary key. `is_active = false` is permanent:
/// records are soft-deleted so usage history keeps pointing at something.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TokenRecord {
    pub secret: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTokenRequest {
    #[serde(default)]
    pub is_admin: bool,
    pub description: Option<String>,
}
