pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::token::TokenRecord;
use crate::models::usage::UsageRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Insert hit the unique index on the token secret.
    #[error("duplicate token secret")]
    DuplicateSecret,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Persistent collection of issued tokens.
///
/// Soft-delete only: rows are deactivated, never removed, so the usage log
/// keeps its referential meaning. Every mutation is a single-row atomic
/// operation at the store level.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Insert a new token. `DuplicateSecret` if the secret is already taken,
    /// active or not.
    async fn insert_token(&self, token: &TokenRecord) -> Result<(), StoreError>;

    /// Exact-match lookup where `is_active = true`.
    async fn get_active_token(&self, secret: &str) -> Result<Option<TokenRecord>, StoreError>;

    /// All active tokens. Ordering is store-defined but stable within a call.
    async fn list_active_tokens(&self) -> Result<Vec<TokenRecord>, StoreError>;

    /// Set `is_active = false`. Returns whether a row actually changed, so a
    /// repeat call on the same secret reports no change.
    async fn deactivate_token(&self, secret: &str) -> Result<bool, StoreError>;
}

/// Append-only log of API accesses.
#[async_trait]
pub trait UsageLog: Send + Sync {
    async fn append(&self, record: &UsageRecord) -> Result<(), StoreError>;
}
