//! In-memory store backing tests and local development. Same contract as
//! the Postgres store, minus durability.

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{StoreError, TokenStore, UsageLog};
use crate::models::token::TokenRecord;
use crate::models::usage::UsageRecord;

#[derive(Default)]
pub struct MemoryStore {
    tokens: Mutex<Vec<TokenRecord>>,
    usages: Mutex<Vec<UsageRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything appended so far, oldest first.
    pub async fn usage_records(&self) -> Vec<UsageRecord> {
        self.usages.lock().await.clone()
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn insert_token(&self, token: &TokenRecord) -> Result<(), StoreError> {
        let mut tokens = self.tokens.lock().await;
        if tokens.iter().any(|t| t.secret == token.secret) {
            return Err(StoreError::DuplicateSecret);
        }
        tokens.push(token.clone());
        Ok(())
    }

    async fn get_active_token(&self, secret: &str) -> Result<Option<TokenRecord>, StoreError> {
        let tokens = self.tokens.lock().await;
        Ok(tokens
            .iter()
            .find(|t| t.secret == secret && t.is_active)
            .cloned())
    }

    async fn list_active_tokens(&self) -> Result<Vec<TokenRecord>, StoreError> {
        let tokens = self.tokens.lock().await;
        Ok(tokens.iter().filter(|t| t.is_active).cloned().collect())
    }

    async fn deactivate_token(&self, secret: &str) -> Result<bool, StoreError> {
        let mut tokens = self.tokens.lock().await;
        match tokens.iter_mut().find(|t| t.secret == secret && t.is_active) {
            Some(token) => {
                token.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl UsageLog for MemoryStore {
    async fn append(&self, record: &UsageRecord) -> Result<(), StoreError> {
        self.usages.lock().await.push(record.clone());
        Ok(())
    }
}
