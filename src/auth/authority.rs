use std::sync::Arc;

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;

use crate::errors::AppError;
use crate::models::token::TokenRecord;
use crate::store::{StoreError, TokenStore};

/// Length of generated token secrets.
pub const SECRET_LEN: usize = 32;

/// Fresh secrets to try when an insert collides on the unique index.
const ISSUE_ATTEMPTS: usize = 3;

/// Issues, verifies, lists and revokes bearer tokens.
///
/// Admin gating lives in the HTTP layer; the authority itself does not care
/// who is asking.
#[derive(Clone)]
pub struct TokenAuthority {
    store: Arc<dyn TokenStore>,
}

impl TokenAuthority {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    /// Generate a fresh secret from the OS CSPRNG. The secret is the sole
    /// credential, so a general-purpose PRNG is not acceptable here.
    fn generate_secret() -> String {
        let mut rng = OsRng;
        (0..SECRET_LEN)
            .map(|_| rng.sample(Alphanumeric) as char)
            .collect()
    }

    /// Create and persist a new token, returning the full record. This is
    /// the only operation that ever hands out the plaintext secret of a
    /// token the caller did not already know.
    pub async fn issue(
        &self,
        is_admin: bool,
        description: Option<String>,
    ) -> Result<TokenRecord, AppError> {
        for _ in 0..ISSUE_ATTEMPTS {
            let token = TokenRecord {
                secret: Self::generate_secret(),
                is_admin,
                created_at: Utc::now(),
                is_active: true,
                description: description.clone(),
            };
            match self.store.insert_token(&token).await {
                Ok(()) => return Ok(token),
                Err(StoreError::DuplicateSecret) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(StoreError::DuplicateSecret.into())
    }

    /// Exact-match lookup of an active token. Unknown and revoked secrets
    /// both come back as `None`; only transport failures are errors.
    pub async fn verify(&self, secret: &str) -> Result<Option<TokenRecord>, AppError> {
        Ok(self.store.get_active_token(secret).await?)
    }

    pub async fn list_active(&self) -> Result<Vec<TokenRecord>, AppError> {
        Ok(self.store.list_active_tokens().await?)
    }

    /// Soft-delete. Returns whether a record actually changed state.
    pub async fn revoke(&self, secret: &str) -> Result<bool, AppError> {
        Ok(self.store.deactivate_token(secret).await?)
    }
}
