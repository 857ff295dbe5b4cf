use async_trait::async_trait;
use sqlx::PgPool;

use super::{StoreError, TokenStore, UsageLog};
use crate::models::token::TokenRecord;
use crate::models::usage::UsageRecord;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn map_sqlx(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db) = e {
        if db.is_unique_violation() {
            return StoreError::DuplicateSecret;
        }
    }
    StoreError::Backend(e.into())
}

#[async_trait]
impl TokenStore for PgStore {
    async fn insert_token(&self, token: &TokenRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO tokens (secret, is_admin, created_at, is_active, description)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(&token.secret)
        .bind(token.is_admin)
        .bind(token.created_at)
        .bind(token.is_active)
        .bind(&token.description)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(())
    }

    async fn get_active_token(&self, secret: &str) -> Result<Option<TokenRecord>, StoreError> {
        let row = sqlx::query_as::<_, TokenRecord>(
            "SELECT secret, is_admin, created_at, is_active, description FROM tokens WHERE secret = $1 AND is_active = true"
        )
        .bind(secret)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(row)
    }

    async fn list_active_tokens(&self) -> Result<Vec<TokenRecord>, StoreError> {
        let rows = sqlx::query_as::<_, TokenRecord>(
            "SELECT secret, is_admin, created_at, is_active, description FROM tokens WHERE is_active = true ORDER BY created_at ASC"
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(rows)
    }

    async fn deactivate_token(&self, secret: &str) -> Result<bool, StoreError> {
        let result =
            sqlx::query("UPDATE tokens SET is_active = false WHERE secret = $1 AND is_active = true")
                .bind(secret)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx)?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UsageLog for PgStore {
    async fn append(&self, record: &UsageRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO usage_records (token, endpoint, method, status_code, metadata, created_at)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(&record.token)
        .bind(&record.endpoint)
        .bind(&record.method)
        .bind(record.status_code)
        .bind(&record.metadata)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(())
    }
}
