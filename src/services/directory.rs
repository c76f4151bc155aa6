//! Device directory: resolves the active push token of a user.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::AppResult;
use crate::models::UserId;

/// Push device tokens, owned by the user collaborator
#[async_trait]
pub trait DeviceDirectory: Send + Sync {
    /// Returns the most recent active token, or `None` if the user has no device
    async fn active_token(&self, user_id: UserId) -> AppResult<Option<String>>;

    /// Registers or refreshes a token; a token moves to the latest user that registers it
    async fn register(&self, user_id: UserId, token: &str) -> AppResult<()>;
}

/// PostgreSQL-backed device directory
pub struct PgDeviceDirectory {
    pool: PgPool,
}

impl PgDeviceDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeviceDirectory for PgDeviceDirectory {
    async fn register(&self, user_id: UserId, token: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO device_tokens (user_id, token, is_active, updated_at)
            VALUES ($1, $2, TRUE, NOW())
            ON CONFLICT (token)
            DO UPDATE SET user_id = EXCLUDED.user_id, is_active = TRUE, updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn active_token(&self, user_id: UserId) -> AppResult<Option<String>> {
        let token: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT token
            FROM device_tokens
            WHERE user_id = $1 AND is_active = TRUE
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token.map(|(t,)| t))
    }
}
