//! Notification record store: the "notification created" facts written after
//! a successful push.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{NewNotification, Notification, UserId};

#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Stores a new unread notification and returns its id
    async fn create(&self, notification: NewNotification) -> AppResult<Uuid>;

    /// Lists a user's notifications, newest first
    async fn list_for_recipient(&self, recipient_id: UserId, limit: i64)
        -> AppResult<Vec<Notification>>;
}

/// PostgreSQL-backed notification store
pub struct PgNotificationStore {
    pool: PgPool,
}

impl PgNotificationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn create(&self, notification: NewNotification) -> AppResult<Uuid> {
        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO notifications (id, recipient_id, title, message, notification_type)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(notification.recipient_id)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.notification_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn list_for_recipient(
        &self,
        recipient_id: UserId,
        limit: i64,
    ) -> AppResult<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, recipient_id, title, message, notification_type, is_read, created_at
            FROM notifications
            WHERE recipient_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(recipient_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }
}
