//! Delivery tracker.
//!
//! Persists one delivery record per (event, channel) attempt and drives its
//! status through `PENDING -> PROCESSING -> POSTED | FAILED`. Records are keyed
//! by their own id, so concurrent dispatches never touch each other's rows.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{ChannelKind, DeliveryRecord, DeliveryStatus};
use crate::services::channels::DeliveryOutcome;
use crate::services::render::RenderedMessage;

/// Storage interface for delivery records
#[async_trait]
pub trait DeliveryStore: Send + Sync {
    async fn insert(&self, record: &DeliveryRecord) -> AppResult<()>;

    /// Persists `record` only if the stored status still equals `from`
    async fn transition(&self, record: &DeliveryRecord, from: DeliveryStatus) -> AppResult<()>;

    /// All records of one event, oldest first
    async fn list_for_event(&self, event_id: Uuid) -> AppResult<Vec<DeliveryRecord>>;
}

/// Records delivery attempts and their outcomes
#[derive(Clone)]
pub struct DeliveryTracker {
    store: Arc<dyn DeliveryStore>,
}

impl DeliveryTracker {
    pub fn new(store: Arc<dyn DeliveryStore>) -> Self {
        Self { store }
    }

    /// Creates a PENDING record and moves it to PROCESSING
    ///
    /// Both steps land in a single insert, so a failed write never leaves a
    /// PENDING row behind that nothing will complete.
    pub async fn begin(
        &self,
        event_id: Uuid,
        channel: ChannelKind,
        message: &RenderedMessage,
        media_ref: Option<String>,
    ) -> AppResult<DeliveryRecord> {
        let pending = DeliveryRecord::pending(event_id, channel, message.body.clone(), media_ref);
        let record = Self::transitioned(pending, DeliveryStatus::Processing, None, None)?;
        self.store.insert(&record).await?;

        log::debug!(
            "Delivery {} ({}) for event {}: {} -> {}",
            record.id,
            record.channel,
            record.event_id,
            DeliveryStatus::Pending,
            record.status
        );

        Ok(record)
    }

    /// Moves a PROCESSING record to its terminal state
    pub async fn complete(
        &self,
        record: DeliveryRecord,
        outcome: &DeliveryOutcome,
    ) -> AppResult<DeliveryRecord> {
        let next = if outcome.is_posted() {
            DeliveryStatus::Posted
        } else {
            DeliveryStatus::Failed
        };

        self.advance(record, next, outcome.error_message(), outcome.http_status())
            .await
    }

    /// Audit trail for one event
    pub async fn list_for_event(&self, event_id: Uuid) -> AppResult<Vec<DeliveryRecord>> {
        self.store.list_for_event(event_id).await
    }

    async fn advance(
        &self,
        record: DeliveryRecord,
        next: DeliveryStatus,
        error_message: Option<String>,
        http_status: Option<u16>,
    ) -> AppResult<DeliveryRecord> {
        let from = record.status;
        let updated = Self::transitioned(record, next, error_message, http_status)?;

        self.store.transition(&updated, from).await?;

        log::debug!(
            "Delivery {} ({}) for event {}: {} -> {}",
            updated.id,
            updated.channel,
            updated.event_id,
            from,
            next
        );

        Ok(updated)
    }

    /// Applies a legal status change to the in-memory record
    fn transitioned(
        record: DeliveryRecord,
        next: DeliveryStatus,
        error_message: Option<String>,
        http_status: Option<u16>,
    ) -> AppResult<DeliveryRecord> {
        if !record.status.can_transition_to(next) {
            return Err(AppError::Conflict(format!(
                "Delivery {} cannot move from {} to {}",
                record.id, record.status, next
            )));
        }

        Ok(DeliveryRecord {
            status: next,
            error_message: if next == DeliveryStatus::Failed {
                Some(error_message.unwrap_or_else(|| "unknown error".to_string()))
            } else {
                None
            },
            http_status_code: http_status.map(i32::from).or(record.http_status_code),
            completed_at: next.is_terminal().then(Utc::now),
            ..record
        })
    }
}

// =============================================================================
// PostgreSQL store
// =============================================================================

/// PostgreSQL-backed delivery store
pub struct PgDeliveryStore {
    pool: PgPool,
}

impl PgDeliveryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeliveryStore for PgDeliveryStore {
    async fn insert(&self, record: &DeliveryRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO delivery_records (
                id, event_id, channel, content, media_ref,
                status, error_message, http_status_code, created_at, completed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(record.id)
        .bind(record.event_id)
        .bind(record.channel)
        .bind(&record.content)
        .bind(&record.media_ref)
        .bind(record.status)
        .bind(&record.error_message)
        .bind(record.http_status_code)
        .bind(record.created_at)
        .bind(record.completed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn transition(&self, record: &DeliveryRecord, from: DeliveryStatus) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE delivery_records
            SET status = $2, error_message = $3, http_status_code = $4, completed_at = $5
            WHERE id = $1 AND status = $6
            "#,
        )
        .bind(record.id)
        .bind(record.status)
        .bind(&record.error_message)
        .bind(record.http_status_code)
        .bind(record.completed_at)
        .bind(from)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(format!(
                "Delivery {} is no longer {}",
                record.id, from
            )));
        }

        Ok(())
    }

    async fn list_for_event(&self, event_id: Uuid) -> AppResult<Vec<DeliveryRecord>> {
        let records = sqlx::query_as::<_, DeliveryRecord>(
            r#"
            SELECT id, event_id, channel, content, media_ref, status,
                   error_message, http_status_code, created_at, completed_at
            FROM delivery_records
            WHERE event_id = $1
            ORDER BY created_at, channel
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
