//! In-memory implementations of the storage and collaborator interfaces.
//!
//! Used when the server runs without `DATABASE_URL` and by the test suites.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{DeliveryRecord, DeliveryStatus, NewNotification, Notification, UserId};
use crate::services::directory::DeviceDirectory;
use crate::services::notifications::NotificationStore;
use crate::services::tracker::DeliveryStore;

fn lock<T>(mutex: &Mutex<T>) -> AppResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| AppError::Internal("in-memory store lock poisoned".to_string()))
}

// =============================================================================
// Delivery records
// =============================================================================

#[derive(Default)]
pub struct MemoryDeliveryStore {
    records: Mutex<Vec<DeliveryRecord>>,
}

impl MemoryDeliveryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored record, in insertion order
    pub fn all(&self) -> Vec<DeliveryRecord> {
        lock(&self.records)
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DeliveryStore for MemoryDeliveryStore {
    async fn insert(&self, record: &DeliveryRecord) -> AppResult<()> {
        let mut records = lock(&self.records)?;
        if records.iter().any(|r| r.id == record.id) {
            return Err(AppError::Conflict(format!(
                "Delivery {} already exists",
                record.id
            )));
        }
        records.push(record.clone());
        Ok(())
    }

    async fn transition(&self, record: &DeliveryRecord, from: DeliveryStatus) -> AppResult<()> {
        let mut records = lock(&self.records)?;
        let stored = records
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or_else(|| AppError::NotFound(format!("Delivery {} not found", record.id)))?;

        if stored.status != from {
            return Err(AppError::Conflict(format!(
                "Delivery {} is no longer {}",
                record.id, from
            )));
        }

        *stored = record.clone();
        Ok(())
    }

    async fn list_for_event(&self, event_id: Uuid) -> AppResult<Vec<DeliveryRecord>> {
        let records = lock(&self.records)?;
        Ok(records
            .iter()
            .filter(|r| r.event_id == event_id)
            .cloned()
            .collect())
    }
}

// =============================================================================
// Device directory
// =============================================================================

#[derive(Default)]
pub struct MemoryDeviceDirectory {
    tokens: Mutex<HashMap<UserId, String>>,
}

impl MemoryDeviceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration for fixtures
    pub fn with_token(self, user_id: UserId, token: impl Into<String>) -> Self {
        if let Ok(mut tokens) = lock(&self.tokens) {
            tokens.insert(user_id, token.into());
        }
        self
    }
}

#[async_trait]
impl DeviceDirectory for MemoryDeviceDirectory {
    async fn active_token(&self, user_id: UserId) -> AppResult<Option<String>> {
        Ok(lock(&self.tokens)?.get(&user_id).cloned())
    }

    async fn register(&self, user_id: UserId, token: &str) -> AppResult<()> {
        let mut tokens = lock(&self.tokens)?;
        tokens.retain(|owner, existing| *owner == user_id || existing != token);
        tokens.insert(user_id, token.to_string());
        Ok(())
    }
}

// =============================================================================
// Notifications
// =============================================================================

#[derive(Default)]
pub struct MemoryNotificationStore {
    notifications: Mutex<Vec<Notification>>,
}

impl MemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Notification> {
        lock(&self.notifications)
            .map(|n| n.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn create(&self, notification: NewNotification) -> AppResult<Uuid> {
        let id = Uuid::new_v4();
        lock(&self.notifications)?.push(Notification {
            id,
            recipient_id: notification.recipient_id,
            title: notification.title,
            message: notification.message,
            notification_type: notification.notification_type,
            is_read: false,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn list_for_recipient(
        &self,
        recipient_id: UserId,
        limit: i64,
    ) -> AppResult<Vec<Notification>> {
        let notifications = lock(&self.notifications)?;
        Ok(notifications
            .iter()
            .rev()
            .filter(|n| n.recipient_id == recipient_id)
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }
}
