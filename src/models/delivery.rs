//! Delivery tracking models.
//!
//! One `DeliveryRecord` exists per (emergency event, channel) attempt and forms
//! the audit trail of the fan-out pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// =============================================================================
// Channel Kind Enum
// =============================================================================

/// Outbound channel an emergency alert is delivered to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Push,
    Facebook,
    Telegram,
    Discord,
}

impl ChannelKind {
    /// Social platforms, in the order they are configured
    pub const SOCIAL: [ChannelKind; 3] = [
        ChannelKind::Facebook,
        ChannelKind::Telegram,
        ChannelKind::Discord,
    ];

    pub fn is_social(self) -> bool {
        !matches!(self, ChannelKind::Push)
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelKind::Push => write!(f, "push"),
            ChannelKind::Facebook => write!(f, "facebook"),
            ChannelKind::Telegram => write!(f, "telegram"),
            ChannelKind::Discord => write!(f, "discord"),
        }
    }
}

// =============================================================================
// Delivery Status Enum
// =============================================================================

/// Status of a single channel delivery attempt
///
/// Transitions are strictly `Pending -> Processing -> (Posted | Failed)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum DeliveryStatus {
    Pending,
    Processing,
    Posted,
    Failed,
}

impl DeliveryStatus {
    /// Returns true if moving from this status to `next` is a legal transition
    pub fn can_transition_to(self, next: DeliveryStatus) -> bool {
        matches!(
            (self, next),
            (DeliveryStatus::Pending, DeliveryStatus::Processing)
                | (DeliveryStatus::Processing, DeliveryStatus::Posted)
                | (DeliveryStatus::Processing, DeliveryStatus::Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, DeliveryStatus::Posted | DeliveryStatus::Failed)
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryStatus::Pending => write!(f, "PENDING"),
            DeliveryStatus::Processing => write!(f, "PROCESSING"),
            DeliveryStatus::Posted => write!(f, "POSTED"),
            DeliveryStatus::Failed => write!(f, "FAILED"),
        }
    }
}

// =============================================================================
// Delivery Record Model
// =============================================================================

/// Audit row for one channel's attempt to deliver one emergency event
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct DeliveryRecord {
    pub id: Uuid,
    pub event_id: Uuid,
    pub channel: ChannelKind,
    /// Rendered text snapshot as sent to the channel
    pub content: String,
    /// File name of the attached media, if any (file is owned externally)
    pub media_ref: Option<String>,
    pub status: DeliveryStatus,
    /// Present iff status is FAILED
    pub error_message: Option<String>,
    pub http_status_code: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl DeliveryRecord {
    /// Creates a new record in PENDING state
    pub fn pending(
        event_id: Uuid,
        channel: ChannelKind,
        content: String,
        media_ref: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            channel,
            content,
            media_ref,
            status: DeliveryStatus::Pending,
            error_message: None,
            http_status_code: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}
