//! In-app notification facts and report status values.
//!
//! Notifications belong to the notification collaborator; the dispatch core only
//! writes a lightweight "notification created" fact after a successful push.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::UserId;

/// Category of an in-app notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationType {
    Emergency,
    Update,
    System,
    Other,
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationType::Emergency => write!(f, "EMERGENCY"),
            NotificationType::Update => write!(f, "UPDATE"),
            NotificationType::System => write!(f, "SYSTEM"),
            NotificationType::Other => write!(f, "OTHER"),
        }
    }
}

/// Stored notification
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: UserId,
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// DTO for creating a notification
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub recipient_id: UserId,
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
}

// =============================================================================
// Report Status
// =============================================================================

/// Lifecycle status of an emergency report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Pending,
    Responding,
    OnScene,
    Resolved,
}

impl ReportStatus {
    /// Human readable label used in status-change notifications
    pub fn display_name(self) -> &'static str {
        match self {
            ReportStatus::Pending => "Pending",
            ReportStatus::Responding => "Emergency Services Responding",
            ReportStatus::OnScene => "Emergency Services On Scene",
            ReportStatus::Resolved => "Resolved",
        }
    }
}

impl std::str::FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ReportStatus::Pending),
            "RESPONDING" => Ok(ReportStatus::Responding),
            "ON_SCENE" => Ok(ReportStatus::OnScene),
            "RESOLVED" => Ok(ReportStatus::Resolved),
            other => Err(format!(
                "Invalid status '{}'. Must be one of PENDING, RESPONDING, ON_SCENE, RESOLVED",
                other
            )),
        }
    }
}
