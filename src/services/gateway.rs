//! Notification gateway for status-change events.
//!
//! A push-only path that reuses the push adapter directly: no social fan-out and
//! no delivery records. Successful pushes leave a notification fact for the
//! in-app notification list.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::error::ChannelError;
use crate::models::{NewNotification, NotificationType, ReportStatus, UserId};
use crate::services::channels::{ChannelAdapter, DeliveryOutcome, Envelope};
use crate::services::notifications::NotificationStore;
use crate::services::render::RenderedMessage;

pub const STATUS_UPDATE_TITLE: &str = "Emergency Status Update";

#[derive(Clone)]
pub struct NotificationGateway {
    push: Arc<dyn ChannelAdapter>,
    notifications: Arc<dyn NotificationStore>,
    channel_timeout: Duration,
}

impl NotificationGateway {
    pub fn new(
        push: Arc<dyn ChannelAdapter>,
        notifications: Arc<dyn NotificationStore>,
        channel_timeout: Duration,
    ) -> Self {
        Self {
            push,
            notifications,
            channel_timeout,
        }
    }

    /// Sends a plain push notification to a user
    pub async fn notify_status_change(
        &self,
        user: UserId,
        title: &str,
        body: &str,
    ) -> DeliveryOutcome {
        self.notify(user, title, body, None).await
    }

    /// Tells the reporter that their report changed status
    ///
    /// Returns `None` when the reporter made the change themselves.
    pub async fn notify_report_status(
        &self,
        report_id: Uuid,
        reporter: UserId,
        actor: UserId,
        status: ReportStatus,
    ) -> Option<DeliveryOutcome> {
        if reporter == actor {
            log::debug!(
                "Report {} updated by its reporter, skipping notification",
                report_id
            );
            return None;
        }

        let body = format!(
            "Your emergency report has been updated to {}",
            status.display_name()
        );

        Some(
            self.notify(reporter, STATUS_UPDATE_TITLE, &body, Some(report_id))
                .await,
        )
    }

    async fn notify(
        &self,
        user: UserId,
        title: &str,
        body: &str,
        reference: Option<Uuid>,
    ) -> DeliveryOutcome {
        let message = RenderedMessage {
            title: title.to_string(),
            body: body.to_string(),
        };
        let envelope = Envelope {
            recipient: user,
            notification_type: NotificationType::Update,
            reference,
            message: &message,
            media: None,
        };

        let outcome =
            match tokio::time::timeout(self.channel_timeout, self.push.deliver(&envelope)).await {
                Ok(outcome) => outcome,
                Err(_) => DeliveryOutcome::failed(ChannelError::Timeout, None),
            };

        match outcome.error() {
            None => {
                let notification = NewNotification {
                    recipient_id: user,
                    title: message.title,
                    message: message.body,
                    notification_type: NotificationType::Update,
                };
                if let Err(e) = self.notifications.create(notification).await {
                    log::warn!("Failed to record status notification for user {}: {}", user, e);
                }
            }
            Some(error) => {
                log::warn!("Status notification to user {} failed: {}", user, error);
            }
        }

        outcome
    }
}
