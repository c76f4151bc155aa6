//! Dispatch coordinator for the emergency fan-out.
//!
//! Renders the alert once, then delivers it to the push channel and every social
//! channel concurrently. Each channel gets its own delivery record and its own
//! timeout; a failure on one channel never blocks, retries or rolls back another.
//! Overall success is decided by the push channel alone.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::error::{AppError, AppResult, ChannelError};
use crate::models::{
    ChannelKind, DeliveryStatus, EmergencyEvent, NewNotification, NotificationType, UserId,
};
use crate::services::channels::{ChannelAdapter, DeliveryOutcome, Envelope, MediaAttachment};
use crate::services::notifications::NotificationStore;
use crate::services::render::{render, RenderedMessage};
use crate::services::tracker::DeliveryTracker;

// =============================================================================
// Dispatch Result
// =============================================================================

/// Outcome of one channel within a dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelResult {
    pub channel: ChannelKind,
    pub outcome: DeliveryOutcome,
}

#[derive(Serialize)]
struct ChannelResultView {
    channel: ChannelKind,
    status: DeliveryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    http_status: Option<u16>,
}

impl Serialize for ChannelResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ChannelResultView {
            channel: self.channel,
            status: if self.outcome.is_posted() {
                DeliveryStatus::Posted
            } else {
                DeliveryStatus::Failed
            },
            error: self.outcome.error_message(),
            http_status: self.outcome.http_status(),
        }
        .serialize(serializer)
    }
}

/// Aggregate of a full fan-out, returned to the caller and never persisted
#[derive(Debug, Clone, Serialize)]
pub struct DispatchResult {
    pub event_id: Uuid,
    /// True iff the push channel posted; social outcomes are informational
    pub overall: bool,
    pub results: Vec<ChannelResult>,
}

impl DispatchResult {
    pub fn outcome(&self, channel: ChannelKind) -> Option<&DeliveryOutcome> {
        self.results
            .iter()
            .find(|r| r.channel == channel)
            .map(|r| &r.outcome)
    }
}

// =============================================================================
// Dispatch Coordinator
// =============================================================================

#[derive(Clone)]
pub struct DispatchCoordinator {
    push: Arc<dyn ChannelAdapter>,
    social: Vec<Arc<dyn ChannelAdapter>>,
    tracker: DeliveryTracker,
    notifications: Arc<dyn NotificationStore>,
    channel_timeout: Duration,
}

impl DispatchCoordinator {
    pub fn new(
        push: Arc<dyn ChannelAdapter>,
        social: Vec<Arc<dyn ChannelAdapter>>,
        tracker: DeliveryTracker,
        notifications: Arc<dyn NotificationStore>,
        channel_timeout: Duration,
    ) -> Self {
        Self {
            push,
            social,
            tracker,
            notifications,
            channel_timeout,
        }
    }

    /// Delivers an emergency alert to every configured channel
    ///
    /// Only a malformed event is an error; every channel problem is reported
    /// inside the returned [`DispatchResult`]. The fan-out runs on its own task,
    /// so in-flight deliveries finish (or time out) even if the caller goes away.
    pub async fn dispatch_emergency(
        &self,
        event: EmergencyEvent,
        target_user: UserId,
        media: Option<MediaAttachment>,
    ) -> AppResult<DispatchResult> {
        let message = match render(&event) {
            Ok(message) => message,
            Err(e) => {
                log::warn!("Rejected emergency event {}: {}", event.id, e);
                if let Some(media) = &media {
                    release_media(media).await;
                }
                return Err(e.into());
            }
        };

        let coordinator = self.clone();
        tokio::spawn(async move {
            coordinator
                .fan_out(event.id, target_user, message, media)
                .await
        })
        .await
        .map_err(|e| AppError::Internal(format!("Dispatch task failed: {}", e)))
    }

    async fn fan_out(
        &self,
        event_id: Uuid,
        target_user: UserId,
        message: RenderedMessage,
        media: Option<MediaAttachment>,
    ) -> DispatchResult {
        log::info!(
            "Dispatching emergency {} to {} channels",
            event_id,
            1 + self.social.len()
        );

        let envelope = Envelope {
            recipient: target_user,
            notification_type: NotificationType::Emergency,
            reference: Some(event_id),
            message: &message,
            media: media.as_ref(),
        };

        let deliveries = std::iter::once(&self.push)
            .chain(self.social.iter())
            .map(|adapter| self.deliver_one(event_id, adapter.as_ref(), &envelope));
        let results = join_all(deliveries).await;

        // Media is shared by every channel and only released after all of them returned
        if let Some(media) = &media {
            release_media(media).await;
        }

        let overall = results
            .iter()
            .any(|r| r.channel == ChannelKind::Push && r.outcome.is_posted());

        if overall {
            self.record_notification(target_user, &message).await;
        }

        let failed = results.iter().filter(|r| !r.outcome.is_posted()).count();
        log::info!(
            "Emergency {} dispatched: overall={}, {} of {} channels failed",
            event_id,
            overall,
            failed,
            results.len()
        );

        DispatchResult {
            event_id,
            overall,
            results,
        }
    }

    /// Runs one channel: begin record, deliver under timeout, complete record
    async fn deliver_one(
        &self,
        event_id: Uuid,
        adapter: &dyn ChannelAdapter,
        envelope: &Envelope<'_>,
    ) -> ChannelResult {
        let channel = adapter.kind();
        let media_ref = envelope.media.map(|m| m.file_name.clone());

        // Tracking is best-effort: a storage failure never stops the delivery itself
        let record = match self
            .tracker
            .begin(event_id, channel, envelope.message, media_ref)
            .await
        {
            Ok(record) => Some(record),
            Err(e) => {
                log::error!(
                    "Failed to create delivery record for {} ({}): {}",
                    event_id,
                    channel,
                    e
                );
                None
            }
        };

        let outcome = match tokio::time::timeout(self.channel_timeout, adapter.deliver(envelope))
            .await
        {
            Ok(outcome) => outcome,
            Err(_) => DeliveryOutcome::failed(ChannelError::Timeout, None),
        };

        if let Some(record) = record {
            if let Err(e) = self.tracker.complete(record, &outcome).await {
                log::error!(
                    "Failed to complete delivery record for {} ({}): {}",
                    event_id,
                    channel,
                    e
                );
            }
        }

        match outcome.error() {
            None => log::info!("Emergency {} posted to {}", event_id, channel),
            Some(error) => log::warn!(
                "Emergency {} to {} failed: {}",
                event_id,
                channel,
                error
            ),
        }

        ChannelResult { channel, outcome }
    }

    async fn record_notification(&self, recipient: UserId, message: &RenderedMessage) {
        let notification = NewNotification {
            recipient_id: recipient,
            title: message.title.clone(),
            message: message.body.clone(),
            notification_type: NotificationType::Emergency,
        };

        if let Err(e) = self.notifications.create(notification).await {
            log::warn!(
                "Failed to record emergency notification for user {}: {}",
                recipient,
                e
            );
        }
    }
}

/// Deletes a temporary media upload; externally owned files are left alone
pub(crate) async fn release_media(media: &MediaAttachment) {
    if !media.temporary {
        return;
    }

    match tokio::fs::remove_file(&media.path).await {
        Ok(()) => log::debug!("Removed temporary media {}", media.path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!(
            "Failed to remove temporary media {}: {}",
            media.path.display(),
            e
        ),
    }
}
