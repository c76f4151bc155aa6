//! Push notification adapter.
//!
//! Resolves the recipient's device token through the device directory and sends
//! the alert to the push provider (FCM HTTP API) with a bearer credential.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::{http_error, transport_error, ChannelAdapter, DeliveryOutcome, Envelope};
use crate::config::PushConfig;
use crate::error::ChannelError;
use crate::models::ChannelKind;
use crate::services::directory::DeviceDirectory;

const SOUND: &str = "default";
const BADGE: &str = "1";
const CLICK_ACTION: &str = "FLUTTER_NOTIFICATION_CLICK";

/// Push provider request body
#[derive(Debug, Serialize)]
struct PushRequest<'a> {
    to: &'a str,
    notification: PushNotification<'a>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    data: BTreeMap<&'static str, String>,
}

#[derive(Debug, Serialize)]
struct PushNotification<'a> {
    title: &'a str,
    body: &'a str,
    sound: &'static str,
    badge: &'static str,
    click_action: &'static str,
}

/// Legacy FCM response body; other providers may answer without it
#[derive(Debug, Default, Deserialize)]
struct PushResponse {
    #[serde(default)]
    failure: u32,
    #[serde(default)]
    results: Vec<PushResult>,
}

#[derive(Debug, Deserialize)]
struct PushResult {
    #[serde(default)]
    error: Option<String>,
}

/// Push notification adapter
pub struct PushNotifier {
    client: reqwest::Client,
    config: PushConfig,
    directory: Arc<dyn DeviceDirectory>,
}

impl PushNotifier {
    /// Creates a push notifier using the shared HTTP client
    pub fn new(
        client: reqwest::Client,
        config: PushConfig,
        directory: Arc<dyn DeviceDirectory>,
    ) -> Self {
        Self {
            client,
            config,
            directory,
        }
    }

    fn build_request<'a>(token: &'a str, envelope: &'a Envelope<'_>) -> PushRequest<'a> {
        let mut data = BTreeMap::new();
        data.insert(
            "notification_type",
            envelope.notification_type.to_string(),
        );
        if let Some(reference) = envelope.reference {
            data.insert("reference_id", reference.to_string());
        }

        PushRequest {
            to: token,
            notification: PushNotification {
                title: &envelope.message.title,
                body: &envelope.message.body,
                sound: SOUND,
                badge: BADGE,
                click_action: CLICK_ACTION,
            },
            data,
        }
    }

    /// Interprets a 200 response body; a reported failure count means rejection
    fn check_body(body: &str) -> Result<(), ChannelError> {
        let parsed: PushResponse = match serde_json::from_str(body) {
            Ok(parsed) => parsed,
            Err(_) => return Ok(()),
        };

        if parsed.failure == 0 {
            return Ok(());
        }

        let reason = parsed
            .results
            .into_iter()
            .find_map(|r| r.error)
            .unwrap_or_else(|| "push rejected by provider".to_string());
        Err(ChannelError::Transport(reason))
    }
}

#[async_trait]
impl ChannelAdapter for PushNotifier {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Push
    }

    async fn deliver(&self, envelope: &Envelope<'_>) -> DeliveryOutcome {
        let token = match self.directory.active_token(envelope.recipient).await {
            Ok(Some(token)) => token,
            Ok(None) => return DeliveryOutcome::failed(ChannelError::no_token(), None),
            Err(e) => {
                log::error!(
                    "Device directory lookup failed for user {}: {}",
                    envelope.recipient,
                    e
                );
                return DeliveryOutcome::failed(
                    ChannelError::Unavailable("device_lookup_failed".to_string()),
                    None,
                );
            }
        };

        let Some(server_key) = self.config.server_key.as_deref() else {
            return DeliveryOutcome::failed(ChannelError::not_configured(), None);
        };

        let request = Self::build_request(&token, envelope);

        let response = match self
            .client
            .post(&self.config.url)
            .bearer_auth(server_key)
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return DeliveryOutcome::failed(transport_error("Push", e), None),
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status != StatusCode::OK {
            return DeliveryOutcome::failed(
                http_error("Push", status.as_u16(), Some(body)),
                Some(status.as_u16()),
            );
        }

        match Self::check_body(&body) {
            Ok(()) => DeliveryOutcome::posted(Some(status.as_u16())),
            Err(error) => DeliveryOutcome::failed(error, Some(status.as_u16())),
        }
    }
}
