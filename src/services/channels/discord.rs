//! Discord webhook adapter.

use async_trait::async_trait;
use reqwest::multipart::Form;
use reqwest::StatusCode;
use serde::Serialize;

use super::{http_error, transport_error, ChannelAdapter, DeliveryOutcome, Envelope, MediaAttachment};
use crate::config::DiscordConfig;
use crate::error::ChannelError;
use crate::models::ChannelKind;

/// Outbound webhook call
#[derive(Debug, PartialEq)]
enum DiscordMessage<'a> {
    Text { content: &'a str },
    File {
        content: &'a str,
        media: &'a MediaAttachment,
    },
}

#[derive(Debug, Serialize)]
struct TextPayload<'a> {
    content: &'a str,
}

impl<'a> DiscordMessage<'a> {
    fn build(content: &'a str, media: Option<&'a MediaAttachment>) -> Self {
        match media {
            Some(media) => DiscordMessage::File { content, media },
            None => DiscordMessage::Text { content },
        }
    }
}

/// Discord webhook adapter
pub struct DiscordNotifier {
    client: reqwest::Client,
    config: Option<DiscordConfig>,
}

impl DiscordNotifier {
    /// Creates the adapter; without configuration every delivery fails as `not_configured`
    pub fn new(client: reqwest::Client, config: Option<DiscordConfig>) -> Self {
        Self { client, config }
    }

    /// Discord answers 200 with `?wait=true` and 204 otherwise
    fn is_success(status: StatusCode) -> bool {
        status == StatusCode::OK || status == StatusCode::NO_CONTENT
    }

    async fn send(
        &self,
        config: &DiscordConfig,
        message: DiscordMessage<'_>,
    ) -> Result<reqwest::Response, ChannelError> {
        let request = match message {
            DiscordMessage::Text { content } => self
                .client
                .post(&config.webhook_url)
                .json(&TextPayload { content }),
            DiscordMessage::File { content, media } => {
                let form = Form::new()
                    .text("content", content.to_string())
                    .part("file", media.part().await?);
                self.client.post(&config.webhook_url).multipart(form)
            }
        };

        request
            .send()
            .await
            .map_err(|e| transport_error("Discord", e))
    }
}

#[async_trait]
impl ChannelAdapter for DiscordNotifier {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Discord
    }

    async fn deliver(&self, envelope: &Envelope<'_>) -> DeliveryOutcome {
        let Some(config) = self.config.as_ref() else {
            return DeliveryOutcome::failed(ChannelError::not_configured(), None);
        };

        let message = DiscordMessage::build(&envelope.message.body, envelope.media);

        let response = match self.send(config, message).await {
            Ok(response) => response,
            Err(error) => return DeliveryOutcome::failed(error, None),
        };

        let status = response.status();
        if Self::is_success(status) {
            return DeliveryOutcome::posted(Some(status.as_u16()));
        }

        let body = response.text().await.unwrap_or_default();
        DeliveryOutcome::failed(
            http_error("Discord", status.as_u16(), Some(body)),
            Some(status.as_u16()),
        )
    }
}
