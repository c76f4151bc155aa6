//! Telegram bot adapter.
//!
//! Sends the alert to a chat through the Bot API. Text-only alerts use
//! `sendMessage` with HTML parse mode, media goes through `sendPhoto`/`sendVideo`.

use async_trait::async_trait;
use reqwest::multipart::Form;
use reqwest::StatusCode;
use serde::Deserialize;

use super::{
    http_error, transport_error, ChannelAdapter, DeliveryOutcome, Envelope, MediaAttachment,
    MediaKind,
};
use crate::config::TelegramConfig;
use crate::error::ChannelError;
use crate::models::ChannelKind;

/// Outbound Bot API call
#[derive(Debug, PartialEq)]
enum TelegramRequest<'a> {
    Message {
        text: &'a str,
    },
    Photo {
        caption: &'a str,
        media: &'a MediaAttachment,
    },
    Video {
        caption: &'a str,
        media: &'a MediaAttachment,
    },
}

impl<'a> TelegramRequest<'a> {
    fn build(text: &'a str, media: Option<&'a MediaAttachment>) -> Self {
        match media {
            None => TelegramRequest::Message { text },
            Some(media) if media.kind == MediaKind::Video => TelegramRequest::Video {
                caption: text,
                media,
            },
            Some(media) => TelegramRequest::Photo {
                caption: text,
                media,
            },
        }
    }

    fn method(&self) -> &'static str {
        match self {
            TelegramRequest::Message { .. } => "sendMessage",
            TelegramRequest::Photo { .. } => "sendPhoto",
            TelegramRequest::Video { .. } => "sendVideo",
        }
    }
}

/// Bot API response envelope
#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram bot adapter
pub struct TelegramNotifier {
    client: reqwest::Client,
    config: Option<TelegramConfig>,
}

impl TelegramNotifier {
    /// Creates the adapter; without configuration every delivery fails as `not_configured`
    pub fn new(client: reqwest::Client, config: Option<TelegramConfig>) -> Self {
        Self { client, config }
    }

    fn endpoint(config: &TelegramConfig, request: &TelegramRequest<'_>) -> String {
        format!(
            "{}/bot{}/{}",
            config.api_url.trim_end_matches('/'),
            config.bot_token,
            request.method()
        )
    }

    /// Escapes characters that carry meaning in Telegram's HTML parse mode
    fn escape_html(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
    }

    async fn send(
        &self,
        config: &TelegramConfig,
        request: TelegramRequest<'_>,
    ) -> Result<reqwest::Response, ChannelError> {
        let url = Self::endpoint(config, &request);
        let chat_id = config.chat_id.clone();

        let builder = match request {
            TelegramRequest::Message { text } => {
                let text = Self::escape_html(text);
                self.client.post(&url).form(&[
                    ("chat_id", chat_id.as_str()),
                    ("text", text.as_str()),
                    ("parse_mode", "HTML"),
                ])
            }
            TelegramRequest::Photo { caption, media } => {
                let form = Form::new()
                    .text("chat_id", chat_id)
                    .text("caption", caption.to_string())
                    .part("photo", media.part().await?);
                self.client.post(&url).multipart(form)
            }
            TelegramRequest::Video { caption, media } => {
                let form = Form::new()
                    .text("chat_id", chat_id)
                    .text("caption", caption.to_string())
                    .part("video", media.part().await?);
                self.client.post(&url).multipart(form)
            }
        };

        builder
            .send()
            .await
            .map_err(|e| transport_error("Telegram", e))
    }
}

#[async_trait]
impl ChannelAdapter for TelegramNotifier {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Telegram
    }

    async fn deliver(&self, envelope: &Envelope<'_>) -> DeliveryOutcome {
        let Some(config) = self.config.as_ref() else {
            return DeliveryOutcome::failed(ChannelError::not_configured(), None);
        };

        let request = TelegramRequest::build(&envelope.message.body, envelope.media);

        let response = match self.send(config, request).await {
            Ok(response) => response,
            Err(error) => return DeliveryOutcome::failed(error, None),
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<TelegramResponse>(&body).ok();

        match parsed {
            Some(TelegramResponse { ok: true, .. }) if status == StatusCode::OK => {
                DeliveryOutcome::posted(Some(status.as_u16()))
            }
            Some(TelegramResponse { description, .. }) => DeliveryOutcome::failed(
                http_error("Telegram", status.as_u16(), description),
                Some(status.as_u16()),
            ),
            None => DeliveryOutcome::failed(
                http_error("Telegram", status.as_u16(), Some(body)),
                Some(status.as_u16()),
            ),
        }
    }
}
