//! Facebook page adapter.
//!
//! Publishes the alert through the Graph API: a text post on the page feed, or a
//! photo/video upload when media is attached.

use async_trait::async_trait;
use reqwest::multipart::Form;
use reqwest::StatusCode;
use serde::Deserialize;

use super::{
    http_error, transport_error, ChannelAdapter, DeliveryOutcome, Envelope, MediaAttachment,
    MediaKind,
};
use crate::config::FacebookConfig;
use crate::error::ChannelError;
use crate::models::ChannelKind;

/// Outbound Graph API call
#[derive(Debug, PartialEq)]
enum FacebookPost<'a> {
    Feed {
        message: &'a str,
    },
    Photo {
        message: &'a str,
        media: &'a MediaAttachment,
    },
    Video {
        description: &'a str,
        media: &'a MediaAttachment,
    },
}

impl<'a> FacebookPost<'a> {
    fn build(text: &'a str, media: Option<&'a MediaAttachment>) -> Self {
        match media {
            None => FacebookPost::Feed { message: text },
            Some(media) if media.kind == MediaKind::Video => FacebookPost::Video {
                description: text,
                media,
            },
            Some(media) => FacebookPost::Photo {
                message: text,
                media,
            },
        }
    }

    /// Graph API edge of the page the post goes to
    fn edge(&self) -> &'static str {
        match self {
            FacebookPost::Feed { .. } => "feed",
            FacebookPost::Photo { .. } => "photos",
            FacebookPost::Video { .. } => "videos",
        }
    }
}

#[derive(Debug, Deserialize)]
struct GraphErrorBody {
    error: GraphError,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    message: String,
}

/// Facebook page adapter
pub struct FacebookNotifier {
    client: reqwest::Client,
    config: Option<FacebookConfig>,
}

impl FacebookNotifier {
    /// Creates the adapter; without configuration every delivery fails as `not_configured`
    pub fn new(client: reqwest::Client, config: Option<FacebookConfig>) -> Self {
        Self { client, config }
    }

    fn endpoint(config: &FacebookConfig, post: &FacebookPost<'_>) -> String {
        format!(
            "{}/{}/{}",
            config.graph_url.trim_end_matches('/'),
            config.page_id,
            post.edge()
        )
    }

    /// Extracts `error.message` from a Graph API error body
    fn error_detail(body: &str) -> Option<String> {
        serde_json::from_str::<GraphErrorBody>(body)
            .map(|b| b.error.message)
            .ok()
            .or_else(|| Some(body.to_string()))
    }

    async fn send(
        &self,
        config: &FacebookConfig,
        post: FacebookPost<'_>,
    ) -> Result<reqwest::Response, ChannelError> {
        let url = Self::endpoint(config, &post);
        let token = config.access_token.as_str();

        let request = match post {
            FacebookPost::Feed { message } => self
                .client
                .post(&url)
                .form(&[("message", message), ("access_token", token)]),
            FacebookPost::Photo { message, media } => {
                let form = Form::new()
                    .text("message", message.to_string())
                    .part("source", media.part().await?);
                self.client
                    .post(&url)
                    .query(&[("access_token", token)])
                    .multipart(form)
            }
            FacebookPost::Video { description, media } => {
                let form = Form::new()
                    .text("description", description.to_string())
                    .part("source", media.part().await?);
                self.client
                    .post(&url)
                    .query(&[("access_token", token)])
                    .multipart(form)
            }
        };

        request
            .send()
            .await
            .map_err(|e| transport_error("Facebook", e))
    }
}

#[async_trait]
impl ChannelAdapter for FacebookNotifier {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Facebook
    }

    async fn deliver(&self, envelope: &Envelope<'_>) -> DeliveryOutcome {
        let Some(config) = self.config.as_ref() else {
            return DeliveryOutcome::failed(ChannelError::not_configured(), None);
        };

        let post = FacebookPost::build(&envelope.message.body, envelope.media);

        let response = match self.send(config, post).await {
            Ok(response) => response,
            Err(error) => return DeliveryOutcome::failed(error, None),
        };

        let status = response.status();
        if status == StatusCode::OK {
            return DeliveryOutcome::posted(Some(status.as_u16()));
        }

        let body = response.text().await.unwrap_or_default();
        DeliveryOutcome::failed(
            http_error("Facebook", status.as_u16(), Self::error_detail(&body)),
            Some(status.as_u16()),
        )
    }
}
