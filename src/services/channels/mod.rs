//! Channel adapters for the emergency fan-out (Strategy pattern).
//!
//! Every outbound channel (push provider, Facebook, Telegram, Discord) implements
//! [`ChannelAdapter`]. Adapters never retry and never return errors: any problem
//! is folded into a [`DeliveryOutcome::Failed`] so sibling channels stay isolated.

pub mod discord;
pub mod facebook;
pub mod push;
pub mod telegram;

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{AppError, AppResult, ChannelError};
use crate::models::{ChannelKind, NotificationType, UserId};
use crate::services::render::RenderedMessage;

pub use discord::DiscordNotifier;
pub use facebook::FacebookNotifier;
pub use push::PushNotifier;
pub use telegram::TelegramNotifier;

const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "mov", "avi", "wmv"];

// =============================================================================
// Delivery Outcome
// =============================================================================

/// Result of a single channel delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Posted {
        http_status: Option<u16>,
    },
    Failed {
        error: ChannelError,
        http_status: Option<u16>,
    },
}

impl DeliveryOutcome {
    /// Creates a successful outcome
    pub fn posted(http_status: Option<u16>) -> Self {
        DeliveryOutcome::Posted { http_status }
    }

    /// Creates a failed outcome
    pub fn failed(error: ChannelError, http_status: Option<u16>) -> Self {
        DeliveryOutcome::Failed { error, http_status }
    }

    pub fn is_posted(&self) -> bool {
        matches!(self, DeliveryOutcome::Posted { .. })
    }

    pub fn http_status(&self) -> Option<u16> {
        match self {
            DeliveryOutcome::Posted { http_status } => *http_status,
            DeliveryOutcome::Failed { http_status, .. } => *http_status,
        }
    }

    pub fn error(&self) -> Option<&ChannelError> {
        match self {
            DeliveryOutcome::Posted { .. } => None,
            DeliveryOutcome::Failed { error, .. } => Some(error),
        }
    }

    /// Error text stored on the delivery record
    pub fn error_message(&self) -> Option<String> {
        self.error().map(ToString::to_string)
    }
}

// =============================================================================
// Media Attachment
// =============================================================================

/// Type of attached media, decides which platform endpoint is used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
}

/// Photo or video attached to an emergency report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAttachment {
    pub path: PathBuf,
    pub file_name: String,
    pub kind: MediaKind,
    /// Temporary uploads are deleted once every channel has finished reading them
    pub temporary: bool,
}

impl MediaAttachment {
    /// Attachment whose file is owned by somebody else and must be kept
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let kind = media_kind(&path);

        Self {
            path,
            file_name,
            kind,
            temporary: false,
        }
    }

    /// Attachment whose file is removed after the dispatch completes
    pub fn temporary(path: impl Into<PathBuf>) -> Self {
        Self {
            temporary: true,
            ..Self::new(path)
        }
    }

    /// Reads the whole file for upload
    pub async fn read(&self) -> Result<Vec<u8>, ChannelError> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| ChannelError::Media(format!("{}: {}", self.file_name, e)))
    }

    /// Builds a multipart file part named after the attachment
    pub(crate) async fn part(&self) -> Result<reqwest::multipart::Part, ChannelError> {
        let bytes = self.read().await?;
        Ok(reqwest::multipart::Part::bytes(bytes).file_name(self.file_name.clone()))
    }
}

fn media_kind(path: &Path) -> MediaKind {
    let is_video = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            VIDEO_EXTENSIONS
                .iter()
                .any(|video| ext.eq_ignore_ascii_case(video))
        })
        .unwrap_or(false);

    if is_video {
        MediaKind::Video
    } else {
        MediaKind::Photo
    }
}

// =============================================================================
// Envelope
// =============================================================================

/// Everything an adapter needs for one delivery
#[derive(Debug, Clone, Copy)]
pub struct Envelope<'a> {
    /// Target user for device-bound channels
    pub recipient: UserId,
    pub notification_type: NotificationType,
    /// Emergency event or report the delivery refers to
    pub reference: Option<Uuid>,
    pub message: &'a RenderedMessage,
    pub media: Option<&'a MediaAttachment>,
}

// =============================================================================
// Channel Adapter Trait
// =============================================================================

/// Trait for outbound channels (Strategy pattern)
///
/// Each channel kind implements this trait with its platform's request shape
/// and its own definition of success.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// Channel this adapter delivers to
    fn kind(&self) -> ChannelKind;

    /// Performs one delivery attempt, never retrying
    async fn deliver(&self, envelope: &Envelope<'_>) -> DeliveryOutcome;
}

// =============================================================================
// Shared transport helpers
// =============================================================================

/// Builds the HTTP client shared by every adapter
pub fn build_http_client(timeout: Duration) -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))
}

/// Maps a reqwest error to a channel error
pub(crate) fn transport_error(platform: &str, e: reqwest::Error) -> ChannelError {
    if e.is_timeout() {
        ChannelError::Timeout
    } else if e.is_connect() {
        ChannelError::Transport(format!("Connection to {} failed", platform))
    } else {
        ChannelError::Transport(format!("{} request failed: {}", platform, e))
    }
}

/// Formats a non-success response using the provider's own error text
pub(crate) fn http_error(platform: &str, status: u16, detail: Option<String>) -> ChannelError {
    match detail.filter(|d| !d.is_empty()) {
        Some(detail) => ChannelError::Transport(format!("{} API error: {}", platform, detail)),
        None => ChannelError::Transport(format!("{} API error: HTTP {}", platform, status)),
    }
}
