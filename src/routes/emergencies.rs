//! Emergency dispatch routes.
//!
//! - POST /api/emergencies - Dispatch a new emergency to every channel
//! - GET /api/emergencies/{event_id}/deliveries - Delivery audit trail
//! - POST /api/reports/{report_id}/status - Notify the reporter of a status change
//! - GET /api/users/{user_id}/notifications - Recent notifications of a user
//! - POST /api/users/{user_id}/device-token - Register the user's push token

use std::path::{Component, Path};

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bootstrap::Services;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{EmergencyEvent, ReportStatus, UserId};
use crate::services::MediaAttachment;

const DEFAULT_NOTIFICATION_LIMIT: i64 = 50;
const MAX_NOTIFICATION_LIMIT: i64 = 200;

// =============================================================================
// Request / Response DTOs
// =============================================================================

/// Report-creation payload: the event snapshot plus its recipient
#[derive(Debug, Deserialize)]
pub struct DispatchEmergencyRequest {
    #[serde(flatten)]
    pub event: EmergencyEvent,
    pub target_user_id: UserId,
    /// File name of an upload inside the media directory
    #[serde(default)]
    pub media_file: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
    pub reporter_id: UserId,
    pub actor_id: UserId,
}

#[derive(Debug, Serialize)]
pub struct OutcomeView {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusUpdateResponse {
    pub notified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<OutcomeView>,
}

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterDeviceTokenRequest {
    pub token: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /api/emergencies
pub async fn dispatch_emergency(
    services: web::Data<Services>,
    config: web::Data<Config>,
    body: web::Json<DispatchEmergencyRequest>,
) -> AppResult<HttpResponse> {
    let request = body.into_inner();

    let media = match request.media_file.as_deref() {
        Some(name) => Some(resolve_media(&config.dispatch.media_dir, name).await?),
        None => None,
    };

    let result = services
        .coordinator
        .dispatch_emergency(request.event, request.target_user_id, media)
        .await?;

    Ok(HttpResponse::Created().json(result))
}

/// GET /api/emergencies/{event_id}/deliveries
pub async fn list_deliveries(
    services: web::Data<Services>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let event_id = path.into_inner();
    let records = services.tracker.list_for_event(event_id).await?;

    if records.is_empty() {
        return Err(AppError::NotFound(format!(
            "No deliveries for emergency {}",
            event_id
        )));
    }

    Ok(HttpResponse::Ok().json(records))
}

/// POST /api/reports/{report_id}/status
pub async fn update_report_status(
    services: web::Data<Services>,
    path: web::Path<Uuid>,
    body: web::Json<StatusUpdateRequest>,
) -> AppResult<HttpResponse> {
    let report_id = path.into_inner();
    let request = body.into_inner();
    let status: ReportStatus = request.status.parse().map_err(AppError::Validation)?;

    let outcome = services
        .gateway
        .notify_report_status(report_id, request.reporter_id, request.actor_id, status)
        .await;

    let response = match outcome {
        None => StatusUpdateResponse {
            notified: false,
            outcome: None,
        },
        Some(outcome) => StatusUpdateResponse {
            notified: outcome.is_posted(),
            outcome: Some(OutcomeView {
                status: if outcome.is_posted() { "POSTED" } else { "FAILED" },
                error: outcome.error_message(),
            }),
        },
    };

    Ok(HttpResponse::Ok().json(response))
}

/// GET /api/users/{user_id}/notifications
pub async fn list_notifications(
    services: web::Data<Services>,
    path: web::Path<UserId>,
    query: web::Query<NotificationQuery>,
) -> AppResult<HttpResponse> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_NOTIFICATION_LIMIT)
        .clamp(1, MAX_NOTIFICATION_LIMIT);

    let notifications = services
        .notifications
        .list_for_recipient(path.into_inner(), limit)
        .await?;

    Ok(HttpResponse::Ok().json(notifications))
}

/// POST /api/users/{user_id}/device-token
pub async fn register_device_token(
    services: web::Data<Services>,
    path: web::Path<UserId>,
    body: web::Json<RegisterDeviceTokenRequest>,
) -> AppResult<HttpResponse> {
    let user_id = path.into_inner();
    let token = body.token.trim();

    if token.is_empty() {
        return Err(AppError::Validation("token must not be empty".to_string()));
    }

    services.devices.register(user_id, token).await?;
    log::info!("Registered push device token for user {}", user_id);

    Ok(HttpResponse::NoContent().finish())
}

/// Maps an uploaded file name to a temporary attachment inside `media_dir`
pub async fn resolve_media(media_dir: &Path, name: &str) -> AppResult<MediaAttachment> {
    let candidate = Path::new(name);
    let mut components = candidate.components();
    let is_plain_name = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );

    if !is_plain_name {
        return Err(AppError::Validation(format!(
            "media_file must be a plain file name, got '{}'",
            name
        )));
    }

    let path = media_dir.join(candidate);
    let exists = tokio::fs::try_exists(&path)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to check media file: {}", e)))?;

    if !exists {
        return Err(AppError::Validation(format!(
            "media_file '{}' not found",
            name
        )));
    }

    Ok(MediaAttachment::temporary(path))
}

/// Configure emergency routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/emergencies")
            .route("", web::post().to(dispatch_emergency))
            .route("/{event_id}/deliveries", web::get().to(list_deliveries)),
    )
    .route(
        "/api/reports/{report_id}/status",
        web::post().to(update_report_status),
    )
    .route(
        "/api/users/{user_id}/notifications",
        web::get().to(list_notifications),
    )
    .route(
        "/api/users/{user_id}/device-token",
        web::post().to(register_device_token),
    );
}
