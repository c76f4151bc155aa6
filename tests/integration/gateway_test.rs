//! Integration tests for the status-change notification gateway

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use resq_dispatch::error::{AppResult, ChannelError};
use resq_dispatch::models::{NotificationType, ReportStatus, UserId};
use resq_dispatch::services::gateway::STATUS_UPDATE_TITLE;
use resq_dispatch::services::{
    build_http_client, DeviceDirectory, NotificationGateway, PushNotifier,
};

use crate::common::harness::{push_ok, DEVICE_TOKEN, PUSH_PATH};
use crate::common::{Harness, TARGET_USER};

const RESPONDER: i64 = 7;

#[tokio::test]
async fn test_status_change_sends_push_without_delivery_records() {
    let h = Harness::new().await;
    h.mock_push(push_ok()).await;

    let outcome = h
        .services
        .gateway
        .notify_status_change(TARGET_USER, "Shelter open", "Community hall is open")
        .await;

    assert!(outcome.is_posted());
    assert!(h.deliveries.all().is_empty());

    let notifications = h.notifications.all();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].notification_type, NotificationType::Update);
    assert_eq!(notifications[0].message, "Community hall is open");
}

#[tokio::test]
async fn test_report_status_notifies_reporter() {
    let h = Harness::new().await;
    Mock::given(method("POST"))
        .and(path(PUSH_PATH))
        .and(body_partial_json(json!({
            "to": DEVICE_TOKEN,
            "notification": {
                "title": STATUS_UPDATE_TITLE,
                "body": "Your emergency report has been updated to Emergency Services On Scene"
            },
            "data": {"notification_type": "UPDATE"}
        })))
        .respond_with(push_ok())
        .expect(1)
        .mount(&h.server)
        .await;

    let outcome = h
        .services
        .gateway
        .notify_report_status(Uuid::new_v4(), TARGET_USER, RESPONDER, ReportStatus::OnScene)
        .await;

    assert!(outcome.unwrap().is_posted());
    assert_eq!(h.notifications.all()[0].title, STATUS_UPDATE_TITLE);
}

#[tokio::test]
async fn test_reporter_updating_own_report_is_not_notified() {
    let h = Harness::new().await;
    h.mock_push(push_ok()).await;

    let outcome = h
        .services
        .gateway
        .notify_report_status(Uuid::new_v4(), TARGET_USER, TARGET_USER, ReportStatus::Resolved)
        .await;

    assert!(outcome.is_none());
    assert!(h.requests_to(PUSH_PATH).await.is_empty());
    assert!(h.notifications.all().is_empty());
}

#[tokio::test]
async fn test_failed_status_push_leaves_no_notification() {
    let h = Harness::builder().without_device_token().build().await;

    let outcome = h
        .services
        .gateway
        .notify_status_change(TARGET_USER, STATUS_UPDATE_TITLE, "Resolved")
        .await;

    assert_eq!(outcome.error(), Some(&ChannelError::no_token()));
    assert!(h.notifications.all().is_empty());
}

#[tokio::test]
async fn test_status_push_rejected_by_provider() {
    let h = Harness::new().await;
    h.mock_push(ResponseTemplate::new(500)).await;

    let outcome = h
        .services
        .gateway
        .notify_report_status(Uuid::new_v4(), TARGET_USER, RESPONDER, ReportStatus::Responding)
        .await
        .unwrap();

    assert!(!outcome.is_posted());
    assert_eq!(outcome.http_status(), Some(500));
    assert!(h.notifications.all().is_empty());
}

/// Directory whose lookups never answer in time
struct StalledDirectory;

#[async_trait]
impl DeviceDirectory for StalledDirectory {
    async fn active_token(&self, _user_id: UserId) -> AppResult<Option<String>> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(Some(DEVICE_TOKEN.to_string()))
    }

    async fn register(&self, _user_id: UserId, _token: &str) -> AppResult<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_stalled_device_lookup_times_out() {
    let h = Harness::new().await;
    h.mock_push(push_ok()).await;

    let push = Arc::new(PushNotifier::new(
        build_http_client(Duration::from_secs(5)).unwrap(),
        h.config.push.clone(),
        Arc::new(StalledDirectory),
    ));
    let gateway = NotificationGateway::new(
        push,
        h.notifications.clone(),
        Duration::from_millis(200),
    );

    let started = std::time::Instant::now();
    let outcome = gateway
        .notify_status_change(TARGET_USER, STATUS_UPDATE_TITLE, "Resolved")
        .await;

    assert_eq!(outcome.error(), Some(&ChannelError::Timeout));
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(h.requests_to(PUSH_PATH).await.is_empty());
    assert!(h.notifications.all().is_empty());
}
