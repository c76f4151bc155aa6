//! Integration tests for the HTTP surface
//!
//! Routes are served by `actix_web::test` with services wired by the harness.

use actix_web::{test, web, App};
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::ResponseTemplate;

use resq_dispatch::routes;

use crate::common::harness::{facebook_ok, push_ok, telegram_ok, PUSH_PATH};
use crate::common::{Harness, TARGET_USER};

macro_rules! init_app {
    ($h:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($h.services.clone()))
                .app_data(web::Data::new($h.config.clone()))
                .configure(routes::health::configure)
                .configure(routes::emergencies::configure),
        )
        .await
    };
}

fn fire_report(event_id: Uuid) -> Value {
    json!({
        "id": event_id,
        "description": "Building fire",
        "emergency_type": "FIRE",
        "severity": "HIGH",
        "location": {"latitude": 40.0, "longitude": -73.0},
        "target_user_id": TARGET_USER
    })
}

// =============================================================================
// Health
// =============================================================================

#[actix_web::test]
async fn test_liveness_returns_ok() {
    let h = Harness::new().await;
    let app = init_app!(h);

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn test_readiness_without_database_is_ready() {
    let h = Harness::new().await;
    let app = init_app!(h);

    let req = test::TestRequest::get().uri("/health/ready").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["database"], "in_memory");
}

// =============================================================================
// Emergencies
// =============================================================================

#[actix_web::test]
async fn test_dispatch_emergency_returns_created_result() {
    let h = Harness::new().await;
    h.mock_all_success().await;
    let app = init_app!(h);
    let event_id = Uuid::new_v4();

    let req = test::TestRequest::post()
        .uri("/api/emergencies")
        .set_json(fire_report(event_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["event_id"], event_id.to_string());
    assert_eq!(body["overall"], true);
    assert_eq!(body["results"].as_array().unwrap().len(), 4);

    let req = test::TestRequest::get()
        .uri(&format!("/api/emergencies/{}/deliveries", event_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let records: Value = test::read_body_json(resp).await;
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 4);
    assert!(records.iter().all(|r| r["status"] == "POSTED"));
}

#[actix_web::test]
async fn test_dispatch_with_out_of_range_location_is_bad_request() {
    let h = Harness::new().await;
    h.mock_all_success().await;
    let app = init_app!(h);
    let mut report = fire_report(Uuid::new_v4());
    report["location"] = json!({"latitude": 120.0, "longitude": 0.0});

    let req = test::TestRequest::post()
        .uri("/api/emergencies")
        .set_json(report)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["type"], "RenderError");
    assert!(h.deliveries.all().is_empty());
}

#[actix_web::test]
async fn test_dispatch_with_uploaded_media_removes_it() {
    let h = Harness::new().await;
    h.mock_push(push_ok()).await;
    h.mock_facebook("photos", facebook_ok()).await;
    h.mock_telegram("sendPhoto", telegram_ok()).await;
    h.mock_discord(ResponseTemplate::new(204)).await;
    let path = h.write_media("upload-1.jpg", b"jpeg-bytes");
    let app = init_app!(h);
    let mut report = fire_report(Uuid::new_v4());
    report["media_file"] = json!("upload-1.jpg");

    let req = test::TestRequest::post()
        .uri("/api/emergencies")
        .set_json(report)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["overall"], true);
    assert!(!path.exists());
}

#[actix_web::test]
async fn test_dispatch_rejects_media_outside_media_dir() {
    let h = Harness::new().await;
    let app = init_app!(h);
    let mut report = fire_report(Uuid::new_v4());
    report["media_file"] = json!("../etc/passwd");

    let req = test::TestRequest::post()
        .uri("/api/emergencies")
        .set_json(report)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    assert!(h.deliveries.all().is_empty());
}

#[actix_web::test]
async fn test_deliveries_for_unknown_event_is_not_found() {
    let h = Harness::new().await;
    let app = init_app!(h);

    let req = test::TestRequest::get()
        .uri(&format!("/api/emergencies/{}/deliveries", Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

// =============================================================================
// Report status
// =============================================================================

#[actix_web::test]
async fn test_report_status_update_notifies_reporter() {
    let h = Harness::new().await;
    h.mock_push(push_ok()).await;
    let app = init_app!(h);

    let req = test::TestRequest::post()
        .uri(&format!("/api/reports/{}/status", Uuid::new_v4()))
        .set_json(json!({"status": "RESPONDING", "reporter_id": TARGET_USER, "actor_id": 7}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["notified"], true);
    assert_eq!(body["outcome"]["status"], "POSTED");

    let req = test::TestRequest::get()
        .uri(&format!("/api/users/{}/notifications", TARGET_USER))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let notifications: Value = test::read_body_json(resp).await;
    assert_eq!(
        notifications[0]["message"],
        "Your emergency report has been updated to Emergency Services Responding"
    );
    assert_eq!(notifications[0]["notification_type"], "UPDATE");
}

#[actix_web::test]
async fn test_self_update_is_not_notified() {
    let h = Harness::new().await;
    let app = init_app!(h);

    let req = test::TestRequest::post()
        .uri(&format!("/api/reports/{}/status", Uuid::new_v4()))
        .set_json(json!({"status": "RESOLVED", "reporter_id": TARGET_USER, "actor_id": TARGET_USER}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"notified": false}));
}

#[actix_web::test]
async fn test_invalid_report_status_is_rejected() {
    let h = Harness::new().await;
    let app = init_app!(h);

    let req = test::TestRequest::post()
        .uri(&format!("/api/reports/{}/status", Uuid::new_v4()))
        .set_json(json!({"status": "ARCHIVED", "reporter_id": TARGET_USER, "actor_id": 7}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["type"], "ValidationError");
}

// =============================================================================
// Device tokens
// =============================================================================

#[actix_web::test]
async fn test_registered_device_token_receives_emergency_push() {
    let h = Harness::builder().without_device_token().build().await;
    h.mock_all_success().await;
    let app = init_app!(h);

    let req = test::TestRequest::post()
        .uri(&format!("/api/users/{}/device-token", TARGET_USER))
        .set_json(json!({"token": "fresh-phone-token"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 204);

    let req = test::TestRequest::post()
        .uri("/api/emergencies")
        .set_json(fire_report(Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["overall"], true);

    let pushes = h.requests_to(PUSH_PATH).await;
    assert_eq!(pushes.len(), 1);
    let payload: Value = serde_json::from_slice(&pushes[0].body).unwrap();
    assert_eq!(payload["to"], "fresh-phone-token");
}

#[actix_web::test]
async fn test_blank_device_token_is_rejected() {
    let h = Harness::builder().without_device_token().build().await;
    let app = init_app!(h);

    let req = test::TestRequest::post()
        .uri(&format!("/api/users/{}/device-token", TARGET_USER))
        .set_json(json!({"token": "  "}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["type"], "ValidationError");
}
