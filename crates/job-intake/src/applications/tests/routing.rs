use super::common::*;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::applications::router::submit_json_handler;
use crate::applications::{ApplicationIntakeService, MAX_UPLOAD_BYTES};

fn json_request(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).expect("serializable")))
        .expect("request builds")
}

fn complete_body() -> Value {
    json!({
        "first_name": "Ann",
        "last_name": "Lee",
        "email": "ann@example.com",
        "date_of_birth": "1990-01-01",
        "education_degree": "Bachelor's",
        "experience_years": 4,
        "resume_payload": STANDARD.encode(RESUME),
    })
}

#[tokio::test]
async fn json_route_stores_and_confirms() {
    let (service, store, notifier) = build_service();
    let router = application_router_with_service(service);

    let response = router
        .oneshot(json_request("/api/v1/applications", &complete_body()))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["outcome"], "completed");
    assert_eq!(payload["application_id"], 1);
    assert!(payload.get("submitted_at").is_some());
    assert!(payload.get("missing_fields").is_none());

    assert_eq!(store.rows()[0].experience_years, 4);
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test]
async fn legacy_submit_route_lists_missing_fields() {
    let (service, store, notifier) = build_service();
    let router = application_router_with_service(service);

    let response = router
        .oneshot(json_request(
            "/submit",
            &json!({ "first_name": "Ann", "email": "  ", "dob": "1990-01-01" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["outcome"], "rejected");
    assert_eq!(
        payload["missing_fields"],
        json!(["last_name", "email", "education_degree", "resume_payload"])
    );
    assert!(store.rows().is_empty());
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn malformed_json_is_rejected_before_the_pipeline() {
    let (service, store, _) = build_service();
    let router = application_router_with_service(service);

    let response = router
        .oneshot(
            Request::post("/api/v1/applications")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["outcome"], "rejected");
    assert!(store.rows().is_empty());
}

#[tokio::test]
async fn oversized_body_is_reported_as_too_large() {
    let (service, store, _) = build_service();
    let router = application_router_with_service(service);

    let padding = "A".repeat(MAX_UPLOAD_BYTES);
    let body = json!({ "first_name": "Ann", "resume_payload": padding });

    let response = router
        .oneshot(json_request("/api/v1/applications", &body))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let payload = read_json_body(response).await;
    assert_eq!(payload["outcome"], "rejected");
    assert!(payload["message"]
        .as_str()
        .is_some_and(|message| message.contains("10 MiB")));
    assert!(store.rows().is_empty());
}

#[tokio::test]
async fn multipart_upload_carries_raw_resume_bytes() {
    let (service, store, _) = build_service();
    let router = application_router_with_service(service);

    let boundary = "intake-boundary";
    let mut body = Vec::new();
    for (name, value) in [
        ("first_name", "Ann"),
        ("last_name", "Lee"),
        ("email", "ann@example.com"),
        ("dob", "1990-01-01"),
        ("education_degree", "MSc"),
    ] {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"resume\"; filename=\"cv.pdf\"\r\n\
             Content-Type: application/pdf\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(RESUME);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let response = router
        .oneshot(
            Request::post("/api/v1/applications/upload")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let rows = store.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].education_degree, "MSc");
    assert_eq!(rows[0].resume_payload.as_bytes(), RESUME);
}

#[tokio::test]
async fn submit_handler_hides_store_failure_details() {
    let service = Arc::new(ApplicationIntakeService::new(
        Arc::new(UnavailableStore),
        Arc::new(RecordingNotifier::default()),
    ));
    let body = match complete_body() {
        Value::Object(map) => map,
        _ => unreachable!("fixture is an object"),
    };

    let response = submit_json_handler::<UnavailableStore, RecordingNotifier>(
        State(service),
        Ok(axum::Json(body)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert_eq!(payload["outcome"], "persistence_error");
    assert!(!payload.to_string().contains("connection refused"));
}

#[tokio::test]
async fn notification_failure_still_reports_the_stored_application() {
    let store = Arc::new(MemoryStore::default());
    let service = Arc::new(ApplicationIntakeService::new(
        store.clone(),
        Arc::new(FailingNotifier),
    ));
    let router = crate::applications::application_router(service);

    let response = router
        .oneshot(json_request("/api/v1/applications", &complete_body()))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["outcome"], "stored_not_notified");
    assert_eq!(payload["application_id"], 1);
    assert_eq!(store.rows().len(), 1);
}
