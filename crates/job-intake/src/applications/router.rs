use std::sync::Arc;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
        DefaultBodyLimit, Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{Map, Value};
use tracing::info;

use super::domain::RawSubmission;
use super::intake::{self, MAX_UPLOAD_BYTES};
use super::notifier::ApplicantNotifier;
use super::outcome::{OutcomeView, SubmissionOutcome};
use super::repository::ApplicationStore;
use super::service::ApplicationIntakeService;

/// Router builder exposing the JSON and multipart intake endpoints.
pub fn application_router<S, N>(service: Arc<ApplicationIntakeService<S, N>>) -> Router
where
    S: ApplicationStore + 'static,
    N: ApplicantNotifier + 'static,
{
    Router::new()
        .route("/api/v1/applications", post(submit_json_handler::<S, N>))
        .route("/submit", post(submit_json_handler::<S, N>))
        .route(
            "/api/v1/applications/upload",
            post(submit_multipart_handler::<S, N>),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(service)
}

pub(crate) async fn submit_json_handler<S, N>(
    State(service): State<Arc<ApplicationIntakeService<S, N>>>,
    body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Response
where
    S: ApplicationStore + 'static,
    N: ApplicantNotifier + 'static,
{
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            info!(reason = %rejection.body_text(), "unreadable application body");
            if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                return too_large();
            }
            return unreadable("Request body must be a JSON object");
        }
    };

    respond(service.submit(intake::from_json(&body)).await)
}

pub(crate) async fn submit_multipart_handler<S, N>(
    State(service): State<Arc<ApplicationIntakeService<S, N>>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response
where
    S: ApplicationStore + 'static,
    N: ApplicantNotifier + 'static,
{
    let multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            info!(reason = %rejection.body_text(), "upload without a multipart body");
            return unreadable("Upload must be sent as multipart/form-data");
        }
    };

    match read_multipart(multipart).await {
        Ok(raw) => respond(service.submit(raw).await),
        Err(err) => {
            info!(reason = %err.body_text(), "unreadable multipart upload");
            if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
                return too_large();
            }
            unreadable("Upload could not be read as multipart/form-data")
        }
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<RawSubmission, MultipartError> {
    let mut raw = RawSubmission::new();
    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let bytes = field.bytes().await?;
        intake::apply_part(&mut raw, &name, &bytes);
    }
    Ok(raw)
}

fn respond(outcome: SubmissionOutcome) -> Response {
    let kind = outcome.kind();
    (kind.status_code(), Json(outcome.view())).into_response()
}

fn unreadable(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(OutcomeView::unreadable(message))).into_response()
}

fn too_large() -> Response {
    let message = format!(
        "Request body exceeds the {} MiB upload limit",
        MAX_UPLOAD_BYTES / (1024 * 1024)
    );
    (
        StatusCode::PAYLOAD_TOO_LARGE,
        Json(OutcomeView::unreadable(message)),
    )
        .into_response()
}
