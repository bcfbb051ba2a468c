use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::schema::FormSchema;
use super::session::{FormSessionError, FormSessionService, SessionId};
use super::submission::{SubmissionOutcome, SubmissionSink};

#[derive(Debug, Deserialize)]
pub struct FieldChange {
    pub value: String,
}

/// Router builder exposing the form catalog and the per-session event endpoints.
pub fn form_router<S>(service: Arc<FormSessionService<S>>) -> Router
where
    S: SubmissionSink + 'static,
{
    Router::new()
        .route("/api/v1/forms", get(catalog_handler::<S>))
        .route("/api/v1/forms/:form", get(schema_handler::<S>))
        .route("/api/v1/forms/:form/sessions", post(open_handler::<S>))
        .route(
            "/api/v1/sessions/:session_id",
            get(snapshot_handler::<S>).delete(close_handler::<S>),
        )
        .route(
            "/api/v1/sessions/:session_id/fields/:field",
            put(change_handler::<S>),
        )
        .route(
            "/api/v1/sessions/:session_id/fields/:field/blur",
            post(blur_handler::<S>),
        )
        .route(
            "/api/v1/sessions/:session_id/submit",
            post(submit_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn catalog_handler<S>(
    State(service): State<Arc<FormSessionService<S>>>,
) -> Json<Vec<FormSchema>>
where
    S: SubmissionSink + 'static,
{
    Json(service.catalog().schemas().cloned().collect())
}

pub(crate) async fn schema_handler<S>(
    State(service): State<Arc<FormSessionService<S>>>,
    Path(form): Path<String>,
) -> Response
where
    S: SubmissionSink + 'static,
{
    match service.catalog().get(&form) {
        Some(schema) => (StatusCode::OK, Json(schema.as_ref().clone())).into_response(),
        None => error_response(FormSessionError::UnknownForm(form)),
    }
}

pub(crate) async fn open_handler<S>(
    State(service): State<Arc<FormSessionService<S>>>,
    Path(form): Path<String>,
) -> Response
where
    S: SubmissionSink + 'static,
{
    match service.open(&form) {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn snapshot_handler<S>(
    State(service): State<Arc<FormSessionService<S>>>,
    Path(session_id): Path<String>,
) -> Response
where
    S: SubmissionSink + 'static,
{
    match service.snapshot(&SessionId(session_id)) {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn change_handler<S>(
    State(service): State<Arc<FormSessionService<S>>>,
    Path((session_id, field)): Path<(String, String)>,
    Json(change): Json<FieldChange>,
) -> Response
where
    S: SubmissionSink + 'static,
{
    match service.change(&SessionId(session_id), &field, change.value) {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn blur_handler<S>(
    State(service): State<Arc<FormSessionService<S>>>,
    Path((session_id, field)): Path<(String, String)>,
) -> Response
where
    S: SubmissionSink + 'static,
{
    match service.blur(&SessionId(session_id), &field) {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn submit_handler<S>(
    State(service): State<Arc<FormSessionService<S>>>,
    Path(session_id): Path<String>,
) -> Response
where
    S: SubmissionSink + 'static,
{
    let session_id = SessionId(session_id);
    let submitted = tokio::task::spawn_blocking(move || service.submit(&session_id)).await;
    match submitted {
        Ok(Ok(receipt)) => {
            let status = match receipt.outcome {
                SubmissionOutcome::Accepted { .. } => StatusCode::ACCEPTED,
                SubmissionOutcome::Rejected { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                SubmissionOutcome::Failed { .. } => StatusCode::SERVICE_UNAVAILABLE,
            };
            (status, Json(receipt)).into_response()
        }
        Ok(Err(err)) => error_response(err),
        Err(join_error) => {
            error!(error = %join_error, "submission task aborted");
            error_response(FormSessionError::Unavailable)
        }
    }
}

pub(crate) async fn close_handler<S>(
    State(service): State<Arc<FormSessionService<S>>>,
    Path(session_id): Path<String>,
) -> Response
where
    S: SubmissionSink + 'static,
{
    match service.close(&SessionId(session_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: FormSessionError) -> Response {
    let status = match err {
        FormSessionError::UnknownForm(_)
        | FormSessionError::SessionNotFound(_)
        | FormSessionError::Field(_) => StatusCode::NOT_FOUND,
        FormSessionError::SubmissionInProgress(_) => StatusCode::CONFLICT,
        FormSessionError::Unavailable => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({
        "error": err.to_string(),
    });
    (status, Json(payload)).into_response()
}
