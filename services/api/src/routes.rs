use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use chrono::Utc;
use devnet_forms::forms::{form_router, FormSessionService, SubmissionSink};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_form_routes<S>(service: Arc<FormSessionService<S>>) -> axum::Router
where
    S: SubmissionSink + 'static,
{
    form_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/api/health", axum::routing::get(api_health))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Health probe consumed by the marketing site front end.
pub(crate) async fn api_health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "time": Utc::now().timestamp(),
    }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
