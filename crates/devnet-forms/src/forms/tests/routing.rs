use super::common::*;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("serializable")))
        .expect("request builds")
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

async fn open_session(router: &axum::Router) -> String {
    let response = router
        .clone()
        .oneshot(empty_request("POST", "/api/v1/forms/interview/sessions"))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    body["session_id"]
        .as_str()
        .expect("session id")
        .to_string()
}

#[tokio::test]
async fn lists_catalog_and_single_schema() {
    let router = router_with_service(build_service(Arc::new(MemorySink::default())));

    let response = router
        .clone()
        .oneshot(empty_request("GET", "/api/v1/forms"))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body[0]["id"], "interview");
    assert_eq!(body[0]["fields"][0]["kind"], "text");
    assert_eq!(body[0]["fields"][0]["max_length"], 15);

    let missing = router
        .oneshot(empty_request("GET", "/api/v1/forms/newsletter"))
        .await
        .expect("router responds");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn change_and_blur_drive_visible_errors() {
    let router = router_with_service(build_service(Arc::new(MemorySink::default())));
    let session_id = open_session(&router).await;

    let changed = router
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/sessions/{session_id}/fields/email"),
            json!({ "value": "not-an-email" }),
        ))
        .await
        .expect("router responds");
    assert_eq!(changed.status(), StatusCode::OK);
    let body = json_body(changed).await;
    assert_eq!(body["errors"], json!({}));
    assert_eq!(body["is_valid"], false);

    let blurred = router
        .oneshot(empty_request(
            "POST",
            &format!("/api/v1/sessions/{session_id}/fields/email/blur"),
        ))
        .await
        .expect("router responds");
    let body = json_body(blurred).await;
    assert_eq!(body["errors"], json!({ "email": "Invalid email address" }));
    assert_eq!(body["touched"], json!(["email"]));
}

#[tokio::test]
async fn submit_maps_outcomes_to_status_codes() {
    let router = router_with_service(build_service(Arc::new(MemorySink::default())));
    let session_id = open_session(&router).await;
    let submit_uri = format!("/api/v1/sessions/{session_id}/submit");

    let rejected = router
        .clone()
        .oneshot(empty_request("POST", &submit_uri))
        .await
        .expect("router responds");
    assert_eq!(rejected.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(rejected).await;
    assert_eq!(body["outcome"], "rejected");
    assert_eq!(body["errors"]["firstName"], "Required");

    for (field, value) in valid_interview_values() {
        let response = router
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/api/v1/sessions/{session_id}/fields/{field}"),
                json!({ "value": value }),
            ))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let accepted = router
        .oneshot(empty_request("POST", &submit_uri))
        .await
        .expect("router responds");
    assert_eq!(accepted.status(), StatusCode::ACCEPTED);
    let body = json_body(accepted).await;
    assert_eq!(body["outcome"], "accepted");
    assert_eq!(body["values"]["email"], "jane@doe.com");
    assert_eq!(body["snapshot"]["values"]["email"], "");
}

#[tokio::test]
async fn sink_failures_return_service_unavailable() {
    let router = router_with_service(build_service(Arc::new(UnavailableSink::default())));
    let session_id = open_session(&router).await;
    for (field, value) in valid_interview_values() {
        router
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/api/v1/sessions/{session_id}/fields/{field}"),
                json!({ "value": value }),
            ))
            .await
            .expect("router responds");
    }

    let response = router
        .oneshot(empty_request(
            "POST",
            &format!("/api/v1/sessions/{session_id}/submit"),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["outcome"], "failed");
    assert_eq!(body["snapshot"]["values"]["firstName"], "Jane");
}

#[tokio::test]
async fn unknown_sessions_and_fields_are_not_found() {
    let router = router_with_service(build_service(Arc::new(MemorySink::default())));

    let missing_session = router
        .clone()
        .oneshot(empty_request("GET", "/api/v1/sessions/form-424242"))
        .await
        .expect("router responds");
    assert_eq!(missing_session.status(), StatusCode::NOT_FOUND);

    let session_id = open_session(&router).await;
    let unknown_field = router
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/sessions/{session_id}/fields/phone"),
            json!({ "value": "555" }),
        ))
        .await
        .expect("router responds");
    assert_eq!(unknown_field.status(), StatusCode::NOT_FOUND);

    let closed = router
        .clone()
        .oneshot(empty_request(
            "DELETE",
            &format!("/api/v1/sessions/{session_id}"),
        ))
        .await
        .expect("router responds");
    assert_eq!(closed.status(), StatusCode::NO_CONTENT);

    let gone = router
        .oneshot(empty_request("GET", &format!("/api/v1/sessions/{session_id}")))
        .await
        .expect("router responds");
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}
