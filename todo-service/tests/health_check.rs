mod common;

use axum::http::{Method, StatusCode};
use common::{mock_app, send, test_config};
use std::sync::Arc;
use todo_service::services::UnavailableStore;
use todo_service::startup::build_store;
use todo_service::{build_router, AppState};

#[tokio::test]
async fn health_check_works() {
    let (app, _) = mock_app();

    let (status, body) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "todo-service");
}

#[tokio::test]
async fn health_check_reports_unreachable_datastore() {
    let (app, store) = mock_app();
    store.set_failure(Some("server selection timeout"));

    let (status, body) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["error"], "server selection timeout");
}

#[tokio::test]
async fn readiness_follows_datastore() {
    let (app, store) = mock_app();

    let (status, _) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);

    store.set_failure(Some("down"));
    let (status, _) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn unparsable_connection_string_still_serves_requests() {
    let app = build_router(AppState::new(Arc::new(UnavailableStore::new(
        "invalid connection string",
    ))));

    let (status, body) = send(&app, Method::GET, "/todos", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["message"],
        "Datastore unavailable: invalid connection string"
    );

    let (status, _) = send(
        &app,
        Method::POST,
        "/todos",
        Some(serde_json::json!({ "title": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_connection_string_still_serves_requests() {
    let mut config = test_config("unused", "unused");
    config.mongodb.uri = None;

    let app = build_router(AppState::new(build_store(&config).await));

    let (status, body) = send(&app, Method::GET, "/todos", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Datastore unavailable: DB_HOST is not set");

    let (status, _) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn unparsable_connection_string_from_config_still_serves_requests() {
    let config = test_config("not-a-mongodb-uri", "unused");

    let app = build_router(AppState::new(build_store(&config).await));

    let (status, body) = send(&app, Method::GET, "/todos", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["message"]
        .as_str()
        .is_some_and(|m| m.starts_with("Datastore unavailable")));
}

#[tokio::test]
async fn metrics_endpoint_returns_text() {
    let (app, _) = mock_app();

    let (status, body) = send(&app, Method::GET, "/metrics", None).await;

    assert_eq!(status, StatusCode::OK);
    // No recorder is installed in tests, so the placeholder comes back.
    assert!(body.as_str().unwrap().starts_with('#'));
}

#[tokio::test]
async fn responses_carry_request_id_and_security_headers() {
    use axum::body::Body;
    use axum::http::Request;
    use tower::util::ServiceExt;

    let (app, _) = mock_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/todos")
                .header("x-request-id", "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers().get("x-request-id").unwrap(), "req-42");
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
}

#[tokio::test]
async fn cors_allows_any_origin_by_default() {
    use axum::body::Body;
    use axum::http::Request;
    use tower::util::ServiceExt;

    let (app, _) = mock_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/todos")
                .header("origin", "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}
