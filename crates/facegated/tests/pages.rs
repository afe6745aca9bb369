mod common;

use axum::http::{header, StatusCode};
use common::*;
use facegate_core::Strategy;
use tower::ServiceExt;

#[tokio::test]
async fn test_home_page() {
    let app = spawn_app(Strategy::Cached, Some(GOLDEN)).await;
    let response = app.router.clone().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/html"));
    assert_eq!(text_body(response).await, "<h1>home</h1>");
}

#[tokio::test]
async fn test_taunting_page() {
    let app = spawn_app(Strategy::Cached, Some(GOLDEN)).await;
    let response = app.router.clone().oneshot(get("/taunting")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(text_body(response).await, "<h1>nope</h1>");
}

#[tokio::test]
async fn test_pages_do_not_touch_analyzer() {
    let app = spawn_app(Strategy::Redetect, Some(GOLDEN)).await;
    let before = app.analyzer_calls();
    app.router.clone().oneshot(get("/")).await.unwrap();
    app.router.clone().oneshot(get("/taunting")).await.unwrap();
    assert_eq!(app.analyzer_calls(), before);
}

#[tokio::test]
async fn test_pages_served_when_not_ready() {
    let app = spawn_app(Strategy::Cached, None).await;
    let response = app.router.clone().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_verify_rejects_get() {
    let app = spawn_app(Strategy::Cached, Some(GOLDEN)).await;
    let response = app.router.clone().oneshot(get("/verify")).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_status_reports_readiness() {
    let app = spawn_app(Strategy::Cached, None).await;
    let (status, body) = app.send(get("/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["strategy"], "cached");
    assert_eq!(body["ready"], false);
    assert_eq!(body["analyzer_loaded"], true);

    let app = spawn_app(Strategy::Redetect, Some(GOLDEN)).await;
    let (_, body) = app.send(get("/status")).await;
    assert_eq!(body["strategy"], "redetect");
    assert_eq!(body["ready"], true);
}

#[tokio::test]
async fn test_missing_template_is_server_error() {
    let app = spawn_app(Strategy::Cached, Some(GOLDEN)).await;
    std::fs::remove_file(app.root().join("templates/taunting.html")).unwrap();

    let response = app.router.clone().oneshot(get("/taunting")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(text_body(response).await, "template taunting.html is missing");
}
