mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::*;
use facegate_core::{Strategy, UnavailableAnalyzer};
use serde_json::json;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

#[tokio::test]
async fn test_matching_face_succeeds() {
    let app = spawn_app(Strategy::Cached, Some(GOLDEN)).await;
    let (status, body) = app.send(verify_image(&png(GOLDEN))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "success"}));
}

#[tokio::test]
async fn test_different_face_fails_without_error() {
    let app = spawn_app(Strategy::Cached, Some(GOLDEN)).await;
    let (status, body) = app.send(verify_image(&png(STRANGER))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "failure"}));
}

#[tokio::test]
async fn test_no_face_in_probe() {
    let app = spawn_app(Strategy::Cached, Some(GOLDEN)).await;
    let (status, body) = app.send(verify_image(&png(NO_FACE))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "failure", "error": "No face detected"}));
}

#[tokio::test]
async fn test_missing_image_field() {
    let app = spawn_app(Strategy::Cached, Some(GOLDEN)).await;
    let (status, body) = app
        .send(verify_request("photo", Some("me.png"), &png(GOLDEN)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"status": "failure", "error": "No image file found"}));
}

#[tokio::test]
async fn test_text_field_named_image_is_not_a_file() {
    let app = spawn_app(Strategy::Cached, Some(GOLDEN)).await;
    let (status, body) = app.send(verify_request("image", None, b"hello")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No image file found");
}

#[tokio::test]
async fn test_non_multipart_request() {
    let app = spawn_app(Strategy::Cached, Some(GOLDEN)).await;
    let request = Request::builder()
        .method("POST")
        .uri("/verify")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"image": "abc"}"#))
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No image file found");
}

#[tokio::test]
async fn test_undecodable_image() {
    let app = spawn_app(Strategy::Cached, Some(GOLDEN)).await;
    let (status, body) = app.send(verify_image(b"definitely not an image")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"status": "failure", "error": "Could not process image"}));
}

#[tokio::test]
async fn test_empty_upload_is_undecodable() {
    let app = spawn_app(Strategy::Redetect, Some(GOLDEN)).await;
    let (status, body) = app.send(verify_image(b"")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Could not process image");
}

#[tokio::test]
async fn test_cached_without_golden_face_is_not_ready() {
    let app = spawn_app(Strategy::Cached, Some(NO_FACE)).await;
    let (status, body) = app.send(verify_image(&png(GOLDEN))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"status": "failure", "error": "Server not ready"}));
}

#[tokio::test]
async fn test_cached_without_golden_file_is_not_ready() {
    let app = spawn_app(Strategy::Cached, None).await;
    let (status, body) = app.send(verify_image(&png(GOLDEN))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Server not ready");
}

#[tokio::test]
async fn test_not_ready_is_checked_before_decoding() {
    let app = spawn_app(Strategy::Cached, None).await;
    let (status, body) = app.send(verify_image(b"garbage")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Server not ready");
}

#[tokio::test]
async fn test_missing_field_is_checked_before_readiness() {
    let app = spawn_app(Strategy::Cached, None).await;
    let (status, body) = app.send(verify_request("file", Some("x.png"), b"x")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No image file found");
}

#[tokio::test]
async fn test_cached_golden_is_encoded_once() {
    let app = spawn_app(Strategy::Cached, Some(GOLDEN)).await;
    assert_eq!(app.analyzer_calls(), 1);

    for _ in 0..3 {
        let (_, body) = app.send(verify_image(&png(GOLDEN))).await;
        assert_eq!(body["status"], "success");
    }
    // One call per probe, none for the golden image.
    assert_eq!(app.analyzer_calls(), 4);
}

#[tokio::test]
async fn test_repeated_requests_give_same_answer() {
    let app = spawn_app(Strategy::Cached, Some(GOLDEN)).await;
    let first = app.send(verify_image(&png(STRANGER))).await;
    let second = app.send(verify_image(&png(STRANGER))).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_redetect_matches_and_rereads_golden() {
    let app = spawn_app(Strategy::Redetect, Some(GOLDEN)).await;
    let warm_up = app.analyzer_calls();

    let (status, body) = app.send(verify_image(&png(GOLDEN))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "success"}));
    assert_eq!(app.analyzer_calls(), warm_up + 2);

    let (_, body) = app.send(verify_image(&png(STRANGER))).await;
    assert_eq!(body, json!({"status": "failure"}));
}

#[tokio::test]
async fn test_redetect_without_golden_face_reports_no_face() {
    let app = spawn_app(Strategy::Redetect, Some(NO_FACE)).await;
    let (status, body) = app.send(verify_image(&png(GOLDEN))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"], "No face detected");
}

#[tokio::test]
async fn test_redetect_missing_golden_file_reports_no_face() {
    let app = spawn_app(Strategy::Redetect, None).await;
    let (status, body) = app.send(verify_image(&png(GOLDEN))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "failure", "error": "No face detected"}));
}

#[tokio::test]
async fn test_unavailable_analyzer_reports_reason() {
    let app = spawn_app_with(
        Strategy::Redetect,
        Some(GOLDEN),
        Box::new(UnavailableAnalyzer::new("model file not found")),
        Arc::new(AtomicUsize::new(0)),
    )
    .await;
    let (status, body) = app.send(verify_image(&png(GOLDEN))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"status": "failure", "error": "face analyzer unavailable: model file not found"})
    );
}

#[tokio::test]
async fn test_unavailable_analyzer_leaves_cached_not_ready() {
    let app = spawn_app_with(
        Strategy::Cached,
        Some(GOLDEN),
        Box::new(UnavailableAnalyzer::new("model file not found")),
        Arc::new(AtomicUsize::new(0)),
    )
    .await;
    let (status, body) = app.send(verify_image(&png(GOLDEN))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Server not ready");
}
