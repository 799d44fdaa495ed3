//! HTTP routes driven in-process

mod common;

use anime_cache::fetch::FALLBACK_RESPONSE;
use anime_cache::retry::RetryReason;
use anime_cache::test_helpers::sample_record;
use anime_cache::upstream::UpstreamError;
use anime_cache::web::router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

#[tokio::test]
async fn test_get_anime_found() {
    let (context, upstream, _store) = common::scripted_context();
    upstream.push_ok(sample_record(42));

    let (status, body) = get(router(context), "/get_anime/42").await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["anime_id"], 42);
    assert_eq!(json["title"], "Anime 42");
    assert_eq!(json["title_english"], "Anime 42 (en)");
}

#[tokio::test]
async fn test_get_anime_fallback() {
    let (context, upstream, _store) = common::scripted_context();
    upstream.push_err(UpstreamError::RateLimited);

    let (status, body) = get(router(context.clone()), "/get_anime/43").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, FALLBACK_RESPONSE.as_bytes());

    let (status, body) = get(router(context), "/retry_queue").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["pending"], serde_json::json!([43]));
}

#[tokio::test]
async fn test_get_anime_not_found() {
    let (context, upstream, _store) = common::scripted_context();
    upstream.push_err(UpstreamError::NotFound);

    let (status, body) = get(router(context), "/get_anime/44").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "Anime not found");
}

#[tokio::test]
async fn test_get_anime_rejects_non_integer_id() {
    let (context, upstream, _store) = common::scripted_context();

    let (status, _) = get(router(context), "/get_anime/abc").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(upstream.calls(), 0);
}

#[tokio::test]
async fn test_circuit_state_lists_breaker() {
    let (context, _upstream, _store) = common::scripted_context();
    context.breaker.force_open();

    let (status, body) = get(router(context), "/circuit_state").await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    let circuits = json["circuits"].as_array().unwrap();
    assert_eq!(circuits.len(), 1);
    assert_eq!(circuits[0]["name"], "my_circuit");
    assert_eq!(circuits[0]["state"], "open");
}

#[tokio::test]
async fn test_health_reports_queue_depth() {
    let (context, _upstream, _store) = common::scripted_context();
    context.retry_queue.enqueue_key(1, RetryReason::RateLimited);
    context.retry_queue.enqueue_key(2, RetryReason::RateLimited);

    let (status, body) = get(router(context), "/health").await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["retry_queue_depth"], 2);
    assert_eq!(json["store"], "memory");
    assert_eq!(json["circuit_state"], "closed");
    assert_eq!(json["circuit_healthy"], true);
}

#[tokio::test]
async fn test_health_reports_open_circuit_as_unhealthy() {
    let (context, _upstream, _store) = common::scripted_context();
    context.breaker.force_open();

    let (status, body) = get(router(context), "/health").await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["circuit_state"], "open");
    assert_eq!(json["circuit_healthy"], false);
}
