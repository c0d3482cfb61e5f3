//! Integration Tests for the Admin API
//!
//! Exercises the diagnostics endpoints both through the router directly and
//! over a live admin server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use cache_proxy::{api::create_router, api::spawn_admin_server, AppState, CacheStore};
use serde_json::Value;
use tower::ServiceExt;

// == Helper Functions ==

fn populated_cache() -> Arc<CacheStore> {
    let cache = Arc::new(CacheStore::new(4, 1024));
    cache.insert("http://example.com/a", b"alpha").unwrap();
    cache.insert("http://example.com/b", b"bravo!").unwrap();
    cache.fetch("http://example.com/a", |_| ()).unwrap();
    let _ = cache.fetch("http://example.com/missing", |_| ());
    cache
}

fn create_test_app() -> Router {
    create_router(AppState::new(populated_cache()))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

// == Router Tests ==

#[tokio::test]
async fn test_stats_endpoint_reports_counters() {
    let (status, json) = get_json(create_test_app(), "/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["hits"], 1);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["insertions"], 2);
    assert_eq!(json["total_entries"], 2);
    assert_eq!(json["slot_count"], 4);
    assert_eq!(json["hit_rate"], 0.5);
}

#[tokio::test]
async fn test_cache_endpoint_lists_entries() {
    let (status, json) = get_json(create_test_app(), "/cache").await;

    assert_eq!(status, StatusCode::OK);
    let entries = json["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["uri"], "http://example.com/a");
    assert_eq!(entries[0]["size"], 5);
    assert_eq!(entries[0]["recency"], 0);
    assert_eq!(entries[1]["uri"], "http://example.com/b");
    assert_eq!(entries[1]["recency"], 1);
}

#[tokio::test]
async fn test_health_endpoint() {
    let (status, json) = get_json(create_test_app(), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn test_unknown_endpoint_returns_json_404() {
    let (status, json) = get_json(create_test_app(), "/get/key").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].is_string());
}

// == Live Server Tests ==

#[tokio::test]
async fn test_admin_server_serves_stats() {
    let cache = populated_cache();
    let (addr, _handle) = spawn_admin_server(
        SocketAddr::from(([127, 0, 0, 1], 0)),
        AppState::new(Arc::clone(&cache)),
    )
    .unwrap();

    let stats: Value = reqwest::get(format!("http://{addr}/stats"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["total_entries"], 2);

    // Updates made by proxy workers are visible through the same store.
    cache.insert("http://example.com/c", b"charlie").unwrap();
    let stats: Value = reqwest::get(format!("http://{addr}/stats"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["total_entries"], 3);
}
