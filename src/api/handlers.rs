//! API Handlers
//!
//! HTTP request handlers for each admin endpoint.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};

use crate::cache::CacheStore;
use crate::models::{EntriesResponse, ErrorResponse, HealthResponse, StatsResponse};

/// Application state shared across all handlers.
///
/// Holds the same cache the proxy workers use. The store synchronizes
/// itself, so no outer lock is needed.
#[derive(Clone)]
pub struct AppState {
    /// Shared cache store
    pub cache: Arc<CacheStore>,
    /// Process start time, reported by /health
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Creates a new AppState around the shared cache.
    pub fn new(cache: Arc<CacheStore>) -> Self {
        Self {
            cache,
            started_at: Utc::now(),
        }
    }
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.stats()))
}

/// Handler for GET /cache
///
/// Lists occupied slots with their key, size and recency.
pub async fn entries_handler(State(state): State<AppState>) -> Json<EntriesResponse> {
    Json(EntriesResponse::new(state.cache.entries()))
}

/// Handler for GET /health
///
/// Returns health status of the proxy.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.started_at))
}

/// Fallback for unknown routes.
pub async fn not_found_handler() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new("No such admin endpoint")),
    )
}
