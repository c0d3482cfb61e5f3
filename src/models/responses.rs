//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::{CacheEntryView, CacheStats};

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Requests served from the cache
    pub hits: u64,
    /// Requests forwarded to an origin
    pub misses: u64,
    /// Objects written into the cache
    pub insertions: u64,
    /// Insertions that displaced another entry
    pub evictions: u64,
    /// Responses too large to cache
    pub uncacheable: u64,
    /// Occupied slots
    pub total_entries: usize,
    /// Fixed slot count
    pub slot_count: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            insertions: stats.insertions,
            evictions: stats.evictions,
            uncacheable: stats.uncacheable,
            total_entries: stats.total_entries,
            slot_count: stats.slot_count,
        }
    }
}

/// One occupied cache slot
#[derive(Debug, Clone, Serialize)]
pub struct EntryResponse {
    pub slot: usize,
    pub uri: String,
    pub size: usize,
    pub recency: u64,
}

impl From<CacheEntryView> for EntryResponse {
    fn from(view: CacheEntryView) -> Self {
        Self {
            slot: view.slot,
            uri: view.uri,
            size: view.size,
            recency: view.recency,
        }
    }
}

/// Response body for the cache listing endpoint (GET /cache)
#[derive(Debug, Clone, Serialize)]
pub struct EntriesResponse {
    pub entries: Vec<EntryResponse>,
}

impl EntriesResponse {
    pub fn new(views: Vec<CacheEntryView>) -> Self {
        Self {
            entries: views.into_iter().map(EntryResponse::from).collect(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    /// Seconds since the proxy started
    pub uptime_secs: i64,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(started_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            status: "healthy".to_string(),
            timestamp: now.to_rfc3339(),
            uptime_secs: (now - started_at).num_seconds(),
        }
    }
}

/// Error response body for unknown routes
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
