//! Response models for the admin API
//!
//! Serializable bodies returned by the diagnostics endpoints.

pub mod responses;

// Re-export commonly used types
pub use responses::{EntriesResponse, EntryResponse, ErrorResponse, HealthResponse, StatsResponse};
