//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::config::CacheConfig;

/// Response body for `DELETE /cache/:pattern` and `DELETE /tags/:tag`
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    /// The key, glob or tag that was invalidated
    pub target: String,
    /// Number of entries removed
    pub removed: usize,
}

impl InvalidateResponse {
    pub fn new(target: impl Into<String>, removed: usize) -> Self {
        Self {
            target: target.into(),
            removed,
        }
    }
}

/// Response body for `POST /sweep`
#[derive(Debug, Clone, Serialize)]
pub struct SweepResponse {
    pub removed: usize,
}

/// Response body for `DELETE /cache`
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
}

impl ClearResponse {
    pub fn cleared() -> Self {
        Self {
            message: "Cache cleared successfully".to_string(),
        }
    }
}

/// Response body for `POST /persist`
#[derive(Debug, Clone, Serialize)]
pub struct PersistResponse {
    /// Whether a snapshot was written
    pub persisted: bool,
}

/// Response body for `PATCH /config`, the live settings after the merge
#[derive(Debug, Clone, Serialize)]
pub struct ConfigResponse {
    pub max_entries: usize,
    pub default_ttl_secs: u64,
    pub sweep_interval_secs: u64,
    pub persist: bool,
    pub pack_threshold: usize,
    pub single_flight: bool,
}

impl From<&CacheConfig> for ConfigResponse {
    fn from(config: &CacheConfig) -> Self {
        Self {
            max_entries: config.max_entries,
            default_ttl_secs: config.default_ttl.as_secs(),
            sweep_interval_secs: config.sweep_interval.as_secs(),
            persist: config.persist,
            pack_threshold: config.pack_threshold,
            single_flight: config.single_flight,
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
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
