//! Error types for the cache and request client
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::client::Method;
use crate::models::ErrorResponse;

// == Persistence Error ==
/// Failures of the durable snapshot store. Absorbed by the cache and logged.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Reading or writing the backing medium failed
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot could not be encoded or decoded
    #[error("corrupt snapshot: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// Backing store refused the write
    #[error("storage quota exceeded: {needed} bytes needed, {limit} allowed")]
    QuotaExceeded { needed: usize, limit: usize },
}

// == Cache Error Enum ==
/// Unified error type for the cache and request client.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The transport could not complete the request
    #[error("Network error: {0}")]
    Network(String),

    /// The request completed with a non-success status
    #[error("{method} {resource} failed with status {status}: {message}")]
    Http {
        method: Method,
        resource: String,
        status: u16,
        message: String,
    },

    /// An invalidation pattern did not compile
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A request body could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Durable storage failed where the caller asked for it explicitly
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

impl CacheError {
    /// HTTP status carried by an `Http` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            CacheError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for CacheError {
    fn from(err: reqwest::Error) -> Self {
        CacheError::Network(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::Network(_) | CacheError::Http { .. } => StatusCode::BAD_GATEWAY,
            CacheError::InvalidPattern(_)
            | CacheError::InvalidRequest(_)
            | CacheError::Serialization(_) => StatusCode::BAD_REQUEST,
            CacheError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache and request client.
pub type Result<T> = std::result::Result<T, CacheError>;
