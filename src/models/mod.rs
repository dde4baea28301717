//! Response models for the admin API
//!
//! DTOs serialized into HTTP response bodies. Requests reuse
//! [`CacheConfigPatch`](crate::config::CacheConfigPatch) directly.

pub mod responses;

// Re-export commonly used types
pub use responses::{
    ClearResponse, ConfigResponse, ErrorResponse, HealthResponse, InvalidateResponse,
    PersistResponse, SweepResponse,
};
