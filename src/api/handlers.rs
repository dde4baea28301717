//! API Handlers
//!
//! HTTP request handlers for each admin endpoint.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::{Cache, CacheStats, EntryInfo, Invalidation};
use crate::config::CacheConfigPatch;
use crate::error::Result;
use crate::models::{
    ClearResponse, ConfigResponse, HealthResponse, InvalidateResponse, PersistResponse,
    SweepResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub cache: Cache,
}

impl AppState {
    pub fn new(cache: Cache) -> Self {
        Self { cache }
    }
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache.stats())
}

/// Handler for GET /keys
pub async fn keys_handler(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.cache.keys())
}

/// Handler for GET /entries
pub async fn entries_handler(State(state): State<AppState>) -> Json<Vec<EntryInfo>> {
    Json(state.cache.describe())
}

/// Handler for POST /sweep
pub async fn sweep_handler(State(state): State<AppState>) -> Json<SweepResponse> {
    Json(SweepResponse {
        removed: state.cache.sweep(),
    })
}

/// Handler for POST /persist
///
/// Unlike the shutdown flush, storage failures are reported to the caller.
pub async fn persist_handler(State(state): State<AppState>) -> Result<Json<PersistResponse>> {
    let persisted = state.cache.try_persist()?;
    Ok(Json(PersistResponse { persisted }))
}

/// Handler for PATCH /config
pub async fn configure_handler(
    State(state): State<AppState>,
    Json(patch): Json<CacheConfigPatch>,
) -> Json<ConfigResponse> {
    state.cache.configure(&patch);
    Json(ConfigResponse::from(&state.cache.config()))
}

/// Handler for DELETE /cache
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    state.cache.clear();
    Json(ClearResponse::cleared())
}

/// Handler for DELETE /cache/:target
///
/// Targets containing `*` are globs, anything else is an exact key.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Path(target): Path<String>,
) -> Result<Json<InvalidateResponse>> {
    let removed = state.cache.invalidate(Invalidation::parse(&target)?);
    Ok(Json(InvalidateResponse::new(target, removed)))
}

/// Handler for DELETE /tags/:tag
pub async fn invalidate_tag_handler(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> Json<InvalidateResponse> {
    let removed = state.cache.invalidate_by_tag(&tag);
    Json(InvalidateResponse::new(tag, removed))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
