//! Villa Cache - TTL cache and cached request client for the villa site
//!
//! Provides a bounded cache with strategy-based TTLs, LRU eviction,
//! periodic sweeping and snapshot persistence, plus a request client that
//! reads through it and invalidates it on writes.

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod storage;
pub mod tasks;

pub use api::AppState;
pub use cache::{Cache, Expiry, Invalidation, Strategy};
pub use client::{CachedClient, HttpTransport, RequestOptions};
pub use config::{CacheConfig, CacheConfigPatch, Config};
pub use error::{CacheError, Result};
pub use tasks::spawn_sweep_task;
