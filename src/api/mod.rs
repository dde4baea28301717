//! API Module
//!
//! Admin HTTP surface for inspecting and maintaining the cache.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /stats` - Cache statistics
//! - `GET /keys` - Stored keys
//! - `GET /entries` - Strategy, remaining TTL and size per live entry
//! - `POST /sweep` - Remove expired entries now
//! - `POST /persist` - Flush a snapshot to durable storage
//! - `PATCH /config` - Merge new cache settings
//! - `DELETE /cache` - Clear the cache
//! - `DELETE /cache/:target` - Invalidate a key or `*` glob
//! - `DELETE /tags/:tag` - Invalidate every `tag:` key

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
