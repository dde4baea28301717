//! Client Module
//!
//! Request client that puts the cache in front of a network transport.

mod cached;
mod key;
mod options;
mod transport;

pub use cached::CachedClient;
pub use key::{cache_key, credentialed_cache_key};
pub use options::RequestOptions;
pub use transport::{HttpTransport, Method, Transport, TransportRequest, TransportResponse};
