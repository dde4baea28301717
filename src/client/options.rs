//! Per-request options of the cached client.

use std::collections::BTreeMap;

use crate::cache::Strategy;

/// Options accepted by every verb. Fields irrelevant to a verb are ignored
/// (reads never invalidate, writes never consult the cache).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// TTL preset for cached reads (default: dynamic)
    pub strategy: Strategy,
    /// Skip the cache lookup on reads; the response is still cached
    pub ignore_cache: bool,
    /// Store the read under this key instead of the derived one
    pub cache_key: Option<String>,
    /// Query string parameters
    pub query: BTreeMap<String, String>,
    /// Headers added on top of the client defaults
    pub headers: BTreeMap<String, String>,
    /// Keys or `*` globs removed after a successful write
    pub invalidate_cache: Vec<String>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn ignore_cache(mut self) -> Self {
        self.ignore_cache = true;
        self
    }

    pub fn cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Header names are case-insensitive and stored lowercased.
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn invalidate(mut self, target: impl Into<String>) -> Self {
        self.invalidate_cache.push(target.into());
        self
    }
}
