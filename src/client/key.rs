//! Cache key derivation for client reads.

use std::collections::BTreeMap;

use serde_json::json;
use sha2::{Digest, Sha256};

use super::{Method, RequestOptions};

pub(crate) const AUTHORIZATION: &str = "authorization";

/// Derives the cache key of an anonymous request.
///
/// The key is `METHOD:` followed by the JSON array `[resource, query,
/// headers]`. Maps are ordered and JSON encoding is injective, so equal
/// logical requests share a key and different ones never collide. Options
/// that only steer caching (strategy, `ignore_cache`, invalidation list) do
/// not take part. An explicit `cache_key` wins.
pub fn cache_key(method: Method, resource: &str, options: &RequestOptions) -> String {
    credentialed_cache_key(method, resource, options, None)
}

/// Derives the cache key of a request sent with `credential` as its default
/// authorization header.
///
/// An `authorization` header on the request itself takes precedence. The
/// credential enters the key only as a SHA-256 digest suffix `@<hex>`, so
/// reads made under different credentials, or none, never share an entry
/// and keys listed for diagnostics never carry a token.
pub fn credentialed_cache_key(
    method: Method,
    resource: &str,
    options: &RequestOptions,
    credential: Option<&str>,
) -> String {
    if let Some(key) = &options.cache_key {
        return key.clone();
    }

    let mut headers: BTreeMap<&str, &str> = options
        .headers
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect();
    let credential = headers.remove(AUTHORIZATION).or(credential);

    let parts = json!([resource, options.query, headers]);
    match credential {
        Some(credential) => format!("{}:{}@{}", method.as_str(), parts, digest(credential)),
        None => format!("{}:{}", method.as_str(), parts),
    }
}

fn digest(credential: &str) -> String {
    hex::encode(Sha256::digest(credential.as_bytes()))
}
