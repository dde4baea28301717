//! Cached request client.
//!
//! Reads are cache-aside: look up, on miss fetch and store. Writes always go
//! to the network and then bust the keys the caller names. Nothing is ever
//! retried here and error responses are never cached.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::key::{credentialed_cache_key, AUTHORIZATION};
use super::{Method, RequestOptions, Transport, TransportRequest};
use crate::cache::{Cache, Invalidation};
use crate::error::{CacheError, Result};

#[derive(Debug)]
pub struct CachedClient {
    base_url: String,
    default_headers: RwLock<BTreeMap<String, String>>,
    transport: Arc<dyn Transport>,
    cache: Cache,
}

impl CachedClient {
    pub fn new(base_url: impl Into<String>, transport: Arc<dyn Transport>, cache: Cache) -> Self {
        let mut default_headers = BTreeMap::new();
        default_headers.insert("content-type".to_string(), "application/json".to_string());

        Self {
            base_url: base_url.into(),
            default_headers: RwLock::new(default_headers),
            transport,
            cache,
        }
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    // == Auth ==
    /// Sets or clears the bearer token sent with every later request.
    pub fn set_auth_token(&self, token: Option<&str>) {
        let mut headers = self
            .default_headers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match token {
            Some(token) => {
                headers.insert(AUTHORIZATION.to_string(), format!("Bearer {}", token));
            }
            None => {
                headers.remove(AUTHORIZATION);
            }
        }
    }

    fn default_header(&self, name: &str) -> Option<String> {
        self.default_headers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    // == Get ==
    /// Fetches `resource`, serving it from the cache when possible.
    ///
    /// Reads made under different auth tokens are cached apart.
    pub async fn get(&self, resource: &str, options: &RequestOptions) -> Result<Value> {
        let credential = self.default_header(AUTHORIZATION);
        let key = credentialed_cache_key(Method::Get, resource, options, credential.as_deref());

        if !options.ignore_cache {
            if let Some(value) = self.cache.get(&key) {
                debug!(%key, "Cache hit");
                return Ok(value);
            }
        }

        debug!(%key, "Cache miss, fetching {}", resource);
        let value = self.send(Method::Get, resource, None, options).await?;
        self.cache.set(key, value.clone(), options.strategy);
        Ok(value)
    }

    // == Mutations ==
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        resource: &str,
        body: &B,
        options: &RequestOptions,
    ) -> Result<Value> {
        let body = serde_json::to_value(body)?;
        self.mutate(Method::Post, resource, Some(body), options).await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        resource: &str,
        body: &B,
        options: &RequestOptions,
    ) -> Result<Value> {
        let body = serde_json::to_value(body)?;
        self.mutate(Method::Put, resource, Some(body), options).await
    }

    pub async fn delete(&self, resource: &str, options: &RequestOptions) -> Result<Value> {
        self.mutate(Method::Delete, resource, None, options).await
    }

    async fn mutate(
        &self,
        method: Method,
        resource: &str,
        body: Option<Value>,
        options: &RequestOptions,
    ) -> Result<Value> {
        // Bad patterns are reported before anything reaches the network.
        let targets = options
            .invalidate_cache
            .iter()
            .map(|target| Invalidation::parse(target))
            .collect::<Result<Vec<_>>>()?;

        let value = self.send(method, resource, body, options).await?;

        for target in targets {
            self.cache.invalidate(target);
        }
        Ok(value)
    }

    // == Send ==
    async fn send(
        &self,
        method: Method,
        resource: &str,
        body: Option<Value>,
        options: &RequestOptions,
    ) -> Result<Value> {
        let mut headers = self
            .default_headers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        headers.extend(options.headers.clone());

        let request = TransportRequest {
            method,
            url: self.url_for(resource),
            headers,
            query: options.query.clone(),
            body,
        };

        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(CacheError::Http {
                method,
                resource: resource.to_string(),
                status: response.status,
                message: error_message(&response.body),
            });
        }
        Ok(response.body)
    }

    /// Joins the base URL and a resource path. Absolute URLs pass through.
    fn url_for(&self, resource: &str) -> String {
        if resource.starts_with("http://") || resource.starts_with("https://") {
            return resource.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            resource.trim_start_matches('/')
        )
    }
}

/// Human-readable reason from an error body.
fn error_message(body: &Value) -> String {
    match body {
        Value::Null => "no response body".to_string(),
        Value::String(text) => text.clone(),
        Value::Object(fields) => fields
            .get("error")
            .or_else(|| fields.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string()),
        other => other.to_string(),
    }
}
