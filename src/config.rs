//! Configuration Module
//!
//! Handles loading and managing cache and server configuration from
//! environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Storage slot holding the persisted cache snapshot.
pub const DEFAULT_SNAPSHOT_SLOT: &str = "villa_cache.snapshot";

// == Cache Config ==
/// Live settings of a cache store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold (at least 1)
    pub max_entries: usize,
    /// TTL for entries written without a duration or strategy
    pub default_ttl: Duration,
    /// Pause between background sweeps
    pub sweep_interval: Duration,
    /// Whether snapshots are written to durable storage
    pub persist: bool,
    /// Values whose serialized form exceeds this many bytes are stored packed
    pub pack_threshold: usize,
    /// Coalesce concurrent `get_or_compute` misses on the same key
    pub single_flight: bool,
    /// Durable storage slot for snapshots
    pub snapshot_slot: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 100,
            default_ttl: Duration::from_secs(300),
            sweep_interval: Duration::from_secs(60),
            persist: true,
            pack_threshold: 1024,
            single_flight: false,
            snapshot_slot: DEFAULT_SNAPSHOT_SLOT.to_string(),
        }
    }
}

impl CacheConfig {
    /// Loads cache settings from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 100)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `SWEEP_INTERVAL` - Sweep frequency in seconds (default: 60)
    /// - `PERSIST` - Write snapshots to durable storage (default: true)
    /// - `PACK_THRESHOLD` - Packing threshold in bytes (default: 1024)
    /// - `SINGLE_FLIGHT` - Coalesce concurrent misses (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env_or("MAX_ENTRIES", defaults.max_entries).max(1),
            default_ttl: Duration::from_secs(env_or("DEFAULT_TTL", 300)),
            sweep_interval: Duration::from_secs(env_or("SWEEP_INTERVAL", 60).max(1)),
            persist: env_or("PERSIST", defaults.persist),
            pack_threshold: env_or("PACK_THRESHOLD", defaults.pack_threshold),
            single_flight: env_or("SINGLE_FLIGHT", defaults.single_flight),
            snapshot_slot: defaults.snapshot_slot,
        }
    }

    // == Apply Patch ==
    /// Merges the fields present in `patch` into this configuration.
    pub fn apply(&mut self, patch: &CacheConfigPatch) {
        if let Some(max_entries) = patch.max_entries {
            self.max_entries = max_entries.max(1);
        }
        if let Some(secs) = patch.default_ttl_secs {
            self.default_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = patch.sweep_interval_secs {
            self.sweep_interval = Duration::from_secs(secs.max(1));
        }
        if let Some(persist) = patch.persist {
            self.persist = persist;
        }
        if let Some(threshold) = patch.pack_threshold {
            self.pack_threshold = threshold;
        }
        if let Some(single_flight) = patch.single_flight {
            self.single_flight = single_flight;
        }
    }
}

// == Cache Config Patch ==
/// Partial settings accepted by `configure`. Absent fields stay unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfigPatch {
    #[serde(default)]
    pub max_entries: Option<usize>,
    #[serde(default)]
    pub default_ttl_secs: Option<u64>,
    #[serde(default)]
    pub sweep_interval_secs: Option<u64>,
    #[serde(default)]
    pub persist: Option<bool>,
    #[serde(default)]
    pub pack_threshold: Option<usize>,
    #[serde(default)]
    pub single_flight: Option<bool>,
}

// == Server Config ==
/// Process configuration for the admin server binary.
#[derive(Debug, Clone)]
pub struct Config {
    pub cache: CacheConfig,
    /// HTTP port of the admin surface
    pub server_port: u16,
    /// Directory backing durable storage
    pub storage_dir: PathBuf,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - Everything read by [`CacheConfig::from_env`]
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `STORAGE_DIR` - Durable storage directory (default: `.villa_cache`)
    pub fn from_env() -> Self {
        Self {
            cache: CacheConfig::from_env(),
            server_port: env_or("SERVER_PORT", 3000),
            storage_dir: env::var("STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".villa_cache")),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            server_port: 3000,
            storage_dir: PathBuf::from(".villa_cache"),
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.cache.max_entries, 100);
        assert_eq!(config.cache.default_ttl, Duration::from_secs(300));
        assert_eq!(config.cache.sweep_interval, Duration::from_secs(60));
        assert!(config.cache.persist);
        assert!(!config.cache.single_flight);
        assert_eq!(config.server_port, 3000);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        for name in [
            "MAX_ENTRIES",
            "DEFAULT_TTL",
            "SWEEP_INTERVAL",
            "PERSIST",
            "PACK_THRESHOLD",
            "SINGLE_FLIGHT",
            "SERVER_PORT",
            "STORAGE_DIR",
        ] {
            env::remove_var(name);
        }

        let config = Config::from_env();
        assert_eq!(config.cache, CacheConfig::default());
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.storage_dir, PathBuf::from(".villa_cache"));
    }

    #[test]
    fn test_apply_patch_merges_present_fields() {
        let mut config = CacheConfig::default();
        config.apply(&CacheConfigPatch {
            max_entries: Some(10),
            persist: Some(false),
            ..Default::default()
        });

        assert_eq!(config.max_entries, 10);
        assert!(!config.persist);
        assert_eq!(config.default_ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_apply_patch_clamps_capacity() {
        let mut config = CacheConfig::default();
        config.apply(&CacheConfigPatch {
            max_entries: Some(0),
            ..Default::default()
        });
        assert_eq!(config.max_entries, 1);
    }

    #[test]
    fn test_patch_rejects_unknown_fields() {
        let result: Result<CacheConfigPatch, _> = serde_json::from_str(r#"{"max_size": 5}"#);
        assert!(result.is_err());
    }
}
