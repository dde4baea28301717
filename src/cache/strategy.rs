//! Strategy Module
//!
//! Named TTL presets and the expiry argument accepted by `set`.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CacheError;

// == Strategy ==
/// Semantic label for how long a cached value stays fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Content that changes at most daily (villa descriptions, photos)
    Static,
    /// Listings and availability
    #[default]
    Dynamic,
    /// Per-visitor data
    User,
    /// Admin panel views
    Admin,
    /// Near-live data
    Realtime,
}

impl Strategy {
    /// All strategies, in table order.
    pub const ALL: [Strategy; 5] = [
        Strategy::Static,
        Strategy::Dynamic,
        Strategy::User,
        Strategy::Admin,
        Strategy::Realtime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Static => "static",
            Strategy::Dynamic => "dynamic",
            Strategy::User => "user",
            Strategy::Admin => "admin",
            Strategy::Realtime => "realtime",
        }
    }

    /// Preset duration used when no table override exists.
    pub fn default_ttl(&self) -> Duration {
        match self {
            Strategy::Static => Duration::from_secs(24 * 60 * 60),
            Strategy::Dynamic => Duration::from_secs(5 * 60),
            Strategy::User => Duration::from_secs(15 * 60),
            Strategy::Admin => Duration::from_secs(2 * 60),
            Strategy::Realtime => Duration::from_secs(30),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CacheError::InvalidRequest(format!("Unknown cache strategy: {}", s)))
    }
}

// == Strategy Table ==
/// Strategy → duration lookup, fixed once the store is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyTable {
    durations: HashMap<Strategy, Duration>,
}

impl Default for StrategyTable {
    fn default() -> Self {
        Self {
            durations: Strategy::ALL
                .into_iter()
                .map(|strategy| (strategy, strategy.default_ttl()))
                .collect(),
        }
    }
}

impl StrategyTable {
    /// Overrides one preset. Only usable before the table is handed to a store.
    pub fn with(mut self, strategy: Strategy, ttl: Duration) -> Self {
        self.durations.insert(strategy, ttl);
        self
    }

    pub fn ttl(&self, strategy: Strategy) -> Duration {
        self.durations
            .get(&strategy)
            .copied()
            .unwrap_or_else(|| strategy.default_ttl())
    }
}

// == Expiry ==
/// How long a value written with `set` should live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expiry {
    /// The store's configured default TTL
    #[default]
    Default,
    /// An explicit duration
    After(Duration),
    /// A named preset
    Strategy(Strategy),
}

impl From<Duration> for Expiry {
    fn from(ttl: Duration) -> Self {
        Expiry::After(ttl)
    }
}

impl From<Strategy> for Expiry {
    fn from(strategy: Strategy) -> Self {
        Expiry::Strategy(strategy)
    }
}

impl From<Option<Strategy>> for Expiry {
    fn from(strategy: Option<Strategy>) -> Self {
        strategy.map_or(Expiry::Default, Expiry::Strategy)
    }
}
