//! Invalidation Module
//!
//! Describes which keys an `invalidate` call removes.

use regex::Regex;

use crate::error::{CacheError, Result};

// == Invalidation ==
/// Target of an invalidation: one key, a key prefix, or a regex.
#[derive(Debug, Clone)]
pub enum Invalidation {
    /// Exactly this key
    Key(String),
    /// Every key starting with this prefix
    Prefix(String),
    /// Every key the regex matches
    Pattern(Regex),
}

impl Invalidation {
    pub fn key(key: impl Into<String>) -> Self {
        Invalidation::Key(key.into())
    }

    /// All keys in a tag namespace, i.e. prefixed with `"{tag}:"`.
    pub fn tag(tag: &str) -> Self {
        Invalidation::Prefix(format!("{}:", tag))
    }

    /// Compiles a regular expression target.
    pub fn pattern(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(Invalidation::Pattern)
            .map_err(|e| CacheError::InvalidPattern(format!("{}: {}", pattern, e)))
    }

    /// Compiles a glob where `*` matches any run of characters and the
    /// whole key must match.
    pub fn glob(glob: &str) -> Result<Self> {
        let body = regex::escape(glob).replace(r"\*", ".*");
        Self::pattern(&format!("^{}$", body))
    }

    /// Reads a caller-supplied target: strings containing `*` are globs,
    /// anything else names a single key.
    pub fn parse(target: &str) -> Result<Self> {
        if target.contains('*') {
            Self::glob(target)
        } else {
            Ok(Self::key(target))
        }
    }

    pub fn matches(&self, key: &str) -> bool {
        match self {
            Invalidation::Key(exact) => exact == key,
            Invalidation::Prefix(prefix) => key.starts_with(prefix.as_str()),
            Invalidation::Pattern(regex) => regex.is_match(key),
        }
    }
}

impl From<&str> for Invalidation {
    fn from(key: &str) -> Self {
        Invalidation::key(key)
    }
}

impl From<String> for Invalidation {
    fn from(key: String) -> Self {
        Invalidation::Key(key)
    }
}

impl From<Regex> for Invalidation {
    fn from(regex: Regex) -> Self {
        Invalidation::Pattern(regex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_key() {
        let target = Invalidation::key("villa:1");
        assert!(target.matches("villa:1"));
        assert!(!target.matches("villa:10"));
    }

    #[test]
    fn test_tag_prefix() {
        let target = Invalidation::tag("villa");
        assert!(target.matches("villa:1"));
        assert!(target.matches("villa:list"));
        assert!(!target.matches("villas:list"));
        assert!(!target.matches("reservation:villa:1"));
    }

    #[test]
    fn test_glob_is_anchored() {
        let target = Invalidation::glob("villa:*").unwrap();
        assert!(target.matches("villa:"));
        assert!(target.matches("villa:42"));
        assert!(!target.matches("admin:villa:42"));
    }

    #[test]
    fn test_glob_escapes_regex_metacharacters() {
        let target = Invalidation::glob("GET:[\"/villas?*").unwrap();
        assert!(target.matches("GET:[\"/villas?page=2"));
        assert!(!target.matches("GET:[\"/villasXpage=2"));
    }

    #[test]
    fn test_parse() {
        assert!(matches!(Invalidation::parse("villa:list").unwrap(), Invalidation::Key(_)));
        assert!(matches!(Invalidation::parse("villa:*").unwrap(), Invalidation::Pattern(_)));
    }

    #[test]
    fn test_invalid_regex() {
        let result = Invalidation::pattern("villa:(");
        assert!(matches!(result, Err(CacheError::InvalidPattern(_))));
    }
}
