//! Cache key newtype and the bypass sentinel.
//!
//! A [`CacheKey`] is the string identity of one logical cacheable unit,
//! derived deterministically from the execution context by a key strategy.
//! The empty key is reserved as the bypass sentinel: deriving it tells the
//! engine to skip caching for that call entirely.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A cache key derived from an execution context.
///
/// Determinism (same context content, same key) is the key strategy's
/// contract; the key itself is just the value. Keys compare, hash, and
/// order as plain strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Create a key from any string-like value.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The bypass sentinel: an empty key.
    ///
    /// A strategy that derives this key opts the call out of caching;
    /// the engine runs the governed operation directly and never touches
    /// the provider.
    pub fn bypass() -> Self {
        Self(String::new())
    }

    /// Returns true if this is the bypass sentinel.
    pub fn is_bypass(&self) -> bool {
        self.0.is_empty()
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the key and return the underlying string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CacheKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for CacheKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_and_accessors() {
        let key = CacheKey::new("user:42");
        assert_eq!(key.as_str(), "user:42");
        assert_eq!(key.to_string(), "user:42");
        assert!(!key.is_bypass());
    }

    #[test]
    fn test_bypass_is_empty() {
        let key = CacheKey::bypass();
        assert!(key.is_bypass());
        assert_eq!(key.as_str(), "");
    }

    #[test]
    fn test_empty_string_is_bypass() {
        assert!(CacheKey::from("").is_bypass());
        assert!(CacheKey::new(String::new()).is_bypass());
    }

    #[test]
    fn test_from_conversions_agree() {
        let a = CacheKey::from("k");
        let b = CacheKey::from("k".to_string());
        assert_eq!(a, b);
    }

    #[test]
    fn test_into_string_roundtrip() {
        let key = CacheKey::new("orders/7");
        assert_eq!(key.clone().into_string(), "orders/7");
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: only the empty string is the bypass sentinel.
        #[test]
        fn prop_bypass_iff_empty(key in ".*") {
            let cache_key = CacheKey::new(key.clone());
            prop_assert_eq!(cache_key.is_bypass(), key.is_empty());
        }

        /// Property: construction preserves the key text exactly.
        #[test]
        fn prop_key_text_preserved(key in ".*") {
            let cache_key = CacheKey::new(key.clone());
            prop_assert_eq!(cache_key.as_str(), key.as_str());
            prop_assert_eq!(cache_key.to_string(), key);
        }
    }
}
