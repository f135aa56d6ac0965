//! The stored form of a cached value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// A cached value as the provider stores it.
///
/// The payload is an opaque JSON document; the engine only ever asks
/// "present or absent" and hands decoding to the result-type boundary.
/// `stored_at` travels with the payload so callers and providers can
/// reason about staleness without a side channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedItem {
    payload: Value,
    stored_at: DateTime<Utc>,
}

impl CachedItem {
    /// Wrap a payload, stamping it with the current time.
    pub fn new(payload: Value) -> Self {
        Self {
            payload,
            stored_at: Utc::now(),
        }
    }

    /// Wrap a payload with an explicit storage timestamp.
    pub fn with_stored_at(payload: Value, stored_at: DateTime<Utc>) -> Self {
        Self { payload, stored_at }
    }

    /// The stored payload.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Consume the item and return the payload.
    pub fn into_payload(self) -> Value {
        self.payload
    }

    /// When this item was stored.
    pub fn stored_at(&self) -> DateTime<Utc> {
        self.stored_at
    }

    /// How long ago this item was stored.
    pub fn age(&self) -> Duration {
        let now = Utc::now();
        if now > self.stored_at {
            (now - self.stored_at).to_std().unwrap_or(Duration::ZERO)
        } else {
            Duration::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_stamps_current_time() {
        let before = Utc::now();
        let item = CachedItem::new(json!({"answer": 42}));
        let after = Utc::now();
        assert!(item.stored_at() >= before && item.stored_at() <= after);
        assert_eq!(item.payload(), &json!({"answer": 42}));
    }

    #[test]
    fn test_with_stored_at_preserves_timestamp() {
        let stamp = Utc::now() - chrono::Duration::seconds(30);
        let item = CachedItem::with_stored_at(json!(17), stamp);
        assert_eq!(item.stored_at(), stamp);
    }

    #[test]
    fn test_age_of_old_item() {
        let stamp = Utc::now() - chrono::Duration::seconds(5);
        let item = CachedItem::with_stored_at(json!(null), stamp);
        let age = item.age();
        assert!(age >= Duration::from_secs(4));
        assert!(age <= Duration::from_secs(10));
    }

    #[test]
    fn test_age_of_future_item_is_zero() {
        let stamp = Utc::now() + chrono::Duration::seconds(60);
        let item = CachedItem::with_stored_at(json!(1), stamp);
        assert_eq!(item.age(), Duration::ZERO);
    }

    #[test]
    fn test_null_payload_is_a_value() {
        // A JSON null payload is a present item, not an absence marker.
        let item = CachedItem::new(Value::Null);
        assert_eq!(item.into_payload(), Value::Null);
    }
}
