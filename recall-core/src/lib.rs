//! Recall Core - Data Types
//!
//! Pure data structures for the Recall cache-aside policy library.
//! This crate contains ONLY data types - no decision logic. The engine,
//! provider traits, and policy surfaces live in `recall-policy`.
//!
//! # Key Types
//!
//! - [`ExecutionContext`]: caller-owned context for one governed call
//! - [`CacheKey`]: string key with an explicit bypass sentinel
//! - [`CachedItem`]: opaque stored payload plus storage timestamp
//! - [`Ttl`]: requested lifetime for a freshly written entry
//! - [`CacheOutcome`]: per-call hit/miss/unavailable signal
//! - [`RecallError`] / [`ExecutionError`]: the error taxonomy

pub mod context;
pub mod error;
pub mod item;
pub mod key;
pub mod outcome;
pub mod ttl;

pub use context::ExecutionContext;
pub use error::{
    ConfigError, ExecutionError, ProviderError, RecallError, RecallResult, StrategyError,
};
pub use item::CachedItem;
pub use key::CacheKey;
pub use outcome::CacheOutcome;
pub use ttl::Ttl;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Generate a new UUIDv7 correlation id (timestamp-sortable).
pub fn new_correlation_id() -> Uuid {
    Uuid::now_v7()
}
