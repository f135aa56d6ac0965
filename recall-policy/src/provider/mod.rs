//! Cache provider traits and shipped implementations.
//!
//! A provider is the only I/O boundary the policy touches: two operations,
//! `get` and `put`, over opaque [`CachedItem`] payloads. Providers come in
//! two execution variants, blocking and suspendable, and an
//! implementation may offer either or both. The engine's decision logic is
//! identical across variants; only the suspension point differs.

pub mod bridge;
pub mod memory;

pub use bridge::BlockingBridge;
pub use memory::InMemoryProvider;

use async_trait::async_trait;
use recall_core::{CacheKey, CachedItem, ProviderError, Ttl};
use serde::{de::DeserializeOwned, Serialize};

/// Marker trait for result types that can pass through a cache provider.
///
/// The serde bound is the type-erasure seam: values cross the provider
/// boundary as JSON payloads, so any result type that round-trips through
/// serde composes with any provider. `Send + Sync + 'static` keeps values
/// usable from the suspendable policies.
pub trait CacheableValue: Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> CacheableValue for T where T: Serialize + DeserializeOwned + Send + Sync + 'static {}

/// Blocking cache provider.
///
/// `get` and `put` complete synchronously on the calling thread.
/// Implementations must be thread-safe: one provider is typically shared
/// across many policies and many concurrent calls.
///
/// # Failure contract
///
/// Failures are recoverable signals, never panics. The engine degrades a
/// failed `get` to a miss and a failed `put` to a skipped write; neither
/// disturbs the governed operation's own result.
pub trait CacheProvider: Send + Sync {
    /// Look up the item stored under `key`, if any.
    fn get(&self, key: &CacheKey) -> Result<Option<CachedItem>, ProviderError>;

    /// Store `item` under `key` with the requested lifetime.
    fn put(&self, key: &CacheKey, item: CachedItem, ttl: Ttl) -> Result<(), ProviderError>;
}

/// Suspendable cache provider.
///
/// The async alternative to [`CacheProvider`]: `get` and `put` may suspend
/// the calling task without blocking an OS thread. Same failure contract.
#[async_trait]
pub trait AsyncCacheProvider: Send + Sync {
    /// Look up the item stored under `key`, if any.
    async fn get(&self, key: &CacheKey) -> Result<Option<CachedItem>, ProviderError>;

    /// Store `item` under `key` with the requested lifetime.
    async fn put(&self, key: &CacheKey, item: CachedItem, ttl: Ttl) -> Result<(), ProviderError>;
}
