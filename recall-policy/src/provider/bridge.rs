//! Adapter from the blocking provider variant to the suspendable one.

use async_trait::async_trait;
use recall_core::{CacheKey, CachedItem, ProviderError, Ttl};
use std::sync::Arc;

use super::{AsyncCacheProvider, CacheProvider};

/// Presents a blocking [`CacheProvider`] as an [`AsyncCacheProvider`].
///
/// The wrapped calls complete immediately (the "awaitable result" here is
/// an already-resolved value), so this is only appropriate for providers
/// whose operations are genuinely cheap (process-local maps and the like).
/// Wrapping a provider that does real I/O would block the task's thread.
///
/// The reverse direction is deliberately not provided: driving a
/// suspendable provider from a blocking policy would require a runtime
/// handle. Use an async policy for async-only providers.
#[derive(Debug)]
pub struct BlockingBridge<P> {
    inner: Arc<P>,
}

// Manual Clone implementation that doesn't require P: Clone.
impl<P> Clone for BlockingBridge<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: CacheProvider> BlockingBridge<P> {
    /// Wrap a blocking provider.
    pub fn new(inner: Arc<P>) -> Self {
        Self { inner }
    }

    /// The wrapped provider.
    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: CacheProvider> AsyncCacheProvider for BlockingBridge<P> {
    async fn get(&self, key: &CacheKey) -> Result<Option<CachedItem>, ProviderError> {
        self.inner.get(key)
    }

    async fn put(&self, key: &CacheKey, item: CachedItem, ttl: Ttl) -> Result<(), ProviderError> {
        self.inner.put(key, item, ttl)
    }
}
