//! Suspendable cache policies.
//!
//! The async alternative to the blocking policies in [`crate::policy`]:
//! same construction contract, same decision tree, with `get`, the
//! governed operation, and `put` awaited at well-defined suspension
//! points. Each awaited step races the context's cancellation token.

use recall_core::{ConfigError, ExecutionContext, ExecutionError, RecallResult};
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::engine::CacheEngine;
use crate::hooks::CacheHooks;
use crate::provider::{AsyncCacheProvider, CacheableValue};
use crate::strategy::{CacheKeyStrategy, NoExpiration, TtlStrategy};

/// Builder for suspendable cache policies.
///
/// Identical contract to [`crate::policy::CachePolicyBuilder`], bound to
/// the suspendable provider variant.
#[derive(Default)]
pub struct AsyncCachePolicyBuilder {
    provider: Option<Arc<dyn AsyncCacheProvider>>,
    key_strategy: Option<Arc<dyn CacheKeyStrategy>>,
    ttl_strategy: Option<Arc<dyn TtlStrategy>>,
    hooks: CacheHooks,
}

impl AsyncCachePolicyBuilder {
    /// Start an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the cache provider (required).
    pub fn provider(mut self, provider: Arc<dyn AsyncCacheProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Bind the key strategy (required).
    pub fn key_strategy(mut self, strategy: Arc<dyn CacheKeyStrategy>) -> Self {
        self.key_strategy = Some(strategy);
        self
    }

    /// Bind the TTL strategy (optional; defaults to [`NoExpiration`]).
    pub fn ttl_strategy(mut self, strategy: Arc<dyn TtlStrategy>) -> Self {
        self.ttl_strategy = Some(strategy);
        self
    }

    /// Bind instrumentation hooks (optional; default to no-ops).
    pub fn hooks(mut self, hooks: CacheHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Build a typed policy.
    pub fn build<T: CacheableValue>(self) -> RecallResult<AsyncCachePolicy<T>> {
        Ok(self.build_untyped()?.typed())
    }

    /// Build an untyped policy.
    pub fn build_untyped(self) -> RecallResult<AnyAsyncCachePolicy> {
        let provider = self.provider.ok_or_else(|| ConfigError::MissingRequired {
            field: "provider".to_string(),
        })?;
        let key_strategy = self.key_strategy.ok_or_else(|| ConfigError::MissingRequired {
            field: "key_strategy".to_string(),
        })?;
        let ttl_strategy = self
            .ttl_strategy
            .unwrap_or_else(|| Arc::new(NoExpiration));
        Ok(AnyAsyncCachePolicy {
            provider,
            engine: CacheEngine::new(key_strategy, ttl_strategy, self.hooks),
        })
    }
}

/// Cache-aside policy for a fixed result type, suspendable mode.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use recall_core::ExecutionContext;
/// use recall_policy::async_policy::{AsyncCachePolicy, AsyncCachePolicyBuilder};
/// use recall_policy::provider::InMemoryProvider;
/// use recall_policy::strategy::ExecutionKeyStrategy;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let policy: AsyncCachePolicy<i64> = AsyncCachePolicyBuilder::new()
///     .provider(Arc::new(InMemoryProvider::new()))
///     .key_strategy(Arc::new(ExecutionKeyStrategy))
///     .build()
///     .unwrap();
///
/// let ctx = ExecutionContext::new("user:42");
/// let value = policy.execute(&ctx, |_| async { Ok::<_, String>(17) }).await.unwrap();
/// assert_eq!(value, 17);
/// # }
/// ```
pub struct AsyncCachePolicy<T: CacheableValue> {
    inner: AnyAsyncCachePolicy,
    _result: PhantomData<fn() -> T>,
}

impl<T: CacheableValue> AsyncCachePolicy<T> {
    /// Execute the governed operation through the cache.
    ///
    /// Same decision tree as the blocking mode; any step may suspend, and
    /// cancellation through the context's token aborts the remaining
    /// steps.
    pub async fn execute<'a, E, F, Fut>(
        &self,
        ctx: &'a ExecutionContext,
        operation: F,
    ) -> Result<T, ExecutionError<E>>
    where
        F: FnOnce(&'a ExecutionContext) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.inner.execute(ctx, operation).await
    }

    /// Erase the result type, keeping the same provider and engine.
    pub fn into_untyped(self) -> AnyAsyncCachePolicy {
        self.inner
    }
}

impl<T: CacheableValue> Clone for AsyncCachePolicy<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _result: PhantomData,
        }
    }
}

/// Suspendable cache-aside policy whose result type is chosen per call.
#[derive(Clone)]
pub struct AnyAsyncCachePolicy {
    provider: Arc<dyn AsyncCacheProvider>,
    engine: CacheEngine,
}

impl AnyAsyncCachePolicy {
    /// Start building a policy.
    pub fn builder() -> AsyncCachePolicyBuilder {
        AsyncCachePolicyBuilder::new()
    }

    /// Execute the governed operation through the cache, with the result
    /// type picked by the call site.
    pub async fn execute<'a, T, E, F, Fut>(
        &self,
        ctx: &'a ExecutionContext,
        operation: F,
    ) -> Result<T, ExecutionError<E>>
    where
        T: CacheableValue,
        F: FnOnce(&'a ExecutionContext) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.engine
            .run_suspendable(self.provider.as_ref(), ctx, operation)
            .await
    }

    /// Pin the result type, keeping the same provider and engine.
    pub fn typed<T: CacheableValue>(self) -> AsyncCachePolicy<T> {
        AsyncCachePolicy {
            inner: self,
            _result: PhantomData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{BlockingBridge, InMemoryProvider};
    use crate::strategy::ExecutionKeyStrategy;
    use recall_core::RecallError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn build_policy<T: CacheableValue>(provider: Arc<InMemoryProvider>) -> AsyncCachePolicy<T> {
        AsyncCachePolicyBuilder::new()
            .provider(provider)
            .key_strategy(Arc::new(ExecutionKeyStrategy))
            .build()
            .expect("provider and key strategy are set")
    }

    #[test]
    fn test_build_without_provider_fails() {
        let result = AsyncCachePolicyBuilder::new()
            .key_strategy(Arc::new(ExecutionKeyStrategy))
            .build::<i64>();
        assert_eq!(
            result.err(),
            Some(RecallError::Config(ConfigError::MissingRequired {
                field: "provider".to_string()
            }))
        );
    }

    #[tokio::test]
    async fn test_execute_caches_across_calls() {
        let policy = build_policy::<i64>(Arc::new(InMemoryProvider::new()));
        let ctx = ExecutionContext::new("user:42");
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let calls = Arc::clone(&calls);
            let value = policy
                .execute(&ctx, move |_| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(17)
                })
                .await
                .unwrap();
            assert_eq!(value, 17);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_bridged_blocking_provider() {
        let store = Arc::new(InMemoryProvider::new());
        let policy: AsyncCachePolicy<String> = AsyncCachePolicyBuilder::new()
            .provider(Arc::new(BlockingBridge::new(Arc::clone(&store))))
            .key_strategy(Arc::new(ExecutionKeyStrategy))
            .build()
            .unwrap();

        let ctx = ExecutionContext::new("greeting");
        let value = policy
            .execute(&ctx, |_| async { Ok::<_, String>("hello".to_string()) })
            .await
            .unwrap();
        assert_eq!(value, "hello");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_untyped_async_policy() {
        let policy = AnyAsyncCachePolicy::builder()
            .provider(Arc::new(InMemoryProvider::new()))
            .key_strategy(Arc::new(ExecutionKeyStrategy))
            .build_untyped()
            .unwrap();

        let ctx = ExecutionContext::new("count");
        let first: i64 = policy
            .execute(&ctx, |_| async { Ok::<_, String>(3) })
            .await
            .unwrap();
        let second: i64 = policy
            .execute(&ctx, |_| async { Err("unreachable".to_string()) })
            .await
            .unwrap();
        assert_eq!(first, 3);
        assert_eq!(second, 3);
    }
}
