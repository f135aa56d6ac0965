//! Blocking cache policies.
//!
//! [`CachePolicy<T>`] is the public entry point for the blocking execution
//! mode: it binds one provider, one key strategy, an optional TTL strategy
//! and optional hooks, and exposes a single `execute` operation delegating
//! to the engine. [`AnyCachePolicy`] is the untyped twin for call sites
//! where the result type is only known at the call itself.
//!
//! Policies are immutable after construction and hold no per-call state;
//! clone them freely and invoke them concurrently. Providers and
//! strategies are `Arc`-shared, never exclusively owned, so one provider
//! can back many policies.

use recall_core::{ConfigError, ExecutionContext, ExecutionError, RecallResult};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::engine::CacheEngine;
use crate::hooks::CacheHooks;
use crate::provider::{CacheProvider, CacheableValue};
use crate::strategy::{CacheKeyStrategy, NoExpiration, TtlStrategy};

/// Builder for blocking cache policies.
///
/// Provider and key strategy are required; `build` fails with
/// [`ConfigError::MissingRequired`] when either is absent. The TTL
/// strategy defaults to [`NoExpiration`] and hooks default to no-ops:
/// explicit values constructed here, not hidden shared state.
#[derive(Default)]
pub struct CachePolicyBuilder {
    provider: Option<Arc<dyn CacheProvider>>,
    key_strategy: Option<Arc<dyn CacheKeyStrategy>>,
    ttl_strategy: Option<Arc<dyn TtlStrategy>>,
    hooks: CacheHooks,
}

impl CachePolicyBuilder {
    /// Start an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the cache provider (required).
    pub fn provider(mut self, provider: Arc<dyn CacheProvider>) -> Self {
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
    pub fn build<T: CacheableValue>(self) -> RecallResult<CachePolicy<T>> {
        Ok(self.build_untyped()?.typed())
    }

    /// Build an untyped policy.
    pub fn build_untyped(self) -> RecallResult<AnyCachePolicy> {
        let provider = self.provider.ok_or_else(|| ConfigError::MissingRequired {
            field: "provider".to_string(),
        })?;
        let key_strategy = self.key_strategy.ok_or_else(|| ConfigError::MissingRequired {
            field: "key_strategy".to_string(),
        })?;
        let ttl_strategy = self
            .ttl_strategy
            .unwrap_or_else(|| Arc::new(NoExpiration));
        Ok(AnyCachePolicy {
            provider,
            engine: CacheEngine::new(key_strategy, ttl_strategy, self.hooks),
        })
    }
}

/// Cache-aside policy for a fixed result type, blocking mode.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use recall_core::ExecutionContext;
/// use recall_policy::policy::{CachePolicy, CachePolicyBuilder};
/// use recall_policy::provider::InMemoryProvider;
/// use recall_policy::strategy::ExecutionKeyStrategy;
///
/// let policy: CachePolicy<i64> = CachePolicyBuilder::new()
///     .provider(Arc::new(InMemoryProvider::new()))
///     .key_strategy(Arc::new(ExecutionKeyStrategy))
///     .build()
///     .unwrap();
///
/// let ctx = ExecutionContext::new("user:42");
/// let value = policy.execute(&ctx, |_| Ok::<_, String>(17)).unwrap();
/// assert_eq!(value, 17);
/// // Served from cache; the operation does not run again.
/// let again = policy.execute(&ctx, |_| Err("unreachable".to_string())).unwrap();
/// assert_eq!(again, 17);
/// ```
pub struct CachePolicy<T: CacheableValue> {
    inner: AnyCachePolicy,
    _result: PhantomData<fn() -> T>,
}

impl<T: CacheableValue> CachePolicy<T> {
    /// Execute the governed operation through the cache.
    ///
    /// On a hit the operation never runs; on a miss it runs exactly once
    /// and its successful result is written back. An operation failure is
    /// returned verbatim and nothing is written.
    pub fn execute<E, F>(
        &self,
        ctx: &ExecutionContext,
        operation: F,
    ) -> Result<T, ExecutionError<E>>
    where
        F: FnOnce(&ExecutionContext) -> Result<T, E>,
    {
        self.inner.execute(ctx, operation)
    }

    /// Erase the result type, keeping the same provider and engine.
    pub fn into_untyped(self) -> AnyCachePolicy {
        self.inner
    }
}

impl<T: CacheableValue> Clone for CachePolicy<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _result: PhantomData,
        }
    }
}

/// Cache-aside policy whose result type is chosen at each call site.
///
/// Holds exactly the same bindings as [`CachePolicy<T>`] and delegates to
/// the same engine; the serde payload boundary does the type conversion,
/// so no decision logic is duplicated. One `AnyCachePolicy` can serve
/// calls of different result types; entries only interoperate insofar as
/// their JSON payloads do.
#[derive(Clone)]
pub struct AnyCachePolicy {
    provider: Arc<dyn CacheProvider>,
    engine: CacheEngine,
}

impl AnyCachePolicy {
    /// Start building a policy.
    pub fn builder() -> CachePolicyBuilder {
        CachePolicyBuilder::new()
    }

    /// Execute the governed operation through the cache, with the result
    /// type picked by the call site.
    pub fn execute<T, E, F>(
        &self,
        ctx: &ExecutionContext,
        operation: F,
    ) -> Result<T, ExecutionError<E>>
    where
        T: CacheableValue,
        F: FnOnce(&ExecutionContext) -> Result<T, E>,
    {
        self.engine
            .run_blocking(self.provider.as_ref(), ctx, operation)
    }

    /// Pin the result type, keeping the same provider and engine.
    pub fn typed<T: CacheableValue>(self) -> CachePolicy<T> {
        CachePolicy {
            inner: self,
            _result: PhantomData,
        }
    }
}
