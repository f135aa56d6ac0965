//! The cache-aside decision tree.
//!
//! One engine drives both execution modes. The decision steps (key
//! derivation, lookup classification, write-back planning and settlement)
//! are shared functions over already-resolved values; the blocking and
//! suspendable drivers differ only in where they suspend. This keeps a
//! single copy of the state machine instead of one per mode.
//!
//! The error-isolation boundary lives here: provider and strategy failures
//! are logged, reported through hooks, and degraded (to a miss, to a
//! skipped write, to the bypass key, to no expiration); they never change
//! what the caller gets back from the governed operation.

use recall_core::{
    CacheKey, CacheOutcome, CachedItem, ExecutionContext, ExecutionError, ProviderError,
    RecallError, Ttl,
};
use std::future::Future;
use std::sync::Arc;

use crate::hooks::CacheHooks;
use crate::provider::{AsyncCacheProvider, CacheProvider, CacheableValue};
use crate::strategy::{CacheKeyStrategy, TtlStrategy};

/// Orchestrates one governed call: derive key, look up, branch on
/// hit/miss, execute on miss, write back, return.
///
/// The engine holds the strategy and hook bindings; the provider is passed
/// in per call by the owning policy, which is what pins a policy to one
/// provider variant while the decision logic stays shared.
#[derive(Clone)]
pub struct CacheEngine {
    key_strategy: Arc<dyn CacheKeyStrategy>,
    ttl_strategy: Arc<dyn TtlStrategy>,
    hooks: CacheHooks,
}

/// What the write-back step should do for a successfully computed value.
enum WritePlan {
    /// Nothing to write; any necessary notification already happened.
    Skip,
    /// Store this item. `notified` records whether the put-error hook has
    /// already fired for this call (TTL-strategy failure), so a subsequent
    /// put failure does not fire it twice.
    Store {
        item: CachedItem,
        ttl: Ttl,
        notified: bool,
    },
}

impl CacheEngine {
    /// Bind strategies and hooks into an engine.
    pub fn new(
        key_strategy: Arc<dyn CacheKeyStrategy>,
        ttl_strategy: Arc<dyn TtlStrategy>,
        hooks: CacheHooks,
    ) -> Self {
        Self {
            key_strategy,
            ttl_strategy,
            hooks,
        }
    }

    /// Run one governed call against a blocking provider.
    pub fn run_blocking<T, E, F>(
        &self,
        provider: &dyn CacheProvider,
        ctx: &ExecutionContext,
        operation: F,
    ) -> Result<T, ExecutionError<E>>
    where
        T: CacheableValue,
        F: FnOnce(&ExecutionContext) -> Result<T, E>,
    {
        if ctx.is_cancelled() {
            return Err(ExecutionError::Cancelled);
        }
        let Some(key) = self.derive_key(ctx) else {
            // Pass-through: no lookup, no write, no hit/miss signal.
            return operation(ctx).map_err(ExecutionError::Operation);
        };
        if let Some(value) = self.classify_lookup(ctx, &key, provider.get(&key)) {
            return Ok(value);
        }
        if ctx.is_cancelled() {
            return Err(ExecutionError::Cancelled);
        }
        let value = operation(ctx).map_err(ExecutionError::Operation)?;
        if ctx.is_cancelled() {
            return Err(ExecutionError::Cancelled);
        }
        if let WritePlan::Store {
            item,
            ttl,
            notified,
        } = self.plan_write(ctx, &key, &value)
        {
            self.settle_write(ctx, &key, notified, provider.put(&key, item, ttl));
        }
        Ok(value)
    }

    /// Run one governed call against a suspendable provider.
    ///
    /// Every awaited step races the context's cancellation token; a
    /// cancellation aborts the remaining steps and surfaces as
    /// [`ExecutionError::Cancelled`], never as a cache error.
    pub async fn run_suspendable<'a, T, E, F, Fut>(
        &self,
        provider: &dyn AsyncCacheProvider,
        ctx: &'a ExecutionContext,
        operation: F,
    ) -> Result<T, ExecutionError<E>>
    where
        T: CacheableValue,
        F: FnOnce(&'a ExecutionContext) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if ctx.is_cancelled() {
            return Err(ExecutionError::Cancelled);
        }
        let Some(key) = self.derive_key(ctx) else {
            return match with_cancellation(ctx, operation(ctx)).await {
                Some(result) => result.map_err(ExecutionError::Operation),
                None => Err(ExecutionError::Cancelled),
            };
        };
        let fetched = match with_cancellation(ctx, provider.get(&key)).await {
            Some(fetched) => fetched,
            None => return Err(ExecutionError::Cancelled),
        };
        if let Some(value) = self.classify_lookup(ctx, &key, fetched) {
            return Ok(value);
        }
        let value = match with_cancellation(ctx, operation(ctx)).await {
            Some(result) => result.map_err(ExecutionError::Operation)?,
            None => return Err(ExecutionError::Cancelled),
        };
        if let WritePlan::Store {
            item,
            ttl,
            notified,
        } = self.plan_write(ctx, &key, &value)
        {
            match with_cancellation(ctx, provider.put(&key, item, ttl)).await {
                Some(outcome) => self.settle_write(ctx, &key, notified, outcome),
                None => return Err(ExecutionError::Cancelled),
            }
        }
        Ok(value)
    }

    /// Step 1: derive the cache key, or `None` to skip caching entirely.
    ///
    /// A strategy failure is contained here: it reads as the bypass key
    /// with a notification through the read-side error hook.
    fn derive_key(&self, ctx: &ExecutionContext) -> Option<CacheKey> {
        match self.key_strategy.derive(ctx) {
            Ok(key) if key.is_bypass() => {
                tracing::debug!(
                    correlation_id = %ctx.correlation_id(),
                    "bypass key derived; executing without cache"
                );
                None
            }
            Ok(key) => Some(key),
            Err(error) => {
                tracing::warn!(
                    correlation_id = %ctx.correlation_id(),
                    error = %error,
                    "key derivation failed; executing without cache"
                );
                self.hooks.notify_get_error(ctx, &RecallError::Strategy(error));
                None
            }
        }
    }

    /// Steps 2–3 classification: turn the lookup result into a usable hit
    /// value, or `None` meaning "proceed as a miss".
    ///
    /// A read failure and an undecodable payload both degrade to a miss;
    /// a broken cache must never prevent a successful execution.
    fn classify_lookup<T: CacheableValue>(
        &self,
        ctx: &ExecutionContext,
        key: &CacheKey,
        fetched: Result<Option<CachedItem>, ProviderError>,
    ) -> Option<T> {
        match fetched {
            Err(error) => {
                tracing::warn!(
                    cache_key = %key,
                    correlation_id = %ctx.correlation_id(),
                    error = %error,
                    outcome = %CacheOutcome::Unavailable,
                    "cache read failed; executing without cache"
                );
                self.hooks.notify_get_error(ctx, &RecallError::Provider(error));
                None
            }
            Ok(Some(item)) => match serde_json::from_value(item.into_payload()) {
                Ok(value) => {
                    tracing::debug!(
                        cache_key = %key,
                        correlation_id = %ctx.correlation_id(),
                        outcome = %CacheOutcome::Hit,
                        "returning cached result"
                    );
                    self.hooks.notify_get(ctx);
                    Some(value)
                }
                Err(decode) => {
                    let error = ProviderError::Decode {
                        key: key.to_string(),
                        reason: decode.to_string(),
                    };
                    tracing::warn!(
                        cache_key = %key,
                        correlation_id = %ctx.correlation_id(),
                        error = %error,
                        "cached payload undecodable; executing without cache"
                    );
                    self.hooks.notify_get_error(ctx, &RecallError::Provider(error));
                    None
                }
            },
            Ok(None) => {
                tracing::debug!(
                    cache_key = %key,
                    correlation_id = %ctx.correlation_id(),
                    outcome = %CacheOutcome::Miss,
                    "cache miss; executing"
                );
                self.hooks.notify_miss(ctx);
                None
            }
        }
    }

    /// Step 4 planning: derive the TTL and encode the value.
    ///
    /// A TTL-strategy failure degrades to no expiration; an encoding
    /// failure skips the write. Both notify the write-side error hook at
    /// most once for the call.
    fn plan_write<T: CacheableValue>(
        &self,
        ctx: &ExecutionContext,
        key: &CacheKey,
        value: &T,
    ) -> WritePlan {
        let (ttl, notified) = match self.ttl_strategy.derive_ttl(ctx) {
            Ok(ttl) => (ttl, false),
            Err(error) => {
                tracing::warn!(
                    cache_key = %key,
                    correlation_id = %ctx.correlation_id(),
                    error = %error,
                    "TTL derivation failed; storing without expiration"
                );
                self.hooks.notify_put_error(ctx, &RecallError::Strategy(error));
                (Ttl::Persistent, true)
            }
        };
        match serde_json::to_value(value) {
            Ok(payload) => WritePlan::Store {
                item: CachedItem::new(payload),
                ttl,
                notified,
            },
            Err(encode) => {
                let error = ProviderError::Encode {
                    key: key.to_string(),
                    reason: encode.to_string(),
                };
                tracing::warn!(
                    cache_key = %key,
                    correlation_id = %ctx.correlation_id(),
                    error = %error,
                    "result not encodable; skipping cache write"
                );
                if !notified {
                    self.hooks.notify_put_error(ctx, &RecallError::Provider(error));
                }
                WritePlan::Skip
            }
        }
    }

    /// Step 4 settlement: report the write outcome. A failed write is
    /// observable but non-fatal; the operation's result is returned either
    /// way.
    fn settle_write(
        &self,
        ctx: &ExecutionContext,
        key: &CacheKey,
        notified: bool,
        outcome: Result<(), ProviderError>,
    ) {
        match outcome {
            Ok(()) => {
                tracing::debug!(
                    cache_key = %key,
                    correlation_id = %ctx.correlation_id(),
                    "result stored in cache"
                );
                self.hooks.notify_put(ctx);
            }
            Err(error) => {
                tracing::warn!(
                    cache_key = %key,
                    correlation_id = %ctx.correlation_id(),
                    error = %error,
                    "cache write failed; returning result anyway"
                );
                if !notified {
                    self.hooks.notify_put_error(ctx, &RecallError::Provider(error));
                }
            }
        }
    }
}

/// Await `fut`, racing it against the context's cancellation token.
///
/// Returns `None` if the call was cancelled first. Without a token the
/// future is awaited directly.
async fn with_cancellation<R>(
    ctx: &ExecutionContext,
    fut: impl Future<Output = R>,
) -> Option<R> {
    match ctx.cancellation() {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => None,
            output = fut => Some(output),
        },
        None => Some(fut.await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::InMemoryProvider;
    use crate::strategy::{ExecutionKeyStrategy, NoExpiration};
    use recall_core::StrategyError;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn engine_with_hooks(hooks: CacheHooks) -> CacheEngine {
        CacheEngine::new(Arc::new(ExecutionKeyStrategy), Arc::new(NoExpiration), hooks)
    }

    fn engine() -> CacheEngine {
        engine_with_hooks(CacheHooks::new())
    }

    /// Provider whose reads and writes always fail.
    struct BrokenProvider;

    impl CacheProvider for BrokenProvider {
        fn get(&self, key: &CacheKey) -> Result<Option<CachedItem>, ProviderError> {
            Err(ProviderError::Read {
                key: key.to_string(),
                reason: "backend down".to_string(),
            })
        }

        fn put(&self, key: &CacheKey, _item: CachedItem, _ttl: Ttl) -> Result<(), ProviderError> {
            Err(ProviderError::Write {
                key: key.to_string(),
                reason: "backend down".to_string(),
            })
        }
    }

    #[test]
    fn test_miss_executes_and_stores() {
        let provider = InMemoryProvider::new();
        let ctx = ExecutionContext::new("user:42");
        let calls = AtomicUsize::new(0);

        let result: Result<i64, ExecutionError<String>> =
            engine().run_blocking(&provider, &ctx, |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(17)
            });

        assert_eq!(result.unwrap(), 17);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stored = CacheProvider::get(&provider, &CacheKey::new("user:42"))
            .unwrap()
            .unwrap();
        assert_eq!(stored.payload(), &json!(17));
    }

    #[test]
    fn test_hit_skips_execution() {
        let provider = InMemoryProvider::new();
        CacheProvider::put(
            &provider,
            &CacheKey::new("user:42"),
            CachedItem::new(json!(17)),
            Ttl::Persistent,
        )
        .unwrap();

        let ctx = ExecutionContext::new("user:42");
        let result: Result<i64, ExecutionError<String>> =
            engine().run_blocking(&provider, &ctx, |_| {
                panic!("operation must not run on a hit")
            });

        assert_eq!(result.unwrap(), 17);
    }

    #[test]
    fn test_bypass_key_is_pass_through() {
        let provider = InMemoryProvider::new();
        let ctx = ExecutionContext::anonymous();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let result: Result<i64, ExecutionError<String>> =
                engine().run_blocking(&provider, &ctx, |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(5)
                });
            assert_eq!(result.unwrap(), 5);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(provider.is_empty(), "pass-through must never write");
    }

    #[test]
    fn test_operation_failure_propagates_and_skips_write() {
        let provider = InMemoryProvider::new();
        let ctx = ExecutionContext::new("user:42");

        let result: Result<i64, ExecutionError<String>> =
            engine().run_blocking(&provider, &ctx, |_| Err("boom".to_string()));

        assert_eq!(result, Err(ExecutionError::Operation("boom".to_string())));
        assert!(provider.is_empty(), "failed execution must never write");
    }

    #[test]
    fn test_broken_provider_still_returns_result() {
        let ctx = ExecutionContext::new("user:42");
        let result: Result<i64, ExecutionError<String>> =
            engine().run_blocking(&BrokenProvider, &ctx, |_| Ok(17));
        assert_eq!(result.unwrap(), 17);
    }

    #[test]
    fn test_key_strategy_error_degrades_to_pass_through() {
        struct FailingKeys;
        impl CacheKeyStrategy for FailingKeys {
            fn derive(&self, _: &ExecutionContext) -> Result<CacheKey, StrategyError> {
                Err(StrategyError::KeyDerivation {
                    reason: "no usable key".to_string(),
                })
            }
        }

        let errors = Arc::new(AtomicUsize::new(0));
        let errors_seen = Arc::clone(&errors);
        let hooks = CacheHooks::new().with_on_get_error(move |_, err| {
            assert!(matches!(err, RecallError::Strategy(_)));
            errors_seen.fetch_add(1, Ordering::SeqCst);
        });
        let engine = CacheEngine::new(Arc::new(FailingKeys), Arc::new(NoExpiration), hooks);

        let provider = InMemoryProvider::new();
        let ctx = ExecutionContext::new("user:42");
        let result: Result<i64, ExecutionError<String>> =
            engine.run_blocking(&provider, &ctx, |_| Ok(9));

        assert_eq!(result.unwrap(), 9);
        assert!(provider.is_empty());
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_ttl_strategy_error_stores_persistent_and_notifies_once() {
        struct FailingTtl;
        impl TtlStrategy for FailingTtl {
            fn derive_ttl(&self, _: &ExecutionContext) -> Result<Ttl, StrategyError> {
                Err(StrategyError::TtlDerivation {
                    reason: "clock skew".to_string(),
                })
            }
        }

        let put_errors = Arc::new(AtomicUsize::new(0));
        let put_errors_seen = Arc::clone(&put_errors);
        let hooks = CacheHooks::new().with_on_put_error(move |_, _| {
            put_errors_seen.fetch_add(1, Ordering::SeqCst);
        });
        let engine =
            CacheEngine::new(Arc::new(ExecutionKeyStrategy), Arc::new(FailingTtl), hooks);

        let provider = InMemoryProvider::new();
        let ctx = ExecutionContext::new("user:42");
        let result: Result<i64, ExecutionError<String>> =
            engine.run_blocking(&provider, &ctx, |_| Ok(17));

        assert_eq!(result.unwrap(), 17);
        // Stored anyway, without expiration.
        assert!(CacheProvider::get(&provider, &CacheKey::new("user:42"))
            .unwrap()
            .is_some());
        assert_eq!(put_errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_ttl_error_then_put_failure_notifies_once() {
        struct FailingTtl;
        impl TtlStrategy for FailingTtl {
            fn derive_ttl(&self, _: &ExecutionContext) -> Result<Ttl, StrategyError> {
                Err(StrategyError::TtlDerivation {
                    reason: "clock skew".to_string(),
                })
            }
        }

        let put_errors = Arc::new(AtomicUsize::new(0));
        let put_errors_seen = Arc::clone(&put_errors);
        let hooks = CacheHooks::new().with_on_put_error(move |_, _| {
            put_errors_seen.fetch_add(1, Ordering::SeqCst);
        });
        let engine =
            CacheEngine::new(Arc::new(ExecutionKeyStrategy), Arc::new(FailingTtl), hooks);

        let ctx = ExecutionContext::new("user:42");
        let result: Result<i64, ExecutionError<String>> =
            engine.run_blocking(&BrokenProvider, &ctx, |_| Ok(17));

        assert_eq!(result.unwrap(), 17);
        assert_eq!(
            put_errors.load(Ordering::SeqCst),
            1,
            "put-error hook must fire at most once per call"
        );
    }

    #[test]
    fn test_undecodable_payload_degrades_to_miss() {
        let provider = InMemoryProvider::new();
        // A string payload where the caller expects an integer.
        CacheProvider::put(
            &provider,
            &CacheKey::new("user:42"),
            CachedItem::new(json!("not a number")),
            Ttl::Persistent,
        )
        .unwrap();

        let get_errors = Arc::new(AtomicUsize::new(0));
        let get_errors_seen = Arc::clone(&get_errors);
        let hooks = CacheHooks::new().with_on_get_error(move |_, err| {
            assert!(matches!(
                err,
                RecallError::Provider(ProviderError::Decode { .. })
            ));
            get_errors_seen.fetch_add(1, Ordering::SeqCst);
        });

        let ctx = ExecutionContext::new("user:42");
        let calls = AtomicUsize::new(0);
        let result: Result<i64, ExecutionError<String>> =
            engine_with_hooks(hooks).run_blocking(&provider, &ctx, |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(17)
            });

        assert_eq!(result.unwrap(), 17);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(get_errors.load(Ordering::SeqCst), 1);
        // The recomputed value replaced the bad payload.
        let stored = CacheProvider::get(&provider, &CacheKey::new("user:42"))
            .unwrap()
            .unwrap();
        assert_eq!(stored.payload(), &json!(17));
    }

    #[test]
    fn test_pre_cancelled_context_short_circuits() {
        let token = tokio_util::sync::CancellationToken::new();
        token.cancel();
        let ctx = ExecutionContext::new("user:42").with_cancellation(token);

        let provider = InMemoryProvider::new();
        let result: Result<i64, ExecutionError<String>> =
            engine().run_blocking(&provider, &ctx, |_| {
                panic!("operation must not run after cancellation")
            });

        assert_eq!(result, Err(ExecutionError::Cancelled));
    }

    #[tokio::test]
    async fn test_suspendable_miss_then_hit() {
        let provider = InMemoryProvider::new();
        let engine = engine();
        let ctx = ExecutionContext::new("user:42");

        let first: Result<i64, ExecutionError<String>> = engine
            .run_suspendable(&provider, &ctx, |_| async { Ok(17) })
            .await;
        assert_eq!(first.unwrap(), 17);

        let second: Result<i64, ExecutionError<String>> = engine
            .run_suspendable(&provider, &ctx, |_| async {
                panic!("operation must not run on a hit")
            })
            .await;
        assert_eq!(second.unwrap(), 17);
    }

    #[tokio::test]
    async fn test_suspendable_cancellation_during_execution() {
        let token = tokio_util::sync::CancellationToken::new();
        let ctx = ExecutionContext::new("user:42").with_cancellation(token.clone());
        let provider = InMemoryProvider::new();

        let engine = engine();
        let pending = engine.run_suspendable(&provider, &ctx, |_| async {
            // Never completes; cancellation must win the race.
            std::future::pending::<Result<i64, String>>().await
        });
        token.cancel();

        assert_eq!(pending.await, Err(ExecutionError::Cancelled));
        assert!(provider.is_empty(), "cancelled execution must not write");
    }
}
