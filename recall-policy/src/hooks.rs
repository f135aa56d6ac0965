//! Instrumentation hooks for cache events.
//!
//! Hooks are fire-and-forget observers of one execution: hit, miss,
//! successful write, and the two non-fatal error channels. Each hook is
//! invoked at most once per call, and all of them are isolated from the
//! return path: a hook receives references and returns nothing, so it
//! cannot alter the value or error the caller sees.

use recall_core::{ExecutionContext, RecallError};
use std::fmt;
use std::sync::Arc;

/// Observer of a non-error cache event, receiving the execution context.
pub type ContextHook = Arc<dyn Fn(&ExecutionContext) + Send + Sync>;

/// Observer of a non-fatal cache error, receiving the context and detail.
pub type ErrorHook = Arc<dyn Fn(&ExecutionContext, &RecallError) + Send + Sync>;

/// Optional instrumentation callbacks for a policy.
///
/// All hooks default to no-ops. Compose with the `with_*` methods:
///
/// ```
/// use recall_policy::hooks::CacheHooks;
///
/// let hooks = CacheHooks::new()
///     .with_on_get(|ctx| tracing::info!(correlation_id = %ctx.correlation_id(), "cache hit"))
///     .with_on_put_error(|_ctx, err| tracing::warn!(error = %err, "cache write failed"));
/// ```
#[derive(Clone, Default)]
pub struct CacheHooks {
    on_get: Option<ContextHook>,
    on_miss: Option<ContextHook>,
    on_put: Option<ContextHook>,
    on_get_error: Option<ErrorHook>,
    on_put_error: Option<ErrorHook>,
}

impl CacheHooks {
    /// All-no-op hooks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe cache hits (the governed operation was skipped).
    pub fn with_on_get(mut self, hook: impl Fn(&ExecutionContext) + Send + Sync + 'static) -> Self {
        self.on_get = Some(Arc::new(hook));
        self
    }

    /// Observe cache misses (the governed operation ran).
    pub fn with_on_miss(
        mut self,
        hook: impl Fn(&ExecutionContext) + Send + Sync + 'static,
    ) -> Self {
        self.on_miss = Some(Arc::new(hook));
        self
    }

    /// Observe successful write-backs.
    pub fn with_on_put(mut self, hook: impl Fn(&ExecutionContext) + Send + Sync + 'static) -> Self {
        self.on_put = Some(Arc::new(hook));
        self
    }

    /// Observe read-side failures: provider read errors, undecodable
    /// payloads, and key-derivation errors.
    pub fn with_on_get_error(
        mut self,
        hook: impl Fn(&ExecutionContext, &RecallError) + Send + Sync + 'static,
    ) -> Self {
        self.on_get_error = Some(Arc::new(hook));
        self
    }

    /// Observe write-side failures: provider write errors, unencodable
    /// results, and TTL-derivation errors.
    pub fn with_on_put_error(
        mut self,
        hook: impl Fn(&ExecutionContext, &RecallError) + Send + Sync + 'static,
    ) -> Self {
        self.on_put_error = Some(Arc::new(hook));
        self
    }

    pub(crate) fn notify_get(&self, ctx: &ExecutionContext) {
        if let Some(hook) = &self.on_get {
            hook(ctx);
        }
    }

    pub(crate) fn notify_miss(&self, ctx: &ExecutionContext) {
        if let Some(hook) = &self.on_miss {
            hook(ctx);
        }
    }

    pub(crate) fn notify_put(&self, ctx: &ExecutionContext) {
        if let Some(hook) = &self.on_put {
            hook(ctx);
        }
    }

    pub(crate) fn notify_get_error(&self, ctx: &ExecutionContext, error: &RecallError) {
        if let Some(hook) = &self.on_get_error {
            hook(ctx, error);
        }
    }

    pub(crate) fn notify_put_error(&self, ctx: &ExecutionContext, error: &RecallError) {
        if let Some(hook) = &self.on_put_error {
            hook(ctx, error);
        }
    }
}

impl fmt::Debug for CacheHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheHooks")
            .field("on_get", &self.on_get.is_some())
            .field("on_miss", &self.on_miss.is_some())
            .field("on_put", &self.on_put.is_some())
            .field("on_get_error", &self.on_get_error.is_some())
            .field("on_put_error", &self.on_put_error.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_core::ProviderError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_default_hooks_are_silent_noops() {
        let hooks = CacheHooks::new();
        let ctx = ExecutionContext::new("k");
        let err = RecallError::Provider(ProviderError::Read {
            key: "k".to_string(),
            reason: "down".to_string(),
        });
        hooks.notify_get(&ctx);
        hooks.notify_miss(&ctx);
        hooks.notify_put(&ctx);
        hooks.notify_get_error(&ctx, &err);
        hooks.notify_put_error(&ctx, &err);
    }

    #[test]
    fn test_hooks_fire_with_context() {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_seen = Arc::clone(&hits);
        let hooks = CacheHooks::new().with_on_get(move |ctx| {
            assert_eq!(ctx.execution_key(), Some("user:42"));
            hits_seen.fetch_add(1, Ordering::SeqCst);
        });

        let ctx = ExecutionContext::new("user:42");
        hooks.notify_get(&ctx);
        hooks.notify_get(&ctx);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_error_hooks_receive_detail() {
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_in_hook = Arc::clone(&seen);
        let hooks = CacheHooks::new().with_on_put_error(move |_ctx, err| {
            assert!(matches!(err, RecallError::Provider(ProviderError::Write { .. })));
            seen_in_hook.fetch_add(1, Ordering::SeqCst);
        });

        let ctx = ExecutionContext::new("k");
        let err = RecallError::Provider(ProviderError::Write {
            key: "k".to_string(),
            reason: "full".to_string(),
        });
        hooks.notify_put_error(&ctx, &err);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_debug_shows_which_hooks_are_set() {
        let hooks = CacheHooks::new().with_on_miss(|_| {});
        let repr = format!("{:?}", hooks);
        assert!(repr.contains("on_miss: true"));
        assert!(repr.contains("on_get: false"));
    }
}
