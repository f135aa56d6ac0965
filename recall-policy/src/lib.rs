//! Recall Policy - Cache-Aside Execution Policy
//!
//! Wraps an arbitrary computation (the governed operation) with
//! cache-aside semantics: consult a provider for a previously computed
//! result keyed by the execution context, and on miss run the operation,
//! store its result, and return it.
//!
//! The cache layer is strictly additive. Removing a policy never changes
//! whether a call succeeds or what value/error it produces, only whether
//! the computation is skipped by reuse of a prior result. Provider
//! failures degrade to misses or skipped writes; strategy failures degrade
//! to the bypass key or to no expiration; the governed operation's own
//! failures pass through verbatim.
//!
//! # Components
//!
//! - [`provider`]: the `get`/`put` SPI in blocking and suspendable
//!   variants, an in-memory implementation, and the blocking-to-
//!   suspendable bridge
//! - [`strategy`]: key and TTL derivation seams with explicit defaults
//! - [`hooks`]: fire-and-forget instrumentation callbacks
//! - [`engine`]: the shared decision tree
//! - [`policy`] / [`async_policy`]: the public execute-with-caching
//!   surfaces, typed and untyped
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use recall_policy::{
//!     CachePolicy, CachePolicyBuilder, ExecutionContext, ExecutionKeyStrategy, InMemoryProvider,
//! };
//!
//! let policy: CachePolicy<u64> = CachePolicyBuilder::new()
//!     .provider(Arc::new(InMemoryProvider::new()))
//!     .key_strategy(Arc::new(ExecutionKeyStrategy))
//!     .build()
//!     .unwrap();
//!
//! let ctx = ExecutionContext::new("fib:30");
//! let value = policy.execute(&ctx, |_| Ok::<_, String>(832_040)).unwrap();
//! assert_eq!(value, 832_040);
//! ```

pub mod async_policy;
pub mod engine;
pub mod hooks;
pub mod policy;
pub mod provider;
pub mod strategy;

pub use async_policy::{AnyAsyncCachePolicy, AsyncCachePolicy, AsyncCachePolicyBuilder};
pub use engine::CacheEngine;
pub use hooks::CacheHooks;
pub use policy::{AnyCachePolicy, CachePolicy, CachePolicyBuilder};
pub use provider::{
    AsyncCacheProvider, BlockingBridge, CacheProvider, CacheableValue, InMemoryProvider,
};
pub use strategy::{CacheKeyStrategy, ExecutionKeyStrategy, FixedTtl, NoExpiration, TtlStrategy};

// Re-export core types for convenience
pub use recall_core::{
    CacheKey, CacheOutcome, CachedItem, ConfigError, ExecutionContext, ExecutionError,
    ProviderError, RecallError, RecallResult, StrategyError, Ttl,
};
