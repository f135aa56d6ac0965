//! Key and TTL derivation strategies.
//!
//! Strategies are the pure seams between the caller's context and the
//! engine: one derives the cache key for a call, the other the lifetime of
//! a freshly written entry. Both must be side-effect-free, since the engine
//! may call them speculatively, and both are injected at construction time as
//! explicit values; there are no hidden default singletons.

use recall_core::{CacheKey, ExecutionContext, StrategyError, Ttl};
use std::time::Duration;

/// Derives the cache key for one execution.
///
/// The contract is a total function over well-formed contexts: return the
/// bypass key rather than failing when a context carries nothing usable.
/// The fallible signature exists so that the engine can contain a
/// misbehaving implementation: an `Err` is treated exactly like the
/// bypass key, with a hook notification. Determinism (same context
/// content, same key) is this trait's contract, not enforced by the
/// engine.
///
/// Closures `Fn(&ExecutionContext) -> CacheKey` implement this trait.
pub trait CacheKeyStrategy: Send + Sync {
    /// Derive the key for this call.
    fn derive(&self, ctx: &ExecutionContext) -> Result<CacheKey, StrategyError>;
}

impl<F> CacheKeyStrategy for F
where
    F: Fn(&ExecutionContext) -> CacheKey + Send + Sync,
{
    fn derive(&self, ctx: &ExecutionContext) -> Result<CacheKey, StrategyError> {
        Ok(self(ctx))
    }
}

/// Derives the requested TTL for a freshly written entry.
///
/// Called only after a miss and a successful execution. An `Err` is
/// treated as [`Ttl::Persistent`] with a hook notification; it never
/// aborts the already-successful operation result.
///
/// Closures `Fn(&ExecutionContext) -> Ttl` implement this trait.
pub trait TtlStrategy: Send + Sync {
    /// Derive the TTL for this write.
    fn derive_ttl(&self, ctx: &ExecutionContext) -> Result<Ttl, StrategyError>;
}

impl<F> TtlStrategy for F
where
    F: Fn(&ExecutionContext) -> Ttl + Send + Sync,
{
    fn derive_ttl(&self, ctx: &ExecutionContext) -> Result<Ttl, StrategyError> {
        Ok(self(ctx))
    }
}

/// Default key strategy: the context's execution key, verbatim.
///
/// A context without an execution key derives the bypass key, which is the
/// documented escape hatch for callers that do not want caching on a given
/// call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionKeyStrategy;

impl CacheKeyStrategy for ExecutionKeyStrategy {
    fn derive(&self, ctx: &ExecutionContext) -> Result<CacheKey, StrategyError> {
        Ok(match ctx.execution_key() {
            Some(key) => CacheKey::new(key),
            None => CacheKey::bypass(),
        })
    }
}

/// Default TTL strategy: no expiration, retention left to the provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExpiration;

impl TtlStrategy for NoExpiration {
    fn derive_ttl(&self, _ctx: &ExecutionContext) -> Result<Ttl, StrategyError> {
        Ok(Ttl::Persistent)
    }
}

/// TTL strategy requesting the same relative lifetime for every write.
#[derive(Debug, Clone, Copy)]
pub struct FixedTtl(pub Duration);

impl TtlStrategy for FixedTtl {
    fn derive_ttl(&self, _ctx: &ExecutionContext) -> Result<Ttl, StrategyError> {
        Ok(Ttl::Duration(self.0))
    }
}
