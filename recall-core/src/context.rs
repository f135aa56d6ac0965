//! Execution context carried through one governed call.
//!
//! The context is owned by the caller for the duration of a single
//! execution and passed by reference into the policy. The engine and the
//! strategies only ever read it; nothing in the cache layer mutates a
//! context after construction.

use serde_json::Value;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Caller-supplied context for one policy execution.
///
/// Carries the optional execution key (the identifier key strategies
/// derive cache keys from), a correlation id for log stitching, an
/// ambient map of correlation data readable by strategies and hooks, and
/// an optional cancellation token governing the whole call.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    execution_key: Option<String>,
    correlation_id: Uuid,
    values: HashMap<String, Value>,
    cancellation: Option<CancellationToken>,
}

impl ExecutionContext {
    /// Create a context carrying the given execution key.
    pub fn new(execution_key: impl Into<String>) -> Self {
        Self {
            execution_key: Some(execution_key.into()),
            correlation_id: crate::new_correlation_id(),
            values: HashMap::new(),
            cancellation: None,
        }
    }

    /// Create a context with no execution key.
    ///
    /// Under the default key strategy such a context derives the bypass
    /// key, so the call runs uncached.
    pub fn anonymous() -> Self {
        Self {
            execution_key: None,
            correlation_id: crate::new_correlation_id(),
            values: HashMap::new(),
            cancellation: None,
        }
    }

    /// Attach an ambient value readable by strategies and hooks.
    pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    /// Attach a cancellation token governing the whole call.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// The execution key, if one was supplied.
    pub fn execution_key(&self) -> Option<&str> {
        self.execution_key.as_deref()
    }

    /// Correlation id for this context, a UUIDv7 minted at construction.
    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    /// Look up an ambient value by key.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// All ambient values.
    pub fn values(&self) -> &HashMap<String, Value> {
        &self.values
    }

    /// The cancellation token, if one was attached.
    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancellation.as_ref()
    }

    /// Returns true if the call has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}
