//! Error types for Recall operations

use thiserror::Error;

/// Configuration errors raised at policy construction time.
///
/// These are fatal: a policy that fails construction never reaches
/// execute time, so a misconfigured binding cannot surface mid-call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },
}

/// Cache provider errors.
///
/// All variants are recoverable from the engine's point of view: a read
/// failure degrades to a miss, a write failure leaves the freshly computed
/// result intact.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Cache read failed for key {key}: {reason}")]
    Read { key: String, reason: String },

    #[error("Cache write failed for key {key}: {reason}")]
    Write { key: String, reason: String },

    #[error("Cached payload for key {key} could not be decoded: {reason}")]
    Decode { key: String, reason: String },

    #[error("Result for key {key} could not be encoded for caching: {reason}")]
    Encode { key: String, reason: String },
}

/// Key or TTL derivation errors.
///
/// A failing key strategy is treated as the bypass key; a failing TTL
/// strategy is treated as no expiration. Neither aborts the call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StrategyError {
    #[error("Key derivation failed: {reason}")]
    KeyDerivation { reason: String },

    #[error("TTL derivation failed: {reason}")]
    TtlDerivation { reason: String },
}

/// Master error type for all Recall errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecallError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Strategy error: {0}")]
    Strategy(#[from] StrategyError),
}

/// Result type alias for Recall operations.
pub type RecallResult<T> = Result<T, RecallError>;

/// Error returned by a policy execution.
///
/// The cache layer is strictly additive: the only errors a caller can see
/// are the governed operation's own failure, carried verbatim, or a
/// cancellation of the call. Provider and strategy failures are reported
/// through hooks and logging, never through this type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecutionError<E> {
    /// The governed operation failed; the inner error is untouched.
    #[error("Operation failed: {0}")]
    Operation(E),

    /// The call was cancelled before it completed.
    #[error("Execution cancelled")]
    Cancelled,
}

impl<E> ExecutionError<E> {
    /// Returns true if this is a cancellation outcome.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Extract the governed operation's error, if that is what this is.
    pub fn into_operation(self) -> Option<E> {
        match self {
            Self::Operation(e) => Some(e),
            Self::Cancelled => None,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
