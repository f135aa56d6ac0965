//! Per-call cache outcome signal.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What the cache contributed to one execution.
///
/// Produced once per governed call for observability (hooks, tracing
/// fields) and discarded when the call returns. A bypassed call (one whose
/// derived key was the sentinel) produces no outcome at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CacheOutcome {
    /// The provider held a usable value; the operation was skipped.
    Hit,
    /// The provider held nothing; the operation ran.
    Miss,
    /// The provider failed on read; the operation ran as on a miss.
    Unavailable,
}

impl CacheOutcome {
    /// Returns true for [`CacheOutcome::Hit`].
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit)
    }

    /// Returns true whenever the governed operation ran.
    pub fn executed(&self) -> bool {
        !self.is_hit()
    }

    /// Stable lowercase name, suitable for log fields and metrics labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Miss => "miss",
            Self::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for CacheOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
