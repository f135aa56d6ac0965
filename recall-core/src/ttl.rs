//! Time-to-live requested for freshly written cache entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Requested lifetime for a freshly written cache entry.
///
/// Computed per write by a TTL strategy and handed to the provider; the
/// engine never persists or re-reads it. How (and whether) expiration is
/// enforced is entirely the provider's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Ttl {
    /// Never expires; retention is left to the provider.
    #[default]
    Persistent,
    /// Expires after a fixed duration from the time of the write.
    Duration(Duration),
    /// Expires at an absolute instant.
    Until(DateTime<Utc>),
}

impl Ttl {
    /// Resolve this TTL to an absolute expiration instant, given the write time.
    ///
    /// Returns `None` for [`Ttl::Persistent`], and also for durations too
    /// large to represent as an instant (which never expire in practice).
    pub fn expires_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Persistent => None,
            Self::Duration(d) => chrono::Duration::from_std(*d)
                .ok()
                .and_then(|d| now.checked_add_signed(d)),
            Self::Until(instant) => Some(*instant),
        }
    }

    /// Returns true if entries written with this TTL never expire.
    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::Persistent)
    }
}
