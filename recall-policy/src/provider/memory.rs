//! In-memory cache provider.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use recall_core::{CacheKey, CachedItem, ProviderError, Ttl};
use std::collections::HashMap;
use std::sync::RwLock;

use super::{AsyncCacheProvider, CacheProvider};

/// One stored entry: the item plus its resolved expiration instant.
#[derive(Debug, Clone)]
struct StoredEntry {
    item: CachedItem,
    expires_at: Option<DateTime<Utc>>,
}

impl StoredEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

/// Process-local cache provider backed by a `RwLock<HashMap>`.
///
/// Implements both provider variants; the suspendable methods complete
/// immediately. Expiration is enforced lazily: an expired entry reads as
/// absent and is pruned on the next write-path access to its key.
///
/// # Null policy
///
/// A stored JSON `null` payload is a legitimately cached value and reads
/// as present. "Not found" means exclusively that no entry exists under
/// the key (or that the entry has expired).
///
/// # Concurrency
///
/// Writes racing on the same key are not serialized against the
/// miss-execute-write sequence: last write wins, which is safe because
/// entries are idempotent overwrites of the same logical value.
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    entries: RwLock<HashMap<String, StoredEntry>>,
}

impl InMemoryProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let now = Utc::now();
        match self.entries.read() {
            Ok(entries) => entries.values().filter(|e| !e.is_expired(now)).count(),
            Err(_) => 0,
        }
    }

    /// Returns true if the provider holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove a single entry. Returns true if an entry was present.
    pub fn remove(&self, key: &CacheKey) -> bool {
        self.entries
            .write()
            .map(|mut entries| entries.remove(key.as_str()).is_some())
            .unwrap_or(false)
    }

    /// Drop every entry.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }
}

impl CacheProvider for InMemoryProvider {
    fn get(&self, key: &CacheKey) -> Result<Option<CachedItem>, ProviderError> {
        let now = Utc::now();
        let expired = {
            let entries = self.entries.read().map_err(|_| ProviderError::Read {
                key: key.to_string(),
                reason: "cache lock poisoned".to_string(),
            })?;
            match entries.get(key.as_str()) {
                Some(entry) if entry.is_expired(now) => true,
                Some(entry) => return Ok(Some(entry.item.clone())),
                None => return Ok(None),
            }
        };
        // Prune the expired entry unless a racing write already replaced it.
        if expired {
            if let Ok(mut entries) = self.entries.write() {
                if entries
                    .get(key.as_str())
                    .is_some_and(|entry| entry.is_expired(now))
                {
                    entries.remove(key.as_str());
                }
            }
        }
        Ok(None)
    }

    fn put(&self, key: &CacheKey, item: CachedItem, ttl: Ttl) -> Result<(), ProviderError> {
        let expires_at = ttl.expires_at(Utc::now());
        let mut entries = self.entries.write().map_err(|_| ProviderError::Write {
            key: key.to_string(),
            reason: "cache lock poisoned".to_string(),
        })?;
        entries.insert(key.as_str().to_string(), StoredEntry { item, expires_at });
        Ok(())
    }
}

#[async_trait]
impl AsyncCacheProvider for InMemoryProvider {
    async fn get(&self, key: &CacheKey) -> Result<Option<CachedItem>, ProviderError> {
        CacheProvider::get(self, key)
    }

    async fn put(&self, key: &CacheKey, item: CachedItem, ttl: Ttl) -> Result<(), ProviderError> {
        CacheProvider::put(self, key, item, ttl)
    }
}
