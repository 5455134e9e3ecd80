use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

use crate::core::connection::SolConnection;
use crate::core::constants::INVALIDATION_CHANNEL_CAPACITY;
use crate::error::{classify_boxed, Result};
use crate::types::{BalanceKey, Lamports, SlotBalance};

/// Last known balance for a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedBalance {
    pub lamports: Option<Lamports>,
    pub slot: u64,

    /// Marked for mandatory re-fetch on next read
    pub stale: bool,
}

/// Shared balance cache keyed by (address, chain).
///
/// Entries are never mutated in place: every write swaps in a new value, so
/// readers holding an older snapshot are unaffected by a concurrent
/// invalidation. Invalidations are also broadcast so that live balance
/// subscriptions for the key can re-fetch.
#[derive(Clone)]
pub struct BalanceCache {
    entries: Arc<RwLock<HashMap<BalanceKey, Arc<CachedBalance>>>>,
    invalidations: broadcast::Sender<BalanceKey>,
}

impl Default for BalanceCache {
    fn default() -> Self {
        Self::new()
    }
}

impl BalanceCache {
    pub fn new() -> Self {
        let (invalidations, _) = broadcast::channel(INVALIDATION_CHANNEL_CAPACITY);
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            invalidations,
        }
    }

    pub fn get(&self, key: &BalanceKey) -> Option<Arc<CachedBalance>> {
        self.entries.read().get(key).cloned()
    }

    /// Record an observed balance. Observations older than a fresh entry are ignored.
    pub fn store(&self, key: BalanceKey, observed: SlotBalance) {
        let mut entries = self.entries.write();
        if let Some(current) = entries.get(&key) {
            if !current.stale && observed.slot < current.slot {
                return;
            }
        }
        entries.insert(
            key,
            Arc::new(CachedBalance {
                lamports: observed.lamports,
                slot: observed.slot,
                stale: false,
            }),
        );
    }

    /// Mark the entry for `key` stale and notify live subscribers.
    ///
    /// Keys that were never cached are still announced, since a subscriber
    /// may be waiting on its first value.
    pub fn invalidate(&self, key: BalanceKey) {
        {
            let mut entries = self.entries.write();
            if let Some(current) = entries.get(&key).cloned() {
                entries.insert(
                    key,
                    Arc::new(CachedBalance {
                        stale: true,
                        ..*current
                    }),
                );
            }
        }
        debug!(%key, "balance invalidated");
        // No receivers just means nobody is watching this cache right now.
        let _ = self.invalidations.send(key);
    }

    /// Forget the entry for `key`. Called when nothing watches it any more.
    pub fn evict(&self, key: &BalanceKey) {
        if self.entries.write().remove(key).is_some() {
            debug!(%key, "balance evicted");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Notifications for every invalidated key
    pub fn subscribe_invalidations(&self) -> broadcast::Receiver<BalanceKey> {
        self.invalidations.subscribe()
    }

    /// Read a balance, fetching it when missing or stale.
    pub async fn read(
        &self,
        key: BalanceKey,
        connection: &dyn SolConnection,
    ) -> Result<Option<Lamports>> {
        if let Some(entry) = self.get(&key) {
            if !entry.stale {
                return Ok(entry.lamports);
            }
        }

        let observed = connection
            .get_balance(&key.address)
            .await
            .map_err(classify_boxed)?;
        self.store(key, observed);
        Ok(observed.lamports)
    }
}

/// Cache-layer seam used after a successful transfer
pub trait CacheInvalidator: Send + Sync {
    fn invalidate(&self, key: BalanceKey);
}

impl CacheInvalidator for BalanceCache {
    fn invalidate(&self, key: BalanceKey) {
        BalanceCache::invalidate(self, key)
    }
}
