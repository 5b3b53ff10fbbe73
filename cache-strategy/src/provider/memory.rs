//! In-process cache provider with TTL expiry and LRU eviction

use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::provider::CacheProvider;
use crate::types::{CacheKey, CacheValue};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// In-memory [`CacheProvider`]
///
/// This implementation provides:
/// - Async access via RwLock; unbounded reads share the read lock
/// - Per-entry expiry measured against an injectable clock
/// - Optional LRU eviction once `max_entries` is reached, O(log n) per access
pub struct InMemoryCacheProvider {
    store: Arc<RwLock<MemoryStore>>,
    clock: Arc<dyn Clock>,
    max_entries: Option<usize>,
}

struct StoredValue {
    value: CacheValue,
    expires_at_millis: i64,

    /// Recency tick, 0 while the store is unbounded
    last_used: u64,
}

impl StoredValue {
    fn is_expired(&self, now_millis: i64) -> bool {
        now_millis > self.expires_at_millis
    }
}

/// Internal storage
#[derive(Default)]
struct MemoryStore {
    entries: HashMap<CacheKey, StoredValue>,

    /// LRU index by recency tick: first entry is least recently used
    recency: BTreeMap<u64, CacheKey>,
    tick: u64,
}

impl MemoryStore {
    fn touch(&mut self, key: &str) {
        self.tick += 1;
        let tick = self.tick;
        if let Some(entry) = self.entries.get_mut(key) {
            self.recency.remove(&entry.last_used);
            entry.last_used = tick;
            self.recency.insert(tick, key.to_string());
        }
    }

    fn insert_entry(&mut self, key: &str, entry: StoredValue) {
        if let Some(previous) = self.entries.insert(key.to_string(), entry) {
            self.recency.remove(&previous.last_used);
        }
    }

    fn remove_entry(&mut self, key: &str) -> Option<StoredValue> {
        let removed = self.entries.remove(key);
        if let Some(entry) = &removed {
            self.recency.remove(&entry.last_used);
        }
        removed
    }

    fn evict_lru(&mut self) -> Option<CacheKey> {
        let (_, victim) = self.recency.pop_first()?;
        self.entries.remove(&victim);
        Some(victim)
    }
}

impl InMemoryCacheProvider {
    /// Unbounded provider on the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Unbounded provider on a caller-supplied clock
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        info!("Initializing in-memory cache provider");
        Self {
            store: Arc::new(RwLock::new(MemoryStore::default())),
            clock,
            max_entries: None,
        }
    }

    /// Cap the number of live entries; the least recently used is evicted first
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries.max(1));
        self
    }

    /// Number of stored entries, including ones that expired but weren't swept yet
    pub async fn len(&self) -> usize {
        self.store.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.entries.is_empty()
    }

    /// Remove every entry
    pub async fn clear(&self) {
        let mut store = self.store.write().await;
        let count = store.entries.len();
        store.entries.clear();
        store.recency.clear();
        info!("Cleared {} entries from in-memory provider", count);
    }

    /// Sweep expired entries, returning the removed keys
    pub async fn cleanup_expired(&self) -> Vec<CacheKey> {
        let now = self.clock.now_millis();
        let mut store = self.store.write().await;

        let expired: Vec<CacheKey> = store
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            store.remove_entry(key);
        }

        if !expired.is_empty() {
            debug!("Cleaned up {} expired entries", expired.len());
        }
        expired
    }

    fn expires_at(&self, ttl: Duration) -> i64 {
        self.clock
            .now_millis()
            .saturating_add(ttl.as_millis().min(i64::MAX as u128) as i64)
    }
}

impl Default for InMemoryCacheProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheProvider for InMemoryCacheProvider {
    async fn get(&self, key: &str) -> Result<Option<CacheValue>> {
        let now = self.clock.now_millis();

        {
            let store = self.store.read().await;
            match store.entries.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired(now) && self.max_entries.is_none() => {
                    return Ok(Some(entry.value.clone()));
                }
                Some(_) => {}
            }
        }

        // Expired entry to drop, or recency to update: re-check under the write lock
        let mut store = self.store.write().await;

        let expired = match store.entries.get(key) {
            Some(entry) => entry.is_expired(now),
            None => return Ok(None),
        };

        if expired {
            debug!("Provider entry expired: {}", key);
            store.remove_entry(key);
            return Ok(None);
        }

        if self.max_entries.is_some() {
            store.touch(key);
        }
        Ok(store.entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: CacheValue, ttl: Duration) -> Result<()> {
        let entry = StoredValue {
            value,
            expires_at_millis: self.expires_at(ttl),
            last_used: 0,
        };

        let mut store = self.store.write().await;

        if let Some(max) = self.max_entries {
            if !store.entries.contains_key(key) {
                while store.entries.len() >= max {
                    match store.evict_lru() {
                        Some(victim) => {
                            debug!("Evicting entry due to max_entries limit: {}", victim);
                        }
                        None => {
                            warn!("LRU index empty while over max_entries");
                            break;
                        }
                    }
                }
            }
        }

        store.insert_entry(key, entry);
        if self.max_entries.is_some() {
            store.touch(key);
        }
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        let mut store = self.store.write().await;
        if store.remove_entry(key).is_some() {
            debug!("Removed provider entry: {}", key);
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let now = self.clock.now_millis();
        let store = self.store.read().await;
        Ok(store
            .entries
            .get(key)
            .map(|entry| !entry.is_expired(now))
            .unwrap_or(false))
    }
}

/// Background task for periodic sweeping of expired entries
pub async fn start_auto_cleanup(provider: Arc<InMemoryCacheProvider>, interval: Duration) {
    info!(
        "Starting automatic provider cleanup task (interval: {:?})",
        interval
    );

    loop {
        tokio::time::sleep(interval).await;

        let removed = provider.cleanup_expired().await;
        if !removed.is_empty() {
            debug!("Auto cleanup removed {} entries", removed.len());
        }
    }
}
