//! Caching policies
//!
//! Each policy is an independent implementation of [`CacheStrategy`]; the
//! [`CacheStrategyManager`](crate::manager::CacheStrategyManager) picks one
//! per operation. The shared plumbing (envelope I/O, background refresh)
//! lives on [`StrategyContext`].

pub mod emergency;
pub mod phi;
pub mod standard;
pub mod swr;

pub use emergency::EmergencyCacheStrategy;
pub use phi::PhiCacheStrategy;
pub use standard::StandardCacheStrategy;
pub use swr::SwrCacheStrategy;

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::provider::CacheProvider;
use crate::types::{
    revalidation_lock_key, CacheOperationOptions, CacheStats, CachedEnvelope, StatsRecorder,
};
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Type-erased value producer
///
/// Must be callable more than once: a strategy may hand it to a background
/// revalidation after the caller has already been answered.
pub type Fetcher = Arc<dyn Fn() -> BoxFuture<'static, Result<Value>> + Send + Sync>;

/// Erase a typed async producer into a [`Fetcher`]
pub fn fetcher<T, F, Fut>(fetch: F) -> Fetcher
where
    T: Serialize + Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    Arc::new(move || {
        let pending = fetch();
        async move {
            let value = pending.await?;
            Ok(serde_json::to_value(value)?)
        }
        .boxed()
    })
}

/// A named caching policy
#[async_trait]
pub trait CacheStrategy: Send + Sync {
    /// Stable name, used in logs
    fn name(&self) -> &'static str;

    /// Whether this policy claims the operation
    fn should_use(&self, options: &CacheOperationOptions) -> bool;

    /// Produce the value for `key`, reading and writing through the provider
    async fn execute(
        &self,
        key: &str,
        fetch: Fetcher,
        options: &CacheOperationOptions,
    ) -> Result<Value>;
}

/// Collaborators shared by every strategy of one engine
#[derive(Clone)]
pub struct StrategyContext {
    pub provider: Arc<dyn CacheProvider>,
    pub clock: Arc<dyn Clock>,
    pub config: EngineConfig,
    pub stats: Arc<StatsRecorder>,
}

impl StrategyContext {
    pub fn new(
        provider: Arc<dyn CacheProvider>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        Self {
            provider,
            clock,
            config,
            stats: Arc::new(StatsRecorder::default()),
        }
    }

    /// Snapshot of the counters fed by all strategies on this context
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    /// Read an envelope; provider or decoding failures count as a miss
    pub(crate) async fn read_envelope(&self, key: &str) -> Option<CachedEnvelope<Value>> {
        let raw = match self.provider.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Cache read failed for {}, treating as miss: {}", key, e);
                return None;
            }
        };

        match serde_json::from_str::<CachedEnvelope<Value>>(&raw) {
            Ok(envelope) => Some(envelope),
            Err(e) => {
                warn!("Undecodable cache envelope at {}, treating as miss: {}", key, e);
                None
            }
        }
    }

    /// Whether a revalidation lock is held; provider failures read as unlocked
    pub(crate) async fn lock_held(&self, key: &str) -> bool {
        let lock_key = revalidation_lock_key(key);
        match self.provider.exists(&lock_key).await {
            Ok(held) => held,
            Err(e) => {
                warn!("Lock check failed for {}: {}", lock_key, e);
                false
            }
        }
    }

    /// Wrap `data` in a fresh envelope and write it
    pub(crate) async fn store_envelope(&self, key: &str, data: &Value, ttl: Duration) -> Result<()> {
        let envelope = CachedEnvelope::new(data, self.clock.now_millis());
        let raw = serde_json::to_string(&envelope)?;
        self.provider.set(key, raw, ttl).await
    }

    /// Foreground fetch-and-cache; every failure reaches the caller
    pub(crate) async fn fetch_and_store(
        &self,
        key: &str,
        fetch: &Fetcher,
        ttl: Duration,
    ) -> Result<Value> {
        let value = fetch().await?;
        self.store_envelope(key, &value, ttl).await?;
        Ok(value)
    }

    /// Claim `<key>:revalidating` ahead of a background refresh
    ///
    /// Written before the refresh task is spawned so that the next read of the
    /// same key sees it even if the task has not been polled yet. A failed
    /// write is logged; the refresh still goes ahead.
    pub(crate) async fn hold_revalidation_lock(&self, key: &str) {
        let lock_key = revalidation_lock_key(key);
        if let Err(e) = self
            .provider
            .set(
                &lock_key,
                "true".to_string(),
                self.config.revalidation_lock_ttl,
            )
            .await
        {
            warn!("Failed to set revalidation lock {}: {}", lock_key, e);
        }
    }

    /// Detach a background refresh of `key`
    ///
    /// With `locked`, the caller already holds `<key>:revalidating` (see
    /// [`StrategyContext::hold_revalidation_lock`]) and the refresh removes it
    /// afterwards on every path. Errors are logged and dropped.
    pub(crate) fn spawn_revalidation(
        &self,
        key: &str,
        fetch: Fetcher,
        ttl: Duration,
        locked: bool,
    ) -> JoinHandle<()> {
        let ctx = self.clone();
        let key = key.to_string();
        self.stats.record_revalidation();

        tokio::spawn(async move {
            let lock_key = locked.then(|| revalidation_lock_key(&key));
            let outcome = ctx.refresh(&key, &fetch, ttl).await;

            if let Some(lock_key) = &lock_key {
                if let Err(e) = ctx.provider.del(lock_key).await {
                    warn!("Failed to release revalidation lock {}: {}", lock_key, e);
                }
            }

            match outcome {
                Ok(()) => debug!("Background revalidation completed: {}", key),
                Err(e) => {
                    ctx.stats.record_revalidation_failure();
                    warn!("Background revalidation failed for {}: {}", key, e);
                }
            }
        })
    }

    async fn refresh(&self, key: &str, fetch: &Fetcher, ttl: Duration) -> Result<()> {
        let value = fetch().await?;
        self.store_envelope(key, &value, ttl).await
    }
}
