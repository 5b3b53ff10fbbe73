//! Stale-while-revalidate policy
//!
//! An entry moves through three windows measured from its capture time:
//!
//! ```text
//!  0 ........ stale_time ........ ttl ........>
//!  |  fresh    |  stale, served    |  expired
//!  |  (serve)  |  + background     |  (fetch
//!  |           |    refresh        |   inline)
//! ```
//!
//! Background refreshes are guarded by an advisory `<key>:revalidating`
//! entry. The guard is exists-then-set, not compare-and-swap, so two callers
//! racing on the same stale entry can both refresh. At most one refresh is
//! the common case, not a guarantee.

use crate::error::Result;
use crate::strategy::{CacheStrategy, Fetcher, StrategyContext};
use crate::types::CacheOperationOptions;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub struct SwrCacheStrategy {
    ctx: StrategyContext,
}

impl SwrCacheStrategy {
    pub fn new(ctx: StrategyContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl CacheStrategy for SwrCacheStrategy {
    fn name(&self) -> &'static str {
        "swr"
    }

    /// Claims operations that name a TTL, since the freshness windows are
    /// measured against it; an empty option set falls through to cache-aside
    fn should_use(&self, options: &CacheOperationOptions) -> bool {
        options.ttl_seconds.is_some() && options.swr_enabled() && !options.emergency_data
    }

    async fn execute(
        &self,
        key: &str,
        fetch: Fetcher,
        options: &CacheOperationOptions,
    ) -> Result<Value> {
        let ttl_secs = options.ttl_or(self.ctx.config.default_ttl.as_secs());
        let ttl = Duration::from_secs(ttl_secs);
        // A stale window at or past the TTL collapses to plain cache-aside
        let fresh_secs = options.stale_time_for(ttl_secs).min(ttl_secs);

        let locked = self.ctx.lock_held(key).await;

        if let Some(envelope) = self.ctx.read_envelope(key).await {
            let age = envelope.age_seconds(self.ctx.clock.now_millis());

            if age < fresh_secs {
                debug!("Cache hit (fresh, age {}s): {}", age, key);
                self.ctx.stats.record_hit();
                return Ok(envelope.data);
            }

            if age < ttl_secs && !locked {
                debug!("Cache hit (stale, age {}s), revalidating: {}", age, key);
                self.ctx.stats.record_stale_hit();
                self.ctx.hold_revalidation_lock(key).await;
                self.ctx.spawn_revalidation(key, fetch, ttl, true);
                return Ok(envelope.data);
            }
        }

        if locked {
            debug!("Revalidation in flight for {}, waiting once", key);
            self.ctx.stats.record_lock_wait();
            tokio::time::sleep(self.ctx.config.lock_wait).await;

            if let Some(envelope) = self.ctx.read_envelope(key).await {
                if envelope.age_seconds(self.ctx.clock.now_millis()) < ttl_secs {
                    debug!("Cache hit after wait: {}", key);
                    self.ctx.stats.record_stale_hit();
                    return Ok(envelope.data);
                }
            }
        }

        debug!("Cache miss: {}", key);
        self.ctx.stats.record_miss();
        self.ctx.fetch_and_store(key, &fetch, ttl).await
    }
}
