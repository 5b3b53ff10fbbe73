//! Plain cache-aside, the terminal fallback policy

use crate::error::Result;
use crate::strategy::{CacheStrategy, Fetcher, StrategyContext};
use crate::types::CacheOperationOptions;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Cache-aside with no staleness window and no background work
///
/// Values are stored raw (no envelope). Provider and fetch failures both
/// propagate; nothing is cached when the fetch fails.
pub struct StandardCacheStrategy {
    ctx: StrategyContext,
}

impl StandardCacheStrategy {
    pub fn new(ctx: StrategyContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl CacheStrategy for StandardCacheStrategy {
    fn name(&self) -> &'static str {
        "standard"
    }

    fn should_use(&self, _options: &CacheOperationOptions) -> bool {
        true
    }

    async fn execute(
        &self,
        key: &str,
        fetch: Fetcher,
        options: &CacheOperationOptions,
    ) -> Result<Value> {
        if let Some(raw) = self.ctx.provider.get(key).await? {
            match serde_json::from_str::<Value>(&raw) {
                Ok(value) => {
                    debug!("Cache hit: {}", key);
                    self.ctx.stats.record_hit();
                    return Ok(value);
                }
                Err(e) => warn!("Undecodable cached value at {}, refetching: {}", key, e),
            }
        }

        debug!("Cache miss: {}", key);
        self.ctx.stats.record_miss();

        let ttl = options.ttl_or(self.ctx.config.default_ttl.as_secs());
        let value = fetch().await?;
        let raw = serde_json::to_string(&value)?;
        self.ctx
            .provider
            .set(key, raw, Duration::from_secs(ttl))
            .await?;
        Ok(value)
    }
}
