//! Highest-priority policy for emergency-critical data

use crate::error::Result;
use crate::strategy::{CacheStrategy, Fetcher, StrategyContext};
use crate::types::CacheOperationOptions;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

/// Always fetches inline and never serves a cached value
///
/// The result is still written (enveloped, short TTL) so that non-emergency
/// readers of the same key benefit. A failed write is logged, not returned:
/// the caller already holds authoritative data.
pub struct EmergencyCacheStrategy {
    ctx: StrategyContext,
}

impl EmergencyCacheStrategy {
    pub fn new(ctx: StrategyContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl CacheStrategy for EmergencyCacheStrategy {
    fn name(&self) -> &'static str {
        "emergency"
    }

    fn should_use(&self, options: &CacheOperationOptions) -> bool {
        options.emergency_data
    }

    async fn execute(
        &self,
        key: &str,
        fetch: Fetcher,
        _options: &CacheOperationOptions,
    ) -> Result<Value> {
        debug!("Emergency fetch, bypassing cache: {}", key);
        self.ctx.stats.record_emergency_fetch();

        let value = fetch().await?;

        if let Err(e) = self
            .ctx
            .store_envelope(key, &value, self.ctx.config.emergency_ttl)
            .await
        {
            warn!("Failed to cache emergency value for {}: {}", key, e);
        }

        Ok(value)
    }
}
