//! Strategy selection and the engine's single entry point

use crate::audit::AuditLogger;
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::{CacheError, Result};
use crate::provider::CacheProvider;
use crate::strategy::{
    fetcher, CacheStrategy, EmergencyCacheStrategy, Fetcher, PhiCacheStrategy,
    StandardCacheStrategy, StrategyContext, SwrCacheStrategy,
};
use crate::types::{revalidation_lock_key, CacheOperationOptions, CacheStats};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

/// Ordered list of strategies; the first whose predicate matches wins
///
/// The manager holds no caching logic of its own. Build it with
/// [`CacheStrategyManager::with_defaults`] for the standard composition
/// (emergency, PHI, SWR, standard) or pass any list to
/// [`CacheStrategyManager::new`].
pub struct CacheStrategyManager {
    strategies: Vec<Arc<dyn CacheStrategy>>,
    context: StrategyContext,
}

impl CacheStrategyManager {
    /// Manager over an explicit, already ordered strategy list
    pub fn new(context: StrategyContext, strategies: Vec<Arc<dyn CacheStrategy>>) -> Self {
        Self {
            strategies,
            context,
        }
    }

    /// Default composition on the system clock
    pub fn with_defaults(
        provider: Arc<dyn CacheProvider>,
        audit: Arc<dyn AuditLogger>,
        config: EngineConfig,
    ) -> Result<Self> {
        Self::with_clock(provider, audit, config, Arc::new(SystemClock))
    }

    /// Default composition on a caller-supplied clock
    pub fn with_clock(
        provider: Arc<dyn CacheProvider>,
        audit: Arc<dyn AuditLogger>,
        config: EngineConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let context = StrategyContext::new(provider, clock, config);

        let strategies: Vec<Arc<dyn CacheStrategy>> = vec![
            Arc::new(EmergencyCacheStrategy::new(context.clone())),
            Arc::new(PhiCacheStrategy::new(context.clone(), audit)),
            Arc::new(SwrCacheStrategy::new(context.clone())),
            Arc::new(StandardCacheStrategy::new(context.clone())),
        ];

        info!(
            "Initializing cache strategy manager with {} strategies",
            strategies.len()
        );
        Ok(Self::new(context, strategies))
    }

    /// First strategy claiming `options`, else the last one in the list
    pub fn get_strategy(&self, options: &CacheOperationOptions) -> Result<Arc<dyn CacheStrategy>> {
        self.strategies
            .iter()
            .find(|strategy| strategy.should_use(options))
            .or_else(|| self.strategies.last())
            .cloned()
            .ok_or(CacheError::NoStrategyAvailable)
    }

    /// Typed entry point: serve `key` through the selected strategy
    pub async fn execute<T, F, Fut>(
        &self,
        key: &str,
        fetch: F,
        options: &CacheOperationOptions,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let value = self.execute_value(key, fetcher(fetch), options).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Untyped entry point working on JSON values
    pub async fn execute_value(
        &self,
        key: &str,
        fetch: Fetcher,
        options: &CacheOperationOptions,
    ) -> Result<Value> {
        let strategy = self.get_strategy(options)?;
        debug!("Dispatching {} to {} strategy", key, strategy.name());
        strategy.execute(key, fetch, options).await
    }

    /// Drop a cached entry and any revalidation lock it holds
    pub async fn invalidate(&self, key: &str) -> Result<()> {
        self.context.provider.del(key).await?;
        self.context.provider.del(&revalidation_lock_key(key)).await?;
        debug!("Invalidated cache entry: {}", key);
        Ok(())
    }

    /// Names of the strategies in priority order
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn stats(&self) -> CacheStats {
        self.context.stats()
    }

    pub fn context(&self) -> &StrategyContext {
        &self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::TracingAuditLogger;
    use crate::clock::ManualClock;
    use crate::provider::InMemoryCacheProvider;
    use crate::types::ComplianceLevel;
    use async_trait::async_trait;
    use std::time::Duration;

    struct FixedStrategy {
        name: &'static str,
        claims: bool,
    }

    #[async_trait]
    impl CacheStrategy for FixedStrategy {
        fn name(&self) -> &'static str {
            self.name
        }

        fn should_use(&self, _options: &CacheOperationOptions) -> bool {
            self.claims
        }

        async fn execute(
            &self,
            _key: &str,
            _fetch: Fetcher,
            _options: &CacheOperationOptions,
        ) -> Result<Value> {
            Ok(Value::from(self.name))
        }
    }

    fn fixed(name: &'static str, claims: bool) -> Arc<dyn CacheStrategy> {
        Arc::new(FixedStrategy { name, claims })
    }

    fn context() -> StrategyContext {
        let clock = Arc::new(ManualClock::new(0));
        StrategyContext::new(
            Arc::new(InMemoryCacheProvider::with_clock(clock.clone())),
            clock,
            EngineConfig::testing(),
        )
    }

    fn default_manager() -> CacheStrategyManager {
        let clock = Arc::new(ManualClock::new(0));
        CacheStrategyManager::with_clock(
            Arc::new(InMemoryCacheProvider::with_clock(clock.clone())),
            Arc::new(TracingAuditLogger),
            EngineConfig::testing(),
            clock,
        )
        .unwrap()
    }

    #[test]
    fn test_default_priority_order() {
        let manager = default_manager();
        assert_eq!(
            manager.strategy_names(),
            vec!["emergency", "phi", "swr", "standard"]
        );
    }

    #[test]
    fn test_selection() {
        let manager = default_manager();
        let pick = |options: CacheOperationOptions| manager.get_strategy(&options).unwrap().name();

        assert_eq!(pick(CacheOperationOptions::default()), "standard");
        assert_eq!(pick(CacheOperationOptions::with_ttl(60)), "swr");
        assert_eq!(pick(CacheOperationOptions::no_swr(60)), "standard");
        assert_eq!(pick(CacheOperationOptions::emergency()), "emergency");
        assert_eq!(
            pick(CacheOperationOptions::phi(ComplianceLevel::Restricted).enable_swr(true)),
            "phi"
        );
        assert_eq!(
            pick(CacheOperationOptions::phi(ComplianceLevel::Standard).emergency_data(true)),
            "emergency"
        );
    }

    #[test]
    fn test_falls_back_to_last_strategy() {
        let manager = CacheStrategyManager::new(
            context(),
            vec![
                fixed("first", false),
                fixed("last", false),
            ],
        );

        let chosen = manager.get_strategy(&CacheOperationOptions::default()).unwrap();
        assert_eq!(chosen.name(), "last");
    }

    #[test]
    fn test_reordered_list_is_respected() {
        let manager = CacheStrategyManager::new(
            context(),
            vec![
                fixed("a", true),
                fixed("b", true),
            ],
        );

        assert_eq!(
            manager.get_strategy(&CacheOperationOptions::default()).unwrap().name(),
            "a"
        );
    }

    #[test]
    fn test_empty_list_is_a_configuration_error() {
        let manager = CacheStrategyManager::new(context(), Vec::new());
        assert!(matches!(
            manager.get_strategy(&CacheOperationOptions::default()),
            Err(CacheError::NoStrategyAvailable)
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig::builder()
            .lock_wait(Duration::ZERO)
            .build();
        let result = CacheStrategyManager::with_defaults(
            Arc::new(InMemoryCacheProvider::new()),
            Arc::new(TracingAuditLogger),
            config,
        );
        assert!(matches!(result, Err(CacheError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_execute_dispatches_unchanged() {
        let manager = CacheStrategyManager::new(
            context(),
            vec![fixed("only", true)],
        );

        let value: String = manager
            .execute("k", || async { Ok("ignored".to_string()) }, &CacheOperationOptions::default())
            .await
            .unwrap();
        assert_eq!(value, "only");
    }

    #[tokio::test]
    async fn test_typed_round_trip_through_default_manager() {
        #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
        struct Slot {
            id: u32,
            label: String,
        }

        let manager = default_manager();
        let options = CacheOperationOptions::with_ttl(60);

        let slot: Slot = manager
            .execute(
                "slot:1",
                || async {
                    Ok(Slot {
                        id: 1,
                        label: "morning".to_string(),
                    })
                },
                &options,
            )
            .await
            .unwrap();
        assert_eq!(slot.label, "morning");

        let again: Slot = manager
            .execute(
                "slot:1",
                || async { Err(CacheError::FetchError("must not be called".to_string())) },
                &options,
            )
            .await
            .unwrap();
        assert_eq!(again, slot);
    }

    #[tokio::test]
    async fn test_invalidate_removes_entry_and_lock() {
        let manager = default_manager();
        let provider = manager.context().provider.clone();

        provider
            .set("k", "\"v\"".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        provider
            .set("k:revalidating", "true".to_string(), Duration::from_secs(30))
            .await
            .unwrap();

        manager.invalidate("k").await.unwrap();

        assert!(!provider.exists("k").await.unwrap());
        assert!(!provider.exists("k:revalidating").await.unwrap());
    }
}
