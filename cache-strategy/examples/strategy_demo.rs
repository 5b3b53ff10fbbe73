//! Cache Strategy Demo Application
//!
//! Runs each caching policy against the in-memory provider and prints what
//! the engine did.
//!
//! Usage:
//!   cargo run --example strategy_demo
//!
//! Environment variables:
//!   RUST_LOG               - log filter (default: info,cache_audit=info)
//!   CACHE_LOCK_WAIT_MS     - wait on a held revalidation lock (default: 100)
//!   CACHE_EMERGENCY_TTL_SECS - expiry of emergency writes (default: 60)

use cache_strategy::{
    start_auto_cleanup, CacheError, CacheOperationOptions, CacheStrategyManager, ComplianceLevel,
    EngineConfig, InMemoryCacheProvider, TracingAuditLogger,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,cache_audit=info")),
        )
        .init();

    info!("=== Cache Strategy Demo ===");

    let config = EngineConfig::from_env()?;
    info!("Engine configuration: {:?}", config);

    let provider = Arc::new(InMemoryCacheProvider::new().with_max_entries(1_000));
    tokio::spawn(start_auto_cleanup(provider.clone(), Duration::from_secs(30)));
    let manager =
        CacheStrategyManager::with_defaults(provider.clone(), Arc::new(TracingAuditLogger), config)?;
    info!("Strategies in priority order: {:?}", manager.strategy_names());

    let upstream_calls = Arc::new(AtomicUsize::new(0));
    let load_schedule = {
        let calls = upstream_calls.clone();
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Ok::<_, CacheError>(format!("schedule v{}", n)) }
        }
    };

    info!("\n--- Stale-While-Revalidate ---");
    let options = CacheOperationOptions::with_ttl(4).stale_time(1);
    for step in 0..4 {
        let value: String = manager
            .execute("schedule:clinic-7", load_schedule.clone(), &options)
            .await?;
        info!(
            "Read {}: {} (upstream calls so far: {})",
            step,
            value,
            upstream_calls.load(Ordering::SeqCst)
        );
        tokio::time::sleep(Duration::from_millis(1_500)).await;
    }

    info!("\n--- PHI ---");
    let options = CacheOperationOptions::phi(ComplianceLevel::Restricted);
    for _ in 0..2 {
        let chart: String = manager
            .execute(
                "patient:42:chart",
                || async { Ok("allergies: penicillin".to_string()) },
                &options,
            )
            .await?;
        info!("Chart: {}", chart);
    }

    info!("\n--- Emergency ---");
    let reading: u32 = manager
        .execute(
            "icu:bed-3:heart-rate",
            || async { Ok(72u32) },
            &CacheOperationOptions::emergency(),
        )
        .await?;
    info!("Heart rate: {} bpm (always live)", reading);

    info!("\n--- Standard ---");
    let value: String = manager
        .execute(
            "formulary:version",
            || async { Ok("2026.10".to_string()) },
            &CacheOperationOptions::default(),
        )
        .await?;
    info!("Formulary version: {}", value);

    // Let background refreshes settle before reporting
    tokio::time::sleep(Duration::from_millis(200)).await;

    info!("\n--- Statistics ---");
    info!("{}", manager.stats());
    info!("Entries held by provider: {}", provider.len().await);

    manager.invalidate("schedule:clinic-7").await?;
    info!("Invalidated schedule:clinic-7");

    info!("\n=== Demo Complete ===");
    Ok(())
}
