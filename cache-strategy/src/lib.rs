//! # Cache Strategy Engine (cache-strategy)
//!
//! Policy-driven caching for a healthcare backend. Each read names a key, a
//! producer for the authoritative value, and a set of options; the engine
//! picks one policy and serves the value through a pluggable key-value
//! provider.
//!
//! ## Features
//!
//! - Four policies, selected in priority order: emergency, PHI, SWR, standard
//! - Stale-while-revalidate with an advisory per-key revalidation lock
//! - Compliance-tiered expiry and access auditing for PHI payloads
//! - Async-first design using tokio
//! - In-memory provider with TTL expiry and optional LRU bound
//! - Environment-driven configuration
//!
//! ## Policies
//!
//! ### Stale-While-Revalidate
//! Serves fresh entries directly, stale entries immediately with a background
//! refresh, and fetches inline once the TTL has passed.
//!
//! ```no_run
//! use cache_strategy::{
//!     CacheOperationOptions, CacheStrategyManager, EngineConfig, InMemoryCacheProvider,
//!     TracingAuditLogger,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> cache_strategy::Result<()> {
//!     let manager = CacheStrategyManager::with_defaults(
//!         Arc::new(InMemoryCacheProvider::new()),
//!         Arc::new(TracingAuditLogger),
//!         EngineConfig::from_env()?,
//!     )?;
//!
//!     let options = CacheOperationOptions::with_ttl(100).stale_time(10);
//!     let schedule: Vec<String> = manager
//!         .execute(
//!             "schedule:clinic-7",
//!             || async { Ok(vec!["09:00".to_string(), "09:30".to_string()]) },
//!             &options,
//!         )
//!         .await?;
//!     println!("Open slots: {:?}", schedule);
//!     Ok(())
//! }
//! ```
//!
//! ### Protected Health Information
//! Expiry comes from the compliance tier and every access is audited.
//!
//! ```no_run
//! use cache_strategy::{
//!     CacheOperationOptions, CacheStrategyManager, ComplianceLevel, EngineConfig,
//!     InMemoryCacheProvider, TracingAuditLogger,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> cache_strategy::Result<()> {
//!     let manager = CacheStrategyManager::with_defaults(
//!         Arc::new(InMemoryCacheProvider::new()),
//!         Arc::new(TracingAuditLogger),
//!         EngineConfig::default(),
//!     )?;
//!
//!     let options = CacheOperationOptions::phi(ComplianceLevel::Restricted);
//!     let chart: String = manager
//!         .execute("patient:42:chart", || async { Ok("...".to_string()) }, &options)
//!         .await?;
//!     println!("{}", chart);
//!     Ok(())
//! }
//! ```
//!
//! ### Emergency Data
//! Always fetched inline; never served from the cache.
//!
//! ```no_run
//! # use cache_strategy::*;
//! # use std::sync::Arc;
//! # async fn run(manager: CacheStrategyManager) -> Result<()> {
//! let vitals: u32 = manager
//!     .execute("icu:bed-3:heart-rate", || async { Ok(72) }, &CacheOperationOptions::emergency())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod audit;
pub mod clock;
pub mod config;
pub mod error;
pub mod manager;
pub mod provider;
pub mod strategy;
pub mod types;

// Re-export main types for convenience
pub use audit::{AuditEventType, AuditLevel, AuditLogger, AuditRecord, TracingAuditLogger};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{EngineConfig, EngineConfigBuilder};
pub use error::{CacheError, Result};
pub use manager::CacheStrategyManager;
pub use provider::{start_auto_cleanup, CacheProvider, InMemoryCacheProvider};
pub use strategy::{
    fetcher, CacheStrategy, EmergencyCacheStrategy, Fetcher, PhiCacheStrategy,
    StandardCacheStrategy, StrategyContext, SwrCacheStrategy,
};
pub use types::{
    revalidation_lock_key, CacheKey, CachePriority, CacheStats, CacheValue, CachedEnvelope,
    CacheOperationOptions, ComplianceLevel, REVALIDATION_LOCK_SUFFIX,
};
