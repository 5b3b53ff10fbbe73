//! Compliance-aware policy for payloads carrying protected health information
//!
//! Every access is audited, expiry comes from the compliance tier rather than
//! the caller, and every hit schedules a refresh regardless of the entry's
//! age. Refreshes here take no lock, so concurrent hits can overlap.

use crate::audit::{AuditEventType, AuditLevel, AuditLogger, AuditRecord};
use crate::error::Result;
use crate::strategy::{CacheStrategy, Fetcher, StrategyContext};
use crate::types::{CacheOperationOptions, ComplianceLevel};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const AUDIT_SOURCE: &str = "phi_cache";

pub struct PhiCacheStrategy {
    ctx: StrategyContext,
    audit: Arc<dyn AuditLogger>,
}

impl PhiCacheStrategy {
    pub fn new(ctx: StrategyContext, audit: Arc<dyn AuditLogger>) -> Self {
        Self { ctx, audit }
    }

    /// Expiry for a compliance tier; unset means standard
    pub fn calculate_ttl(&self, level: Option<ComplianceLevel>) -> Duration {
        match level.unwrap_or_default() {
            ComplianceLevel::Restricted => self.ctx.config.phi_restricted_ttl,
            ComplianceLevel::Sensitive => self.ctx.config.phi_sensitive_ttl,
            ComplianceLevel::Standard => self.ctx.config.phi_standard_ttl,
        }
    }

    fn audit(
        &self,
        event_type: AuditEventType,
        message: &str,
        key: &str,
        options: &CacheOperationOptions,
        ttl: Duration,
    ) {
        let record = AuditRecord::new(event_type, AuditLevel::Info, message, AUDIT_SOURCE)
            .with_metadata("key", key)
            .with_metadata(
                "complianceLevel",
                options.compliance_level.unwrap_or_default().to_string(),
            )
            .with_metadata("ttlSeconds", ttl.as_secs());

        if let Err(e) = self.audit.log(record) {
            warn!("Audit sink rejected {} for {}: {}", event_type, key, e);
        }
    }
}

#[async_trait]
impl CacheStrategy for PhiCacheStrategy {
    fn name(&self) -> &'static str {
        "phi"
    }

    fn should_use(&self, options: &CacheOperationOptions) -> bool {
        options.contains_phi
    }

    async fn execute(
        &self,
        key: &str,
        fetch: Fetcher,
        options: &CacheOperationOptions,
    ) -> Result<Value> {
        let ttl = self.calculate_ttl(options.compliance_level);

        self.audit(AuditEventType::CacheAccess, "PHI cache access", key, options, ttl);

        if let Some(envelope) = self.ctx.read_envelope(key).await {
            self.audit(AuditEventType::CacheHit, "PHI cache hit", key, options, ttl);
            debug!("PHI cache hit, revalidating: {}", key);
            self.ctx.stats.record_hit();
            self.ctx.spawn_revalidation(key, fetch, ttl, false);
            return Ok(envelope.data);
        }

        debug!("PHI cache miss: {}", key);
        self.ctx.stats.record_miss();
        let value = self.ctx.fetch_and_store(key, &fetch, ttl).await?;
        self.audit(AuditEventType::CacheMiss, "PHI cache miss", key, options, ttl);
        Ok(value)
    }
}
