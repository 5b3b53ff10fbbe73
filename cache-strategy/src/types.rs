//! Core type definitions for the cache engine

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Cache key type
pub type CacheKey = String;

/// Raw value as stored in the provider (serialized JSON)
pub type CacheValue = String;

/// Suffix of the advisory lock entry guarding background revalidation
pub const REVALIDATION_LOCK_SUFFIX: &str = ":revalidating";

/// Key of the revalidation lock for a cache key
pub fn revalidation_lock_key(key: &str) -> CacheKey {
    format!("{}{}", key, REVALIDATION_LOCK_SUFFIX)
}

/// Relative importance of a cached value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CachePriority {
    Low,
    #[default]
    Normal,
    High,
}

/// Regulatory tier of PHI payloads, governs their expiry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplianceLevel {
    #[default]
    Standard,
    Sensitive,
    Restricted,
}

impl fmt::Display for ComplianceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComplianceLevel::Standard => write!(f, "standard"),
            ComplianceLevel::Sensitive => write!(f, "sensitive"),
            ComplianceLevel::Restricted => write!(f, "restricted"),
        }
    }
}

/// Per-call policy descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheOperationOptions {
    /// Base time-to-live; unset falls back to the engine default
    pub ttl_seconds: Option<u64>,

    /// Freshness boundary; defaults to half of the TTL
    pub stale_time_seconds: Option<u64>,

    /// Tags for bulk invalidation (carried, not acted on by the engine)
    pub tags: BTreeSet<String>,

    pub priority: CachePriority,

    /// Unset means enabled
    pub enable_swr: Option<bool>,

    /// Life-critical data that must never be served stale
    pub emergency_data: bool,

    /// Payload contains protected health information
    #[serde(rename = "containsPHI")]
    pub contains_phi: bool,

    pub compliance_level: Option<ComplianceLevel>,

    /// Opaque hint for the provider
    pub compress: bool,
}

impl Default for CacheOperationOptions {
    fn default() -> Self {
        Self {
            ttl_seconds: None,
            stale_time_seconds: None,
            tags: BTreeSet::new(),
            priority: CachePriority::Normal,
            enable_swr: None,
            emergency_data: false,
            contains_phi: false,
            compliance_level: None,
            compress: false,
        }
    }
}

impl CacheOperationOptions {
    /// Options with the given TTL and everything else defaulted
    pub fn with_ttl(ttl_seconds: u64) -> Self {
        Self {
            ttl_seconds: Some(ttl_seconds),
            ..Default::default()
        }
    }

    /// Options for PHI payloads at the given compliance tier
    pub fn phi(level: ComplianceLevel) -> Self {
        Self {
            contains_phi: true,
            compliance_level: Some(level),
            ..Default::default()
        }
    }

    /// Options for emergency-critical data
    pub fn emergency() -> Self {
        Self {
            emergency_data: true,
            ..Default::default()
        }
    }

    /// Plain cache-aside options (stale-while-revalidate disabled)
    pub fn no_swr(ttl_seconds: u64) -> Self {
        Self {
            ttl_seconds: Some(ttl_seconds),
            enable_swr: Some(false),
            ..Default::default()
        }
    }

    pub fn stale_time(mut self, seconds: u64) -> Self {
        self.stale_time_seconds = Some(seconds);
        self
    }

    pub fn ttl(mut self, seconds: u64) -> Self {
        self.ttl_seconds = Some(seconds);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn priority(mut self, priority: CachePriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn enable_swr(mut self, enable: bool) -> Self {
        self.enable_swr = Some(enable);
        self
    }

    pub fn emergency_data(mut self, emergency: bool) -> Self {
        self.emergency_data = emergency;
        self
    }

    pub fn contains_phi(mut self, phi: bool) -> Self {
        self.contains_phi = phi;
        self
    }

    pub fn compliance_level(mut self, level: ComplianceLevel) -> Self {
        self.compliance_level = Some(level);
        self
    }

    pub fn compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// TTL in seconds, or `default_secs` when the caller named none
    pub fn ttl_or(&self, default_secs: u64) -> u64 {
        self.ttl_seconds.unwrap_or(default_secs)
    }

    /// Freshness boundary in seconds for the given TTL
    pub fn stale_time_for(&self, ttl_secs: u64) -> u64 {
        self.stale_time_seconds.unwrap_or(ttl_secs / 2)
    }

    /// Whether stale-while-revalidate is allowed for this operation
    pub fn swr_enabled(&self) -> bool {
        self.enable_swr != Some(false)
    }
}

/// The unit stored by freshness-aware strategies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedEnvelope<T> {
    pub data: T,
    pub captured_at_epoch_millis: i64,
}

impl<T> CachedEnvelope<T> {
    pub fn new(data: T, captured_at_epoch_millis: i64) -> Self {
        Self {
            data,
            captured_at_epoch_millis,
        }
    }

    /// Whole seconds elapsed since capture; never negative
    pub fn age_seconds(&self, now_millis: i64) -> u64 {
        (now_millis.saturating_sub(self.captured_at_epoch_millis)).max(0) as u64 / 1000
    }
}

/// Statistics for engine behaviour monitoring
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Values served fresh from the cache
    pub hits: u64,

    /// Values served past their freshness boundary
    pub stale_hits: u64,

    /// Synchronous fetches caused by an absent or expired entry
    pub misses: u64,

    /// Times a caller waited on another caller's revalidation
    pub lock_waits: u64,

    /// Background revalidations started
    pub revalidations: u64,

    /// Background revalidations that failed and were swallowed
    pub revalidation_failures: u64,

    /// Emergency reads that bypassed the cache
    pub emergency_fetches: u64,
}

impl CacheStats {
    /// Share of reads answered from the cache, as a percentage
    pub fn hit_rate(&self) -> f64 {
        let served = self.hits + self.stale_hits;
        let total = served + self.misses;
        if total == 0 {
            0.0
        } else {
            (served as f64 / total as f64) * 100.0
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheStats {{ hits: {}, stale_hits: {}, misses: {}, hit_rate: {:.2}%, revalidations: {}, revalidation_failures: {} }}",
            self.hits,
            self.stale_hits,
            self.misses,
            self.hit_rate(),
            self.revalidations,
            self.revalidation_failures
        )
    }
}

/// Lock-free counters shared between strategies and their background tasks
#[derive(Debug, Default)]
pub struct StatsRecorder {
    hits: AtomicU64,
    stale_hits: AtomicU64,
    misses: AtomicU64,
    lock_waits: AtomicU64,
    revalidations: AtomicU64,
    revalidation_failures: AtomicU64,
    emergency_fetches: AtomicU64,
}

impl StatsRecorder {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_hit(&self) {
        self.stale_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lock_wait(&self) {
        self.lock_waits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_revalidation(&self) {
        self.revalidations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_revalidation_failure(&self) {
        self.revalidation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_emergency_fetch(&self) {
        self.emergency_fetches.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            stale_hits: self.stale_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            lock_waits: self.lock_waits.load(Ordering::Relaxed),
            revalidations: self.revalidations.load(Ordering::Relaxed),
            revalidation_failures: self.revalidation_failures.load(Ordering::Relaxed),
            emergency_fetches: self.emergency_fetches.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_key() {
        assert_eq!(revalidation_lock_key("user:42"), "user:42:revalidating");
    }

    #[test]
    fn test_stale_time_defaults_to_half_ttl() {
        let options = CacheOperationOptions::with_ttl(101);
        assert_eq!(options.stale_time_for(options.ttl_or(0)), 50);

        let options = CacheOperationOptions::with_ttl(100).stale_time(10);
        assert_eq!(options.stale_time_for(100), 10);

        assert_eq!(CacheOperationOptions::default().ttl_or(300), 300);
    }

    #[test]
    fn test_swr_enabled_by_default() {
        assert!(CacheOperationOptions::default().swr_enabled());
        assert!(CacheOperationOptions::default().enable_swr(true).swr_enabled());
        assert!(!CacheOperationOptions::no_swr(60).swr_enabled());
    }

    #[test]
    fn test_options_from_json() {
        let options: CacheOperationOptions = serde_json::from_str(
            r#"{"ttlSeconds": 120, "containsPHI": true, "complianceLevel": "restricted", "tags": ["patients"]}"#,
        )
        .unwrap();

        assert_eq!(options.ttl_seconds, Some(120));
        assert!(options.contains_phi);
        assert_eq!(options.compliance_level, Some(ComplianceLevel::Restricted));
        assert!(options.tags.contains("patients"));
        assert_eq!(options.priority, CachePriority::Normal);
        assert_eq!(options.enable_swr, None);
    }

    #[test]
    fn test_envelope_wire_shape() {
        let envelope = CachedEnvelope::new("hello", 1_700_000_000_000);
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["data"], "hello");
        assert_eq!(json["capturedAtEpochMillis"], 1_700_000_000_000i64);
    }

    #[test]
    fn test_envelope_age() {
        let envelope = CachedEnvelope::new(1u32, 10_000);
        assert_eq!(envelope.age_seconds(10_999), 0);
        assert_eq!(envelope.age_seconds(15_000), 5);
        // Clock skew never produces a negative age
        assert_eq!(envelope.age_seconds(5_000), 0);
    }

    #[test]
    fn test_stats_recorder() {
        let recorder = StatsRecorder::default();
        recorder.record_hit();
        recorder.record_hit();
        recorder.record_stale_hit();
        recorder.record_miss();
        recorder.record_revalidation();

        let stats = recorder.snapshot();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.stale_hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate(), 75.0);
        assert!(stats.to_string().contains("hits: 2"));
    }

    #[test]
    fn test_stats_zero_requests() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }
}
