//! Configuration for the cache strategy engine

use crate::error::{CacheError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Engine-wide tuning knobs
///
/// Defaults:
/// - Revalidation lock: 30 seconds, bounds how long a hung refresh can block others
/// - Lock wait: 100 ms, a single wait before a duplicate fetch
/// - PHI tiers: 15 min restricted, 30 min sensitive, 1 hour standard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// TTL of the `<key>:revalidating` lock entry
    pub revalidation_lock_ttl: Duration,

    /// How long SWR waits once for an in-flight revalidation
    pub lock_wait: Duration,

    /// TTL for values written by the emergency strategy
    pub emergency_ttl: Duration,

    /// PHI expiry for `ComplianceLevel::Restricted`
    pub phi_restricted_ttl: Duration,

    /// PHI expiry for `ComplianceLevel::Sensitive`
    pub phi_sensitive_ttl: Duration,

    /// PHI expiry for `ComplianceLevel::Standard` or unset
    pub phi_standard_ttl: Duration,

    /// TTL used when operation options don't name one
    pub default_ttl: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            revalidation_lock_ttl: Duration::from_secs(30),
            lock_wait: Duration::from_millis(100),
            // 1 minute; only non-emergency readers of the same key see these writes
            emergency_ttl: Duration::from_secs(60),
            phi_restricted_ttl: Duration::from_secs(900),
            phi_sensitive_ttl: Duration::from_secs(1800),
            phi_standard_ttl: Duration::from_secs(3600),
            default_ttl: Duration::from_secs(300),
        }
    }
}

impl EngineConfig {
    /// Create a new builder for engine configuration
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let named = [
            ("revalidation_lock_ttl", self.revalidation_lock_ttl),
            ("lock_wait", self.lock_wait),
            ("emergency_ttl", self.emergency_ttl),
            ("phi_restricted_ttl", self.phi_restricted_ttl),
            ("phi_sensitive_ttl", self.phi_sensitive_ttl),
            ("phi_standard_ttl", self.phi_standard_ttl),
            ("default_ttl", self.default_ttl),
        ];
        for (name, value) in named {
            if value.is_zero() {
                return Err(CacheError::ConfigError(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }

        if self.phi_restricted_ttl > self.phi_sensitive_ttl
            || self.phi_sensitive_ttl > self.phi_standard_ttl
        {
            return Err(CacheError::ConfigError(
                "PHI TTL tiers must satisfy restricted <= sensitive <= standard".to_string(),
            ));
        }

        Ok(())
    }

    /// Load configuration from the environment (and a `.env` file if present)
    ///
    /// Unset variables keep their defaults; unparsable ones are an error.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secs = |name: &str| -> Result<Option<Duration>> {
            parse_var::<u64>(name, lookup(name)).map(|v| v.map(Duration::from_secs))
        };

        let mut builder = EngineConfig::builder();
        if let Some(ttl) = secs("CACHE_LOCK_TTL_SECS")? {
            builder = builder.revalidation_lock_ttl(ttl);
        }
        if let Some(ms) = parse_var::<u64>("CACHE_LOCK_WAIT_MS", lookup("CACHE_LOCK_WAIT_MS"))? {
            builder = builder.lock_wait(Duration::from_millis(ms));
        }
        if let Some(ttl) = secs("CACHE_EMERGENCY_TTL_SECS")? {
            builder = builder.emergency_ttl(ttl);
        }
        if let Some(ttl) = secs("CACHE_PHI_RESTRICTED_TTL_SECS")? {
            builder = builder.phi_restricted_ttl(ttl);
        }
        if let Some(ttl) = secs("CACHE_PHI_SENSITIVE_TTL_SECS")? {
            builder = builder.phi_sensitive_ttl(ttl);
        }
        if let Some(ttl) = secs("CACHE_PHI_STANDARD_TTL_SECS")? {
            builder = builder.phi_standard_ttl(ttl);
        }
        if let Some(ttl) = secs("CACHE_DEFAULT_TTL_SECS")? {
            builder = builder.default_ttl(ttl);
        }

        let config = builder.build();
        config.validate()?;
        Ok(config)
    }
}

fn parse_var<T: FromStr>(name: &str, raw: Option<String>) -> Result<Option<T>> {
    match raw {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            CacheError::ConfigError(format!("{} has invalid value '{}'", name, raw))
        }),
    }
}

/// Builder for engine configuration
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    revalidation_lock_ttl: Option<Duration>,
    lock_wait: Option<Duration>,
    emergency_ttl: Option<Duration>,
    phi_restricted_ttl: Option<Duration>,
    phi_sensitive_ttl: Option<Duration>,
    phi_standard_ttl: Option<Duration>,
    default_ttl: Option<Duration>,
}

impl EngineConfigBuilder {
    /// Set the revalidation lock TTL
    pub fn revalidation_lock_ttl(mut self, ttl: Duration) -> Self {
        self.revalidation_lock_ttl = Some(ttl);
        self
    }

    /// Set the single wait applied when a revalidation is in flight
    pub fn lock_wait(mut self, wait: Duration) -> Self {
        self.lock_wait = Some(wait);
        self
    }

    /// Set the emergency write TTL
    pub fn emergency_ttl(mut self, ttl: Duration) -> Self {
        self.emergency_ttl = Some(ttl);
        self
    }

    pub fn phi_restricted_ttl(mut self, ttl: Duration) -> Self {
        self.phi_restricted_ttl = Some(ttl);
        self
    }

    pub fn phi_sensitive_ttl(mut self, ttl: Duration) -> Self {
        self.phi_sensitive_ttl = Some(ttl);
        self
    }

    pub fn phi_standard_ttl(mut self, ttl: Duration) -> Self {
        self.phi_standard_ttl = Some(ttl);
        self
    }

    /// Set the TTL used when operation options name none
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Build the engine configuration
    pub fn build(self) -> EngineConfig {
        let defaults = EngineConfig::default();

        EngineConfig {
            revalidation_lock_ttl: self
                .revalidation_lock_ttl
                .unwrap_or(defaults.revalidation_lock_ttl),
            lock_wait: self.lock_wait.unwrap_or(defaults.lock_wait),
            emergency_ttl: self.emergency_ttl.unwrap_or(defaults.emergency_ttl),
            phi_restricted_ttl: self
                .phi_restricted_ttl
                .unwrap_or(defaults.phi_restricted_ttl),
            phi_sensitive_ttl: self
                .phi_sensitive_ttl
                .unwrap_or(defaults.phi_sensitive_ttl),
            phi_standard_ttl: self.phi_standard_ttl.unwrap_or(defaults.phi_standard_ttl),
            default_ttl: self.default_ttl.unwrap_or(defaults.default_ttl),
        }
    }
}

/// Preset configurations
impl EngineConfig {
    /// Tighter expiry for deployments under stricter retention rules
    pub fn strict_compliance() -> Self {
        Self {
            emergency_ttl: Duration::from_secs(30),
            phi_restricted_ttl: Duration::from_secs(450),
            phi_sensitive_ttl: Duration::from_secs(900),
            phi_standard_ttl: Duration::from_secs(1800),
            ..Default::default()
        }
    }

    /// Short waits for test suites
    pub fn testing() -> Self {
        Self {
            lock_wait: Duration::from_millis(20),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.revalidation_lock_ttl, Duration::from_secs(30));
        assert_eq!(config.lock_wait, Duration::from_millis(100));
        assert_eq!(config.phi_restricted_ttl, Duration::from_secs(900));
        assert_eq!(config.phi_sensitive_ttl, Duration::from_secs(1800));
        assert_eq!(config.phi_standard_ttl, Duration::from_secs(3600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut invalid = EngineConfig::default();
        invalid.lock_wait = Duration::ZERO;
        assert!(invalid.validate().is_err());

        let mut invalid = EngineConfig::default();
        invalid.phi_restricted_ttl = Duration::from_secs(7200);
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = EngineConfig::builder()
            .lock_wait(Duration::from_millis(250))
            .emergency_ttl(Duration::from_secs(10))
            .build();

        assert_eq!(config.lock_wait, Duration::from_millis(250));
        assert_eq!(config.emergency_ttl, Duration::from_secs(10));
        assert_eq!(config.revalidation_lock_ttl, Duration::from_secs(30));
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("CACHE_LOCK_TTL_SECS", "45"),
            ("CACHE_LOCK_WAIT_MS", "50"),
            ("CACHE_PHI_STANDARD_TTL_SECS", "7200"),
        ]
        .into_iter()
        .collect();

        let config = EngineConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap();
        assert_eq!(config.revalidation_lock_ttl, Duration::from_secs(45));
        assert_eq!(config.lock_wait, Duration::from_millis(50));
        assert_eq!(config.phi_standard_ttl, Duration::from_secs(7200));
        assert_eq!(config.emergency_ttl, Duration::from_secs(60));
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let result = EngineConfig::from_lookup(|name| {
            (name == "CACHE_EMERGENCY_TTL_SECS").then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(CacheError::ConfigError(_))));
    }

    #[test]
    fn test_preset_configs() {
        let strict = EngineConfig::strict_compliance();
        assert!(strict.validate().is_ok());
        assert_eq!(strict.phi_restricted_ttl, Duration::from_secs(450));

        let testing = EngineConfig::testing();
        assert_eq!(testing.lock_wait, Duration::from_millis(20));
    }
}
