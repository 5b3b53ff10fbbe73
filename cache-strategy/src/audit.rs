//! Access-audit sink used by the PHI strategy
//!
//! Delivery of audit trails is somebody else's job; the engine only hands
//! records to an [`AuditLogger`] and ignores whatever goes wrong there.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Severity of an audit record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Audit event kinds emitted by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    CacheAccess,
    CacheHit,
    CacheMiss,
}

impl fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditEventType::CacheAccess => write!(f, "cache_access"),
            AuditEventType::CacheHit => write!(f, "cache_hit"),
            AuditEventType::CacheMiss => write!(f, "cache_miss"),
        }
    }
}

/// A single audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub event_type: AuditEventType,
    pub level: AuditLevel,
    pub message: String,
    /// Component that produced the record
    pub source: String,
    pub metadata: HashMap<String, Value>,
    pub timestamp: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(
        event_type: AuditEventType,
        level: AuditLevel,
        message: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type,
            level,
            message: message.into(),
            source: source.into(),
            metadata: HashMap::new(),
            timestamp: Utc::now(),
        }
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Destination for audit records
///
/// Called synchronously on the request path, so implementations should hand
/// the record off rather than perform slow I/O inline.
pub trait AuditLogger: Send + Sync {
    fn log(&self, record: AuditRecord) -> Result<()>;
}

/// Audit sink that forwards records to `tracing` under the `cache_audit` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditLogger;

impl AuditLogger for TracingAuditLogger {
    fn log(&self, record: AuditRecord) -> Result<()> {
        let metadata = serde_json::to_string(&record.metadata)?;
        match record.level {
            AuditLevel::Debug => tracing::debug!(
                target: "cache_audit",
                event = %record.event_type,
                source = %record.source,
                metadata = %metadata,
                "{}",
                record.message
            ),
            AuditLevel::Info => tracing::info!(
                target: "cache_audit",
                event = %record.event_type,
                source = %record.source,
                metadata = %metadata,
                "{}",
                record.message
            ),
            AuditLevel::Warn => tracing::warn!(
                target: "cache_audit",
                event = %record.event_type,
                source = %record.source,
                metadata = %metadata,
                "{}",
                record.message
            ),
            AuditLevel::Error => tracing::error!(
                target: "cache_audit",
                event = %record.event_type,
                source = %record.source,
                metadata = %metadata,
                "{}",
                record.message
            ),
        }
        Ok(())
    }
}
