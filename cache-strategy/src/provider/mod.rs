//! Backing key-value store contract
//!
//! The engine treats the provider as opaque: eviction, replication and
//! durability are the provider's concern. Values cross the boundary as
//! serialized JSON strings.

pub mod memory;

use crate::error::Result;
use crate::types::CacheValue;
use async_trait::async_trait;
use std::time::Duration;

pub use memory::{start_auto_cleanup, InMemoryCacheProvider};

/// Minimal asynchronous key-value store
///
/// Implementations must be safe to share across tasks. No atomicity is
/// assumed between calls; concurrent writes are last-writer-wins.
#[async_trait]
pub trait CacheProvider: Send + Sync {
    /// Read a value, `None` when absent or expired
    async fn get(&self, key: &str) -> Result<Option<CacheValue>>;

    /// Write a value that expires after `ttl`
    async fn set(&self, key: &str, value: CacheValue, ttl: Duration) -> Result<()>;

    /// Remove a value; removing an absent key is not an error
    async fn del(&self, key: &str) -> Result<()>;

    /// Check for a live value without reading it
    async fn exists(&self, key: &str) -> Result<bool>;
}
