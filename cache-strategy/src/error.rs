//! Error types for cache engine operations
//!
//! The engine introduces a single error type of its own. Failures coming from
//! the fetch function or the backing provider are carried through unchanged
//! in their own variants so callers can tell them apart.

use thiserror::Error;

/// Main error type for cache engine operations
#[derive(Error, Debug)]
pub enum CacheError {
    /// The authoritative data source (fetch function) failed
    #[error("Fetch error: {0}")]
    FetchError(String),

    /// The backing cache provider failed
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The strategy list is empty
    #[error("No cache strategy available")]
    NoStrategyAvailable,

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for cache engine operations
pub type Result<T> = std::result::Result<T, CacheError>;

impl From<String> for CacheError {
    fn from(s: String) -> Self {
        CacheError::Other(s)
    }
}

impl From<&str> for CacheError {
    fn from(s: &str) -> Self {
        CacheError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        CacheError::SerializationError(e.to_string())
    }
}

// Fetch closures built on anyhow can use `?` directly.
impl From<anyhow::Error> for CacheError {
    fn from(e: anyhow::Error) -> Self {
        CacheError::FetchError(format!("{:#}", e))
    }
}
