//! Error types for AtlasCache
//!
//! Provides a unified error type for codec, store and cache operations.
//! Absent keys and fields are never errors; they surface as `Ok(None)` or
//! empty collections.

use thiserror::Error;

/// Result type alias using CacheError
pub type Result<T> = std::result::Result<T, CacheError>;

/// Unified error type for AtlasCache operations
#[derive(Debug, Error)]
pub enum CacheError {
    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    /// The value's type cannot be represented by the codec
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// Bytes could not be reconstructed into the expected type
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Value too large: {size} bytes (max {limit})")]
    ValueTooLarge { size: u64, limit: u64 },

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    /// Connection-level failure talking to the store. Never retried here.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The store rejected a command
    #[error("Store error: {0}")]
    Store(String),

    #[error("Wrong type for key '{key}': expected {expected}")]
    WrongType { key: String, expected: &'static str },

    // -------------------------------------------------------------------------
    // Usage Errors
    // -------------------------------------------------------------------------
    #[error("Invalid expiration: {0}")]
    InvalidExpiration(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CacheError {
    /// Build a `WrongType` error for `key`
    pub fn wrong_type(key: impl Into<String>, expected: &'static str) -> Self {
        CacheError::WrongType {
            key: key.into(),
            expected,
        }
    }

    /// Whether the error came from the store connection rather than the data
    pub fn is_unavailable(&self) -> bool {
        matches!(self, CacheError::StoreUnavailable(_))
    }
}
