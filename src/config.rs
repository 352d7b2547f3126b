//! Configuration for AtlasCache
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

use crate::cache::Expiration;
use crate::error::{CacheError, Result};

/// Main configuration for a cache client
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Codec Configuration
    // -------------------------------------------------------------------------
    /// Engine pool and buffer settings
    pub codec: CodecConfig,

    // -------------------------------------------------------------------------
    // Expiration Configuration
    // -------------------------------------------------------------------------
    /// Policies applied when an operation is called without an explicit one
    pub expiration: ExpirationDefaults,

    // -------------------------------------------------------------------------
    // Store Configuration
    // -------------------------------------------------------------------------
    /// Connection URL, used by network-backed stores
    ///
    /// Format: `redis://[username:password@]host[:port][/database]`
    pub store_url: String,

    /// Max idle store connections kept for reuse
    pub store_pool_capacity: usize,
}

/// Codec engine pool settings
#[derive(Debug, Clone)]
pub struct CodecConfig {
    /// Max idle engines retained by the pool. Extra engines created under
    /// contention are dropped when released.
    pub engine_pool_capacity: usize,

    /// Engines created up front when the codec is built
    pub engine_prewarm: usize,

    /// Initial capacity of each engine's scratch buffer (in bytes)
    pub engine_buffer_capacity: usize,

    /// Scratch buffers larger than this are shrunk back after use (in bytes)
    pub max_retained_buffer: usize,

    /// Largest encoded value accepted on encode or decode (in bytes)
    pub max_value_size: u64,
}

/// Default expiration per operation family.
///
/// Strings and hash fields expire after a day unless told otherwise, while
/// objects are kept until deleted. Use [`ExpirationDefaults::uniform`] to
/// apply one policy everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpirationDefaults {
    /// Used by `set_string`
    pub string: Expiration,

    /// Used by `set`
    pub object: Expiration,

    /// Used by `hash_put`
    pub hash_field: Expiration,
}

/// One day, the default lifetime of strings and hash fields
pub const DEFAULT_EXPIRE: Duration = Duration::from_secs(60 * 60 * 24);

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            engine_pool_capacity: 32,
            engine_prewarm: 4,
            engine_buffer_capacity: 1024,
            max_retained_buffer: 1024 * 1024, // 1 MB
            max_value_size: 16 * 1024 * 1024, // 16 MB
        }
    }
}

impl Default for ExpirationDefaults {
    fn default() -> Self {
        Self {
            string: Expiration::After(DEFAULT_EXPIRE),
            object: Expiration::Never,
            hash_field: Expiration::After(DEFAULT_EXPIRE),
        }
    }
}

impl ExpirationDefaults {
    /// Same policy for every family
    pub fn uniform(policy: Expiration) -> Self {
        Self {
            string: policy,
            object: policy,
            hash_field: policy,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            codec: CodecConfig::default(),
            expiration: ExpirationDefaults::default(),
            store_url: "redis://127.0.0.1:6379".to_string(),
            store_pool_capacity: 16,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the configuration for values no component can work with
    pub fn validate(&self) -> Result<()> {
        if self.codec.engine_pool_capacity == 0 {
            return Err(CacheError::Config(
                "engine_pool_capacity must be at least 1".to_string(),
            ));
        }
        if self.codec.engine_prewarm > self.codec.engine_pool_capacity {
            return Err(CacheError::Config(format!(
                "engine_prewarm ({}) exceeds engine_pool_capacity ({})",
                self.codec.engine_prewarm, self.codec.engine_pool_capacity
            )));
        }
        if self.codec.max_value_size == 0 {
            return Err(CacheError::Config(
                "max_value_size must be greater than zero".to_string(),
            ));
        }
        if self.store_pool_capacity == 0 {
            return Err(CacheError::Config(
                "store_pool_capacity must be at least 1".to_string(),
            ));
        }

        let defaults = self.expiration;
        for policy in [defaults.string, defaults.object, defaults.hash_field] {
            policy.validate()?;
        }

        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the max number of idle codec engines retained
    pub fn engine_pool_capacity(mut self, count: usize) -> Self {
        self.config.codec.engine_pool_capacity = count;
        self
    }

    /// Set how many codec engines are created up front
    pub fn engine_prewarm(mut self, count: usize) -> Self {
        self.config.codec.engine_prewarm = count;
        self
    }

    /// Set the initial scratch buffer size of each engine (in bytes)
    pub fn engine_buffer_capacity(mut self, bytes: usize) -> Self {
        self.config.codec.engine_buffer_capacity = bytes;
        self
    }

    /// Set the largest scratch buffer kept between calls (in bytes)
    pub fn max_retained_buffer(mut self, bytes: usize) -> Self {
        self.config.codec.max_retained_buffer = bytes;
        self
    }

    /// Set the maximum encoded value size (in bytes)
    pub fn max_value_size(mut self, bytes: u64) -> Self {
        self.config.codec.max_value_size = bytes;
        self
    }

    /// Set the default expiration of `set_string`
    pub fn string_expiration(mut self, policy: Expiration) -> Self {
        self.config.expiration.string = policy;
        self
    }

    /// Set the default expiration of `set`
    pub fn object_expiration(mut self, policy: Expiration) -> Self {
        self.config.expiration.object = policy;
        self
    }

    /// Set the default expiration of `hash_put`
    pub fn hash_field_expiration(mut self, policy: Expiration) -> Self {
        self.config.expiration.hash_field = policy;
        self
    }

    /// Replace all expiration defaults at once
    pub fn expiration_defaults(mut self, defaults: ExpirationDefaults) -> Self {
        self.config.expiration = defaults;
        self
    }

    /// Set the store connection URL
    pub fn store_url(mut self, url: impl Into<String>) -> Self {
        self.config.store_url = url.into();
        self
    }

    /// Set the max idle store connections
    pub fn store_pool_capacity(mut self, count: usize) -> Self {
        self.config.store_pool_capacity = count;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
