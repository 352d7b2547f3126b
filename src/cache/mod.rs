//! Cache Module
//!
//! Typed, expiration-aware operations over a `Store`.
//!
//! ## Responsibilities
//! - Encode values through the `ObjectCodec` before they reach the store
//! - Decode store bytes into the type the caller asks for
//! - Apply expiration policies, explicit or from `ExpirationDefaults`
//!
//! Keys and hash fields are passed to the store verbatim; only values go
//! through the codec.
//!
//! ## Operation Families
//! - Scalars: `set`, `set_string`, `get`, `get_string`, `multi_get`
//! - Hashes: `hash_put`, `hash_put_all`, `hash_get`, `hash_get_all`, `hash_multi_get`
//! - Lists: `left_push`, `right_push`, `left_pop`, `right_pop`, `range`
//! - Keys: `delete`, `delete_many`, `exists`, `expire`, `expire_at`, `ttl`, `keys`, `key_type`

mod expiration;
mod hash;
mod list;

pub use expiration::{Expiration, MAX_TTL};

use std::collections::BTreeSet;
use std::time::{Duration, SystemTime};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::ObjectCodec;
use crate::config::{Config, ExpirationDefaults};
use crate::error::Result;
use crate::store::{DataKind, Store};

/// Typed cache client over a byte store
///
/// ## Concurrency Model
/// Every call is synchronous and returns once the store round-trip is done.
/// `Cache<S>` is `Send + Sync` when `S` is; share it across threads with an
/// `Arc`. The codec's engine pool is the only shared state the cache owns.
pub struct Cache<S: Store> {
    /// Byte store the cache writes through
    store: S,

    /// Value codec (pooled engines)
    codec: ObjectCodec,

    /// Policies for calls without an explicit expiration
    defaults: ExpirationDefaults,
}

impl<S: Store> Cache<S> {
    /// Build a cache over `store`
    pub fn new(store: S, config: Config) -> Result<Self> {
        config.validate()?;

        tracing::debug!(
            store = store.name(),
            engines = config.codec.engine_prewarm,
            defaults = ?config.expiration,
            "Cache initialized"
        );

        Ok(Self {
            store,
            codec: ObjectCodec::new(config.codec),
            defaults: config.expiration,
        })
    }

    /// Build a cache with the default configuration
    pub fn with_defaults(store: S) -> Result<Self> {
        Self::new(store, Config::default())
    }

    // =========================================================================
    // Scalars
    // =========================================================================

    /// Store a value under `key` using the object default expiration
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        self.set_with(key, value, self.defaults.object)
    }

    /// Store a value under `key`, replacing what was there
    ///
    /// The policy is applied atomically with the write.
    pub fn set_with<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        policy: Expiration,
    ) -> Result<()> {
        let ttl = policy.ttl()?;
        tracing::trace!(key, ?policy, "set");

        self.codec
            .encode_with(value, |bytes| self.store.set(key, bytes, ttl))?
    }

    /// Store a string using the string default expiration
    pub fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.set_string_with(key, value, self.defaults.string)
    }

    pub fn set_string_with(&self, key: &str, value: &str, policy: Expiration) -> Result<()> {
        self.set_with(key, value, policy)
    }

    /// Read the value under `key`; `None` if the key is absent
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let bytes = self.store.get(key)?;
        self.codec.decode_opt(bytes.as_deref())
    }

    pub fn get_string(&self, key: &str) -> Result<Option<String>> {
        self.get(key)
    }

    /// Read several keys at once
    ///
    /// The result has one entry per key, in the same order, with `None`
    /// wherever a key is absent.
    pub fn multi_get<T: DeserializeOwned>(&self, keys: &[&str]) -> Result<Vec<Option<T>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        self.store
            .multi_get(keys)?
            .iter()
            .map(|bytes| self.codec.decode_opt(bytes.as_deref()))
            .collect()
    }

    // =========================================================================
    // Keys
    // =========================================================================

    /// Remove a key; `false` if it did not exist
    pub fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.store.delete(&[key])? > 0)
    }

    /// Remove several keys, returning how many existed
    pub fn delete_many(&self, keys: &[&str]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        self.store.delete(keys)
    }

    pub fn exists(&self, key: &str) -> Result<bool> {
        self.store.exists(key)
    }

    /// Set or reset the TTL of an existing key
    ///
    /// Returns whether the key existed and was updated.
    pub fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        Expiration::After(ttl).validate()?;
        self.store.expire(key, ttl)
    }

    /// Expire an existing key at `at`; a past instant deletes the key
    ///
    /// Returns whether the key existed and was updated.
    pub fn expire_at(&self, key: &str, at: SystemTime) -> Result<bool> {
        self.store.expire_at(key, at)
    }

    /// Remaining TTL; `None` if the key is absent or never expires
    pub fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        self.store.ttl(key)
    }

    /// All keys matching a glob pattern
    ///
    /// Scans every key in the store. Meant for administration and
    /// debugging, never for request paths.
    pub fn keys(&self, pattern: &str) -> Result<BTreeSet<String>> {
        tracing::debug!(pattern, store = self.store.name(), "Scanning all keys");
        Ok(self.store.keys(pattern)?.into_iter().collect())
    }

    /// What kind of data `key` holds
    pub fn key_type(&self, key: &str) -> Result<DataKind> {
        self.store.key_type(key)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The value codec
    pub fn codec(&self) -> &ObjectCodec {
        &self.codec
    }

    /// Policies used when no expiration is given
    pub fn defaults(&self) -> ExpirationDefaults {
        self.defaults
    }
}
