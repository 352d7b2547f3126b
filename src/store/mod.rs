//! Store Module
//!
//! Byte-oriented key-value store interface the cache layer runs on.
//!
//! ## Responsibilities
//! - Scalar, hash and list primitives over raw byte values
//! - Key management: delete, expiry, pattern listing, type inspection
//! - Expiry enforcement (the cache layer never tracks deadlines itself)
//!
//! Keys and hash fields are plain UTF-8 strings; values are opaque bytes.
//!
//! ## Implementations
//! - `MemoryStore`: in-process, for tests and embedding
//! - `RedisStore`: Redis server over pooled connections (feature `redis-backend`)

mod memory;
mod pattern;
#[cfg(feature = "redis-backend")]
mod redis;

pub use memory::MemoryStore;
pub use pattern::glob_match;
#[cfg(feature = "redis-backend")]
pub use self::redis::RedisStore;

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, SystemTime};

use crate::error::Result;

/// Kind of data held under a key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataKind {
    /// Key does not exist
    None,
    /// Plain value (`string` in Redis terms)
    Scalar,
    List,
    Set,
    SortedSet,
    Hash,
    Stream,
    /// A type this crate does not know about
    Other(String),
}

impl DataKind {
    /// Map a Redis `TYPE` reply to a kind
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "none" => DataKind::None,
            "string" => DataKind::Scalar,
            "list" => DataKind::List,
            "set" => DataKind::Set,
            "zset" => DataKind::SortedSet,
            "hash" => DataKind::Hash,
            "stream" => DataKind::Stream,
            other => DataKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataKind::None => f.write_str("none"),
            DataKind::Scalar => f.write_str("string"),
            DataKind::List => f.write_str("list"),
            DataKind::Set => f.write_str("set"),
            DataKind::SortedSet => f.write_str("zset"),
            DataKind::Hash => f.write_str("hash"),
            DataKind::Stream => f.write_str("stream"),
            DataKind::Other(name) => f.write_str(name),
        }
    }
}

/// End of a list to push to or pop from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEnd {
    /// Head
    Left,
    /// Tail
    Right,
}

/// A byte-oriented key-value store
///
/// Missing keys and fields are reported as `None` or empty collections,
/// never as errors. Implementations are responsible for expiring keys.
pub trait Store: Send + Sync {
    /// A name for logging
    fn name(&self) -> &'static str;

    // -------------------------------------------------------------------------
    // Scalars
    // -------------------------------------------------------------------------

    /// Write a value, replacing whatever the key held, with an optional TTL
    /// applied atomically with the write
    fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()>;

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// One entry per key, in order; missing keys (or non-scalar keys) are `None`
    fn multi_get(&self, keys: &[&str]) -> Result<Vec<Option<Vec<u8>>>>;

    // -------------------------------------------------------------------------
    // Keys
    // -------------------------------------------------------------------------

    /// Remove keys, returning how many existed
    fn delete(&self, keys: &[&str]) -> Result<u64>;

    fn exists(&self, key: &str) -> Result<bool>;

    /// Set a relative TTL; `false` if the key does not exist
    fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;

    /// Set an absolute deadline; `false` if the key does not exist
    fn expire_at(&self, key: &str, at: SystemTime) -> Result<bool>;

    /// Remaining TTL; `None` if the key is missing or never expires
    fn ttl(&self, key: &str) -> Result<Option<Duration>>;

    /// All keys matching a glob pattern. Scans every key.
    fn keys(&self, pattern: &str) -> Result<Vec<String>>;

    fn key_type(&self, key: &str) -> Result<DataKind>;

    // -------------------------------------------------------------------------
    // Hashes
    // -------------------------------------------------------------------------

    fn hash_set(&self, key: &str, field: &str, value: &[u8]) -> Result<()>;

    /// Write several fields, merging with existing ones
    fn hash_set_all(&self, key: &str, entries: &[(String, Vec<u8>)]) -> Result<()>;

    /// Replace the whole hash at `key` with `entries`
    ///
    /// The default deletes then writes, so a concurrent reader may see the
    /// hash missing or partially written. Stores with transactions override it.
    fn replace_hash(&self, key: &str, entries: &[(String, Vec<u8>)]) -> Result<()> {
        self.delete(&[key])?;
        if entries.is_empty() {
            return Ok(());
        }
        self.hash_set_all(key, entries)
    }

    fn hash_get(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>>;

    fn hash_get_all(&self, key: &str) -> Result<HashMap<String, Vec<u8>>>;

    /// One entry per field, in order
    fn hash_multi_get(&self, key: &str, fields: &[&str]) -> Result<Vec<Option<Vec<u8>>>>;

    // -------------------------------------------------------------------------
    // Lists
    // -------------------------------------------------------------------------

    /// Push values one by one at `end`, returning the new length
    ///
    /// Pushing `[a, b]` on the left leaves `b` at the head.
    fn list_push(&self, key: &str, end: ListEnd, values: &[Vec<u8>]) -> Result<u64>;

    fn list_pop(&self, key: &str, end: ListEnd) -> Result<Option<Vec<u8>>>;

    /// Elements from `start` to `stop` inclusive; negative indexes count
    /// from the tail (`-1` is the last element)
    fn list_range(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Vec<u8>>>;

    fn list_len(&self, key: &str) -> Result<u64>;
}
