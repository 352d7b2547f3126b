//! # AtlasCache
//!
//! A typed caching client for key-value stores with:
//! - A pooled binary object codec (serde + bincode, checksummed frames)
//! - Scalar, hash, list and key operations over any byte-oriented `Store`
//! - Explicit, configurable expiration defaults
//! - An in-memory store for tests and an optional Redis store
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Callers                              │
//! │                 (many threads, typed values)                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Cache<S>                               │
//! │        scalar / hash / list / key operations                │
//! └──────────┬──────────────────────────────────┬───────────────┘
//!            │ values                           │ keys + bytes
//!            ▼                                  ▼
//!   ┌─────────────────┐                 ┌─────────────────┐
//!   │   ObjectCodec   │                 │    S: Store     │
//!   │ (Engine pool)   │                 │ Memory / Redis  │
//!   └─────────────────┘                 └─────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use atlascache::{Cache, MemoryStore};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct User {
//!     name: String,
//!     age: u32,
//! }
//!
//! let cache = Cache::with_defaults(MemoryStore::new()).unwrap();
//!
//! let user = User { name: "Bai".to_string(), age: 18 };
//! cache.set("user:0", &user).unwrap();
//!
//! let loaded: Option<User> = cache.get("user:0").unwrap();
//! assert_eq!(loaded, Some(user));
//! assert_eq!(cache.get::<User>("user:1").unwrap(), None);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod store;
pub mod cache;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CacheError, Result};
pub use config::{CodecConfig, Config, ExpirationDefaults};
pub use codec::{ObjectCodec, Value, ValueKind};
pub use store::{DataKind, ListEnd, MemoryStore, Store};
#[cfg(feature = "redis-backend")]
pub use store::RedisStore;
pub use cache::{Cache, Expiration};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of AtlasCache
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
