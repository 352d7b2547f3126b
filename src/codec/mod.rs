//! Codec Module
//!
//! Converts typed values to byte sequences and back, for use as the value
//! half of key-value pairs.
//!
//! ## Responsibilities
//! - Encode any `serde::Serialize` value into a framed byte sequence
//! - Decode bytes into the type the caller names, rejecting truncated,
//!   corrupted or mismatched input
//! - Share non-reentrant engines between threads through a pool
//!
//! ## Frame Format
//! ```text
//! ┌───────────┬─────────────┬───────────┬─────────────────────────┐
//! │ Magic (1) │ Version (1) │ CRC32 (4) │ bincode payload         │
//! └───────────┴─────────────┴───────────┴─────────────────────────┘
//! ```
//!
//! ## Null Handling
//! `Option::None` and `Value::Null` encode to a full frame, so a stored null
//! is never confused with a missing key or an empty container.

mod engine;
mod object;
mod pool;
mod value;

pub use engine::{Engine, FORMAT_VERSION, HEADER_SIZE, MAGIC};
pub use object::ObjectCodec;
pub use pool::{Pool, Pooled};
pub use value::{Value, ValueKind};
