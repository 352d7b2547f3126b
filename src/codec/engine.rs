//! Encoding engine
//!
//! One engine = bincode options + a scratch buffer that is reused across
//! calls. Encoding mutates the buffer, so an engine must never be used by
//! two callers at once; `ObjectCodec` hands engines out through a pool.
//!
//! ## Frame Format
//! ```text
//! ┌───────────┬─────────────┬───────────┬─────────────────────────┐
//! │ Magic (1) │ Version (1) │ CRC32 (4) │ bincode payload         │
//! └───────────┴─────────────┴───────────┴─────────────────────────┘
//! ```
//! The CRC covers the payload only and is stored little endian.

use bincode::{ErrorKind, Options};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::CodecConfig;
use crate::error::{CacheError, Result};

/// First byte of every frame
pub const MAGIC: u8 = 0xAC;

/// Frame layout version
pub const FORMAT_VERSION: u8 = 1;

/// Magic (1) + version (1) + CRC32 (4)
pub const HEADER_SIZE: usize = 6;

/// A single-threaded encode/decode instance
#[derive(Debug)]
pub struct Engine {
    /// Scratch buffer holding the last encoded frame
    buffer: Vec<u8>,

    /// Capacity the buffer is shrunk back to
    initial_capacity: usize,

    /// Buffers above this capacity are shrunk by `reset`
    max_retained_buffer: usize,

    /// Largest payload accepted (bytes)
    max_value_size: u64,
}

impl Engine {
    /// Create an engine with the given codec settings
    pub fn new(config: &CodecConfig) -> Self {
        Self {
            buffer: Vec::with_capacity(config.engine_buffer_capacity),
            initial_capacity: config.engine_buffer_capacity,
            max_retained_buffer: config.max_retained_buffer,
            max_value_size: config.max_value_size,
        }
    }

    /// Encode `value` into a frame held by the engine's buffer
    ///
    /// The returned slice is valid until the next call on this engine.
    pub fn encode<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<&[u8]> {
        self.buffer.clear();
        self.buffer.extend_from_slice(&[MAGIC, FORMAT_VERSION, 0, 0, 0, 0]);

        encode_options()
            .serialize_into(&mut self.buffer, value)
            .map_err(encode_error)?;

        let payload_len = (self.buffer.len() - HEADER_SIZE) as u64;
        if payload_len > self.max_value_size {
            return Err(CacheError::ValueTooLarge {
                size: payload_len,
                limit: self.max_value_size,
            });
        }

        let crc = crc32fast::hash(&self.buffer[HEADER_SIZE..]);
        self.buffer[2..HEADER_SIZE].copy_from_slice(&crc.to_le_bytes());

        Ok(&self.buffer)
    }

    /// Decode a frame produced by `encode` into a `T`
    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        let payload = open_frame(bytes)?;

        if payload.len() as u64 > self.max_value_size {
            return Err(CacheError::Decode(format!(
                "Payload too large: {} bytes (max {})",
                payload.len(),
                self.max_value_size
            )));
        }

        decode_options(self.max_value_size)
            .deserialize(payload)
            .map_err(decode_error)
    }

    /// Release scratch memory held after an oversized value
    pub fn reset(&mut self) {
        self.buffer.clear();
        if self.buffer.capacity() > self.max_retained_buffer {
            self.buffer.shrink_to(self.initial_capacity);
        }
    }

    /// Current scratch buffer capacity (bytes)
    pub fn buffer_capacity(&self) -> usize {
        self.buffer.capacity()
    }
}

/// Validate the frame header and checksum, returning the payload
fn open_frame(bytes: &[u8]) -> Result<&[u8]> {
    if bytes.len() < HEADER_SIZE {
        return Err(CacheError::Decode(format!(
            "Incomplete header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    if bytes[0] != MAGIC {
        return Err(CacheError::Decode(format!(
            "Unknown frame marker: 0x{:02x}",
            bytes[0]
        )));
    }

    if bytes[1] != FORMAT_VERSION {
        return Err(CacheError::Decode(format!(
            "Unsupported format version: {} (expected {})",
            bytes[1], FORMAT_VERSION
        )));
    }

    let stored_crc = u32::from_le_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]);
    let payload = &bytes[HEADER_SIZE..];
    let actual_crc = crc32fast::hash(payload);
    if stored_crc != actual_crc {
        return Err(CacheError::Decode(format!(
            "Checksum mismatch: stored 0x{:08x}, computed 0x{:08x}",
            stored_crc, actual_crc
        )));
    }

    Ok(payload)
}

fn encode_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_little_endian()
        .with_varint_encoding()
}

fn decode_options(limit: u64) -> impl Options {
    bincode::DefaultOptions::new()
        .with_little_endian()
        .with_varint_encoding()
        .with_limit(limit)
        .reject_trailing_bytes()
}

fn encode_error(err: bincode::Error) -> CacheError {
    match *err {
        ErrorKind::SequenceMustHaveLength => {
            CacheError::UnsupportedType("sequence without a known length".to_string())
        }
        ErrorKind::Custom(msg) => CacheError::UnsupportedType(msg),
        other => CacheError::UnsupportedType(other.to_string()),
    }
}

fn decode_error(err: bincode::Error) -> CacheError {
    match *err {
        ErrorKind::DeserializeAnyNotSupported => CacheError::UnsupportedType(
            "type needs a self-describing format and cannot be decoded".to_string(),
        ),
        ErrorKind::Io(ref io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
            CacheError::Decode("Truncated payload".to_string())
        }
        other => CacheError::Decode(other.to_string()),
    }
}
