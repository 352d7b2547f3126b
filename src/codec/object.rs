//! Object codec
//!
//! Thread-safe front end over a pool of encoding engines.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::CodecConfig;
use crate::error::Result;

use super::{Engine, Pool, Pooled};

/// Converts typed values to and from framed byte sequences
///
/// ## Concurrency:
/// - Each call takes its own `Engine` from `engines` and gives it back when
///   the call ends, successfully or not
/// - An empty pool grows instead of blocking; at most
///   `engine_pool_capacity` idle engines are kept afterwards
pub struct ObjectCodec {
    /// Idle engines
    engines: Pool<Engine>,

    /// Settings every new engine is built with
    config: CodecConfig,
}

impl ObjectCodec {
    /// Create a codec and prewarm its engine pool
    pub fn new(config: CodecConfig) -> Self {
        let engines = Pool::new("codec-engine", config.engine_pool_capacity);
        engines.prewarm(config.engine_prewarm, || Engine::new(&config));

        Self { engines, config }
    }

    /// Encode a value into an owned byte vector
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        self.encode_with(value, |bytes| bytes.to_vec())
    }

    /// Encode a value and lend the bytes to `f` without copying them out
    ///
    /// The engine stays checked out while `f` runs.
    pub fn encode_with<T, R>(&self, value: &T, f: impl FnOnce(&[u8]) -> R) -> Result<R>
    where
        T: Serialize + ?Sized,
    {
        let mut engine = self.engine();
        let out = engine.encode(value).map(f);
        engine.reset();
        out
    }

    /// Decode bytes into the type the caller expects
    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        self.engine().decode(bytes)
    }

    /// Decode bytes that may be absent
    pub fn decode_opt<T: DeserializeOwned>(&self, bytes: Option<&[u8]>) -> Result<Option<T>> {
        bytes.map(|b| self.decode(b)).transpose()
    }

    /// Idle engines currently pooled
    pub fn idle_engines(&self) -> usize {
        self.engines.idle()
    }

    /// Engines created since the codec was built
    pub fn engines_created(&self) -> usize {
        self.engines.created()
    }

    /// Codec settings
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    fn engine(&self) -> Pooled<'_, Engine> {
        self.engines.acquire(|| Engine::new(&self.config))
    }
}

impl Default for ObjectCodec {
    fn default() -> Self {
        Self::new(CodecConfig::default())
    }
}

impl std::fmt::Debug for ObjectCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectCodec")
            .field("engines", &self.engines)
            .finish()
    }
}
