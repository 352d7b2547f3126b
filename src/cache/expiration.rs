//! Expiration policies

use std::time::Duration;

use crate::error::{CacheError, Result};

/// Longest TTL a store accepts (`i64::MAX` milliseconds)
pub const MAX_TTL: Duration = Duration::from_millis(i64::MAX as u64);

/// How long a written key lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Expiration {
    /// Keep until deleted
    #[default]
    Never,

    /// Expire after a positive duration (millisecond resolution)
    After(Duration),
}

impl Expiration {
    /// Expire after `secs` seconds
    pub fn seconds(secs: u64) -> Self {
        Expiration::After(Duration::from_secs(secs))
    }

    /// Reject TTLs the store cannot represent
    pub fn validate(&self) -> Result<()> {
        match self {
            Expiration::Never => Ok(()),
            Expiration::After(ttl) if ttl.as_millis() == 0 => Err(CacheError::InvalidExpiration(
                format!("TTL must be at least 1ms, got {:?}", ttl),
            )),
            Expiration::After(ttl) if *ttl > MAX_TTL => Err(CacheError::InvalidExpiration(
                format!("TTL must be at most {:?}, got {:?}", MAX_TTL, ttl),
            )),
            Expiration::After(_) => Ok(()),
        }
    }

    /// The TTL to hand to the store, after validation
    pub fn ttl(&self) -> Result<Option<Duration>> {
        self.validate()?;
        Ok(match self {
            Expiration::Never => None,
            Expiration::After(ttl) => Some(*ttl),
        })
    }
}

impl From<Duration> for Expiration {
    fn from(ttl: Duration) -> Self {
        Expiration::After(ttl)
    }
}

impl From<Option<Duration>> for Expiration {
    fn from(ttl: Option<Duration>) -> Self {
        ttl.map_or(Expiration::Never, Expiration::After)
    }
}
