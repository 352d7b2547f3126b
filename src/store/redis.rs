//! Redis Store
//!
//! `Store` over synchronous Redis connections.
//!
//! ## Connections
//! Connections are pooled with the same `Pool` the codec uses for engines.
//! A connection that fails at the transport level is discarded instead of
//! being handed back. Timeouts and retries are left to the Redis client.

use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use redis::{Client, Connection, RedisError, RedisResult};

use crate::codec::{Pool, Pooled};
use crate::config::Config;
use crate::error::{CacheError, Result};

use super::{DataKind, ListEnd, Store};

/// Redis-backed store
pub struct RedisStore {
    client: Client,

    /// Idle connections
    connections: Pool<Connection>,
}

impl RedisStore {
    /// Connect using `config.store_url`
    ///
    /// One connection is opened eagerly so a bad URL or unreachable server
    /// fails here rather than on first use.
    pub fn open(config: &Config) -> Result<Self> {
        let client = Client::open(config.store_url.as_str())
            .map_err(|e| CacheError::Config(format!("Invalid store URL: {}", e)))?;

        let store = Self {
            client,
            connections: Pool::new("redis-connection", config.store_pool_capacity),
        };

        drop(store.connection()?);
        tracing::info!(url = %config.store_url, "Connected to Redis");

        Ok(store)
    }

    fn connection(&self) -> Result<Pooled<'_, Connection>> {
        self.connections
            .try_acquire(|| self.client.get_connection().map_err(store_error))
    }

    /// Run `f` on a pooled connection, discarding the connection on
    /// transport errors
    fn with_connection<T>(&self, f: impl FnOnce(&mut Connection) -> RedisResult<T>) -> Result<T> {
        let mut conn = self.connection()?;
        match f(&mut *conn) {
            Ok(value) => Ok(value),
            Err(e) => {
                let err = store_error(e);
                if err.is_unavailable() {
                    conn.discard();
                }
                Err(err)
            }
        }
    }
}

/// Transport failures are `StoreUnavailable`; server replies are `Store`
fn store_error(e: RedisError) -> CacheError {
    if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout() {
        CacheError::StoreUnavailable(e.to_string())
    } else {
        CacheError::Store(e.to_string())
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Store for RedisStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl {
            cmd.arg("PX").arg(millis(ttl));
        }
        self.with_connection(|conn| cmd.query::<()>(conn))
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.with_connection(|conn| redis::cmd("GET").arg(key).query(conn))
    }

    fn multi_get(&self, keys: &[&str]) -> Result<Vec<Option<Vec<u8>>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        self.with_connection(|conn| redis::cmd("MGET").arg(keys).query(conn))
    }

    fn delete(&self, keys: &[&str]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        self.with_connection(|conn| redis::cmd("DEL").arg(keys).query(conn))
    }

    fn exists(&self, key: &str) -> Result<bool> {
        self.with_connection(|conn| redis::cmd("EXISTS").arg(key).query(conn))
    }

    fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        self.with_connection(|conn| {
            redis::cmd("PEXPIRE").arg(key).arg(millis(ttl)).query(conn)
        })
    }

    fn expire_at(&self, key: &str, at: SystemTime) -> Result<bool> {
        let since_epoch = at.duration_since(UNIX_EPOCH).map_err(|_| {
            CacheError::InvalidExpiration("deadline before the Unix epoch".to_string())
        })?;
        self.with_connection(|conn| {
            redis::cmd("PEXPIREAT")
                .arg(key)
                .arg(millis(since_epoch))
                .query(conn)
        })
    }

    fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        // -2: missing key, -1: no expiry
        let remaining: i64 = self.with_connection(|conn| redis::cmd("PTTL").arg(key).query(conn))?;
        Ok(u64::try_from(remaining).ok().map(Duration::from_millis))
    }

    fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        self.with_connection(|conn| redis::cmd("KEYS").arg(pattern).query(conn))
    }

    fn key_type(&self, key: &str) -> Result<DataKind> {
        let name: String = self.with_connection(|conn| redis::cmd("TYPE").arg(key).query(conn))?;
        Ok(DataKind::from_type_name(&name))
    }

    fn hash_set(&self, key: &str, field: &str, value: &[u8]) -> Result<()> {
        self.with_connection(|conn| {
            redis::cmd("HSET")
                .arg(key)
                .arg(field)
                .arg(value)
                .query::<()>(conn)
        })
    }

    fn hash_set_all(&self, key: &str, entries: &[(String, Vec<u8>)]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut cmd = redis::cmd("HSET");
        cmd.arg(key);
        for (field, value) in entries {
            cmd.arg(field.as_str()).arg(value.as_slice());
        }
        self.with_connection(|conn| cmd.query::<()>(conn))
    }

    /// Delete and rewrite inside `MULTI`/`EXEC`, so readers see either the
    /// old hash or the new one
    fn replace_hash(&self, key: &str, entries: &[(String, Vec<u8>)]) -> Result<()> {
        let mut pipe = redis::pipe();
        pipe.atomic().cmd("DEL").arg(key).ignore();

        if !entries.is_empty() {
            pipe.cmd("HSET").arg(key);
            for (field, value) in entries {
                pipe.arg(field.as_str()).arg(value.as_slice());
            }
            pipe.ignore();
        }

        self.with_connection(|conn| pipe.query::<()>(conn))
    }

    fn hash_get(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>> {
        self.with_connection(|conn| redis::cmd("HGET").arg(key).arg(field).query(conn))
    }

    fn hash_get_all(&self, key: &str) -> Result<HashMap<String, Vec<u8>>> {
        self.with_connection(|conn| redis::cmd("HGETALL").arg(key).query(conn))
    }

    fn hash_multi_get(&self, key: &str, fields: &[&str]) -> Result<Vec<Option<Vec<u8>>>> {
        if fields.is_empty() {
            return Ok(Vec::new());
        }
        self.with_connection(|conn| redis::cmd("HMGET").arg(key).arg(fields).query(conn))
    }

    fn list_push(&self, key: &str, end: ListEnd, values: &[Vec<u8>]) -> Result<u64> {
        if values.is_empty() {
            return self.list_len(key);
        }

        let mut cmd = redis::cmd(match end {
            ListEnd::Left => "LPUSH",
            ListEnd::Right => "RPUSH",
        });
        cmd.arg(key);
        for value in values {
            cmd.arg(value.as_slice());
        }
        self.with_connection(|conn| cmd.query(conn))
    }

    fn list_pop(&self, key: &str, end: ListEnd) -> Result<Option<Vec<u8>>> {
        let name = match end {
            ListEnd::Left => "LPOP",
            ListEnd::Right => "RPOP",
        };
        self.with_connection(|conn| redis::cmd(name).arg(key).query(conn))
    }

    fn list_range(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Vec<u8>>> {
        self.with_connection(|conn| {
            redis::cmd("LRANGE")
                .arg(key)
                .arg(start)
                .arg(stop)
                .query(conn)
        })
    }

    fn list_len(&self, key: &str) -> Result<u64> {
        self.with_connection(|conn| redis::cmd("LLEN").arg(key).query(conn))
    }
}
