//! Hash operations
//!
//! Hash fields cannot carry their own TTL; any expiration applies to the
//! whole key and every field under it.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::store::Store;

use super::{Cache, Expiration};

impl<S: Store> Cache<S> {
    /// Write one field using the hash default expiration
    pub fn hash_put<T: Serialize + ?Sized>(&self, key: &str, field: &str, value: &T) -> Result<()> {
        self.hash_put_with(key, field, value, self.defaults.hash_field)
    }

    /// Write one field of the hash at `key`
    ///
    /// With `Expiration::After`, the TTL is (re)applied to the whole key
    /// after the write. `Expiration::Never` leaves any existing TTL alone.
    pub fn hash_put_with<T: Serialize + ?Sized>(
        &self,
        key: &str,
        field: &str,
        value: &T,
        policy: Expiration,
    ) -> Result<()> {
        let ttl = policy.ttl()?;
        tracing::trace!(key, field, ?policy, "hash_put");

        self.codec
            .encode_with(value, |bytes| self.store.hash_set(key, field, bytes))??;

        if let Some(ttl) = ttl {
            self.store.expire(key, ttl)?;
        }
        Ok(())
    }

    /// Replace the whole hash at `key` with `fields`
    ///
    /// Existing fields missing from `fields` are lost. All values are encoded
    /// before the old hash is touched, so an unencodable value leaves it
    /// intact. Whether readers can observe the hash mid-replacement depends
    /// on the store's `replace_hash`.
    pub fn hash_put_all<'a, T, F, I>(&self, key: &str, fields: I) -> Result<()>
    where
        T: Serialize + ?Sized + 'a,
        F: AsRef<str>,
        I: IntoIterator<Item = (F, &'a T)>,
    {
        let entries = fields
            .into_iter()
            .map(|(field, value)| Ok((field.as_ref().to_string(), self.codec.encode(value)?)))
            .collect::<Result<Vec<_>>>()?;

        tracing::trace!(key, fields = entries.len(), "hash_put_all");
        self.store.replace_hash(key, &entries)
    }

    /// Read one field; `None` if the key or field is absent
    pub fn hash_get<T: DeserializeOwned>(&self, key: &str, field: &str) -> Result<Option<T>> {
        let bytes = self.store.hash_get(key, field)?;
        self.codec.decode_opt(bytes.as_deref())
    }

    /// Read every field; empty if the key is absent
    pub fn hash_get_all<T: DeserializeOwned>(&self, key: &str) -> Result<HashMap<String, T>> {
        self.store
            .hash_get_all(key)?
            .into_iter()
            .map(|(field, bytes)| Ok((field, self.codec.decode(&bytes)?)))
            .collect()
    }

    /// Read several fields, one entry per field in the same order
    pub fn hash_multi_get<T: DeserializeOwned>(
        &self,
        key: &str,
        fields: &[&str],
    ) -> Result<Vec<Option<T>>> {
        if fields.is_empty() {
            return Ok(Vec::new());
        }

        self.store
            .hash_multi_get(key, fields)?
            .iter()
            .map(|bytes| self.codec.decode_opt(bytes.as_deref()))
            .collect()
    }
}
