//! List operations
//!
//! Pushing and popping on the same end gives a stack; opposite ends give a
//! queue.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::store::{ListEnd, Store};

use super::Cache;

impl<S: Store> Cache<S> {
    /// Push a value at the head, returning the new length
    pub fn left_push<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<u64> {
        self.push_one(key, ListEnd::Left, value)
    }

    /// Push values at the head one by one; the last value ends up first
    pub fn left_push_all<T: Serialize>(&self, key: &str, values: &[T]) -> Result<u64> {
        self.push_all(key, ListEnd::Left, values)
    }

    /// Push a value at the tail, returning the new length
    pub fn right_push<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<u64> {
        self.push_one(key, ListEnd::Right, value)
    }

    /// Push values at the tail, keeping their order
    pub fn right_push_all<T: Serialize>(&self, key: &str, values: &[T]) -> Result<u64> {
        self.push_all(key, ListEnd::Right, values)
    }

    /// Remove and return the head; `None` if the list is empty or missing
    pub fn left_pop<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.pop(key, ListEnd::Left)
    }

    /// Remove and return the tail; `None` if the list is empty or missing
    pub fn right_pop<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.pop(key, ListEnd::Right)
    }

    /// The whole list, head to tail, without modifying it
    pub fn range<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        self.store
            .list_range(key, 0, -1)?
            .iter()
            .map(|bytes| self.codec.decode(bytes))
            .collect()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn push_one<T: Serialize + ?Sized>(&self, key: &str, end: ListEnd, value: &T) -> Result<u64> {
        let bytes = self.codec.encode(value)?;
        tracing::trace!(key, ?end, "list_push");
        self.store.list_push(key, end, &[bytes])
    }

    fn push_all<T: Serialize>(&self, key: &str, end: ListEnd, values: &[T]) -> Result<u64> {
        if values.is_empty() {
            return self.store.list_len(key);
        }

        let encoded = values
            .iter()
            .map(|value| self.codec.encode(value))
            .collect::<Result<Vec<_>>>()?;

        tracing::trace!(key, ?end, count = encoded.len(), "list_push");
        self.store.list_push(key, end, &encoded)
    }

    fn pop<T: DeserializeOwned>(&self, key: &str, end: ListEnd) -> Result<Option<T>> {
        let bytes = self.store.list_pop(key, end)?;
        self.codec.decode_opt(bytes.as_deref())
    }
}
