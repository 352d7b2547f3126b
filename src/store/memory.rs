//! In-memory Store
//!
//! HashMap-based store with RwLock for concurrency and lazy expiry.
//!
//! ## Expiry
//! Each slot carries an optional deadline. Expired slots are invisible to
//! reads and are removed by the next write touching them, or in bulk by
//! `purge_expired`.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant, SystemTime};

use parking_lot::RwLock;

use crate::error::{CacheError, Result};

use super::{glob_match, DataKind, ListEnd, Store};

/// Data held under one key
#[derive(Debug, Clone)]
enum Data {
    Scalar(Vec<u8>),
    Hash(HashMap<String, Vec<u8>>),
    List(VecDeque<Vec<u8>>),
}

/// A key's data plus its deadline
#[derive(Debug, Clone)]
struct Slot {
    data: Data,
    expires_at: Option<Instant>,
}

impl Slot {
    fn new(data: Data) -> Self {
        Self {
            data,
            expires_at: None,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }

    fn kind(&self) -> DataKind {
        match self.data {
            Data::Scalar(_) => DataKind::Scalar,
            Data::Hash(_) => DataKind::Hash,
            Data::List(_) => DataKind::List,
        }
    }
}

/// In-process implementation of `Store`
///
/// ## Concurrency:
/// - `slots`: Protected by RwLock (many concurrent readers, exclusive writer)
/// - `replace_hash` runs under a single write lock, so readers never observe
///   a half-replaced hash
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: RwLock<HashMap<String, Slot>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) keys
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.slots
            .read()
            .values()
            .filter(|slot| !slot.is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired slot, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut slots = self.slots.write();
        let before = slots.len();
        slots.retain(|_, slot| !slot.is_expired(now));
        let purged = before - slots.len();

        if purged > 0 {
            tracing::debug!(purged, remaining = slots.len(), "Purged expired keys");
        }
        purged
    }

    /// Remove everything
    pub fn clear(&self) {
        self.slots.write().clear();
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Read a live slot under the read lock
    fn with_live<R>(&self, key: &str, f: impl FnOnce(Option<&Slot>) -> R) -> R {
        let now = Instant::now();
        let slots = self.slots.read();
        f(slots.get(key).filter(|slot| !slot.is_expired(now)))
    }

    /// Live hash at `key`, or `WrongType`
    fn read_hash<R>(
        &self,
        key: &str,
        f: impl FnOnce(Option<&HashMap<String, Vec<u8>>>) -> R,
    ) -> Result<R> {
        self.with_live(key, |slot| match slot.map(|s| &s.data) {
            None => Ok(f(None)),
            Some(Data::Hash(hash)) => Ok(f(Some(hash))),
            Some(_) => Err(CacheError::wrong_type(key, "hash")),
        })
    }

    /// Live list at `key`, or `WrongType`
    fn read_list<R>(&self, key: &str, f: impl FnOnce(Option<&VecDeque<Vec<u8>>>) -> R) -> Result<R> {
        self.with_live(key, |slot| match slot.map(|s| &s.data) {
            None => Ok(f(None)),
            Some(Data::List(list)) => Ok(f(Some(list))),
            Some(_) => Err(CacheError::wrong_type(key, "list")),
        })
    }

    /// Set or clear the deadline of a live key under the write lock
    fn set_deadline(&self, key: &str, ttl: Duration) -> Result<bool> {
        let now = Instant::now();
        let mut slots = self.slots.write();
        evict_if_expired(&mut slots, key, now);

        if ttl.is_zero() {
            return Ok(slots.remove(key).is_some());
        }

        let deadline = deadline_after(now, ttl)?;
        match slots.get_mut(key) {
            Some(slot) => {
                slot.expires_at = Some(deadline);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Remove `key` if its deadline has passed
fn evict_if_expired(slots: &mut HashMap<String, Slot>, key: &str, now: Instant) {
    if slots.get(key).is_some_and(|slot| slot.is_expired(now)) {
        slots.remove(key);
    }
}

/// `now + ttl`, or `InvalidExpiration` if the clock cannot represent it
fn deadline_after(now: Instant, ttl: Duration) -> Result<Instant> {
    now.checked_add(ttl).ok_or_else(|| {
        CacheError::InvalidExpiration(format!("TTL out of range: {:?}", ttl))
    })
}

/// Resolve Redis-style inclusive, possibly negative indexes against `len`
fn normalize_range(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };

    if len == 0 || start > stop || start >= len || stop < 0 {
        return None;
    }
    Some((start as usize, stop as usize))
}

impl Store for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        let expires_at = ttl
            .map(|ttl| deadline_after(Instant::now(), ttl))
            .transpose()?;
        let slot = Slot {
            data: Data::Scalar(value.to_vec()),
            expires_at,
        };
        self.slots.write().insert(key.to_string(), slot);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.with_live(key, |slot| match slot.map(|s| &s.data) {
            None => Ok(None),
            Some(Data::Scalar(bytes)) => Ok(Some(bytes.clone())),
            Some(_) => Err(CacheError::wrong_type(key, "string")),
        })
    }

    fn multi_get(&self, keys: &[&str]) -> Result<Vec<Option<Vec<u8>>>> {
        let now = Instant::now();
        let slots = self.slots.read();

        Ok(keys
            .iter()
            .map(|key| match slots.get(*key) {
                Some(slot) if !slot.is_expired(now) => match &slot.data {
                    Data::Scalar(bytes) => Some(bytes.clone()),
                    _ => None,
                },
                _ => None,
            })
            .collect())
    }

    fn delete(&self, keys: &[&str]) -> Result<u64> {
        let now = Instant::now();
        let mut slots = self.slots.write();

        let mut removed = 0;
        for key in keys {
            if let Some(slot) = slots.remove(*key) {
                if !slot.is_expired(now) {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.with_live(key, |slot| slot.is_some()))
    }

    fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        self.set_deadline(key, ttl)
    }

    fn expire_at(&self, key: &str, at: SystemTime) -> Result<bool> {
        // A deadline in the past deletes the key
        let ttl = at
            .duration_since(SystemTime::now())
            .unwrap_or(Duration::ZERO);
        self.set_deadline(key, ttl)
    }

    fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        let now = Instant::now();
        Ok(self.with_live(key, |slot| {
            slot.and_then(|s| s.expires_at)
                .map(|deadline| deadline.saturating_duration_since(now))
        }))
    }

    fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let now = Instant::now();
        let slots = self.slots.read();

        Ok(slots
            .iter()
            .filter(|(key, slot)| !slot.is_expired(now) && glob_match(pattern, key))
            .map(|(key, _)| key.clone())
            .collect())
    }

    fn key_type(&self, key: &str) -> Result<DataKind> {
        Ok(self.with_live(key, |slot| slot.map_or(DataKind::None, Slot::kind)))
    }

    fn hash_set(&self, key: &str, field: &str, value: &[u8]) -> Result<()> {
        self.hash_set_all(key, &[(field.to_string(), value.to_vec())])
    }

    fn hash_set_all(&self, key: &str, entries: &[(String, Vec<u8>)]) -> Result<()> {
        let now = Instant::now();
        let mut slots = self.slots.write();
        evict_if_expired(&mut slots, key, now);

        let slot = slots
            .entry(key.to_string())
            .or_insert_with(|| Slot::new(Data::Hash(HashMap::new())));

        match &mut slot.data {
            Data::Hash(hash) => {
                for (field, value) in entries {
                    hash.insert(field.clone(), value.clone());
                }
                Ok(())
            }
            _ => Err(CacheError::wrong_type(key, "hash")),
        }
    }

    fn replace_hash(&self, key: &str, entries: &[(String, Vec<u8>)]) -> Result<()> {
        let mut slots = self.slots.write();

        if entries.is_empty() {
            slots.remove(key);
            return Ok(());
        }

        let hash = entries.iter().cloned().collect();
        slots.insert(key.to_string(), Slot::new(Data::Hash(hash)));
        Ok(())
    }

    fn hash_get(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>> {
        self.read_hash(key, |hash| hash.and_then(|h| h.get(field).cloned()))
    }

    fn hash_get_all(&self, key: &str) -> Result<HashMap<String, Vec<u8>>> {
        self.read_hash(key, |hash| hash.cloned().unwrap_or_default())
    }

    fn hash_multi_get(&self, key: &str, fields: &[&str]) -> Result<Vec<Option<Vec<u8>>>> {
        self.read_hash(key, |hash| {
            fields
                .iter()
                .map(|field| hash.and_then(|h| h.get(*field).cloned()))
                .collect()
        })
    }

    fn list_push(&self, key: &str, end: ListEnd, values: &[Vec<u8>]) -> Result<u64> {
        let now = Instant::now();
        let mut slots = self.slots.write();
        evict_if_expired(&mut slots, key, now);

        if values.is_empty() {
            return match slots.get(key).map(|s| &s.data) {
                None => Ok(0),
                Some(Data::List(list)) => Ok(list.len() as u64),
                Some(_) => Err(CacheError::wrong_type(key, "list")),
            };
        }

        let slot = slots
            .entry(key.to_string())
            .or_insert_with(|| Slot::new(Data::List(VecDeque::new())));

        match &mut slot.data {
            Data::List(list) => {
                for value in values {
                    match end {
                        ListEnd::Left => list.push_front(value.clone()),
                        ListEnd::Right => list.push_back(value.clone()),
                    }
                }
                Ok(list.len() as u64)
            }
            _ => Err(CacheError::wrong_type(key, "list")),
        }
    }

    fn list_pop(&self, key: &str, end: ListEnd) -> Result<Option<Vec<u8>>> {
        let now = Instant::now();
        let mut slots = self.slots.write();
        evict_if_expired(&mut slots, key, now);

        let Some(slot) = slots.get_mut(key) else {
            return Ok(None);
        };

        let (popped, now_empty) = match &mut slot.data {
            Data::List(list) => {
                let popped = match end {
                    ListEnd::Left => list.pop_front(),
                    ListEnd::Right => list.pop_back(),
                };
                (popped, list.is_empty())
            }
            _ => return Err(CacheError::wrong_type(key, "list")),
        };

        // An emptied list no longer exists
        if now_empty {
            slots.remove(key);
        }
        Ok(popped)
    }

    fn list_range(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Vec<u8>>> {
        self.read_list(key, |list| {
            let Some(list) = list else {
                return Vec::new();
            };
            match normalize_range(list.len(), start, stop) {
                Some((from, to)) => list.range(from..=to).cloned().collect(),
                None => Vec::new(),
            }
        })
    }

    fn list_len(&self, key: &str) -> Result<u64> {
        self.read_list(key, |list| list.map_or(0, |l| l.len() as u64))
    }
}
