//! Object Pool
//!
//! Lock-free pool of reusable, non-shareable instances.
//!
//! ## Behavior
//! - `acquire` pops an idle instance or creates a new one (never blocks)
//! - The returned guard hands the instance back on drop, on every exit path
//! - At most `capacity` idle instances are retained; surplus ones are dropped
//! - `Pooled::discard` drops an instance that must not be reused

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam::queue::ArrayQueue;

/// A pool of reusable instances of `T`
///
/// ## Concurrency:
/// - `idle`: bounded lock-free queue (crossbeam `ArrayQueue`)
/// - `created`: atomic counter of every instance ever built by this pool
/// - All methods use `&self`, so a pool can be shared behind an `Arc` or a
///   plain reference across threads when `T: Send`
pub struct Pool<T> {
    /// Name used in log events
    name: &'static str,

    /// Instances waiting to be reused
    idle: ArrayQueue<T>,

    /// Total instances created
    created: AtomicUsize,
}

impl<T> Pool<T> {
    /// Create an empty pool retaining at most `capacity` idle instances
    ///
    /// A capacity of zero is raised to one.
    pub fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            idle: ArrayQueue::new(capacity.max(1)),
            created: AtomicUsize::new(0),
        }
    }

    /// Fill the pool with up to `count` fresh instances
    pub fn prewarm(&self, count: usize, mut create: impl FnMut() -> T) {
        for _ in 0..count.min(self.idle.capacity()) {
            if self.idle.push(create()).is_err() {
                break;
            }
            self.created.fetch_add(1, Ordering::Relaxed);
        }
        tracing::debug!(pool = self.name, idle = self.idle.len(), "Pool prewarmed");
    }

    /// Take an idle instance, or build one with `create` if none is free
    pub fn acquire(&self, create: impl FnOnce() -> T) -> Pooled<'_, T> {
        let item = match self.idle.pop() {
            Some(item) => item,
            None => self.grow(create),
        };
        Pooled {
            pool: self,
            item: Some(item),
        }
    }

    /// Like `acquire`, for constructors that can fail
    pub fn try_acquire<E>(
        &self,
        create: impl FnOnce() -> Result<T, E>,
    ) -> Result<Pooled<'_, T>, E> {
        let item = match self.idle.pop() {
            Some(item) => item,
            None => {
                let item = create()?;
                self.grow(|| item)
            }
        };
        Ok(Pooled {
            pool: self,
            item: Some(item),
        })
    }

    /// Number of idle instances
    pub fn idle(&self) -> usize {
        self.idle.len()
    }

    /// Number of instances created since the pool was built
    pub fn created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    /// Max idle instances retained
    pub fn capacity(&self) -> usize {
        self.idle.capacity()
    }

    fn grow(&self, create: impl FnOnce() -> T) -> T {
        let total = self.created.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::trace!(pool = self.name, total, "Pool empty, creating instance");
        create()
    }

    fn release(&self, item: T) {
        if self.idle.push(item).is_err() {
            tracing::trace!(pool = self.name, "Pool full, dropping surplus instance");
        }
    }
}

impl<T> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("name", &self.name)
            .field("idle", &self.idle.len())
            .field("capacity", &self.idle.capacity())
            .field("created", &self.created())
            .finish()
    }
}

/// Scoped handle on a pooled instance; returns it to the pool on drop
pub struct Pooled<'a, T> {
    pool: &'a Pool<T>,

    /// Always `Some` until dropped or discarded
    item: Option<T>,
}

impl<T> Pooled<'_, T> {
    /// Drop the instance instead of returning it (e.g. a broken connection)
    pub fn discard(mut self) {
        self.item = None;
        tracing::debug!(pool = self.pool.name, "Discarding pooled instance");
    }
}

impl<T> Deref for Pooled<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.item.as_ref().expect("pooled item is present until drop")
    }
}

impl<T> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.item.as_mut().expect("pooled item is present until drop")
    }
}

impl<T> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        if let Some(item) = self.item.take() {
            self.pool.release(item);
        }
    }
}
