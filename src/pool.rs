//! Object pools for per-request scratch values.
//!
//! A [`Pool`] is a mutex-protected free list. Values are reset through the
//! [`Recycle`] trait when they come back, and values that grew past the pool's
//! retain limit are dropped instead of pooled so that one unusually large
//! request cannot inflate the memory the pool holds on to.

use std::fmt;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use parking_lot::Mutex;

/// A value that can be cleared and handed out again by a [`Pool`].
pub trait Recycle: Default {
    /// Clears `self` for reuse. Returns `false` if the value grew past
    /// `limit`, in which case the pool drops it.
    fn recycle(&mut self, limit: usize) -> bool;
}

impl Recycle for Vec<u8> {
    fn recycle(&mut self, limit: usize) -> bool {
        self.clear();
        self.capacity() <= limit
    }
}

/// A bounded pool of reusable values.
///
/// ```rust
/// use bolt::pool::Pool;
///
/// let pool: Pool<Vec<u8>> = Pool::new(16, 1024);
///
/// let mut buf = pool.take();
/// buf.extend_from_slice(b"scratch");
/// pool.release(buf);
/// assert_eq!(pool.idle(), 1);
///
/// // recycled values come back empty
/// assert!(pool.take().is_empty());
/// ```
pub struct Pool<T> {
    idle: Mutex<Vec<T>>,
    max_idle: usize,
    retain_limit: usize,
}

impl<T: Recycle> Pool<T> {
    /// Creates a pool that keeps at most `max_idle` values, each no larger
    /// than `retain_limit` as judged by [`Recycle::recycle`].
    pub fn new(max_idle: usize, retain_limit: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            max_idle,
            retain_limit,
        }
    }

    /// Takes an empty value out of the pool, creating one if the pool is empty.
    pub fn take(&self) -> T {
        self.idle.lock().pop().unwrap_or_default()
    }

    /// Returns a value to the pool.
    pub fn release(&self, mut value: T) {
        if !value.recycle(self.retain_limit) {
            return;
        }

        let mut idle = self.idle.lock();
        if idle.len() < self.max_idle {
            idle.push(value);
        }
    }

    /// Takes a value wrapped in a guard that releases it on drop.
    pub fn acquire(self: &Arc<Self>) -> Pooled<T> {
        Pooled {
            value: self.take(),
            pool: Some(Arc::clone(self)),
        }
    }

    /// The number of values currently waiting in the pool.
    pub fn idle(&self) -> usize {
        self.idle.lock().len()
    }

    /// The size threshold past which released values are dropped.
    pub fn retain_limit(&self) -> usize {
        self.retain_limit
    }
}

impl<T> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("idle", &self.idle.lock().len())
            .field("max_idle", &self.max_idle)
            .field("retain_limit", &self.retain_limit)
            .finish()
    }
}

/// A pooled value that goes back to its pool when dropped.
pub struct Pooled<T: Recycle> {
    value: T,
    pool: Option<Arc<Pool<T>>>,
}

impl<T: Recycle> Pooled<T> {
    /// Wraps a value that does not belong to any pool.
    pub fn detached(value: T) -> Self {
        Self { value, pool: None }
    }
}

impl<T: Recycle> Deref for Pooled<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: Recycle> DerefMut for Pooled<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: Recycle> Drop for Pooled<T> {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.release(mem::take(&mut self.value));
        }
    }
}

impl<T: Recycle + fmt::Debug> fmt::Debug for Pooled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_buffers_are_dropped() {
        let pool: Pool<Vec<u8>> = Pool::new(4, 64);

        pool.release(Vec::with_capacity(1024));
        assert_eq!(pool.idle(), 0);

        pool.release(Vec::with_capacity(32));
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn idle_count_is_bounded() {
        let pool: Pool<Vec<u8>> = Pool::new(2, 64);
        for _ in 0..5 {
            pool.release(Vec::new());
        }
        assert_eq!(pool.idle(), 2);
    }

    #[test]
    fn guard_returns_value_on_drop() {
        let pool = Arc::new(Pool::<Vec<u8>>::new(4, 64));
        {
            let mut buf = pool.acquire();
            buf.push(1);
            assert_eq!(pool.idle(), 0);
        }
        assert_eq!(pool.idle(), 1);
        assert!(pool.acquire().is_empty());
    }

    #[test]
    fn detached_guard_is_not_pooled() {
        let pool = Arc::new(Pool::<Vec<u8>>::new(4, 64));
        drop(Pooled::detached(vec![1, 2, 3]));
        assert_eq!(pool.idle(), 0);
    }
}
