//! Arena storage with stable, move-only handles.
//!
//! Grounded in `ManagedVariable<T>` from the original source: a mutex-guarded
//! container that hands out a move-only token per element and reports
//! leftover elements at destruction instead of aborting. The original backs
//! its container with a `std::list`; here a [`slotmap::SlotMap`] plays that
//! role, giving O(1) access by key without the list's per-node allocation —
//! the same arena-with-stable-keys idea the teacher crate reaches for
//! through `granite`'s `slotmap` storage backend.
//!
//! `Pool<T>` is used two ways in this crate:
//! - through [`Handle`], an auto-releasing token suited to externally-shared
//!   resources like a [`FieldSet`](crate::field::FieldSet)'s tiles;
//! - through the raw [`PoolKey`] accessors (`insert_raw`/`get_raw`/
//!   `remove_raw`), suited to an arena a single owner walks internally, like
//!   the quadtree's own node storage, where keys must be `Copy` to live
//!   inside parent/child back-references.

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use slotmap::SlotMap;

slotmap::new_key_type! {
    /// A stable key into a [`Pool`], valid until the pool is dropped or the
    /// entry is explicitly removed.
    pub struct PoolKey;
}

struct Inner<T> {
    slots: Mutex<SlotMap<PoolKey, T>>,
}

/// Append-mostly typed storage returning stable handles or keys.
///
/// Allocation order is unobservable; nothing about iteration order or key
/// values should be relied upon beyond "distinct live entries get distinct
/// keys".
pub struct Pool<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Pool<T> {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                slots: Mutex::new(SlotMap::with_key()),
            }),
        }
    }

    /// Inserts `value` and returns an auto-releasing [`Handle`] to it.
    pub fn acquire_from(&self, value: T) -> Handle<T> {
        let key = self.inner.slots.lock().insert(value);
        Handle {
            inner: Arc::clone(&self.inner),
            key: Some(key),
        }
    }

    /// Inserts the value produced by `f` and returns a [`Handle`] to it.
    pub fn acquire_with(&self, f: impl FnOnce() -> T) -> Handle<T> {
        self.acquire_from(f())
    }

    /// Inserts `T::default()` and returns a [`Handle`] to it.
    pub fn acquire(&self) -> Handle<T>
    where
        T: Default,
    {
        self.acquire_from(T::default())
    }

    /// Inserts `value` and returns a raw, `Copy` [`PoolKey`].
    ///
    /// Unlike [`Handle`], a `PoolKey` does not auto-release; the owner is
    /// responsible for calling [`remove_raw`](Self::remove_raw).
    pub fn insert_raw(&self, value: T) -> PoolKey {
        self.inner.slots.lock().insert(value)
    }

    /// Removes and returns the element at `key`, if present.
    pub fn remove_raw(&self, key: PoolKey) -> Option<T> {
        self.inner.slots.lock().remove(key)
    }

    /// Borrows the element at `key` for the duration of the returned guard.
    #[must_use]
    pub fn get_raw(&self, key: PoolKey) -> Option<MappedMutexGuard<'_, T>> {
        let guard = self.inner.slots.lock();
        if !guard.contains_key(key) {
            return None;
        }
        Some(MutexGuard::map(guard, |slots| &mut slots[key]))
    }

    /// The number of live elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.slots.lock().len()
    }

    /// Whether the pool currently holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Debug for Pool<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool").field("len", &self.len()).finish()
    }
}

impl<T> Drop for Inner<T> {
    fn drop(&mut self) {
        let n = self.slots.get_mut().len();
        if n != 0 {
            log::warn!("resource leak: {} element(s) at pool destruction", n);
        }
    }
}

/// A stable, move-only reference to an element inside a [`Pool`].
///
/// Releases its backing element when dropped, unless [`release`](Self::release)
/// already consumed it.
pub struct Handle<T> {
    inner: Arc<Inner<T>>,
    key: Option<PoolKey>,
}

impl<T> Handle<T> {
    /// Borrows the referenced element.
    #[must_use]
    pub fn get(&self) -> MappedMutexGuard<'_, T> {
        let key = self.key.expect("handle used after release");
        MutexGuard::map(self.inner.slots.lock(), |slots| &mut slots[key])
    }

    /// Removes the element from its pool and returns it, consuming the handle
    /// without running its releasing `Drop` behavior again.
    pub fn release(mut self) -> T {
        let key = self.key.take().expect("handle used after release");
        self.inner
            .slots
            .lock()
            .remove(key)
            .expect("handle key missing from its own pool")
    }

    /// The raw key backing this handle, for diagnostics.
    #[must_use]
    pub fn key(&self) -> PoolKey {
        self.key.expect("handle used after release")
    }
}

impl<T> Debug for Handle<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle").field("key", &self.key).finish()
    }
}

impl<T> Drop for Handle<T> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.inner.slots.lock().remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_and_release_roundtrip() {
        let pool: Pool<i32> = Pool::new();
        let h = pool.acquire_from(42);
        assert_eq!(pool.len(), 1);
        assert_eq!(*h.get(), 42);
        let v = h.release();
        assert_eq!(v, 42);
        assert_eq!(pool.len(), 0);
    }

    #[test]
    fn drop_without_release_frees_slot() {
        let pool: Pool<i32> = Pool::new();
        {
            let _h = pool.acquire_from(1);
            assert_eq!(pool.len(), 1);
        }
        assert_eq!(pool.len(), 0);
    }

    #[test]
    fn acquire_uses_default_value() {
        let pool: Pool<i32> = Pool::new();
        let h = pool.acquire();
        assert_eq!(*h.get(), 0);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn raw_keys_are_independent_entries() {
        let pool: Pool<i32> = Pool::new();
        let a = pool.insert_raw(1);
        let b = pool.insert_raw(2);
        assert_ne!(a, b);
        assert_eq!(*pool.get_raw(a).unwrap(), 1);
        assert_eq!(pool.remove_raw(b), Some(2));
        assert!(pool.get_raw(b).is_none());
    }
}
