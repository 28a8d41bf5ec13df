//! A reader-preferring read/write lock guarding [`crate::pager::Pager`]
//! mutation (spec.md §5).
//!
//! Ported from the acquisition discipline `dbstuff/cache.py`'s
//! `LRUCache.rwlock` was built on (`read_access`/`write_access` context
//! managers around a `ReadWriteLock` primitive) into a first-class Rust
//! type with scoped RAII guards, per spec.md §9's design note: "model as a
//! first-class primitive with scoped acquire/release; the scope boundary
//! guarantees release on every exit path including errors." This crate
//! hand-rolls the primitive on `std::sync::{Mutex, Condvar}` rather than
//! reaching for `parking_lot::RwLock` (used elsewhere in the example pack)
//! because stock `RwLock` implementations don't guarantee the
//! reader-preference spec.md requires: a writer here excludes *new*
//! readers as soon as it starts waiting, but still waits for readers
//! already in their critical section to finish before it proceeds.

use std::ops::{Deref, DerefMut};
use std::sync::{Condvar, Mutex, MutexGuard};

/// Reader-preferring read/write lock around a `T`.
///
/// Readers increment a counter under `state` and may run concurrently;
/// a writer takes `state` (excluding new readers from entering) and waits
/// on `readers_gone` until the counter drops to zero, then runs alone.
pub struct RwLock<T> {
    state: Mutex<State>,
    readers_gone: Condvar,
    data: std::cell::UnsafeCell<T>,
}

struct State {
    readers: usize,
}

// SAFETY: all access to `data` is mediated by `state`/`readers_gone`: a
// `ReadGuard` only exists while `readers` is incremented under `state`'s
// mutex, and a `WriteGuard` only exists while the writer holds `state`'s
// mutex continuously for the guard's lifetime and has observed
// `readers == 0`. Neither guard hands out overlapping mutable access.
unsafe impl<T: Send> Send for RwLock<T> {}
unsafe impl<T: Send> Sync for RwLock<T> {}

impl<T> RwLock<T> {
    pub fn new(data: T) -> Self {
        Self {
            state: Mutex::new(State { readers: 0 }),
            readers_gone: Condvar::new(),
            data: std::cell::UnsafeCell::new(data),
        }
    }

    /// Acquire a shared read guard. Blocks only if a writer currently holds
    /// the lock; does not block behind a writer merely *waiting* to
    /// acquire, since readers and the waiting writer both contend on the
    /// same `state` mutex and readers never hold it longer than it takes
    /// to bump the counter.
    pub fn read(&self) -> ReadGuard<'_, T> {
        let mut state = self.state.lock().expect("rwlock state poisoned");
        state.readers += 1;
        drop(state);
        ReadGuard { lock: self }
    }

    /// Consume the lock and recover the wrapped value. Taking `self` by
    /// value proves no guard can be outstanding, so this never blocks.
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }

    /// Acquire the exclusive write guard. Blocks until every reader that
    /// already entered has released (`readers == 0`); a writer that starts
    /// waiting holds `state` continuously, so no new reader can slip in
    /// ahead of it.
    pub fn write(&self) -> WriteGuard<'_, T> {
        let mut state = self.state.lock().expect("rwlock state poisoned");
        while state.readers > 0 {
            state = self
                .readers_gone
                .wait(state)
                .expect("rwlock condvar poisoned");
        }
        WriteGuard {
            lock: self,
            _state: state,
        }
    }
}

/// RAII shared-read guard. Releasing (drop) decrements the reader count
/// and wakes any writer waiting for it to reach zero.
pub struct ReadGuard<'a, T> {
    lock: &'a RwLock<T>,
}

impl<T> Deref for ReadGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> Drop for ReadGuard<'_, T> {
    fn drop(&mut self) {
        let mut state = self.lock.state.lock().expect("rwlock state poisoned");
        state.readers -= 1;
        if state.readers == 0 {
            self.lock.readers_gone.notify_all();
        }
    }
}

/// RAII exclusive-write guard. Holds `state`'s mutex for its whole
/// lifetime, so no reader or writer can acquire until this guard drops.
pub struct WriteGuard<'a, T> {
    lock: &'a RwLock<T>,
    _state: MutexGuard<'a, State>,
}

impl<T> Deref for WriteGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for WriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.data.get() }
    }
}
