//! Per-key mutual exclusion
//!
//! A [`LockTable`] hands out one mutex per key (account or loan id). Ledger
//! operations hold the lock for the whole read-validate-commit sequence, so the
//! balance a check sees cannot go stale before the write lands.
//!
//! # Lock Ordering
//!
//! [`LockTable::with_pair`] always acquires the smaller key first. Two transfers
//! in opposite directions between the same accounts therefore queue on the same
//! first lock instead of deadlocking.

use dashmap::DashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

/// Table of lazily created per-key locks
#[derive(Debug)]
pub struct LockTable<K>
where
    K: Eq + Hash,
{
    locks: DashMap<K, Arc<Mutex<()>>>,
}

impl<K> Default for LockTable<K>
where
    K: Eq + Hash + Ord + Copy,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> LockTable<K>
where
    K: Eq + Hash + Ord + Copy,
{
    pub fn new() -> Self {
        LockTable {
            locks: DashMap::new(),
        }
    }

    /// Run `f` while holding the lock for `key`
    ///
    /// A lock poisoned by a panicking holder is recovered; the guarded data is
    /// `()` and the store's own commit is all-or-nothing.
    pub fn with_lock<R>(&self, key: K, f: impl FnOnce() -> R) -> R {
        let lock = self.lock_for(key);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    /// Run `f` while holding the locks for both keys, smaller key first
    ///
    /// Equal keys take the single lock once.
    pub fn with_pair<R>(&self, a: K, b: K, f: impl FnOnce() -> R) -> R {
        if a == b {
            return self.with_lock(a, f);
        }
        let (first, second) = if a < b { (a, b) } else { (b, a) };

        let first = self.lock_for(first);
        let second = self.lock_for(second);
        let _first = first.lock().unwrap_or_else(PoisonError::into_inner);
        let _second = second.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    /// Number of keys that have been locked at least once
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    fn lock_for(&self, key: K) -> Arc<Mutex<()>> {
        // The shard guard from `entry` is released before the mutex is taken
        Arc::clone(&self.locks.entry(key).or_default())
    }
}
