//! Per-key transaction locks
//!
//! Provides [`KeyLocks`], a registry of mutexes keyed on the source-side
//! [`LinkKey`]. Replacements on the same `(from, name)` serialize on one mutex;
//! replacements on different keys never wait on each other.

use dashmap::DashMap;
use parking_lot::{ArcMutexGuard, Mutex, RawMutex};
use reslink_types::LinkKey;
use std::sync::Arc;
use std::time::Duration;

type LockTable = DashMap<LinkKey, Arc<Mutex<()>>>;

/// Registry of per-key mutexes
///
/// Entries are created on first use and removed when the last holder or
/// waiter lets go, so the table only holds keys with live transactions.
#[derive(Debug, Default, Clone)]
pub struct KeyLocks {
    table: Arc<LockTable>,
}

impl KeyLocks {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `key`, waiting at most `timeout`
    ///
    /// Returns `None` if another holder kept the key for the whole timeout.
    #[must_use]
    pub fn acquire(&self, key: &LinkKey, timeout: Duration) -> Option<KeyLock> {
        let mutex = self
            .table
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();

        match mutex.try_lock_arc_for(timeout) {
            Some(guard) => Some(KeyLock {
                key: key.clone(),
                guard: Some(guard),
                table: Arc::clone(&self.table),
            }),
            None => {
                drop(mutex);
                prune(&self.table, key);
                None
            }
        }
    }

    /// True if some transaction currently holds `key`
    #[must_use]
    pub fn is_held(&self, key: &LinkKey) -> bool {
        self.table
            .get(key)
            .is_some_and(|entry| entry.value().is_locked())
    }

    /// Number of keys with live holders or waiters
    #[inline]
    #[must_use]
    pub fn active(&self) -> usize {
        self.table.len()
    }
}

fn prune(table: &LockTable, key: &LinkKey) {
    table.remove_if(key, |_, mutex| Arc::strong_count(mutex) == 1);
}

/// Held transaction lock on one [`LinkKey`]; released on drop
pub struct KeyLock {
    key: LinkKey,
    guard: Option<ArcMutexGuard<RawMutex, ()>>,
    table: Arc<LockTable>,
}

impl KeyLock {
    /// Locked key
    #[inline]
    #[must_use]
    pub fn key(&self) -> &LinkKey {
        &self.key
    }
}

impl std::fmt::Debug for KeyLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyLock").field("key", &self.key).finish()
    }
}

impl Drop for KeyLock {
    fn drop(&mut self) {
        // Unlock before pruning so the strong count no longer includes our guard.
        self.guard.take();
        prune(&self.table, &self.key);
    }
}
