// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process keyed mutual exclusion.
//!
//! Events for the same session key, and ownership writes for the same user,
//! must not interleave. [`KeyedLocks`] hands out one async mutex per key and
//! forgets the key once nobody holds or waits on it.

use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A table of async mutexes addressed by key.
pub struct KeyedLocks<K: Eq + Hash + Clone> {
    slots: Arc<DashMap<K, Arc<Mutex<()>>>>,
}

impl<K: Eq + Hash + Clone> Clone for KeyedLocks<K> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
        }
    }
}

impl<K: Eq + Hash + Clone> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            slots: Arc::new(DashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until `key` is free and hold it until the guard drops.
    pub async fn lock(&self, key: K) -> KeyedGuard<K> {
        let slot = self.slots.entry(key.clone()).or_default().clone();
        let guard = slot.lock_owned().await;
        KeyedGuard {
            key,
            guard: Some(guard),
            slots: self.slots.clone(),
        }
    }

    /// Number of keys currently held or awaited.
    pub fn active(&self) -> usize {
        self.slots.len()
    }
}

/// Holds one key of a [`KeyedLocks`] table.
pub struct KeyedGuard<K: Eq + Hash + Clone> {
    key: K,
    guard: Option<OwnedMutexGuard<()>>,
    slots: Arc<DashMap<K, Arc<Mutex<()>>>>,
}

impl<K: Eq + Hash + Clone> Drop for KeyedGuard<K> {
    fn drop(&mut self) {
        // Release first so the strong count below only sees the table and waiters.
        drop(self.guard.take());
        self.slots
            .remove_if(&self.key, |_, slot| Arc::strong_count(slot) == 1);
    }
}
