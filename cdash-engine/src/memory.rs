//! # In-Memory Store
//!
//! Provide an ordered, lock-protected backend with the same contract as the
//! on-disk store, for tests and throwaway runs.
//!
//! ## Design Principles
//!
//! 1. **Ordered Map**: A `BTreeMap` keeps `scan` in key order like sled does.
//! 2. **Single Lock**: Records are tiny and rare (one per day), so one
//!    `RwLock` is enough; readers never block each other.
//! 3. **Fault Injection**: Writes can be made to fail so callers can exercise
//!    their non-fatal write paths.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::RwLock;

use cdash_common::{CdashError, CdashResult};

use crate::store::KVStore;

/// Ordered in-memory implementation of `KVStore`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Key -> value, ordered by key bytes.
    map: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    /// When set, every `put` fails with `CdashError::Storage`.
    fail_writes: AtomicBool,
    /// Number of successful `put` calls.
    writes: AtomicUsize,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent writes fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Release);
    }

    /// Returns how many writes have been applied.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Acquire)
    }

    /// Returns the number of stored entries.
    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    /// Returns true when nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }
}

impl KVStore for MemoryStore {
    fn get(&self, key: &[u8]) -> CdashResult<Option<Vec<u8>>> {
        Ok(self.map.read().get(key).cloned())
    }

    /// Inserts or replaces a value; the previous value is dropped.
    fn put(&self, key: &[u8], value: &[u8]) -> CdashResult<()> {
        if self.fail_writes.load(Ordering::Acquire) {
            return Err(CdashError::Storage("injected write failure".to_string()));
        }
        self.map.write().insert(key.to_vec(), value.to_vec());
        self.writes.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn scan(&self) -> CdashResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let map = self.map.read();
        Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    fn flush(&self) -> CdashResult<()> {
        Ok(())
    }
}
