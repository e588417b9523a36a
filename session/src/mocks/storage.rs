//! Write-counting storage wrapper for testing.

use crate::error::StorageError;
use crate::stores::KeyValueStore;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Wraps a [`KeyValueStore`] and counts writes per key, so throttle tests can
/// assert exact write frequencies. Clones share the counters.
#[derive(Debug, Clone)]
pub struct CountingStore<K> {
    inner: K,
    set_counts: Arc<Mutex<HashMap<String, usize>>>,
}

impl<K: KeyValueStore> CountingStore<K> {
    /// Wrap `inner`.
    #[must_use]
    pub fn new(inner: K) -> Self {
        Self {
            inner,
            set_counts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// How many times `key` was written.
    #[must_use]
    #[allow(clippy::expect_used)] // Test helper
    pub fn writes(&self, key: &str) -> usize {
        self.set_counts
            .lock()
            .expect("counter lock")
            .get(key)
            .copied()
            .unwrap_or(0)
    }
}

impl<K: KeyValueStore> KeyValueStore for CountingStore<K> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    #[allow(clippy::expect_used)] // Test helper
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.set(key, value)?;
        *self
            .set_counts
            .lock()
            .expect("counter lock")
            .entry(key.to_string())
            .or_insert(0) += 1;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key)
    }
}
