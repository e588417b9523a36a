//! In-memory shared-origin store.
//!
//! One [`MemoryKeyValueStore`] plays the role of the origin's durable storage
//! area: every tab holds a cheap clone of the same handle, scoped with its
//! own [`TabId`] so mutation events carry their originator.

use super::{KeyValueStore, StorageEvent, StorageWatch};
use crate::error::StorageError;
use crate::state::TabId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug)]
struct OriginArea {
    map: Mutex<HashMap<String, String>>,
    events: broadcast::Sender<StorageEvent>,
}

/// Shared-origin in-memory key-value store.
///
/// Clones share the same storage area. [`MemoryKeyValueStore::for_tab`]
/// produces the handle a tab writes through; its mutations are published to
/// every watcher tagged with that tab's id.
#[derive(Debug, Clone)]
pub struct MemoryKeyValueStore {
    area: Arc<OriginArea>,
    origin: Option<TabId>,
}

impl MemoryKeyValueStore {
    /// Create a fresh, empty storage area.
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            area: Arc::new(OriginArea {
                map: Mutex::new(HashMap::new()),
                events,
            }),
            origin: None,
        }
    }

    /// A handle onto the same area whose writes are attributed to `tab`.
    #[must_use]
    pub fn for_tab(&self, tab: TabId) -> Self {
        Self {
            area: Arc::clone(&self.area),
            origin: Some(tab),
        }
    }

    /// All keys currently present. Primarily a test aid.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the storage area is unavailable.
    pub fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.lock_map()?.keys().cloned().collect())
    }

    fn lock_map(&self) -> Result<MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.area
            .map
            .lock()
            .map_err(|_| StorageError::Unavailable("storage mutex poisoned".to_string()))
    }

    fn publish(&self, key: &str, old_value: Option<String>, new_value: Option<String>) {
        // No receivers is fine; there is nobody to notify.
        let _ = self.area.events.send(StorageEvent {
            key: key.to_string(),
            old_value,
            new_value,
            origin: self.origin.clone(),
        });
    }
}

impl Default for MemoryKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock_map()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let old_value = {
            let mut map = self.lock_map()?;
            map.insert(key.to_string(), value.to_string())
        };
        // Events announce changes; overwriting with the same value is not one.
        if old_value.as_deref() != Some(value) {
            self.publish(key, old_value, Some(value.to_string()));
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let old_value = {
            let mut map = self.lock_map()?;
            map.remove(key)
        };
        if let Some(old) = old_value {
            self.publish(key, Some(old), None);
        }
        Ok(())
    }
}

impl StorageWatch for MemoryKeyValueStore {
    fn watch(&self) -> broadcast::Receiver<StorageEvent> {
        self.area.events.subscribe()
    }
}
