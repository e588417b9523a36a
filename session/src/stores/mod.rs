//! Durable key-value storage.
//!
//! The session subsystem persists everything as string values under
//! well-known keys (see [`crate::keys`]). The store is shared by every tab of
//! one origin; writes are last-write-wins at the key level and peers observe
//! them as [`StorageEvent`]s, the way browser tabs observe `storage` events
//! from each other.

use crate::error::StorageError;
use crate::state::TabId;
use tokio::sync::broadcast;

pub mod memory;

pub use memory::MemoryKeyValueStore;

/// Synchronous string key-value storage.
///
/// Mirrors browser-local storage semantics: cheap synchronous access, string
/// values, no transactions. Implementations must be cheaply cloneable handles
/// onto shared state.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the storage area is unavailable.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the storage area is unavailable.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key` if present.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the storage area is unavailable.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// One observed mutation of the shared store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    /// The mutated key.
    pub key: String,
    /// Value before the mutation.
    pub old_value: Option<String>,
    /// Value after the mutation; `None` for removals.
    pub new_value: Option<String>,
    /// The tab that performed the mutation, when known. Consumers skip their
    /// own writes, mirroring browser `storage` event delivery.
    pub origin: Option<TabId>,
}

impl StorageEvent {
    /// Returns `true` when the key was removed.
    #[must_use]
    pub const fn is_removal(&self) -> bool {
        self.new_value.is_none()
    }
}

/// Stores whose mutations can be observed by peers.
pub trait StorageWatch {
    /// Subscribe to mutation events. Events produced before the call are not
    /// replayed.
    fn watch(&self) -> broadcast::Receiver<StorageEvent>;
}

/// Read a key, folding storage failure into absence.
///
/// Authentication state must fail closed: an unreadable store is treated the
/// same as missing data, and the failure is logged.
pub(crate) fn read<K: KeyValueStore>(storage: &K, key: &str) -> Option<String> {
    match storage.get(key) {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(key, %error, "storage read failed; treating as absent");
            None
        },
    }
}

/// Read a key and parse it as an epoch-millisecond timestamp.
///
/// Non-numeric values fold into absence, same as a read failure.
pub(crate) fn read_millis<K: KeyValueStore>(storage: &K, key: &str) -> Option<i64> {
    read(storage, key).and_then(|raw| raw.parse::<i64>().ok())
}
