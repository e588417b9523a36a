//! Cross-tab signaling.
//!
//! Tabs of one origin coordinate through two independent notification
//! backends behind one announce interface: a named broadcast channel (the
//! primary path) and a transient storage key toggle (the fallback for
//! contexts where broadcast delivery is not guaranteed). Receivers treat
//! either as sufficient and stay idempotent against receiving both for the
//! same logical event.

use crate::error::StorageError;
use crate::keys;
use crate::state::TabId;
use crate::stores::KeyValueStore;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Well-known channel name shared by every tab of the application.
pub const SESSION_CHANNEL: &str = "session_sync";

const BUS_CAPACITY: usize = 32;

/// What a peer signal announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeerSignalKind {
    /// A tab tore the session down deliberately (logout or local expiry
    /// detection). Receivers tear down without re-evaluating expiry.
    ForceLogout,
    /// The network layer observed a 401 and tore the session down.
    AutoLogout,
    /// A tab rebuilt its in-memory state from storage; peers may adopt.
    ContextRestored,
    /// A tab completed a fresh login; peers may adopt.
    LoginCompleted,
}

impl PeerSignalKind {
    /// Returns `true` for the teardown signals.
    #[must_use]
    pub const fn is_logout(self) -> bool {
        matches!(self, Self::ForceLogout | Self::AutoLogout)
    }

    /// Stable name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ForceLogout => "force_logout",
            Self::AutoLogout => "auto_logout",
            Self::ContextRestored => "context_restored",
            Self::LoginCompleted => "login_completed",
        }
    }
}

/// One in-flight cross-tab message. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerSignal {
    /// What happened.
    pub kind: PeerSignalKind,
    /// The tab that sent the signal.
    pub tab: TabId,
    /// Send time, epoch milliseconds.
    pub sent_at_millis: i64,
}

/// Anything that can deliver a [`PeerSignal`] toward peer tabs.
pub trait PeerAnnouncer: Send + Sync {
    /// Deliver `signal` to whoever is listening.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when a storage-backed path cannot write.
    /// Announce failures are never fatal to the caller's own teardown.
    fn announce(&self, signal: &PeerSignal) -> Result<(), StorageError>;
}

/// The in-process broadcast channel shared by all tabs of one origin - the
/// counterpart of a named `BroadcastChannel`.
#[derive(Debug, Clone)]
pub struct SessionBus {
    sender: broadcast::Sender<PeerSignal>,
}

impl SessionBus {
    /// Create the origin-wide bus.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BUS_CAPACITY);
        Self { sender }
    }

    /// Subscribe to signals. Signals sent before the call are not replayed.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PeerSignal> {
        self.sender.subscribe()
    }

    /// Send a signal to every subscriber.
    pub fn send(&self, signal: PeerSignal) {
        // A bus with no subscribers simply has nobody to tell.
        let delivered = self.sender.send(signal).unwrap_or(0);
        tracing::debug!(delivered, channel = SESSION_CHANNEL, "peer signal sent");
    }
}

impl Default for SessionBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Primary announcer: the broadcast channel.
#[derive(Debug, Clone)]
pub struct ChannelAnnouncer {
    bus: SessionBus,
}

impl ChannelAnnouncer {
    /// Announce over `bus`.
    #[must_use]
    pub const fn new(bus: SessionBus) -> Self {
        Self { bus }
    }
}

impl PeerAnnouncer for ChannelAnnouncer {
    fn announce(&self, signal: &PeerSignal) -> Result<(), StorageError> {
        self.bus.send(signal.clone());
        Ok(())
    }
}

/// Fallback announcer: toggle the transient `session_logout` key.
///
/// Setting the key notifies every storage watcher; the immediate removal
/// keeps the key from lingering as stale state. Only teardown signals use
/// this path - restoration already surfaces to storage watchers through the
/// snapshot keys it touches.
#[derive(Debug, Clone)]
pub struct StorageSignalAnnouncer<K> {
    storage: K,
}

impl<K: KeyValueStore> StorageSignalAnnouncer<K> {
    /// Announce through `storage`.
    pub const fn new(storage: K) -> Self {
        Self { storage }
    }
}

impl<K: KeyValueStore> PeerAnnouncer for StorageSignalAnnouncer<K> {
    fn announce(&self, signal: &PeerSignal) -> Result<(), StorageError> {
        if !signal.kind.is_logout() {
            return Ok(());
        }
        self.storage
            .set(keys::SESSION_LOGOUT, &signal.sent_at_millis.to_string())?;
        self.storage.remove(keys::SESSION_LOGOUT)
    }
}

/// Belt-and-suspenders announcer: both backends, every time.
///
/// A failing backend is logged and does not stop the other one; announcing
/// can degrade but never abort a teardown.
#[derive(Debug, Clone)]
pub struct DualAnnouncer<P, F> {
    primary: P,
    fallback: F,
}

impl<P, F> DualAnnouncer<P, F>
where
    P: PeerAnnouncer,
    F: PeerAnnouncer,
{
    /// Combine two announcers.
    pub const fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P, F> PeerAnnouncer for DualAnnouncer<P, F>
where
    P: PeerAnnouncer,
    F: PeerAnnouncer,
{
    fn announce(&self, signal: &PeerSignal) -> Result<(), StorageError> {
        if let Err(error) = self.primary.announce(signal) {
            tracing::warn!(kind = signal.kind.as_str(), %error, "primary announce failed");
        }
        if let Err(error) = self.fallback.announce(signal) {
            tracing::warn!(kind = signal.kind.as_str(), %error, "fallback announce failed");
        }
        Ok(())
    }
}
