//! Session environment.
//!
//! All external dependencies the session reducer needs, injected behind
//! traits. The tab identifier is constructed once at tab startup and passed
//! in here explicitly - never an ambient singleton.

use crate::broadcast::PeerAnnouncer;
use crate::providers::{IdentityGateway, Navigator, Notifier};
use crate::state::TabId;
use crate::stores::KeyValueStore;
use crosstab_core::environment::Clock;
use std::sync::Arc;

/// Session environment.
///
/// # Type Parameters
///
/// - `K`: durable key-value store
/// - `A`: peer announcer (broadcast + storage fallback)
/// - `N`: navigator
/// - `T`: notifier
/// - `I`: identity/organization gateway
#[derive(Clone)]
pub struct SessionEnvironment<K, A, N, T, I>
where
    K: KeyValueStore + Clone,
    A: PeerAnnouncer + Clone,
    N: Navigator + Clone,
    T: Notifier + Clone,
    I: IdentityGateway + Clone,
{
    /// Durable key-value store, scoped to this tab.
    pub storage: K,

    /// Peer announcer.
    pub announcer: A,

    /// Navigation sink.
    pub navigator: N,

    /// Notification sink.
    pub notifier: T,

    /// Identity/organization backend.
    pub identity: I,

    /// Time source.
    pub clock: Arc<dyn Clock>,

    /// This tab's identifier.
    pub tab: TabId,
}

impl<K, A, N, T, I> SessionEnvironment<K, A, N, T, I>
where
    K: KeyValueStore + Clone,
    A: PeerAnnouncer + Clone,
    N: Navigator + Clone,
    T: Notifier + Clone,
    I: IdentityGateway + Clone,
{
    /// Create a new session environment.
    pub fn new(
        storage: K,
        announcer: A,
        navigator: N,
        notifier: T,
        identity: I,
        clock: Arc<dyn Clock>,
        tab: TabId,
    ) -> Self {
        Self {
            storage,
            announcer,
            navigator,
            notifier,
            identity,
            clock,
            tab,
        }
    }
}
