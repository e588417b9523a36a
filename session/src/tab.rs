//! The per-tab shell.
//!
//! A [`Tab`] wires one session state machine to its surroundings: the shared
//! origin store, the broadcast bus, the activity tracker, and the
//! low-frequency re-validation safety net. It is the integration surface the
//! rest of the application talks to - route guards call
//! [`Tab::validate_session`], the 401 interceptor calls
//! [`Tab::on_unauthorized`], page mounts happen in [`Tab::open`].
//!
//! Event-driven triggers (storage mutations, broadcast signals, visibility)
//! are primary; the periodic tick exists only to catch anything those miss.

use crate::actions::SessionAction;
use crate::activity::{ActivityTracker, InteractionKind, write_last_activity};
use crate::broadcast::{ChannelAnnouncer, DualAnnouncer, SessionBus, StorageSignalAnnouncer};
use crate::config::SessionConfig;
use crate::environment::SessionEnvironment;
use crate::expiry::{self, ExpiryVerdict};
use crate::keys;
use crate::providers::{IdentityGateway, Navigator, Notifier};
use crate::reducers::SessionReducer;
use crate::state::{
    OrganizationState, SessionPhase, SessionState, TabId, TokenSet, UserSnapshot,
};
use crate::stores::{MemoryKeyValueStore, StorageWatch, read_millis};
use crate::token::token_set_valid;
use crosstab_core::environment::Clock;
use crosstab_runtime::Store;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// The announcer a tab uses: broadcast channel plus storage-key fallback.
pub type TabAnnouncer = DualAnnouncer<ChannelAnnouncer, StorageSignalAnnouncer<MemoryKeyValueStore>>;

/// The environment a tab runs its reducer with.
pub type TabEnvironment<I, N, T> =
    SessionEnvironment<MemoryKeyValueStore, TabAnnouncer, N, T, I>;

type TabStore<I, N, T> = Store<
    SessionState,
    SessionAction,
    TabEnvironment<I, N, T>,
    SessionReducer<MemoryKeyValueStore, TabAnnouncer, N, T, I>,
>;

/// One tab of the application.
///
/// Dropping a tab aborts its listener tasks, the way closing a browser tab
/// drops its subscriptions.
pub struct Tab<I, N, T>
where
    I: IdentityGateway + Clone + Send + Sync + 'static,
    N: Navigator + Clone + Send + Sync + 'static,
    T: Notifier + Clone + Send + Sync + 'static,
{
    id: TabId,
    store: TabStore<I, N, T>,
    storage: MemoryKeyValueStore,
    tracker: Arc<ActivityTracker<MemoryKeyValueStore>>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
    listeners: Vec<JoinHandle<()>>,
}

impl<I, N, T> Tab<I, N, T>
where
    I: IdentityGateway + Clone + Send + Sync + 'static,
    N: Navigator + Clone + Send + Sync + 'static,
    T: Notifier + Clone + Send + Sync + 'static,
{
    /// Open a tab against the shared origin store and bus, and run the mount
    /// validation (restoring in-memory state from storage when possible).
    pub async fn open(
        origin: &MemoryKeyValueStore,
        bus: &SessionBus,
        identity: I,
        navigator: N,
        notifier: T,
        clock: Arc<dyn Clock>,
        config: SessionConfig,
    ) -> Self {
        let id = TabId::generate(clock.as_ref());
        let storage = origin.for_tab(id.clone());
        let announcer = DualAnnouncer::new(
            ChannelAnnouncer::new(bus.clone()),
            StorageSignalAnnouncer::new(storage.clone()),
        );
        let environment = SessionEnvironment::new(
            storage.clone(),
            announcer,
            navigator,
            notifier,
            identity,
            Arc::clone(&clock),
            id.clone(),
        );
        let store: TabStore<I, N, T> = Store::new(
            SessionState::new(),
            SessionReducer::new(config.clone()),
            environment,
        );
        let tracker = Arc::new(ActivityTracker::new(
            storage.clone(),
            Arc::clone(&clock),
            config.activity_throttle,
        ));

        let mut listeners = Vec::with_capacity(3);
        listeners.push(Self::spawn_storage_listener(
            origin,
            &store,
            &tracker,
            id.clone(),
        ));
        listeners.push(Self::spawn_bus_listener(bus, &store, &tracker, id.clone()));
        if let Some(interval) = config.revalidate_interval {
            listeners.push(Self::spawn_revalidation_tick(&store, &tracker, interval));
        }

        let tab = Self {
            id,
            store,
            storage,
            tracker,
            clock,
            config,
            listeners,
        };

        tab.store.send(SessionAction::PageLoaded).await;
        tab.sync_tracker().await;
        tab
    }

    /// This tab's identifier.
    #[must_use]
    pub const fn id(&self) -> &TabId {
        &self.id
    }

    /// Run the validation routine now. Returns `true` when the session
    /// survived it.
    pub async fn validate_session(&self) -> bool {
        self.store.send(SessionAction::ValidateRequested).await;
        self.sync_tracker().await;
        !self.phase().await.is_terminal()
    }

    /// Explicit sign-out. Silent: no expiry notice is shown.
    pub async fn logout(&self) {
        self.store.send(SessionAction::LogoutRequested).await;
        self.sync_tracker().await;
    }

    /// Entry point for the 401 interceptor: an authenticated backend call was
    /// rejected, tear the session down.
    pub async fn on_unauthorized(&self) {
        self.store.send(SessionAction::RemoteUnauthorized).await;
        self.sync_tracker().await;
    }

    /// Complete a login with the tokens issued by the token endpoint. Drives
    /// the identity and organization fetches before returning.
    pub async fn login(&self, tokens: TokenSet) {
        self.store
            .send(SessionAction::LoginSucceeded { tokens })
            .await;
        self.sync_tracker().await;
    }

    /// Switch the active organization.
    pub async fn select_organization(&self, organization_id: &str) {
        self.store
            .send(SessionAction::OrganizationSelected {
                organization_id: organization_id.to_string(),
            })
            .await;
    }

    /// The document became visible again; re-validate.
    pub async fn visibility_regained(&self) {
        self.store.send(SessionAction::VisibilityRegained).await;
        self.sync_tracker().await;
    }

    /// Feed one user-interaction signal to the activity tracker. Returns
    /// `true` if it produced a storage write.
    pub fn interaction(&self, kind: InteractionKind) -> bool {
        self.tracker.record(kind)
    }

    /// Bump `last_activity` unconditionally (bypassing the throttle).
    pub fn update_last_activity(&self) {
        write_last_activity(&self.storage, self.clock.now_millis());
    }

    /// Derived session validity: authenticated, tokens usable, within both
    /// timeouts. Read-only; does not trigger validation.
    pub async fn is_session_valid(&self) -> bool {
        if !self.phase().await.is_authenticated() {
            return false;
        }
        let now = self.clock.now();
        if !token_set_valid(&self.storage, now) {
            return false;
        }
        let verdict = expiry::evaluate(
            read_millis(&self.storage, keys::LOGIN_TIME),
            read_millis(&self.storage, keys::LAST_ACTIVITY),
            now.timestamp_millis(),
            &self.config.expiry_policy(),
        );
        verdict == ExpiryVerdict::Active
    }

    /// Current lifecycle phase.
    pub async fn phase(&self) -> SessionPhase {
        self.store.state(|state| state.phase).await
    }

    /// Current in-memory user snapshot.
    pub async fn user(&self) -> Option<UserSnapshot> {
        self.store.state(|state| state.user.clone()).await
    }

    /// Current in-memory organization state.
    pub async fn organizations(&self) -> OrganizationState {
        self.store.state(|state| state.organizations.clone()).await
    }

    /// Whether the activity tracker currently has its listeners attached.
    #[must_use]
    pub fn is_tracking_activity(&self) -> bool {
        self.tracker.is_listening()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Listener tasks
    // ═══════════════════════════════════════════════════════════════════

    fn spawn_storage_listener(
        origin: &MemoryKeyValueStore,
        store: &TabStore<I, N, T>,
        tracker: &Arc<ActivityTracker<MemoryKeyValueStore>>,
        id: TabId,
    ) -> JoinHandle<()> {
        let mut events = origin.watch();
        let store = store.clone();
        let tracker = Arc::clone(tracker);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        // A tab does not observe its own writes.
                        if event.origin.as_ref() == Some(&id) {
                            continue;
                        }
                        store.send(SessionAction::StorageChanged(event)).await;
                        sync_tracker_to_phase(&store, &tracker).await;
                    },
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "storage event listener lagged");
                    },
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    fn spawn_bus_listener(
        bus: &SessionBus,
        store: &TabStore<I, N, T>,
        tracker: &Arc<ActivityTracker<MemoryKeyValueStore>>,
        id: TabId,
    ) -> JoinHandle<()> {
        let mut signals = bus.subscribe();
        let store = store.clone();
        let tracker = Arc::clone(tracker);
        tokio::spawn(async move {
            loop {
                match signals.recv().await {
                    Ok(signal) => {
                        // The channel does not echo to the sender.
                        if signal.tab == id {
                            continue;
                        }
                        store.send(SessionAction::PeerSignalReceived(signal)).await;
                        sync_tracker_to_phase(&store, &tracker).await;
                    },
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "broadcast listener lagged");
                    },
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    fn spawn_revalidation_tick(
        store: &TabStore<I, N, T>,
        tracker: &Arc<ActivityTracker<MemoryKeyValueStore>>,
        interval: std::time::Duration,
    ) -> JoinHandle<()> {
        let store = store.clone();
        let tracker = Arc::clone(tracker);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately; mount already validated.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let terminal = store.state(|state| state.phase.is_terminal()).await;
                if !terminal {
                    store.send(SessionAction::ValidateRequested).await;
                    sync_tracker_to_phase(&store, &tracker).await;
                }
            }
        })
    }

    async fn sync_tracker(&self) {
        sync_tracker_to_phase(&self.store, &self.tracker).await;
    }
}

/// Keep the activity tracker's subscription aligned with the auth state:
/// attached while authenticated, detached otherwise, so no listener keeps
/// writing into a cleared store after teardown.
async fn sync_tracker_to_phase<I, N, T>(
    store: &TabStore<I, N, T>,
    tracker: &Arc<ActivityTracker<MemoryKeyValueStore>>,
) where
    I: IdentityGateway + Clone + Send + Sync + 'static,
    N: Navigator + Clone + Send + Sync + 'static,
    T: Notifier + Clone + Send + Sync + 'static,
{
    if store.state(|state| state.phase.is_authenticated()).await {
        tracker.start();
    } else {
        tracker.stop();
    }
}

impl<I, N, T> Drop for Tab<I, N, T>
where
    I: IdentityGateway + Clone + Send + Sync + 'static,
    N: Navigator + Clone + Send + Sync + 'static,
    T: Notifier + Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        for listener in &self.listeners {
            listener.abort();
        }
    }
}
