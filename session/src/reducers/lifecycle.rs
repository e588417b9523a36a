//! The session lifecycle state machine.
//!
//! One reducer ties the token validator, the expiry policy, restoration, and
//! the teardown protocol together. Whatever trigger fires - page load,
//! visibility regained, a peer signal, a 401, an explicit call - the same
//! routine runs, and the phase machine makes reentrancy a non-event: a
//! trigger landing while teardown is in progress observes `TearingDown` and
//! does nothing.
//!
//! # Teardown protocol
//!
//! Teardown is a sequential effect chain: announce to peers *first* (both
//! backends), then remove every session key, then notify, then navigate to
//! the login route, then mark the phase terminal. Every step swallows and
//! logs its own failures, so a broken storage area can degrade the cleanup
//! but never keep the user on an authenticated page.

use crate::actions::SessionAction;
use crate::activity::write_last_activity;
use crate::broadcast::{PeerAnnouncer, PeerSignal, PeerSignalKind};
use crate::config::SessionConfig;
use crate::environment::SessionEnvironment;
use crate::expiry::{self, ExpiryVerdict};
use crate::keys;
use crate::providers::{IdentityGateway, Navigator, Notice, Notifier, OrganizationDetails};
use crate::restore::restore_from_persistent;
use crate::state::{
    OrganizationRecord, SessionPhase, SessionState, TeardownReason, TokenSet, UserSnapshot,
};
use crate::stores::{KeyValueStore, StorageEvent, read, read_millis};
use crate::token::{BearerCredentials, token_set_valid};
use crosstab_core::effect::{Effect, Effects};
use crosstab_core::reducer::Reducer;
use crosstab_core::smallvec;
use std::marker::PhantomData;
use std::sync::Arc;

/// Whether a teardown broadcasts to peers.
///
/// Locally decided teardowns announce; teardowns triggered by a peer signal
/// stay quiet, otherwise every signal would echo around the origin forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Announce {
    Peers,
    Quiet,
}

/// The session lifecycle reducer.
#[derive(Debug, Clone)]
pub struct SessionReducer<K, A, N, T, I> {
    config: SessionConfig,
    _phantom: PhantomData<(K, A, N, T, I)>,
}

impl<K, A, N, T, I> SessionReducer<K, A, N, T, I> {
    /// Create a reducer with the given configuration.
    #[must_use]
    pub const fn new(config: SessionConfig) -> Self {
        Self {
            config,
            _phantom: PhantomData,
        }
    }

    /// The configuration this reducer runs with.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }
}

impl<K, A, N, T, I> Reducer for SessionReducer<K, A, N, T, I>
where
    K: KeyValueStore + Clone + Send + Sync + 'static,
    A: PeerAnnouncer + Clone + Send + Sync + 'static,
    N: Navigator + Clone + Send + Sync + 'static,
    T: Notifier + Clone + Send + Sync + 'static,
    I: IdentityGateway + Clone + Send + Sync + 'static,
{
    type State = SessionState;
    type Action = SessionAction;
    type Environment = SessionEnvironment<K, A, N, T, I>;

    fn reduce(
        &self,
        state: &mut SessionState,
        action: SessionAction,
        env: &Self::Environment,
    ) -> Effects<SessionAction> {
        match action {
            // ═══════════════════════════════════════════════════════════
            // Lifecycle triggers
            // ═══════════════════════════════════════════════════════════
            SessionAction::PageLoaded => self.on_mount(state, env),

            SessionAction::VisibilityRegained => {
                if state.phase.is_authenticated() {
                    self.validate(state, env)
                } else {
                    smallvec![]
                }
            },

            SessionAction::ValidateRequested => self.validate(state, env),

            SessionAction::LogoutRequested => {
                self.begin_teardown(state, env, TeardownReason::UserLogout, Announce::Peers)
            },

            SessionAction::RemoteUnauthorized => self.begin_teardown(
                state,
                env,
                TeardownReason::RemoteUnauthorized,
                Announce::Peers,
            ),

            // ═══════════════════════════════════════════════════════════
            // Peer coordination
            // ═══════════════════════════════════════════════════════════
            SessionAction::PeerSignalReceived(signal) => self.on_peer_signal(state, env, &signal),

            SessionAction::StorageChanged(event) => self.on_storage_changed(state, env, &event),

            // ═══════════════════════════════════════════════════════════
            // Login flow
            // ═══════════════════════════════════════════════════════════
            SessionAction::LoginSucceeded { tokens } => {
                Self::on_login_succeeded(state, env, tokens)
            },

            SessionAction::IdentityLoaded { user } => Self::on_identity_loaded(state, env, user),

            SessionAction::OrganizationsLoaded { organizations } => {
                self.on_organizations_loaded(state, env, organizations)
            },

            SessionAction::OrganizationDetailsLoaded { details } => {
                if state.phase.is_terminal() {
                    return smallvec![];
                }
                let storage = env.storage.clone();
                smallvec![Effect::future(async move {
                    persist_organization_details(&storage, &details);
                    None
                })]
            },

            SessionAction::LoginFailed { error } => {
                if state.phase.is_terminal() {
                    return smallvec![];
                }
                tracing::warn!(%error, "sign-in flow failed");
                let notifier = env.notifier.clone();
                smallvec![Effect::future(async move {
                    notifier.notify(Notice::sign_in_failed());
                    None
                })]
            },

            SessionAction::OrganizationSelected { organization_id } => {
                Self::on_organization_selected(state, env, &organization_id)
            },

            // ═══════════════════════════════════════════════════════════
            // Internal events
            // ═══════════════════════════════════════════════════════════
            SessionAction::TeardownCompleted => {
                if let SessionPhase::TearingDown { reason } = state.phase {
                    state.phase = SessionPhase::TornDown { reason };
                    tracing::info!(?reason, "session teardown completed");
                }
                smallvec![]
            },
        }
    }
}

impl<SK, SA, SN, ST, SI> SessionReducer<SK, SA, SN, ST, SI> {
    /// Mount reconciliation: durable tokens vs. in-memory state.
    fn on_mount<K, A, N, T, I>(
        &self,
        state: &mut SessionState,
        env: &SessionEnvironment<K, A, N, T, I>,
    ) -> Effects<SessionAction>
    where
        K: KeyValueStore + Clone + Send + Sync + 'static,
        A: PeerAnnouncer + Clone + Send + Sync + 'static,
        N: Navigator + Clone + Send + Sync + 'static,
        T: Notifier + Clone + Send + Sync + 'static,
        I: IdentityGateway + Clone + Send + Sync + 'static,
    {
        if state.phase.is_terminal() {
            return smallvec![];
        }

        let has_tokens = read(&env.storage, keys::ACCESS_TOKEN).is_some();
        match (has_tokens, state.phase.is_authenticated()) {
            // In-memory says authenticated, storage disagrees: the memory is
            // stale. Peers already share the token-less storage, so stay
            // quiet.
            (false, true) => {
                tracing::warn!("in-memory auth state is stale: durable tokens are gone");
                self.begin_teardown(state, env, TeardownReason::StaleMemoryState, Announce::Quiet)
            },

            // Fresh tab with durable tokens: validate, then rebuild
            // in-memory state from the persisted snapshots.
            (true, false) => {
                let mut effects = self.validate(state, env);
                if state.phase.is_terminal() {
                    return effects;
                }
                if restore_from_persistent(&env.storage, state) {
                    state.phase = SessionPhase::Authenticated;
                    effects.push(self.announce_restoration(env));
                }
                effects
            },

            // Both agree there is a session: validate normally.
            (true, true) => self.validate(state, env),

            // Nothing anywhere: the login flow applies.
            (false, false) => smallvec![],
        }
    }

    /// The single validation routine: tokens, then expiry, then extend.
    fn validate<K, A, N, T, I>(
        &self,
        state: &mut SessionState,
        env: &SessionEnvironment<K, A, N, T, I>,
    ) -> Effects<SessionAction>
    where
        K: KeyValueStore + Clone + Send + Sync + 'static,
        A: PeerAnnouncer + Clone + Send + Sync + 'static,
        N: Navigator + Clone + Send + Sync + 'static,
        T: Notifier + Clone + Send + Sync + 'static,
        I: IdentityGateway + Clone + Send + Sync + 'static,
    {
        if state.phase.is_terminal() {
            return smallvec![];
        }

        let now = env.clock.now();

        if !token_set_valid(&env.storage, now) {
            tracing::info!("validation failed: token set missing or undecodable");
            return self.begin_teardown(state, env, TeardownReason::InvalidTokens, Announce::Peers);
        }

        let login_time = read_millis(&env.storage, keys::LOGIN_TIME);
        let last_activity = read_millis(&env.storage, keys::LAST_ACTIVITY);
        let verdict = expiry::evaluate(
            login_time,
            last_activity,
            now.timestamp_millis(),
            &self.config.expiry_policy(),
        );
        if let ExpiryVerdict::Expired(reason) = verdict {
            tracing::info!(reason = reason.as_str(), "session expired");
            return self.begin_teardown(
                state,
                env,
                TeardownReason::Expired(reason),
                Announce::Peers,
            );
        }

        // Valid: extend the session.
        let storage = env.storage.clone();
        let now_millis = now.timestamp_millis();
        smallvec![Effect::future(async move {
            write_last_activity(&storage, now_millis);
            None
        })]
    }

    /// The idempotent teardown procedure.
    fn begin_teardown<K, A, N, T, I>(
        &self,
        state: &mut SessionState,
        env: &SessionEnvironment<K, A, N, T, I>,
        reason: TeardownReason,
        announce: Announce,
    ) -> Effects<SessionAction>
    where
        K: KeyValueStore + Clone + Send + Sync + 'static,
        A: PeerAnnouncer + Clone + Send + Sync + 'static,
        N: Navigator + Clone + Send + Sync + 'static,
        T: Notifier + Clone + Send + Sync + 'static,
        I: IdentityGateway + Clone + Send + Sync + 'static,
    {
        if state.phase.is_terminal() {
            tracing::debug!(?reason, "teardown already in progress; ignoring");
            return smallvec![];
        }

        tracing::info!(?reason, "tearing down session");
        state.phase = SessionPhase::TearingDown { reason };
        state.user = None;
        state.organizations.clear();

        let mut chain: Vec<Effect<SessionAction>> = Vec::with_capacity(5);

        // Peers learn first, while the record still exists.
        if announce == Announce::Peers {
            let announcer = env.announcer.clone();
            let kind = if reason == TeardownReason::RemoteUnauthorized {
                PeerSignalKind::AutoLogout
            } else {
                PeerSignalKind::ForceLogout
            };
            let signal = PeerSignal {
                kind,
                tab: env.tab.clone(),
                sent_at_millis: env.clock.now_millis(),
            };
            chain.push(Effect::future(async move {
                if let Err(error) = announcer.announce(&signal) {
                    tracing::warn!(%error, "peer announce failed; key removals still signal it");
                }
                None
            }));
        }

        // Remove the exhaustive key list; unrelated state survives.
        let storage = env.storage.clone();
        chain.push(Effect::future(async move {
            for key in keys::SESSION_KEYS {
                if let Err(error) = storage.remove(key) {
                    tracing::warn!(key, %error, "failed to clear session key");
                }
            }
            None
        }));

        if self.config.show_expiration_notice && !reason.is_user_initiated() {
            let notifier = env.notifier.clone();
            chain.push(Effect::future(async move {
                notifier.notify(Notice::session_expired());
                None
            }));
        }

        let navigator = env.navigator.clone();
        let login_route = self.config.login_route.clone();
        chain.push(Effect::future(async move {
            navigator.navigate(&login_route);
            None
        }));

        chain.push(Effect::future(async { Some(SessionAction::TeardownCompleted) }));

        smallvec![Effect::chain(chain)]
    }

    /// A restored tab announces itself after a short settle delay, unless
    /// teardown won the window in the meantime.
    fn announce_restoration<K, A, N, T, I>(
        &self,
        env: &SessionEnvironment<K, A, N, T, I>,
    ) -> Effect<SessionAction>
    where
        K: KeyValueStore + Clone + Send + Sync + 'static,
        A: PeerAnnouncer + Clone + Send + Sync + 'static,
        N: Navigator + Clone + Send + Sync + 'static,
        T: Notifier + Clone + Send + Sync + 'static,
        I: IdentityGateway + Clone + Send + Sync + 'static,
    {
        let announcer = env.announcer.clone();
        let storage = env.storage.clone();
        let clock = Arc::clone(&env.clock);
        let tab = env.tab.clone();
        let delay = self.config.restore_announce_delay;
        Effect::future(async move {
            // Fire-and-continue: the mount routine must not wait out the
            // settle delay.
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if read(&storage, keys::ACCESS_TOKEN).is_none() {
                    tracing::debug!("restoration announce dropped: session is gone");
                    return;
                }
                let signal = PeerSignal {
                    kind: PeerSignalKind::ContextRestored,
                    tab,
                    sent_at_millis: clock.now_millis(),
                };
                if let Err(error) = announcer.announce(&signal) {
                    tracing::warn!(%error, "restoration announce failed");
                }
            });
            None
        })
    }

    /// A peer told us something over the broadcast channel.
    fn on_peer_signal<K, A, N, T, I>(
        &self,
        state: &mut SessionState,
        env: &SessionEnvironment<K, A, N, T, I>,
        signal: &PeerSignal,
    ) -> Effects<SessionAction>
    where
        K: KeyValueStore + Clone + Send + Sync + 'static,
        A: PeerAnnouncer + Clone + Send + Sync + 'static,
        N: Navigator + Clone + Send + Sync + 'static,
        T: Notifier + Clone + Send + Sync + 'static,
        I: IdentityGateway + Clone + Send + Sync + 'static,
    {
        if signal.tab == env.tab {
            return smallvec![];
        }
        tracing::debug!(kind = signal.kind.as_str(), from = %signal.tab, "peer signal");

        match signal.kind {
            // The peer already decided; no local re-evaluation, no
            // rebroadcast.
            PeerSignalKind::ForceLogout | PeerSignalKind::AutoLogout => {
                if state.phase.is_authenticated() {
                    self.begin_teardown(state, env, TeardownReason::PeerSignal, Announce::Quiet)
                } else {
                    smallvec![]
                }
            },

            PeerSignalKind::ContextRestored | PeerSignalKind::LoginCompleted => {
                Self::adopt_peer_session(state, env);
                smallvec![]
            },
        }
    }

    /// A peer mutated the shared store; the fallback signal path.
    fn on_storage_changed<K, A, N, T, I>(
        &self,
        state: &mut SessionState,
        env: &SessionEnvironment<K, A, N, T, I>,
        event: &StorageEvent,
    ) -> Effects<SessionAction>
    where
        K: KeyValueStore + Clone + Send + Sync + 'static,
        A: PeerAnnouncer + Clone + Send + Sync + 'static,
        N: Navigator + Clone + Send + Sync + 'static,
        T: Notifier + Clone + Send + Sync + 'static,
        I: IdentityGateway + Clone + Send + Sync + 'static,
    {
        if event.origin.as_ref() == Some(&env.tab) {
            return smallvec![];
        }

        match event.key.as_str() {
            // A peer cleared the credentials.
            k if k == keys::ACCESS_TOKEN && event.is_removal() => {
                if state.phase.is_authenticated() {
                    tracing::info!("peer removed the access token");
                    self.begin_teardown(state, env, TeardownReason::PeerSignal, Announce::Quiet)
                } else {
                    smallvec![]
                }
            },

            // The dedicated fallback signal key was toggled on.
            k if k == keys::SESSION_LOGOUT && event.new_value.is_some() => {
                if state.phase.is_authenticated() {
                    tracing::info!("peer raised the logout signal key");
                    self.begin_teardown(state, env, TeardownReason::PeerSignal, Announce::Quiet)
                } else {
                    smallvec![]
                }
            },

            // Peers bump activity all the time; nothing to do locally.
            _ => smallvec![],
        }
    }

    /// Adopt a session a peer just restored or created, without announcing
    /// again.
    fn adopt_peer_session<K, A, N, T, I>(
        state: &mut SessionState,
        env: &SessionEnvironment<K, A, N, T, I>,
    ) where
        K: KeyValueStore + Clone + Send + Sync + 'static,
        A: PeerAnnouncer + Clone + Send + Sync + 'static,
        N: Navigator + Clone + Send + Sync + 'static,
        T: Notifier + Clone + Send + Sync + 'static,
        I: IdentityGateway + Clone + Send + Sync + 'static,
    {
        if !state.phase.is_uninitialized() {
            return;
        }
        if !token_set_valid(&env.storage, env.clock.now()) {
            return;
        }
        if restore_from_persistent(&env.storage, state) {
            state.phase = SessionPhase::Authenticated;
            tracing::info!("adopted session announced by peer");
        }
    }

    /// Persist the session record and start the identity fetch.
    fn on_login_succeeded<K, A, N, T, I>(
        state: &mut SessionState,
        env: &SessionEnvironment<K, A, N, T, I>,
        tokens: TokenSet,
    ) -> Effects<SessionAction>
    where
        K: KeyValueStore + Clone + Send + Sync + 'static,
        A: PeerAnnouncer + Clone + Send + Sync + 'static,
        N: Navigator + Clone + Send + Sync + 'static,
        T: Notifier + Clone + Send + Sync + 'static,
        I: IdentityGateway + Clone + Send + Sync + 'static,
    {
        if matches!(state.phase, SessionPhase::TearingDown { .. }) {
            tracing::warn!("login ignored while teardown is in progress");
            return smallvec![];
        }

        // Signing in resets any previous terminal state.
        state.phase = SessionPhase::Uninitialized;
        state.user = None;
        state.organizations.clear();

        let storage = env.storage.clone();
        let identity = env.identity.clone();
        let now_millis = env.clock.now_millis();

        smallvec![Effect::future(async move {
            // The session record is one unit: three tokens, the legacy jwt
            // duplicate, and both timestamps.
            let stamp = now_millis.to_string();
            let record = [
                (keys::JWT, tokens.id_token.as_str()),
                (keys::ID_TOKEN, tokens.id_token.as_str()),
                (keys::REFRESH_TOKEN, tokens.refresh_token.as_str()),
                (keys::ACCESS_TOKEN, tokens.access_token.as_str()),
                (keys::LOGIN_TIME, stamp.as_str()),
                (keys::LAST_ACTIVITY, stamp.as_str()),
            ];
            for (key, value) in record {
                if let Err(error) = storage.set(key, value) {
                    tracing::error!(key, %error, "failed to persist session record; aborting login");
                    return None;
                }
            }
            tracing::info!("session record persisted; fetching identity");

            let Some(credentials) = BearerCredentials::from_storage(&storage) else {
                return None;
            };
            match identity.fetch_identity(credentials).await {
                Ok(user) => Some(SessionAction::IdentityLoaded { user }),
                Err(error) => Some(SessionAction::LoginFailed { error }),
            }
        })]
    }

    /// Persist the identity snapshot and start the organization fetch.
    fn on_identity_loaded<K, A, N, T, I>(
        state: &mut SessionState,
        env: &SessionEnvironment<K, A, N, T, I>,
        user: UserSnapshot,
    ) -> Effects<SessionAction>
    where
        K: KeyValueStore + Clone + Send + Sync + 'static,
        A: PeerAnnouncer + Clone + Send + Sync + 'static,
        N: Navigator + Clone + Send + Sync + 'static,
        T: Notifier + Clone + Send + Sync + 'static,
        I: IdentityGateway + Clone + Send + Sync + 'static,
    {
        if state.phase.is_terminal() {
            return smallvec![];
        }
        state.user = Some(user.clone());

        let storage = env.storage.clone();
        let identity = env.identity.clone();
        smallvec![Effect::future(async move {
            let snapshot = [
                (keys::USER_NAME, user.first_name.as_str()),
                (keys::USER_LASTNAME, user.last_name.as_str()),
                (keys::USER_ID, user.id.as_str()),
                (keys::CUSTOMER_ID, user.id.as_str()),
                (keys::USER_EMAIL, user.email.as_str()),
            ];
            for (key, value) in snapshot {
                if let Err(error) = storage.set(key, value) {
                    tracing::warn!(key, %error, "failed to persist identity snapshot");
                }
            }

            let Some(credentials) = BearerCredentials::from_storage(&storage) else {
                return None;
            };
            match identity.fetch_organizations(credentials).await {
                Ok(organizations) => Some(SessionAction::OrganizationsLoaded { organizations }),
                Err(error) => Some(SessionAction::LoginFailed { error }),
            }
        })]
    }

    /// Select the first organization, persist the context, announce the
    /// login, and land on the home page.
    fn on_organizations_loaded<K, A, N, T, I>(
        &self,
        state: &mut SessionState,
        env: &SessionEnvironment<K, A, N, T, I>,
        organizations: Vec<OrganizationRecord>,
    ) -> Effects<SessionAction>
    where
        K: KeyValueStore + Clone + Send + Sync + 'static,
        A: PeerAnnouncer + Clone + Send + Sync + 'static,
        N: Navigator + Clone + Send + Sync + 'static,
        T: Notifier + Clone + Send + Sync + 'static,
        I: IdentityGateway + Clone + Send + Sync + 'static,
    {
        if state.phase.is_terminal() {
            return smallvec![];
        }

        state.organizations.available = organizations.clone();
        state.organizations.current = organizations.first().cloned();
        state.phase = SessionPhase::Authenticated;

        let storage = env.storage.clone();
        let announcer = env.announcer.clone();
        let navigator = env.navigator.clone();
        let identity = env.identity.clone();
        let tab = env.tab.clone();
        let now_millis = env.clock.now_millis();
        let home_route = self.config.home_route.clone();
        let first = organizations.first().cloned();

        smallvec![Effect::future(async move {
            match serde_json::to_string(&organizations) {
                Ok(json) => {
                    if let Err(error) = storage.set(keys::AVAILABLE_ORGANIZATIONS, &json) {
                        tracing::warn!(%error, "failed to persist organization list");
                    }
                },
                Err(error) => tracing::warn!(%error, "organization list not serializable"),
            }
            if let Some(org) = &first {
                persist_current_organization(&storage, org);
            }

            let signal = PeerSignal {
                kind: PeerSignalKind::LoginCompleted,
                tab,
                sent_at_millis: now_millis,
            };
            if let Err(error) = announcer.announce(&signal) {
                tracing::warn!(%error, "login announce failed");
            }

            navigator.navigate(&home_route);

            // Display details are fetched after navigation; the page does not
            // wait for them.
            let org = first?;
            let credentials = BearerCredentials::from_storage(&storage)?;
            match identity
                .fetch_organization_details(credentials, org.partition_key.clone())
                .await
            {
                Ok(details) => Some(SessionAction::OrganizationDetailsLoaded { details }),
                Err(error) if error.is_unauthorized() => Some(SessionAction::RemoteUnauthorized),
                Err(error) => {
                    tracing::warn!(%error, "organization details fetch failed");
                    None
                },
            }
        })]
    }

    /// Switch the active organization and refresh its display details.
    fn on_organization_selected<K, A, N, T, I>(
        state: &mut SessionState,
        env: &SessionEnvironment<K, A, N, T, I>,
        organization_id: &str,
    ) -> Effects<SessionAction>
    where
        K: KeyValueStore + Clone + Send + Sync + 'static,
        A: PeerAnnouncer + Clone + Send + Sync + 'static,
        N: Navigator + Clone + Send + Sync + 'static,
        T: Notifier + Clone + Send + Sync + 'static,
        I: IdentityGateway + Clone + Send + Sync + 'static,
    {
        if !state.phase.is_authenticated() {
            return smallvec![];
        }
        if !state.organizations.select(organization_id) {
            tracing::warn!(organization_id, "cannot select unknown organization");
            return smallvec![];
        }
        let Some(org) = state.organizations.current.clone() else {
            return smallvec![];
        };

        let storage = env.storage.clone();
        let identity = env.identity.clone();
        smallvec![Effect::future(async move {
            persist_current_organization(&storage, &org);
            let credentials = BearerCredentials::from_storage(&storage)?;
            match identity
                .fetch_organization_details(credentials, org.partition_key.clone())
                .await
            {
                Ok(details) => Some(SessionAction::OrganizationDetailsLoaded { details }),
                Err(error) if error.is_unauthorized() => Some(SessionAction::RemoteUnauthorized),
                Err(error) => {
                    tracing::warn!(%error, "organization details fetch failed");
                    None
                },
            }
        })]
    }
}

/// Persist the active-organization keys.
fn persist_current_organization<K: KeyValueStore>(storage: &K, org: &OrganizationRecord) {
    let fields = [
        (keys::PARTITION_KEY, org.partition_key.as_str()),
        (keys::CURRENT_ORGANIZATION_ID, org.id.as_str()),
        (keys::CURRENT_ORGANIZATION_NAME, org.name.as_str()),
    ];
    for (key, value) in fields {
        if let Err(error) = storage.set(key, value) {
            tracing::warn!(key, %error, "failed to persist organization context");
        }
    }
}

/// Persist the denormalized company/representative display fields.
fn persist_organization_details<K: KeyValueStore>(storage: &K, details: &OrganizationDetails) {
    let set = |key: &str, value: &Option<String>| {
        if let Some(value) = value {
            if let Err(error) = storage.set(key, value) {
                tracing::warn!(key, %error, "failed to persist organization details");
            }
        }
    };

    set(keys::COMPANY_BUSINESS_NAME, &details.business_name);
    set(keys::COMPANY_BUSINESS_TYPE, &details.business_type);
    set(keys::COMPANY_CALLING_CODE, &details.calling_code);
    set(keys::COMPANY_PHONE_NUMBER, &details.phone_number);
    set(keys::COMPANY_ADDRESS_LINE, &details.address_line);

    if let Some(rep) = &details.representative {
        if let Err(error) = storage.set(keys::REPRESENTATIVE_PEOPLE_ID, &rep.id) {
            tracing::warn!(%error, "failed to persist representative id");
        }
        if let Err(error) = storage.set(keys::REPRESENTATIVE_PEOPLE_FULL_NAME, &rep.full_name) {
            tracing::warn!(%error, "failed to persist representative name");
        }
        set(keys::REPRESENTATIVE_PEOPLE_FIRST_NAME, &rep.first_name);
        set(keys::REPRESENTATIVE_PEOPLE_LAST_NAME, &rep.last_name);
        set(keys::REPRESENTATIVE_PEOPLE_EMAIL, &rep.email);
        set(keys::REPRESENTATIVE_PEOPLE_CALLING_CODE, &rep.calling_code);
        set(keys::REPRESENTATIVE_PEOPLE_PHONE_NUMBER, &rep.phone_number);
    }

    match serde_json::to_string(details) {
        Ok(json) => {
            if let Err(error) = storage.set(keys::ORGANIZATION_DETAILS, &json) {
                tracing::warn!(%error, "failed to persist organization details blob");
            }
        },
        Err(error) => tracing::warn!(%error, "organization details not serializable"),
    }
}
