//! Session actions.
//!
//! Every input to the session state machine: lifecycle triggers, peer
//! coordination events, the login flow, and internal completion events
//! produced by effects.

use crate::broadcast::PeerSignal;
use crate::error::GatewayError;
use crate::providers::OrganizationDetails;
use crate::state::{OrganizationRecord, TokenSet, UserSnapshot};
use crate::stores::StorageEvent;

/// Session action.
///
/// Actions are the only way to communicate with the session state machine.
/// The reducer is the single validation entry point; whichever trigger fires,
/// the same routine runs and the phase machine guards reentrancy.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    // ═══════════════════════════════════════════════════════════════════
    // Lifecycle triggers
    // ═══════════════════════════════════════════════════════════════════
    /// The page finished loading; reconcile durable and in-memory state.
    PageLoaded,

    /// The document became visible again after being hidden; re-validate to
    /// catch anything that happened while backgrounded.
    VisibilityRegained,

    /// Explicit validation request (route guard, periodic safety net).
    ValidateRequested,

    /// The user asked to sign out.
    LogoutRequested,

    /// An authenticated backend call answered 401.
    RemoteUnauthorized,

    // ═══════════════════════════════════════════════════════════════════
    // Peer coordination
    // ═══════════════════════════════════════════════════════════════════
    /// A signal arrived over the broadcast channel.
    PeerSignalReceived(PeerSignal),

    /// A peer tab mutated the shared store.
    StorageChanged(StorageEvent),

    // ═══════════════════════════════════════════════════════════════════
    // Login flow
    // ═══════════════════════════════════════════════════════════════════
    /// The token endpoint accepted the user's credentials.
    LoginSucceeded {
        /// The issued bearer tokens.
        tokens: TokenSet,
    },

    /// The identity backend returned the signed-in user.
    ///
    /// This is an **event** produced by the effect executor.
    IdentityLoaded {
        /// The confirmed identity.
        user: UserSnapshot,
    },

    /// The organization list arrived.
    ///
    /// This is an **event** produced by the effect executor.
    OrganizationsLoaded {
        /// Organizations available to the user.
        organizations: Vec<OrganizationRecord>,
    },

    /// Display details for the selected organization arrived.
    ///
    /// This is an **event** produced by the effect executor.
    OrganizationDetailsLoaded {
        /// The denormalized display fields.
        details: OrganizationDetails,
    },

    /// Some step of the login flow failed.
    LoginFailed {
        /// What went wrong.
        error: GatewayError,
    },

    /// The user switched the active organization.
    OrganizationSelected {
        /// Id of the organization to activate.
        organization_id: String,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Internal events
    // ═══════════════════════════════════════════════════════════════════
    /// The teardown effect chain finished.
    TeardownCompleted,
}
