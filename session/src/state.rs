//! Session state types.
//!
//! The in-memory state of one tab. Everything here is a cache of
//! server-confirmed data or a position in the lifecycle state machine; the
//! durable key-value store remains the cross-tab source of truth.

use crate::expiry::ExpiryReason;
use crosstab_core::environment::Clock;
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════
// Tab identity
// ═══════════════════════════════════════════════════════════════════════

/// Identifier of one tab, created once at tab startup and injected wherever
/// outgoing signals need tagging. Never a lazily initialized global.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TabId(String);

impl TabId {
    /// Generate a fresh tab identifier: `tab_<epoch-millis>_<entropy>`.
    #[must_use]
    pub fn generate(clock: &dyn Clock) -> Self {
        let entropy: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(9)
            .map(char::from)
            .collect();
        Self(format!(
            "tab_{}_{}",
            clock.now_millis(),
            entropy.to_lowercase()
        ))
    }

    /// Wrap a known identifier (tests, replay).
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TabId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Lifecycle phase
// ═══════════════════════════════════════════════════════════════════════

/// Why a session was torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownReason {
    /// A bearer token was missing or undecodable.
    InvalidTokens,
    /// The expiry policy judged the session dead.
    Expired(ExpiryReason),
    /// A peer tab already decided; no local re-evaluation happened.
    PeerSignal,
    /// The backend answered 401 on an authenticated call.
    RemoteUnauthorized,
    /// The user asked to sign out.
    UserLogout,
    /// In-memory state claimed authentication but the durable tokens were
    /// gone.
    StaleMemoryState,
}

impl TeardownReason {
    /// Returns `true` when the user asked for this teardown themselves, in
    /// which case the "session expired" notice is suppressed.
    #[must_use]
    pub const fn is_user_initiated(self) -> bool {
        matches!(self, Self::UserLogout)
    }
}

/// Lifecycle phase of one tab.
///
/// `TearingDown` is a first-class state, not a flag: any trigger that lands
/// while teardown is in progress observes it and becomes a no-op, which is
/// the whole reentrancy story.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No in-memory authentication yet (fresh tab, or signed out before).
    Uninitialized,
    /// Valid session with in-memory identity.
    Authenticated,
    /// Teardown effects are executing.
    TearingDown {
        /// Why the session ended.
        reason: TeardownReason,
    },
    /// Teardown finished; terminal until the next login.
    TornDown {
        /// Why the session ended.
        reason: TeardownReason,
    },
}

impl SessionPhase {
    /// Returns `true` for [`SessionPhase::Authenticated`].
    #[must_use]
    pub const fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated)
    }

    /// Returns `true` while teardown is executing or done.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::TearingDown { .. } | Self::TornDown { .. })
    }

    /// Returns `true` for [`SessionPhase::Uninitialized`].
    #[must_use]
    pub const fn is_uninitialized(self) -> bool {
        matches!(self, Self::Uninitialized)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Snapshots
// ═══════════════════════════════════════════════════════════════════════

/// The three bearer tokens issued at login. Opaque except for the identity
/// token, whose payload carries the expiry claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    /// Access token.
    pub access_token: String,
    /// Refresh token.
    pub refresh_token: String,
    /// Structured identity token (`header.payload.signature`).
    pub id_token: String,
}

/// Cached identity of the signed-in user.
///
/// A mirror of server-confirmed data; exists so a freshly opened tab can
/// rebuild its in-memory state without a network round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSnapshot {
    /// Backend user id.
    pub id: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Email address.
    pub email: String,
}

/// One organization the user may act for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationRecord {
    /// Organization id.
    pub id: String,
    /// Partition key scoping backend calls to this organization.
    pub partition_key: String,
    /// Display name.
    pub name: String,
    /// Role of the user within the organization.
    #[serde(default)]
    pub role: String,
    /// Organization type label.
    #[serde(default, rename = "type")]
    pub org_type: String,
    /// Backend customer id owning the record.
    #[serde(default)]
    pub customer_id: String,
}

/// Organization-selection state of one tab.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizationState {
    /// Organizations available to the user.
    pub available: Vec<OrganizationRecord>,
    /// Currently selected organization.
    pub current: Option<OrganizationRecord>,
}

impl OrganizationState {
    /// Select the organization with `id`; returns `true` if found.
    pub fn select(&mut self, id: &str) -> bool {
        match self.available.iter().find(|org| org.id == id) {
            Some(org) => {
                self.current = Some(org.clone());
                true
            },
            None => false,
        }
    }

    /// Drop all organization state.
    pub fn clear(&mut self) {
        self.available.clear();
        self.current = None;
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Root state
// ═══════════════════════════════════════════════════════════════════════

/// Root session state of one tab - what the session reducer operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// Lifecycle phase.
    pub phase: SessionPhase,
    /// Identity of the signed-in user, if any.
    pub user: Option<UserSnapshot>,
    /// Organization-selection state.
    pub organizations: OrganizationState,
}

impl SessionState {
    /// Fresh, unauthenticated state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Uninitialized,
            user: None,
            organizations: OrganizationState::default(),
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use crosstab_core::environment::SystemClock;

    fn org(id: &str) -> OrganizationRecord {
        OrganizationRecord {
            id: id.to_string(),
            partition_key: format!("pk-{id}"),
            name: format!("Org {id}"),
            role: String::new(),
            org_type: "Organizational".to_string(),
            customer_id: String::new(),
        }
    }

    #[test]
    fn tab_ids_are_unique_and_prefixed() {
        let a = TabId::generate(&SystemClock);
        let b = TabId::generate(&SystemClock);
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("tab_"));
    }

    #[test]
    fn select_finds_by_id() {
        let mut orgs = OrganizationState {
            available: vec![org("1"), org("2")],
            current: None,
        };
        assert!(orgs.select("2"));
        assert_eq!(orgs.current.as_ref().map(|o| o.id.as_str()), Some("2"));
        assert!(!orgs.select("missing"));
    }

    #[test]
    fn tearing_down_is_terminal() {
        let phase = SessionPhase::TearingDown {
            reason: TeardownReason::UserLogout,
        };
        assert!(phase.is_terminal());
        assert!(!phase.is_authenticated());
    }

    #[test]
    fn organization_record_round_trips_through_json() {
        let record = org("abc");
        let json = serde_json::to_string(&record).unwrap();
        let back: OrganizationRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }
}
