//! Cross-tab context restoration.
//!
//! A freshly opened tab holds valid durable tokens but no in-memory state.
//! Restoration rebuilds the user and organization state from the persisted
//! snapshots so the tab becomes usable without a network round trip.

use crate::keys;
use crate::state::{OrganizationRecord, SessionState, UserSnapshot};
use crate::stores::{KeyValueStore, read};

/// Rebuild in-memory user and organization state from storage.
///
/// Preconditions: persisted `user_id` and `user_email`. When either is
/// missing the tab simply stays unauthenticated and the normal login flow
/// applies - a silent `false`, not an error. Corrupt organization JSON is
/// logged and treated as "no organizations"; it never blocks the identity
/// restoration.
///
/// The caller owns the phase transition and the peer announcement.
pub fn restore_from_persistent<K: KeyValueStore>(storage: &K, state: &mut SessionState) -> bool {
    let (Some(id), Some(email)) = (read(storage, keys::USER_ID), read(storage, keys::USER_EMAIL))
    else {
        tracing::debug!("restoration skipped: identity snapshot incomplete");
        return false;
    };

    state.user = Some(UserSnapshot {
        id,
        email,
        first_name: read(storage, keys::USER_NAME).unwrap_or_default(),
        last_name: read(storage, keys::USER_LASTNAME).unwrap_or_default(),
    });

    state.organizations.clear();
    if let Some(raw) = read(storage, keys::AVAILABLE_ORGANIZATIONS) {
        match serde_json::from_str::<Vec<OrganizationRecord>>(&raw) {
            Ok(organizations) => {
                state.organizations.available = organizations;
                if let Some(current_id) = read(storage, keys::CURRENT_ORGANIZATION_ID) {
                    if !state.organizations.select(&current_id) {
                        tracing::warn!(
                            organization_id = %current_id,
                            "persisted current organization not in the available list"
                        );
                    }
                }
            },
            Err(error) => {
                tracing::warn!(%error, "persisted organization list is corrupt; dropping it");
            },
        }
    }

    tracing::debug!(
        organizations = state.organizations.available.len(),
        "session context restored from storage"
    );
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use crate::stores::MemoryKeyValueStore;

    fn org(id: &str) -> OrganizationRecord {
        OrganizationRecord {
            id: id.to_string(),
            partition_key: format!("pk-{id}"),
            name: format!("Org {id}"),
            role: "admin".to_string(),
            org_type: "Organizational".to_string(),
            customer_id: "cust-1".to_string(),
        }
    }

    fn seeded_store() -> MemoryKeyValueStore {
        let store = MemoryKeyValueStore::new();
        store.set(keys::USER_ID, "user-1").unwrap();
        store.set(keys::USER_EMAIL, "ada@example.com").unwrap();
        store.set(keys::USER_NAME, "Ada").unwrap();
        store.set(keys::USER_LASTNAME, "Lovelace").unwrap();
        store
    }

    #[test]
    fn missing_identity_fields_skip_restoration() {
        let store = MemoryKeyValueStore::new();
        store.set(keys::USER_ID, "user-1").unwrap();
        let mut state = SessionState::new();

        assert!(!restore_from_persistent(&store, &mut state));
        assert_eq!(state, SessionState::new());
    }

    #[test]
    fn identity_snapshot_restores_without_organizations() {
        let store = seeded_store();
        let mut state = SessionState::new();

        assert!(restore_from_persistent(&store, &mut state));
        let user = state.user.unwrap();
        assert_eq!(user.id, "user-1");
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.first_name, "Ada");
        assert!(state.organizations.available.is_empty());
    }

    #[test]
    fn organization_list_round_trips_with_selection() {
        let store = seeded_store();
        let organizations: Vec<_> = (1..=5).map(|i| org(&i.to_string())).collect();
        store
            .set(
                keys::AVAILABLE_ORGANIZATIONS,
                &serde_json::to_string(&organizations).unwrap(),
            )
            .unwrap();
        store.set(keys::CURRENT_ORGANIZATION_ID, "3").unwrap();

        let mut state = SessionState::new();
        assert!(restore_from_persistent(&store, &mut state));
        assert_eq!(state.organizations.available, organizations);
        assert_eq!(
            state.organizations.current.as_ref().map(|o| o.id.as_str()),
            Some("3")
        );
    }

    #[test]
    fn corrupt_organization_json_still_restores_identity() {
        let store = seeded_store();
        store.set(keys::AVAILABLE_ORGANIZATIONS, "{not json").unwrap();

        let mut state = SessionState::new();
        assert!(restore_from_persistent(&store, &mut state));
        assert!(state.user.is_some());
        assert!(state.organizations.available.is_empty());
        assert!(state.organizations.current.is_none());
    }
}
