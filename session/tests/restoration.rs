//! Context restoration integration tests.
//!
//! A freshly opened tab with valid durable tokens must end up authenticated
//! with the persisted snapshot, announce the restoration, and stay silent
//! when the snapshot is insufficient.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

mod common;

use common::{Harness, NOW_MILLIS, forge_tokens, organizations, settle};
use crosstab_session::stores::KeyValueStore;
use crosstab_session::{PeerSignalKind, SessionPhase, keys};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn fresh_tab_restores_the_full_context() {
    let harness = Harness::new();
    let tab_a = harness.open_tab().await;
    tab_a.tab.login(forge_tokens()).await;

    // A brand-new tab, uninitialized in memory, valid tokens on disk.
    let tab_b = harness.open_tab().await;

    assert_eq!(tab_b.tab.phase().await, SessionPhase::Authenticated);
    assert_eq!(tab_b.tab.user().await, Some(common::ada()));
    let orgs = tab_b.tab.organizations().await;
    assert_eq!(orgs.available, organizations(3));
    assert_eq!(orgs.current.map(|o| o.id), Some("1".to_string()));
    // Restoration needs no network round trip.
    assert_eq!(tab_b.gateway.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn organization_list_round_trips_exactly() {
    let harness = Harness::new();
    let gateway = crosstab_session::mocks::MockIdentityGateway::new()
        .with_user(common::ada())
        .with_organizations(organizations(5));
    let tab_a = harness
        .open_tab_with(harness.bus.clone(), gateway, Harness::config())
        .await;
    tab_a.tab.login(forge_tokens()).await;

    let tab_b = harness.open_tab().await;

    let restored = tab_b.tab.organizations().await.available;
    assert_eq!(restored.len(), 5);
    assert_eq!(restored, organizations(5));
}

#[tokio::test(start_paused = true)]
async fn selected_organization_is_restored_by_id() {
    let harness = Harness::new();
    let tab_a = harness.open_tab().await;
    tab_a.tab.login(forge_tokens()).await;
    tab_a.tab.select_organization("3").await;

    let tab_b = harness.open_tab().await;

    let orgs = tab_b.tab.organizations().await;
    assert_eq!(orgs.current.map(|o| o.id), Some("3".to_string()));
    assert_eq!(
        harness.origin.get(keys::PARTITION_KEY).unwrap().as_deref(),
        Some("pk-3")
    );
}

#[tokio::test(start_paused = true)]
async fn restoration_without_identity_snapshot_is_a_silent_no_op() {
    let harness = Harness::new();
    // Tokens and timestamps only; no user_id / user_email.
    let tokens = forge_tokens();
    harness.origin.set(keys::ACCESS_TOKEN, &tokens.access_token).unwrap();
    harness.origin.set(keys::REFRESH_TOKEN, &tokens.refresh_token).unwrap();
    harness.origin.set(keys::ID_TOKEN, &tokens.id_token).unwrap();
    harness
        .origin
        .set(keys::LOGIN_TIME, &NOW_MILLIS.to_string())
        .unwrap();
    harness
        .origin
        .set(keys::LAST_ACTIVITY, &NOW_MILLIS.to_string())
        .unwrap();

    let opened = harness.open_tab().await;

    assert_eq!(opened.tab.phase().await, SessionPhase::Uninitialized);
    assert_eq!(opened.tab.user().await, None);
    assert_eq!(opened.notifier.count(), 0);
    // The durable session is untouched for a later login or peer.
    assert!(harness.origin.get(keys::ACCESS_TOKEN).unwrap().is_some());
}

#[tokio::test(start_paused = true)]
async fn restoration_is_announced_after_the_settle_delay() {
    let harness = Harness::new();
    let tab_a = harness.open_tab().await;
    tab_a.tab.login(forge_tokens()).await;

    let mut signals = harness.bus.subscribe();
    let tab_b = harness.open_tab().await;
    assert_eq!(tab_b.tab.phase().await, SessionPhase::Authenticated);

    // The announce waits for the configured settle delay.
    tokio::time::sleep(Duration::from_millis(300)).await;
    settle().await;

    let mut saw_restored = false;
    while let Ok(signal) = signals.try_recv() {
        if signal.kind == PeerSignalKind::ContextRestored {
            assert_eq!(&signal.tab, tab_b.tab.id());
            saw_restored = true;
        }
    }
    assert!(saw_restored, "expected a ContextRestored announcement");
}

#[tokio::test(start_paused = true)]
async fn corrupt_organization_snapshot_does_not_block_restoration() {
    let harness = Harness::new();
    let tab_a = harness.open_tab().await;
    tab_a.tab.login(forge_tokens()).await;
    harness
        .origin
        .set(keys::AVAILABLE_ORGANIZATIONS, "{definitely not json")
        .unwrap();
    settle().await;

    let tab_b = harness.open_tab().await;

    assert_eq!(tab_b.tab.phase().await, SessionPhase::Authenticated);
    assert_eq!(tab_b.tab.user().await, Some(common::ada()));
    assert!(tab_b.tab.organizations().await.available.is_empty());
}

#[tokio::test(start_paused = true)]
async fn expired_tokens_block_restoration_and_clear_the_session() {
    let harness = Harness::new();
    // A full snapshot, but the id token expired an hour ago.
    let expired = common::forge_id_token(NOW_MILLIS / 1_000 - 3_600);
    harness.origin.set(keys::ACCESS_TOKEN, "access").unwrap();
    harness.origin.set(keys::REFRESH_TOKEN, "refresh").unwrap();
    harness.origin.set(keys::ID_TOKEN, &expired).unwrap();
    harness
        .origin
        .set(keys::LOGIN_TIME, &NOW_MILLIS.to_string())
        .unwrap();
    harness
        .origin
        .set(keys::LAST_ACTIVITY, &NOW_MILLIS.to_string())
        .unwrap();
    harness.origin.set(keys::USER_ID, "user-1").unwrap();
    harness
        .origin
        .set(keys::USER_EMAIL, "ada@example.com")
        .unwrap();

    let opened = harness.open_tab().await;

    assert!(opened.tab.phase().await.is_terminal());
    assert_eq!(opened.tab.user().await, None);
    assert_eq!(harness.origin.get(keys::ACCESS_TOKEN).unwrap(), None);
    assert_eq!(opened.navigator.last().as_deref(), Some("/"));
}
