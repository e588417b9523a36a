//! Lifecycle integration tests: login, expiry, teardown.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

mod common;

use chrono::Duration;
use common::{Harness, NOW_MILLIS, forge_tokens, settle};
use crosstab_session::{
    ExpiryReason, SessionPhase, TeardownReason, keys, stores::KeyValueStore,
};

#[tokio::test(start_paused = true)]
async fn login_persists_the_session_record_and_lands_home() {
    let harness = Harness::new();
    let opened = harness.open_tab().await;

    opened.tab.login(forge_tokens()).await;

    assert_eq!(opened.tab.phase().await, SessionPhase::Authenticated);
    assert_eq!(opened.tab.user().await, Some(common::ada()));

    // The session record was written as one unit.
    let stamp = NOW_MILLIS.to_string();
    for (key, expected) in [
        (keys::ACCESS_TOKEN, "access-token".to_string()),
        (keys::REFRESH_TOKEN, "refresh-token".to_string()),
        (keys::LOGIN_TIME, stamp.clone()),
        (keys::LAST_ACTIVITY, stamp),
    ] {
        assert_eq!(
            harness.origin.get(key).unwrap().as_deref(),
            Some(expected.as_str()),
            "key {key}"
        );
    }
    // Legacy jwt duplicate mirrors the id token.
    assert_eq!(
        harness.origin.get(keys::JWT).unwrap(),
        harness.origin.get(keys::ID_TOKEN).unwrap()
    );

    // Identity and organization context were snapshotted.
    assert_eq!(
        harness.origin.get(keys::USER_EMAIL).unwrap().as_deref(),
        Some("ada@example.com")
    );
    assert_eq!(
        harness.origin.get(keys::PARTITION_KEY).unwrap().as_deref(),
        Some("pk-1")
    );

    assert_eq!(opened.navigator.last().as_deref(), Some("/home"));
    assert!(opened.tab.is_session_valid().await);
    assert!(opened.tab.is_tracking_activity());
}

#[tokio::test(start_paused = true)]
async fn inactivity_timeout_clears_every_session_key() {
    let harness = Harness::new();
    let opened = harness.open_tab().await;
    opened.tab.login(forge_tokens()).await;

    // One millisecond past the inactivity window, with no interaction.
    harness.clock.advance(Duration::minutes(30) + Duration::milliseconds(1));

    assert!(!opened.tab.validate_session().await);
    assert_eq!(
        opened.tab.phase().await,
        SessionPhase::TornDown {
            reason: TeardownReason::Expired(ExpiryReason::InactivityTimeout)
        }
    );
    for key in keys::SESSION_KEYS {
        assert_eq!(harness.origin.get(key).unwrap(), None, "key {key} survived");
    }
    assert_eq!(opened.navigator.last().as_deref(), Some("/"));
    assert_eq!(opened.notifier.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn absolute_ceiling_wins_over_fresh_activity() {
    let harness = Harness::new();
    let opened = harness.open_tab().await;
    opened.tab.login(forge_tokens()).await;

    harness.clock.advance(Duration::hours(24) + Duration::seconds(1));
    // Activity recorded this very millisecond cannot save the session.
    opened.tab.update_last_activity();

    assert!(!opened.tab.validate_session().await);
    assert_eq!(
        opened.tab.phase().await,
        SessionPhase::TornDown {
            reason: TeardownReason::Expired(ExpiryReason::MaxSessionDuration)
        }
    );
}

#[tokio::test(start_paused = true)]
async fn interaction_keeps_the_session_alive_within_the_ceiling() {
    let harness = Harness::new();
    let opened = harness.open_tab().await;
    opened.tab.login(forge_tokens()).await;

    // Interact every 20 minutes for 2 hours; each validation passes.
    for _ in 0..6 {
        harness.clock.advance(Duration::minutes(20));
        assert!(opened.tab.interaction(crosstab_session::InteractionKind::Click));
        assert!(opened.tab.validate_session().await);
    }
    assert!(opened.tab.is_session_valid().await);
}

#[tokio::test(start_paused = true)]
async fn language_preference_survives_teardown() {
    let harness = Harness::new();
    let opened = harness.open_tab().await;
    opened.tab.login(forge_tokens()).await;
    harness.origin.set(keys::LANGUAGE, "es").unwrap();

    opened.tab.logout().await;

    assert_eq!(
        harness.origin.get(keys::LANGUAGE).unwrap().as_deref(),
        Some("es")
    );
    for key in keys::SESSION_KEYS {
        assert_eq!(harness.origin.get(key).unwrap(), None, "key {key} survived");
    }
}

#[tokio::test(start_paused = true)]
async fn explicit_logout_is_silent_and_navigates_to_login() {
    let harness = Harness::new();
    let opened = harness.open_tab().await;
    opened.tab.login(forge_tokens()).await;

    opened.tab.logout().await;

    assert_eq!(
        opened.tab.phase().await,
        SessionPhase::TornDown {
            reason: TeardownReason::UserLogout
        }
    );
    assert_eq!(opened.notifier.count(), 0);
    assert_eq!(opened.navigator.last().as_deref(), Some("/"));
}

#[tokio::test(start_paused = true)]
async fn concurrent_teardown_navigates_exactly_once() {
    let harness = Harness::new();
    let opened = harness.open_tab().await;
    opened.tab.login(forge_tokens()).await;
    let navigations_before = opened.navigator.navigations().len();

    tokio::join!(opened.tab.logout(), opened.tab.logout());
    settle().await;

    assert_eq!(
        opened.navigator.navigations().len(),
        navigations_before + 1,
        "teardown must navigate exactly once"
    );
    assert_eq!(opened.notifier.count(), 0);
}

#[tokio::test(start_paused = true)]
async fn unauthorized_response_tears_down_with_a_notice() {
    let harness = Harness::new();
    let opened = harness.open_tab().await;
    opened.tab.login(forge_tokens()).await;

    // The 401 interceptor path.
    opened.tab.on_unauthorized().await;

    assert_eq!(
        opened.tab.phase().await,
        SessionPhase::TornDown {
            reason: TeardownReason::RemoteUnauthorized
        }
    );
    assert_eq!(opened.notifier.count(), 1);
    assert!(!opened.tab.is_session_valid().await);
}

#[tokio::test(start_paused = true)]
async fn activity_tracking_stops_at_teardown() {
    let harness = Harness::new();
    let opened = harness.open_tab().await;
    opened.tab.login(forge_tokens()).await;
    assert!(opened.tab.is_tracking_activity());

    opened.tab.logout().await;

    assert!(!opened.tab.is_tracking_activity());
    harness.clock.advance(Duration::minutes(5));
    assert!(!opened.tab.interaction(crosstab_session::InteractionKind::KeyPress));
    assert_eq!(harness.origin.get(keys::LAST_ACTIVITY).unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn periodic_safety_net_catches_background_expiry() {
    let harness = Harness::new();
    let config = Harness::config()
        .with_revalidate_interval(Some(std::time::Duration::from_secs(60)));
    let opened = harness
        .open_tab_with(harness.bus.clone(), common::default_gateway(), config)
        .await;
    opened.tab.login(forge_tokens()).await;

    // The session goes quiet past the inactivity window. No user trigger
    // fires; only the low-frequency tick is left.
    harness.clock.advance(Duration::minutes(31));
    tokio::time::sleep(std::time::Duration::from_secs(65)).await;
    settle().await;

    assert_eq!(
        opened.tab.phase().await,
        SessionPhase::TornDown {
            reason: TeardownReason::Expired(ExpiryReason::InactivityTimeout)
        }
    );
}
