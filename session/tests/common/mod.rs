//! Shared harness for the session integration tests.
//!
//! Builds a simulated origin: one shared storage area, one broadcast bus, a
//! stepping clock, and tabs wired with mock collaborators.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test support code
#![allow(dead_code)] // Not every test file uses every helper

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use crosstab_session::mocks::{MockIdentityGateway, MockNavigator, MockNotifier};
use crosstab_session::state::OrganizationRecord;
use crosstab_session::stores::MemoryKeyValueStore;
use crosstab_session::{SessionBus, SessionConfig, Tab, TokenSet, UserSnapshot};
use crosstab_testing::mocks::SteppingClock;
use std::sync::Arc;
use std::time::Duration;

/// The frozen "wall clock" start of every scenario.
pub const NOW_MILLIS: i64 = 1_750_000_000_000;

/// A tab plus handles to its recording mocks.
pub struct OpenTab {
    pub tab: Tab<MockIdentityGateway, MockNavigator, MockNotifier>,
    pub navigator: MockNavigator,
    pub notifier: MockNotifier,
    pub gateway: MockIdentityGateway,
}

/// One simulated origin.
pub struct Harness {
    pub origin: MemoryKeyValueStore,
    pub bus: SessionBus,
    pub clock: SteppingClock,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            origin: MemoryKeyValueStore::new(),
            bus: SessionBus::new(),
            clock: SteppingClock::at_millis(NOW_MILLIS),
        }
    }

    /// Default test configuration: event-driven only (the periodic safety
    /// net gets its own dedicated test).
    pub fn config() -> SessionConfig {
        SessionConfig::default().with_revalidate_interval(None)
    }

    /// Open a tab with the standard canned gateway (Ada + three orgs).
    pub async fn open_tab(&self) -> OpenTab {
        self.open_tab_with(self.bus.clone(), default_gateway(), Self::config())
            .await
    }

    /// Open a tab on a specific bus (e.g. a disconnected one to simulate
    /// missing broadcast delivery).
    pub async fn open_tab_on(&self, bus: SessionBus) -> OpenTab {
        self.open_tab_with(bus, default_gateway(), Self::config()).await
    }

    /// Open a tab with full control over gateway and config.
    pub async fn open_tab_with(
        &self,
        bus: SessionBus,
        gateway: MockIdentityGateway,
        config: SessionConfig,
    ) -> OpenTab {
        let navigator = MockNavigator::new();
        let notifier = MockNotifier::new();
        let tab = Tab::open(
            &self.origin,
            &bus,
            gateway.clone(),
            navigator.clone(),
            notifier.clone(),
            Arc::new(self.clock.clone()),
            config,
        )
        .await;
        OpenTab {
            tab,
            navigator,
            notifier,
            gateway,
        }
    }
}

/// The canned gateway most scenarios use.
pub fn default_gateway() -> MockIdentityGateway {
    MockIdentityGateway::new()
        .with_user(ada())
        .with_organizations(organizations(3))
}

pub fn ada() -> UserSnapshot {
    UserSnapshot {
        id: "user-1".to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "ada@example.com".to_string(),
    }
}

pub fn organizations(count: usize) -> Vec<OrganizationRecord> {
    (1..=count)
        .map(|i| OrganizationRecord {
            id: i.to_string(),
            partition_key: format!("pk-{i}"),
            name: format!("Org {i}"),
            role: "admin".to_string(),
            org_type: "Organizational".to_string(),
            customer_id: "user-1".to_string(),
        })
        .collect()
}

/// A structured identity token expiring two days after [`NOW_MILLIS`].
pub fn forge_tokens() -> TokenSet {
    let exp = NOW_MILLIS / 1_000 + 48 * 3_600;
    TokenSet {
        access_token: "access-token".to_string(),
        refresh_token: "refresh-token".to_string(),
        id_token: forge_id_token(exp),
    }
}

pub fn forge_id_token(exp_epoch_seconds: i64) -> String {
    let payload =
        serde_json::json!({ "sub": "user-1", "exp": exp_epoch_seconds }).to_string();
    format!("header.{}.signature", URL_SAFE_NO_PAD.encode(payload))
}

/// Let the spawned listener tasks drain their queues.
///
/// Runs on the current-thread test runtime: a couple of yields lets every
/// ready task run, and the short virtual sleeps act as sync points under
/// paused time.
pub async fn settle() {
    for _ in 0..25 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(2)).await;
    for _ in 0..25 {
        tokio::task::yield_now().await;
    }
}
