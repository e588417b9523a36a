//! Mock identity gateway for testing.

use crate::error::GatewayError;
use crate::providers::{IdentityGateway, OrganizationDetails};
use crate::state::{OrganizationRecord, UserSnapshot};
use crate::token::BearerCredentials;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Responses {
    user: Option<UserSnapshot>,
    organizations: Vec<OrganizationRecord>,
    details: OrganizationDetails,
    fail_with: Option<GatewayError>,
}

/// Mock identity/organization gateway.
///
/// Answers from canned responses and counts calls; `failing_with` turns every
/// call into the given error (set [`GatewayError::Unauthorized`] to exercise
/// the 401 path).
#[derive(Debug, Clone, Default)]
pub struct MockIdentityGateway {
    responses: Arc<Mutex<Responses>>,
    calls: Arc<AtomicUsize>,
}

impl MockIdentityGateway {
    /// Create a gateway with empty canned responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the identity returned by `fetch_identity`.
    #[must_use]
    #[allow(clippy::expect_used)] // Test helper
    pub fn with_user(self, user: UserSnapshot) -> Self {
        self.responses.lock().expect("gateway lock").user = Some(user);
        self
    }

    /// Set the organizations returned by `fetch_organizations`.
    #[must_use]
    #[allow(clippy::expect_used)] // Test helper
    pub fn with_organizations(self, organizations: Vec<OrganizationRecord>) -> Self {
        self.responses.lock().expect("gateway lock").organizations = organizations;
        self
    }

    /// Set the details returned by `fetch_organization_details`.
    #[must_use]
    #[allow(clippy::expect_used)] // Test helper
    pub fn with_details(self, details: OrganizationDetails) -> Self {
        self.responses.lock().expect("gateway lock").details = details;
        self
    }

    /// Make every call fail with `error`.
    #[must_use]
    #[allow(clippy::expect_used)] // Test helper
    pub fn failing_with(self, error: GatewayError) -> Self {
        self.responses.lock().expect("gateway lock").fail_with = Some(error);
        self
    }

    /// Total number of gateway calls made.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    #[allow(clippy::expect_used)] // Test helper
    fn answer<R>(&self, pick: impl FnOnce(&Responses) -> R) -> Result<R, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let responses = self.responses.lock().expect("gateway lock");
        match &responses.fail_with {
            Some(error) => Err(error.clone()),
            None => Ok(pick(&responses)),
        }
    }
}

impl IdentityGateway for MockIdentityGateway {
    fn fetch_identity(
        &self,
        _credentials: BearerCredentials,
    ) -> impl Future<Output = Result<UserSnapshot, GatewayError>> + Send {
        let answer = self.answer(|r| r.user.clone()).and_then(|user| {
            user.ok_or_else(|| GatewayError::Malformed("no canned identity".to_string()))
        });
        async move { answer }
    }

    fn fetch_organizations(
        &self,
        _credentials: BearerCredentials,
    ) -> impl Future<Output = Result<Vec<OrganizationRecord>, GatewayError>> + Send {
        let answer = self.answer(|r| r.organizations.clone());
        async move { answer }
    }

    fn fetch_organization_details(
        &self,
        _credentials: BearerCredentials,
        _partition_key: String,
    ) -> impl Future<Output = Result<OrganizationDetails, GatewayError>> + Send {
        let answer = self.answer(|r| r.details.clone());
        async move { answer }
    }
}
