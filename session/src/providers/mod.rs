//! Collaborator interfaces.
//!
//! The session subsystem touches the rest of the application through these
//! traits only: a place to redirect on logout, a notification sink, and the
//! identity/organization backend. Reducer logic depends on the traits; the
//! application (or the mocks) provides implementations.

use crate::error::GatewayError;
use crate::state::{OrganizationRecord, UserSnapshot};
use crate::token::BearerCredentials;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Visual weight of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeSeverity {
    /// Informational.
    Info,
    /// Something went wrong and ended the session.
    Destructive,
}

/// A user-facing notice. Always phrased in the user's terms; raw technical
/// errors never surface here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Short title.
    pub title: String,
    /// One-sentence body.
    pub body: String,
    /// Visual weight.
    pub severity: NoticeSeverity,
}

impl Notice {
    /// The notice shown when an authenticated session ends without the user
    /// asking for it.
    #[must_use]
    pub fn session_expired() -> Self {
        Self {
            title: "Session expired".to_string(),
            body: "Your session has expired. Please sign in again.".to_string(),
            severity: NoticeSeverity::Destructive,
        }
    }

    /// The notice shown when a sign-in attempt fails.
    #[must_use]
    pub fn sign_in_failed() -> Self {
        Self {
            title: "Sign-in failed".to_string(),
            body: "We could not sign you in. Please try again.".to_string(),
            severity: NoticeSeverity::Destructive,
        }
    }
}

/// Where teardown and login send the user.
pub trait Navigator: Send + Sync {
    /// Navigate the tab to `route`.
    fn navigate(&self, route: &str);
}

/// Sink for user-facing notices.
pub trait Notifier: Send + Sync {
    /// Surface `notice` to the user.
    fn notify(&self, notice: Notice);
}

/// Denormalized organization and representative-person display fields,
/// persisted for the UI header after login.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationDetails {
    /// Registered business name.
    pub business_name: Option<String>,
    /// Business type label.
    pub business_type: Option<String>,
    /// Phone country calling code.
    pub calling_code: Option<String>,
    /// Phone number.
    pub phone_number: Option<String>,
    /// First address line.
    pub address_line: Option<String>,
    /// Representative person, when the organization names one.
    pub representative: Option<RepresentativeSnapshot>,
}

/// Display fields of an organization's representative person.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepresentativeSnapshot {
    /// Person id.
    pub id: String,
    /// Full display name.
    pub full_name: String,
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Phone country calling code.
    pub calling_code: Option<String>,
    /// Phone number.
    pub phone_number: Option<String>,
}

/// The identity/organization backend.
///
/// Every call carries the stored bearer credentials; a
/// [`GatewayError::Unauthorized`] answer from any of them routes into the
/// same teardown path as local expiry detection.
pub trait IdentityGateway: Send + Sync {
    /// Fetch the identity of the signed-in user.
    fn fetch_identity(
        &self,
        credentials: BearerCredentials,
    ) -> impl Future<Output = Result<UserSnapshot, GatewayError>> + Send;

    /// Fetch the organizations (partition keys) available to the user.
    fn fetch_organizations(
        &self,
        credentials: BearerCredentials,
    ) -> impl Future<Output = Result<Vec<OrganizationRecord>, GatewayError>> + Send;

    /// Fetch display details of the organization behind `partition_key`.
    fn fetch_organization_details(
        &self,
        credentials: BearerCredentials,
        partition_key: String,
    ) -> impl Future<Output = Result<OrganizationDetails, GatewayError>> + Send;
}
