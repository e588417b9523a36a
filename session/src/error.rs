//! Error types for the session subsystem.

use thiserror::Error;

/// Durable key-value storage failures.
///
/// Storage failing is never fatal by itself: callers log the error and
/// degrade toward "assume the session is invalid", because failing open on
/// authentication state is the unsafe direction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The storage area could not be read or written.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Identity/organization backend failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The backend rejected the bearer credentials.
    ///
    /// A 401 from any authenticated call is an authoritative remote signal of
    /// session invalidity and routes into the same teardown path as local
    /// expiry detection.
    #[error("unauthorized")]
    Unauthorized,

    /// The backend could not be reached.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The backend answered with a payload the client could not interpret.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl GatewayError {
    /// Returns `true` if this error must trigger session teardown.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}
