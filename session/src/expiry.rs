//! Session expiry policy.
//!
//! A session dies for one of two independent reasons: it outlived the
//! absolute ceiling counted from login, or the user went quiet for longer
//! than the inactivity window. Both are evaluated here as a pure function of
//! the stored timestamps; activity never resets the absolute ceiling.

use chrono::Duration;

/// Why a session was judged expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpiryReason {
    /// `login_time` or `last_activity` was absent or non-numeric.
    MissingSessionData,
    /// The session outlived the absolute ceiling counted from login.
    MaxSessionDuration,
    /// No activity within the inactivity window.
    InactivityTimeout,
}

impl ExpiryReason {
    /// Stable name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingSessionData => "missing_session_data",
            Self::MaxSessionDuration => "max_session_duration",
            Self::InactivityTimeout => "inactivity_timeout",
        }
    }
}

/// Outcome of one expiry evaluation. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryVerdict {
    /// The session is within both limits.
    Active,
    /// The session is over a limit and must be torn down.
    Expired(ExpiryReason),
}

impl ExpiryVerdict {
    /// Returns `true` for [`ExpiryVerdict::Expired`].
    #[must_use]
    pub const fn is_expired(self) -> bool {
        matches!(self, Self::Expired(_))
    }

    /// The expiry reason, if expired.
    #[must_use]
    pub const fn reason(self) -> Option<ExpiryReason> {
        match self {
            Self::Active => None,
            Self::Expired(reason) => Some(reason),
        }
    }
}

/// The two timeouts a session is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    /// Absolute ceiling counted from `login_time`, regardless of activity.
    pub max_session_duration: Duration,
    /// Longest tolerated gap since `last_activity`. Materially shorter than
    /// the ceiling.
    pub inactivity_timeout: Duration,
}

/// Evaluate session validity at `now_millis`.
///
/// The absolute-duration check runs before the inactivity check; either alone
/// is terminal.
#[must_use]
pub fn evaluate(
    login_time_millis: Option<i64>,
    last_activity_millis: Option<i64>,
    now_millis: i64,
    policy: &ExpiryPolicy,
) -> ExpiryVerdict {
    let (Some(login_time), Some(last_activity)) = (login_time_millis, last_activity_millis) else {
        return ExpiryVerdict::Expired(ExpiryReason::MissingSessionData);
    };

    let time_since_login = now_millis.saturating_sub(login_time);
    if time_since_login > policy.max_session_duration.num_milliseconds() {
        return ExpiryVerdict::Expired(ExpiryReason::MaxSessionDuration);
    }

    let time_since_activity = now_millis.saturating_sub(last_activity);
    if time_since_activity > policy.inactivity_timeout.num_milliseconds() {
        return ExpiryVerdict::Expired(ExpiryReason::InactivityTimeout);
    }

    ExpiryVerdict::Active
}
