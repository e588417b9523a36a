//! Session configuration.
//!
//! Configuration is the single source of truth for every threshold; the
//! numeric values below are documented fallback defaults, not hardcoded
//! policy scattered through the code.

use crate::expiry::ExpiryPolicy;
use chrono::Duration;

/// Session lifecycle configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Absolute session ceiling counted from login, regardless of activity.
    ///
    /// Default: 24 hours.
    pub max_session_duration: Duration,

    /// Longest tolerated gap since the last recorded activity. Materially
    /// shorter than the ceiling.
    ///
    /// Default: 30 minutes.
    pub inactivity_timeout: Duration,

    /// Minimum interval between successive `last_activity` writes, bounding
    /// write frequency under high-volume interaction events.
    ///
    /// Default: 30 seconds.
    pub activity_throttle: Duration,

    /// How long a freshly restored tab waits before announcing the
    /// restoration to peers, letting the local UI settle first.
    ///
    /// Default: 250 ms.
    pub restore_announce_delay: std::time::Duration,

    /// Low-frequency re-validation safety net. Event-driven triggers
    /// (visibility, storage, broadcast) are the primary mechanism; `None`
    /// disables the periodic check entirely.
    ///
    /// Default: every 5 minutes.
    pub revalidate_interval: Option<std::time::Duration>,

    /// Whether expiry teardown surfaces a user-visible notice. Explicit
    /// user-initiated logout is always silent regardless of this flag.
    ///
    /// Default: `true`.
    pub show_expiration_notice: bool,

    /// Route of the unauthenticated entry page.
    ///
    /// Default: `/`.
    pub login_route: String,

    /// Route navigated to after a successful login.
    ///
    /// Default: `/home`.
    pub home_route: String,
}

impl SessionConfig {
    /// Set the absolute session ceiling.
    #[must_use]
    pub const fn with_max_session_duration(mut self, duration: Duration) -> Self {
        self.max_session_duration = duration;
        self
    }

    /// Set the inactivity timeout.
    #[must_use]
    pub const fn with_inactivity_timeout(mut self, timeout: Duration) -> Self {
        self.inactivity_timeout = timeout;
        self
    }

    /// Set the activity write throttle.
    #[must_use]
    pub const fn with_activity_throttle(mut self, throttle: Duration) -> Self {
        self.activity_throttle = throttle;
        self
    }

    /// Set the restoration announce delay.
    #[must_use]
    pub const fn with_restore_announce_delay(mut self, delay: std::time::Duration) -> Self {
        self.restore_announce_delay = delay;
        self
    }

    /// Set or disable the periodic re-validation safety net.
    #[must_use]
    pub const fn with_revalidate_interval(mut self, interval: Option<std::time::Duration>) -> Self {
        self.revalidate_interval = interval;
        self
    }

    /// Enable or suppress the expiry notice.
    #[must_use]
    pub const fn with_expiration_notice(mut self, show: bool) -> Self {
        self.show_expiration_notice = show;
        self
    }

    /// The two timeouts as an [`ExpiryPolicy`].
    #[must_use]
    pub const fn expiry_policy(&self) -> ExpiryPolicy {
        ExpiryPolicy {
            max_session_duration: self.max_session_duration,
            inactivity_timeout: self.inactivity_timeout,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_session_duration: Duration::hours(24),
            inactivity_timeout: Duration::minutes(30),
            activity_throttle: Duration::seconds(30),
            restore_announce_delay: std::time::Duration::from_millis(250),
            revalidate_interval: Some(std::time::Duration::from_secs(300)),
            show_expiration_notice: true,
            login_route: "/".to_string(),
            home_route: "/home".to_string(),
        }
    }
}
