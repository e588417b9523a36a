//! # Crosstab Testing
//!
//! Testing utilities and helpers for the crosstab session architecture.
//!
//! This crate provides:
//! - Deterministic clock implementations ([`mocks::FixedClock`],
//!   [`mocks::SteppingClock`])
//! - The [`ReducerTest`] fluent harness for Given-When-Then reducer tests
//! - Assertion helpers for effect lists
//!
//! ## Example
//!
//! ```ignore
//! use crosstab_testing::ReducerTest;
//!
//! ReducerTest::new(SessionReducer::new(config))
//!     .with_env(test_environment())
//!     .given_state(SessionState::new(tab_id))
//!     .when_action(SessionAction::ValidateRequested)
//!     .then_state(|state| assert!(state.phase.is_authenticated()))
//!     .run();
//! ```


pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations of environment traits.
pub mod mocks {
    use chrono::{DateTime, Duration, Utc};
    use crosstab_core::environment::Clock;
    use std::sync::{Arc, Mutex};

    /// Fixed clock for deterministic tests.
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::Utc;
    /// use crosstab_core::environment::Clock;
    /// use crosstab_testing::mocks::FixedClock;
    ///
    /// let now = Utc::now();
    /// let clock = FixedClock::at(now);
    /// assert_eq!(clock.now(), now);
    /// assert_eq!(clock.now(), now);
    /// ```
    #[derive(Debug, Clone, Copy)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a clock frozen at `time`.
        #[must_use]
        pub const fn at(time: DateTime<Utc>) -> Self {
            Self { time }
        }

        /// Create a clock frozen at the given epoch milliseconds.
        ///
        /// # Panics
        ///
        /// Panics if `millis` is outside the representable chrono range
        /// (never the case for realistic test timestamps).
        #[must_use]
        #[allow(clippy::expect_used)] // Test helper, invalid input is a test bug
        pub fn at_millis(millis: i64) -> Self {
            Self {
                time: DateTime::from_timestamp_millis(millis).expect("timestamp in range"),
            }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Stepping clock for scenario tests.
    ///
    /// Starts at a chosen instant and only moves when the test advances it,
    /// so "31 seconds later" is a statement in the test rather than a sleep.
    ///
    /// Clones share the same underlying instant.
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::{Duration, Utc};
    /// use crosstab_core::environment::Clock;
    /// use crosstab_testing::mocks::SteppingClock;
    ///
    /// let clock = SteppingClock::at(Utc::now());
    /// let start = clock.now();
    /// clock.advance(Duration::minutes(31));
    /// assert_eq!(clock.now() - start, Duration::minutes(31));
    /// ```
    #[derive(Debug, Clone)]
    pub struct SteppingClock {
        time: Arc<Mutex<DateTime<Utc>>>,
    }

    impl SteppingClock {
        /// Create a stepping clock starting at `time`.
        #[must_use]
        pub fn at(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(Mutex::new(time)),
            }
        }

        /// Create a stepping clock starting at the given epoch milliseconds.
        ///
        /// # Panics
        ///
        /// Panics if `millis` is outside the representable chrono range.
        #[must_use]
        #[allow(clippy::expect_used)] // Test helper, invalid input is a test bug
        pub fn at_millis(millis: i64) -> Self {
            Self::at(DateTime::from_timestamp_millis(millis).expect("timestamp in range"))
        }

        /// Move the clock forward by `delta`.
        ///
        /// # Panics
        ///
        /// Panics if the clock mutex is poisoned.
        #[allow(clippy::expect_used)] // Test helper
        pub fn advance(&self, delta: Duration) {
            let mut guard = self.time.lock().expect("clock lock");
            *guard += delta;
        }

        /// Move the clock forward by whole milliseconds.
        pub fn advance_millis(&self, millis: i64) {
            self.advance(Duration::milliseconds(millis));
        }
    }

    impl Clock for SteppingClock {
        #[allow(clippy::expect_used)] // Test helper
        fn now(&self) -> DateTime<Utc> {
            *self.time.lock().expect("clock lock")
        }
    }
}
