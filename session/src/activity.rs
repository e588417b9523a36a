//! User activity tracking.
//!
//! Listens to user-interaction signals and keeps the durable `last_activity`
//! timestamp fresh, throttled so bursts of high-frequency events (pointer
//! moves, scrolling) cost at most one storage write per interval.

use crate::keys;
use crate::stores::{KeyValueStore, read_millis};
use chrono::Duration;
use crosstab_core::environment::Clock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// The user-interaction signals that count as activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    /// Pointer button pressed.
    PointerDown,
    /// Pointer moved.
    PointerMove,
    /// Key pressed.
    KeyPress,
    /// Page scrolled.
    Scroll,
    /// Touch started.
    TouchStart,
    /// Element clicked.
    Click,
}

impl InteractionKind {
    /// Every signal kind the tracker subscribes to.
    pub const ALL: [Self; 6] = [
        Self::PointerDown,
        Self::PointerMove,
        Self::KeyPress,
        Self::Scroll,
        Self::TouchStart,
        Self::Click,
    ];

    /// Stable name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PointerDown => "pointerdown",
            Self::PointerMove => "pointermove",
            Self::KeyPress => "keypress",
            Self::Scroll => "scroll",
            Self::TouchStart => "touchstart",
            Self::Click => "click",
        }
    }
}

/// Write `now` into the `last_activity` key unconditionally.
///
/// Used by the tracker once the throttle allows it and by the validator to
/// extend the session on every successful pass. Write failures are logged and
/// swallowed; the next expiry evaluation will judge the stale timestamp.
pub fn write_last_activity<K: KeyValueStore>(storage: &K, now_millis: i64) {
    if let Err(error) = storage.set(keys::LAST_ACTIVITY, &now_millis.to_string()) {
        tracing::warn!(%error, "failed to write last_activity");
    }
}

/// Throttled `last_activity` writer.
///
/// Inert until [`ActivityTracker::start`] and after [`ActivityTracker::stop`],
/// so a signed-out tab records nothing and teardown leaves no listener
/// writing into a cleared store.
pub struct ActivityTracker<K> {
    storage: K,
    clock: Arc<dyn Clock>,
    throttle_millis: i64,
    listening: AtomicBool,
}

impl<K: KeyValueStore> ActivityTracker<K> {
    /// Create a tracker writing through `storage`.
    pub fn new(storage: K, clock: Arc<dyn Clock>, throttle: Duration) -> Self {
        Self {
            storage,
            clock,
            throttle_millis: throttle.num_milliseconds(),
            listening: AtomicBool::new(false),
        }
    }

    /// Attach the interaction listeners. Idempotent.
    pub fn start(&self) {
        if !self.listening.swap(true, Ordering::SeqCst) {
            tracing::debug!("activity tracking started");
        }
    }

    /// Detach the interaction listeners. Idempotent.
    pub fn stop(&self) {
        if self.listening.swap(false, Ordering::SeqCst) {
            tracing::debug!("activity tracking stopped");
        }
    }

    /// Whether listeners are currently attached.
    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    /// Record one interaction signal.
    ///
    /// Returns `true` if a storage write happened. Writes occur at most once
    /// per throttle interval, however many signals arrive.
    pub fn record(&self, kind: InteractionKind) -> bool {
        if !self.is_listening() {
            return false;
        }

        let now = self.clock.now_millis();
        let fresh_enough = read_millis(&self.storage, keys::LAST_ACTIVITY)
            .is_some_and(|last| now.saturating_sub(last) <= self.throttle_millis);
        if fresh_enough {
            return false;
        }

        tracing::debug!(signal = kind.as_str(), "user activity recorded");
        write_last_activity(&self.storage, now);
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use crate::mocks::CountingStore;
    use crate::stores::MemoryKeyValueStore;
    use crosstab_testing::mocks::SteppingClock;

    type TestTracker = ActivityTracker<CountingStore<MemoryKeyValueStore>>;

    fn tracker_with(
        throttle: Duration,
    ) -> (TestTracker, SteppingClock, CountingStore<MemoryKeyValueStore>) {
        let clock = SteppingClock::at_millis(1_000_000);
        let storage = CountingStore::new(MemoryKeyValueStore::new());
        let tracker = ActivityTracker::new(storage.clone(), Arc::new(clock.clone()), throttle);
        (tracker, clock, storage)
    }

    #[test]
    fn burst_of_signals_writes_once() {
        let (tracker, clock, storage) = tracker_with(Duration::seconds(30));
        tracker.start();

        // 1000 pointer moves over ~100ms against a 30s throttle.
        let mut writes = 0;
        for _ in 0..1_000 {
            if tracker.record(InteractionKind::PointerMove) {
                writes += 1;
            }
            clock.advance(Duration::microseconds(100));
        }

        assert_eq!(writes, 1);
        assert_eq!(storage.writes(keys::LAST_ACTIVITY), 1);
    }

    #[test]
    fn writes_resume_after_the_throttle_interval() {
        let (tracker, clock, storage) = tracker_with(Duration::seconds(30));
        tracker.start();

        assert!(tracker.record(InteractionKind::Click));
        clock.advance(Duration::seconds(29));
        assert!(!tracker.record(InteractionKind::Click));
        clock.advance(Duration::seconds(2));
        assert!(tracker.record(InteractionKind::Click));
        assert_eq!(storage.writes(keys::LAST_ACTIVITY), 2);
    }

    #[test]
    fn stopped_tracker_records_nothing() {
        let (tracker, _clock, storage) = tracker_with(Duration::seconds(30));
        assert!(!tracker.record(InteractionKind::KeyPress));

        tracker.start();
        assert!(tracker.record(InteractionKind::KeyPress));

        tracker.stop();
        assert!(!tracker.is_listening());
        assert!(!tracker.record(InteractionKind::KeyPress));
        assert_eq!(storage.writes(keys::LAST_ACTIVITY), 1);
    }
}
