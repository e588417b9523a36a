//! Mock notifier for testing.

use crate::providers::{Notice, Notifier};
use std::sync::{Arc, Mutex};

/// Mock notifier capturing every surfaced notice.
#[derive(Debug, Clone, Default)]
pub struct MockNotifier {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl MockNotifier {
    /// Create a new mock notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notice surfaced, in order.
    #[must_use]
    #[allow(clippy::expect_used)] // Test helper
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().expect("notifier lock").clone()
    }

    /// Number of notices surfaced.
    #[must_use]
    pub fn count(&self) -> usize {
        self.notices().len()
    }
}

impl Notifier for MockNotifier {
    #[allow(clippy::expect_used)] // Test helper
    fn notify(&self, notice: Notice) {
        self.notices.lock().expect("notifier lock").push(notice);
    }
}
