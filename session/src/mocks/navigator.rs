//! Mock navigator for testing.

use crate::providers::Navigator;
use std::sync::{Arc, Mutex};

/// Mock navigator recording every navigation.
#[derive(Debug, Clone, Default)]
pub struct MockNavigator {
    routes: Arc<Mutex<Vec<String>>>,
}

impl MockNavigator {
    /// Create a new mock navigator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every route navigated to, in order.
    #[must_use]
    #[allow(clippy::expect_used)] // Test helper
    pub fn navigations(&self) -> Vec<String> {
        self.routes.lock().expect("navigator lock").clone()
    }

    /// The most recent navigation, if any.
    #[must_use]
    pub fn last(&self) -> Option<String> {
        self.navigations().last().cloned()
    }
}

impl Navigator for MockNavigator {
    #[allow(clippy::expect_used)] // Test helper
    fn navigate(&self, route: &str) {
        self.routes
            .lock()
            .expect("navigator lock")
            .push(route.to_string());
    }
}
