//! services/storefront/src/adapters/navigator.rs
//!
//! A `Navigator` that records every route it is sent to. Consumers without a
//! real screen stack (the smoke-run binary, tests) inspect the history instead.

use std::sync::Mutex;
use storefront_core::ports::{Navigator, Route};
use tracing::info;

#[derive(Debug, Default)]
pub struct RecordingNavigator {
    history: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<Route> {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn current(&self) -> Option<Route> {
        self.history().last().copied()
    }

    pub fn visits(&self, route: Route) -> usize {
        self.history().iter().filter(|r| **r == route).count()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        info!(path = route.path(), "Navigating");
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(route);
    }
}
