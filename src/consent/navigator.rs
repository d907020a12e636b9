//! Window navigation side effects.

use std::sync::{Arc, Mutex, PoisonError};

/// Where an opened link goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTarget {
    /// A new tab (`_blank`).
    Blank,
    /// The browser's default for `window.open`.
    Default,
}

/// Trait for the browser window the widget lives in.
pub trait Navigator: Send + Sync {
    /// `history.back()`.
    fn history_back(&self);

    fn open(&self, url: &str, target: LinkTarget);
}

impl<N: Navigator + ?Sized> Navigator for Arc<N> {
    fn history_back(&self) {
        (**self).history_back()
    }

    fn open(&self, url: &str, target: LinkTarget) {
        (**self).open(url, target)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationEvent {
    Back,
    Open { url: String, target: LinkTarget },
}

/// Records navigation instead of performing it.
#[derive(Debug, Default)]
pub struct SessionHistory {
    events: Mutex<Vec<NavigationEvent>>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NavigationEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn back_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| **e == NavigationEvent::Back)
            .count()
    }

    fn record(&self, event: NavigationEvent) {
        tracing::debug!(?event, "navigation");
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl Navigator for SessionHistory {
    fn history_back(&self) {
        self.record(NavigationEvent::Back);
    }

    fn open(&self, url: &str, target: LinkTarget) {
        self.record(NavigationEvent::Open {
            url: url.to_string(),
            target,
        });
    }
}
