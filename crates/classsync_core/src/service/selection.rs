//! Campus selection tracking for in-flight requests.
//!
//! Every screen load takes a [`SelectionTicket`] before its first await.
//! Switching campus bumps the generation, so a load that finishes after the
//! switch sees a stale ticket and drops its result instead of writing it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Selection active when a request was launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionTicket {
    pub campus_id: Option<String>,
    generation: u64,
}

#[derive(Debug, Default)]
pub struct SelectionTracker {
    current: Mutex<Option<String>>,
    generation: AtomicU64,
}

impl SelectionTracker {
    pub fn new(initial: Option<String>) -> Self {
        Self {
            current: Mutex::new(initial),
            generation: AtomicU64::new(0),
        }
    }

    pub fn current(&self) -> Option<String> {
        self.current
            .lock()
            .map(|current| current.clone())
            .unwrap_or(None)
    }

    /// Switches selection; returns `false` when it was already selected.
    pub fn select(&self, campus_id: Option<String>) -> bool {
        let Ok(mut current) = self.current.lock() else {
            return false;
        };
        if *current == campus_id {
            return false;
        }
        *current = campus_id;
        self.generation.fetch_add(1, Ordering::SeqCst);
        true
    }

    pub fn ticket(&self) -> SelectionTicket {
        let Ok(current) = self.current.lock() else {
            return SelectionTicket {
                campus_id: None,
                generation: u64::MAX,
            };
        };
        SelectionTicket {
            campus_id: current.clone(),
            generation: self.generation.load(Ordering::SeqCst),
        }
    }

    pub fn is_current(&self, ticket: &SelectionTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.generation
    }
}
