//! Session-scoped handoff of the weak-letter review set.
//!
//! The progress panel offers a list of letter ids; the flashcards exercise
//! takes it on its next mount. The value is read once and then cleared.

use crate::storage::{KvMedium, MemoryMedium, Store};
use std::sync::Arc;
use tracing::debug;

/// Session key for the review set
pub const REVIEW_KEY: &str = "review-set";

/// Namespace used for session-scoped keys
pub const SESSION_NAMESPACE: &str = "hebrew-read-session";

pub struct ReviewHandoff<M: KvMedium = Arc<MemoryMedium>> {
    session: Store<M>,
}

impl Default for ReviewHandoff {
    fn default() -> Self {
        Self::new()
    }
}

impl ReviewHandoff {
    /// Fresh in-memory session
    pub fn new() -> Self {
        Self::over(Arc::new(MemoryMedium::new()))
    }
}

impl<M: KvMedium> ReviewHandoff<M> {
    pub fn over(medium: M) -> Self {
        Self {
            session: Store::new(medium, SESSION_NAMESPACE),
        }
    }

    /// Stage `ids` for the next flashcards mount; replaces any earlier offer
    pub fn offer(&self, ids: &[String]) -> bool {
        debug!(count = ids.len(), "[review] review set offered");
        self.session.save(REVIEW_KEY, ids)
    }

    /// Consume the staged set. A corrupt payload is discarded.
    pub fn take(&self) -> Option<Vec<String>> {
        let ids = self.session.load::<Vec<String>>(REVIEW_KEY);
        self.session.remove(REVIEW_KEY);
        ids
    }

    pub fn is_staged(&self) -> bool {
        self.session.load_value(REVIEW_KEY).is_some()
    }
}
