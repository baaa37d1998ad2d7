//! Progress reporter: the one callback exercises get.
//!
//! Requests are queued and drained into the engine under the engine lock.
//! A subscriber that reports from inside `record_outcome` (re-entry on the
//! draining thread) leaves its request in the queue and returns; the
//! current drain applies it once the in-flight call is done. Every other
//! caller waits for the lock, so its outcome is applied before `report`
//! returns.
//!
//! Holding the engine lock while calling `report` on the same thread,
//! outside a drain, deadlocks.

use crate::badges::Achievement;
use crate::mastery::{MasteryEngine, ProgressDelta};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{trace, warn};

thread_local! {
    // Engines this thread is currently draining into
    static DRAINING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Marks an engine as being drained on this thread until dropped
struct DrainMark(usize);

impl DrainMark {
    fn enter(engine: usize) -> Option<Self> {
        DRAINING.with(|d| {
            let mut d = d.borrow_mut();
            if d.contains(&engine) {
                None
            } else {
                d.push(engine);
                Some(Self(engine))
            }
        })
    }
}

impl Drop for DrainMark {
    fn drop(&mut self) {
        DRAINING.with(|d| d.borrow_mut().retain(|e| *e != self.0));
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Ingest {
    Outcome(ProgressDelta),
    Achievement(Achievement),
}

/// Cloneable handle exercises use to report outcomes
#[derive(Clone)]
pub struct ProgressReporter {
    engine: Arc<Mutex<MasteryEngine>>,
    pending: Arc<Mutex<VecDeque<Ingest>>>,
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("pending", &self.pending_len())
            .finish()
    }
}

impl ProgressReporter {
    pub fn new(engine: Arc<Mutex<MasteryEngine>>) -> Self {
        Self {
            engine,
            pending: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Report an outcome
    pub fn report(&self, delta: ProgressDelta) {
        self.enqueue(Ingest::Outcome(delta));
        self.drain();
    }

    /// Report a named achievement
    pub fn achievement(&self, achievement: Achievement) {
        self.enqueue(Ingest::Achievement(achievement));
        self.drain();
    }

    pub fn engine(&self) -> &Arc<Mutex<MasteryEngine>> {
        &self.engine
    }

    /// Requests waiting for the engine
    pub fn pending_len(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or(0)
    }

    fn enqueue(&self, request: Ingest) {
        match self.pending.lock() {
            Ok(mut pending) => pending.push_back(request),
            Err(poisoned) => poisoned.into_inner().push_back(request),
        }
    }

    fn next_request(&self) -> Option<Ingest> {
        match self.pending.lock() {
            Ok(mut pending) => pending.pop_front(),
            Err(poisoned) => poisoned.into_inner().pop_front(),
        }
    }

    fn lock_engine(&self) -> MutexGuard<'_, MasteryEngine> {
        match self.engine.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("[reporter] engine lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn drain(&self) {
        let Some(_mark) = DrainMark::enter(Arc::as_ptr(&self.engine) as usize) else {
            trace!("[reporter] re-entrant report, left queued for the current drain");
            return;
        };
        let mut engine = self.lock_engine();
        while let Some(request) = self.next_request() {
            match request {
                Ingest::Outcome(delta) => {
                    engine.record_outcome(delta);
                }
                Ingest::Achievement(a) => {
                    engine.award(a);
                }
            }
        }
    }
}
