//! Exercise modules.
//!
//! Every exercise implements [`Feature`]: the router activates a panel by
//! calling `mount`, handing the exercise a snapshot of the state and the
//! reporter it uses for every outcome. Exercises never touch the store or
//! the bus directly.

pub mod flashcards;
pub mod letter_hunt;
pub mod reading;
pub mod syllables;
pub mod trace;

pub use flashcards::{Flashcards, FLASHCARDS_PANEL};
pub use letter_hunt::{Density, HuntBoard, LetterHunt, RoundResult, LETTER_HUNT_PANEL};
pub use reading::{Reading, ReadingItem, ReadingKind, READING_PANEL};
pub use syllables::{QuizQuestion, Syllables, SYLLABLES_PANEL};
pub use trace::{Bitmap, Trace, TraceResult, TRACE_PANEL};

use crate::error::{HebreadError, Result};
use crate::reporter::ProgressReporter;
use crate::state::AppState;
use std::sync::{Arc, Mutex, MutexGuard};

/// Everything an exercise receives when its panel is activated
#[derive(Debug, Clone)]
pub struct MountContext {
    /// Identifier of the surface the exercise renders into
    pub host: String,
    pub snapshot: Arc<AppState>,
    pub reporter: ProgressReporter,
}

impl MountContext {
    pub fn new(panel: &str, snapshot: Arc<AppState>, reporter: ProgressReporter) -> Self {
        Self {
            host: format!("{}-host", panel),
            snapshot,
            reporter,
        }
    }
}

/// Contract shared by all exercises
pub trait Feature: Send + Sync {
    /// Panel this exercise lives in
    fn panel(&self) -> &'static str;

    /// (Re)initialize the exercise. Mounting again replaces the session.
    fn mount(&self, ctx: MountContext) -> Result<()>;

    /// Whether a session is currently mounted
    fn is_mounted(&self) -> bool;
}

/// Lock a session slot, recovering from poisoning
pub(crate) fn lock_session<T>(slot: &Mutex<Option<T>>) -> MutexGuard<'_, Option<T>> {
    match slot.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

pub(crate) fn not_mounted(panel: &str) -> HebreadError {
    HebreadError::NotMounted(panel.to_string())
}
