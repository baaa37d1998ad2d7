//! Hebrew Read Common - progress core for the alphabet trainer
//!
//! Persistent store, application state, event bus, mastery engine, badge
//! rules, panel router and the exercise modules that report into them.

pub mod badges;
pub mod bus;
pub mod config;
pub mod curriculum;
pub mod error;
pub mod features;
pub mod highlight;
pub mod mastery;
pub mod reporter;
pub mod review;
pub mod router;
pub mod state;
pub mod storage;
pub mod summary;

pub use bus::{CoreEvent, EventBus, EventName, SubscriptionId};
pub use config::HebreadConfig;
pub use curriculum::{Curriculum, Letter, WILDCARD_LETTER};
pub use error::{HebreadError, Result};
pub use mastery::{MasteryEngine, OutcomeReport, ProgressDelta, SharedMedium};
pub use reporter::ProgressReporter;
pub use router::PanelRouter;
pub use state::{AppState, LetterRecord};
pub use storage::{FileMedium, KvMedium, MemoryMedium, Store};
pub use summary::ProgressSummary;
