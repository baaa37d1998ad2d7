//! Mastery engine.
//!
//! Owns the application state envelope and is its only writer. Every
//! outcome from every exercise enters through `record_outcome`, which
//! updates XP and the letter record, persists, publishes, recomputes the
//! derived summary and evaluates badges, in that order.

use crate::badges::{self, Achievement};
use crate::bus::{CoreEvent, EventBus};
use crate::curriculum::Curriculum;
use crate::error::HebreadError;
use crate::state::{AppState, LetterRecord, STATE_KEY};
use crate::storage::{KvMedium, Store};
use crate::summary::{self, ProgressSummary};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Score at which a letter counts as mastered (overall %, badges)
pub const MASTERY_THRESHOLD_HIGH: f64 = 0.8;

/// Score at which a letter counts as learned enough (review, highlighting)
pub const MASTERY_THRESHOLD_LOW: f64 = 0.6;

/// Medium handle the engine persists through
pub type SharedMedium = Arc<dyn KvMedium>;

// ============================================================================
// Delta
// ============================================================================

/// Normalized outcome report from an exercise.
///
/// Defaults: no XP, no letter, `was_correct = false`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressDelta {
    #[serde(default)]
    pub xp_gain: u32,
    #[serde(default)]
    pub letter_id: Option<String>,
    #[serde(default)]
    pub was_correct: Option<bool>,
}

impl ProgressDelta {
    pub fn empty() -> Self {
        Self::default()
    }

    /// XP only, no letter attribution
    pub fn xp(xp_gain: u32) -> Self {
        Self {
            xp_gain,
            ..Self::default()
        }
    }

    /// Outcome for a letter (or the wildcard bucket)
    pub fn letter(xp_gain: u32, letter_id: &str, was_correct: bool) -> Self {
        Self {
            xp_gain,
            letter_id: Some(letter_id.to_string()),
            was_correct: Some(was_correct),
        }
    }

    /// Resolve the letter key, canonicalized through the curriculum
    fn resolve_letter(&self, curriculum: &Curriculum) -> Result<Option<String>, HebreadError> {
        match self.letter_id.as_deref().map(str::trim) {
            None => {
                if self.was_correct.is_some() {
                    debug!("[mastery] was_correct without letter_id ignored");
                }
                Ok(None)
            }
            Some("") => Err(HebreadError::InvalidDelta("empty letter_id".to_string())),
            Some(token) => Ok(Some(curriculum.canonical_id(token))),
        }
    }
}

/// What a single `record_outcome` call changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutcomeReport {
    pub letter: Option<(String, LetterRecord)>,
    pub unlocked: Vec<String>,
    pub persisted: bool,
}

// ============================================================================
// Engine
// ============================================================================

pub struct MasteryEngine {
    state: AppState,
    store: Store<SharedMedium>,
    bus: Arc<EventBus>,
    curriculum: Curriculum,
    summary_tx: watch::Sender<ProgressSummary>,
}

impl std::fmt::Debug for MasteryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasteryEngine")
            .field("xp", &self.state.progress.xp)
            .field("letters", &self.state.progress.mastered_letters.len())
            .field("badges", &self.state.badges.len())
            .finish()
    }
}

impl MasteryEngine {
    /// Hydrate from the store; missing or corrupt data yields a fresh state
    pub fn boot(store: Store<SharedMedium>, bus: Arc<EventBus>, curriculum: Curriculum) -> Self {
        let state = AppState::hydrate(store.load_value(STATE_KEY));
        info!(
            xp = state.progress.xp,
            letters = state.progress.mastered_letters.len(),
            badges = state.badges.len(),
            "[mastery] state hydrated"
        );
        Self::with_state(state, store, bus, curriculum)
    }

    pub fn with_state(
        state: AppState,
        store: Store<SharedMedium>,
        bus: Arc<EventBus>,
        curriculum: Curriculum,
    ) -> Self {
        let (summary_tx, _) = watch::channel(ProgressSummary::compute(&state, &curriculum));
        Self {
            state,
            store,
            bus,
            curriculum,
            summary_tx,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Read-only copy for exercises
    pub fn snapshot(&self) -> Arc<AppState> {
        Arc::new(self.state.clone())
    }

    pub fn curriculum(&self) -> &Curriculum {
        &self.curriculum
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Ingest one outcome
    pub fn record_outcome(&mut self, delta: ProgressDelta) -> OutcomeReport {
        let mut report = OutcomeReport::default();

        // 1. XP is unconditional
        self.state.progress.xp = self.state.progress.xp.saturating_add(delta.xp_gain as u64);
        self.state.started = true;

        // 2. Letter record
        let letter = match delta.resolve_letter(&self.curriculum) {
            Ok(letter) => letter,
            Err(e) => {
                warn!(kind = e.kind(), "[mastery] dropping letter part of delta: {}", e);
                None
            }
        };
        if let Some(id) = letter {
            let record = self.state.progress.mastered_letters.entry(id.clone()).or_default();
            record.observe(delta.was_correct.unwrap_or(false));
            debug!(
                letter = %id,
                seen = record.seen,
                correct = record.correct,
                score = record.score,
                "[mastery] letter updated"
            );
            report.letter = Some((id, *record));
        }

        // 3. Persist before anyone hears about it
        report.persisted = self.persist();

        // 4. Publish
        if let Some((id, record)) = &report.letter {
            self.bus.emit(&CoreEvent::LetterProgress {
                letter_id: id.clone(),
                record: *record,
            });
        }

        // 5. Derived views
        self.publish_summary();

        // 6. Badges
        if let Some((id, record)) = report.letter.clone() {
            for name in badges::evaluate(&id, &record) {
                if self.unlock(&name) {
                    report.unlocked.push(name);
                }
            }
            if !report.unlocked.is_empty() {
                report.persisted = self.persist() && report.persisted;
                self.publish_summary();
            }
        }

        report
    }

    /// Award a named achievement reported directly by an exercise
    pub fn award(&mut self, achievement: Achievement) -> bool {
        let unlocked = self.unlock(achievement.badge_name());
        if unlocked {
            self.persist();
            self.publish_summary();
        }
        unlocked
    }

    /// Erase everything under our namespace and start over
    pub fn reset(&mut self) -> usize {
        let removed = self.store.reset_all();
        self.state = AppState::default();
        self.publish_summary();
        info!(removed, "[mastery] progress reset");
        removed
    }

    pub fn subscribe_summary(&self) -> watch::Receiver<ProgressSummary> {
        self.summary_tx.subscribe()
    }

    pub fn summary(&self) -> ProgressSummary {
        ProgressSummary::compute(&self.state, &self.curriculum)
    }

    pub fn learned_set(&self) -> BTreeSet<String> {
        summary::learned_set(&self.state)
    }

    pub fn weak_letters(&self) -> Vec<String> {
        summary::weak_letters(&self.state)
    }

    fn unlock(&mut self, name: &str) -> bool {
        if !self.state.badges.insert(name) {
            return false;
        }
        info!(badge = name, "[mastery] badge unlocked");
        self.bus.emit(&CoreEvent::BadgeUnlocked {
            name: name.to_string(),
        });
        true
    }

    fn persist(&self) -> bool {
        self.store.save(STATE_KEY, &self.state)
    }

    fn publish_summary(&self) {
        self.summary_tx.send_replace(self.summary());
    }
}
