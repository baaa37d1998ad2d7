//! Application state envelope: per-letter mastery, XP, goals and badges.
//!
//! The envelope is the unit of persistence. It can always be rebuilt from
//! nothing, and hydration merges a saved snapshot field by field over the
//! defaults so a partial or tampered snapshot never fails the boot.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Storage key holding the envelope
pub const STATE_KEY: &str = "app-state";

/// Static guidance shown on the progress panel
pub const DEFAULT_GOALS: &[&str] = &[
    "Learn 5 new letters",
    "Finish one tracing exercise",
    "Read 3 simple words",
];

// ============================================================================
// Letter mastery
// ============================================================================

/// Per-letter statistics accumulated across all exercises
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LetterRecord {
    pub seen: u32,
    pub correct: u32,
    pub score: f64,
}

impl LetterRecord {
    /// Record one outcome and recompute the score
    pub fn observe(&mut self, was_correct: bool) {
        self.seen += 1;
        if was_correct {
            self.correct += 1;
        }
        self.recompute();
    }

    fn recompute(&mut self) {
        self.score = if self.seen > 0 {
            self.correct as f64 / self.seen as f64
        } else {
            0.0
        };
    }

    /// Clamp `correct <= seen` and recompute the score from the counters
    pub fn normalized(mut self) -> Self {
        self.correct = self.correct.min(self.seen);
        self.recompute();
        self
    }
}

/// Aggregate progress
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    #[serde(default)]
    pub mastered_letters: BTreeMap<String, LetterRecord>,
    #[serde(default)]
    pub xp: u64,
}

// ============================================================================
// Badges
// ============================================================================

/// Ordered, append-only set of unique badge names
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BadgeSet(Vec<String>);

impl BadgeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `name` if absent. Returns true only on absent -> present.
    pub fn insert(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.0.push(name.to_string());
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|b| b == name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    fn deduplicated(self) -> Self {
        let mut out = BadgeSet::new();
        for name in self.0 {
            out.insert(&name);
        }
        out
    }
}

// ============================================================================
// Envelope
// ============================================================================

/// The persisted envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    #[serde(default)]
    pub started: bool,
    #[serde(default)]
    pub progress: Progress,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub badges: BadgeSet,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            started: false,
            progress: Progress::default(),
            goals: DEFAULT_GOALS.iter().map(|g| g.to_string()).collect(),
            badges: BadgeSet::new(),
        }
    }
}

impl AppState {
    /// Build the envelope from an optional saved snapshot.
    ///
    /// Each top-level field present in the snapshot overrides the default
    /// if it decodes; anything else keeps its default.
    pub fn hydrate(saved: Option<serde_json::Value>) -> Self {
        let mut state = AppState::default();
        let fields = match saved {
            Some(serde_json::Value::Object(fields)) => fields,
            Some(other) => {
                warn!("[state] ignoring non-object snapshot ({})", json_kind(&other));
                return state;
            }
            None => return state,
        };

        merge_field(&fields, "started", &mut state.started);
        merge_field(&fields, "progress", &mut state.progress);
        merge_field(&fields, "goals", &mut state.goals);
        merge_field(&fields, "badges", &mut state.badges);

        state.normalize();
        state
    }

    fn normalize(&mut self) {
        for record in self.progress.mastered_letters.values_mut() {
            *record = record.normalized();
        }
        self.badges = std::mem::take(&mut self.badges).deduplicated();
    }

    pub fn record(&self, letter_id: &str) -> Option<&LetterRecord> {
        self.progress.mastered_letters.get(letter_id)
    }
}

fn merge_field<T: DeserializeOwned>(
    fields: &serde_json::Map<String, serde_json::Value>,
    name: &str,
    slot: &mut T,
) {
    let Some(value) = fields.get(name) else {
        return;
    };
    match T::deserialize(value) {
        Ok(decoded) => *slot = decoded,
        Err(e) => warn!(field = name, "[state] keeping default for malformed field: {}", e),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
