//! Derived progress views. Never persisted, always recomputed from state.

use crate::curriculum::Curriculum;
use crate::mastery::{MASTERY_THRESHOLD_HIGH, MASTERY_THRESHOLD_LOW};
use crate::state::AppState;
use serde::Serialize;
use std::collections::BTreeSet;

/// Format a 0-1 ratio as a percentage string
pub fn format_percent(value: f64, digits: usize) -> String {
    if value.is_nan() {
        return "0%".to_string();
    }
    format!("{:.*}%", digits, value * 100.0)
}

/// Share of curriculum letters at or above the mastery threshold
pub fn overall_percent(state: &AppState, curriculum: &Curriculum) -> f64 {
    let total = curriculum.len();
    if total == 0 {
        return 0.0;
    }
    let mastered = state
        .progress
        .mastered_letters
        .values()
        .filter(|r| r.score >= MASTERY_THRESHOLD_HIGH)
        .count();
    mastered as f64 / total as f64
}

/// Letter ids at or above the "learned enough" threshold
pub fn learned_set(state: &AppState) -> BTreeSet<String> {
    state
        .progress
        .mastered_letters
        .iter()
        .filter(|(_, r)| r.score >= MASTERY_THRESHOLD_LOW)
        .map(|(id, _)| id.clone())
        .collect()
}

/// Letter ids below the "learned enough" threshold (review candidates)
pub fn weak_letters(state: &AppState) -> Vec<String> {
    state
        .progress
        .mastered_letters
        .iter()
        .filter(|(_, r)| r.score < MASTERY_THRESHOLD_LOW)
        .map(|(id, _)| id.clone())
        .collect()
}

/// Snapshot of everything the progress panel shows
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgressSummary {
    pub percent: f64,
    pub xp: u64,
    pub tracked_letters: usize,
    pub mastered_letters: usize,
    pub progress_line: String,
    pub stats_line: String,
    pub badges: Vec<String>,
}

impl ProgressSummary {
    pub fn compute(state: &AppState, curriculum: &Curriculum) -> Self {
        let percent = overall_percent(state, curriculum);
        let tracked = state.progress.mastered_letters.len();
        let mastered = state
            .progress
            .mastered_letters
            .values()
            .filter(|r| r.score >= MASTERY_THRESHOLD_HIGH)
            .count();
        Self {
            percent,
            xp: state.progress.xp,
            tracked_letters: tracked,
            mastered_letters: mastered,
            progress_line: format!("Progress: {}", format_percent(percent, 0)),
            stats_line: format!("XP: {} | Letters practised: {}", state.progress.xp, tracked),
            badges: state.badges.iter().map(str::to_string).collect(),
        }
    }
}
