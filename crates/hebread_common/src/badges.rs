//! Achievement badges for the learner.
//!
//! Rules are pure: they look at one letter record and name the badges it
//! qualifies for. Deduplication against already-awarded badges happens in
//! `BadgeSet::insert`, so a rule may fire repeatedly without effect.

use crate::mastery::MASTERY_THRESHOLD_HIGH;
use crate::state::{BadgeSet, LetterRecord};
use serde::{Deserialize, Serialize};

/// Awarded on the very first outcome the learner records
pub const FIRST_ATTEMPT_BADGE: &str = "First attempt";

/// Awarded for a letter hunt round with every target found
pub const PERFECT_HUNT_BADGE: &str = "Perfect letter hunt";

/// Minimum outcomes before a letter can earn its mastery badge
pub const MASTERY_MIN_SEEN: u32 = 5;

/// Letter-scoped rule: the badge `record` earns for `letter_id`, if any
pub type LetterRule = fn(&str, &LetterRecord) -> Option<String>;

/// Rules evaluated after every outcome that touched a letter
pub const LETTER_RULES: &[LetterRule] = &[first_attempt, letter_mastered];

fn first_attempt(_letter_id: &str, record: &LetterRecord) -> Option<String> {
    (record.seen == 1).then(|| FIRST_ATTEMPT_BADGE.to_string())
}

fn letter_mastered(letter_id: &str, record: &LetterRecord) -> Option<String> {
    let mastered = record.score >= MASTERY_THRESHOLD_HIGH && record.seen >= MASTERY_MIN_SEEN;
    mastered.then(|| mastery_badge_name(letter_id))
}

/// Named achievements that exercises report directly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Achievement {
    PerfectHunt,
}

impl Achievement {
    pub fn badge_name(&self) -> &'static str {
        match self {
            Achievement::PerfectHunt => PERFECT_HUNT_BADGE,
        }
    }
}

/// Badge name for mastering `letter_id`
pub fn mastery_badge_name(letter_id: &str) -> String {
    format!("Mastered {}", letter_id)
}

/// Every badge `record` qualifies for, in rule order
pub fn evaluate(letter_id: &str, record: &LetterRecord) -> Vec<String> {
    LETTER_RULES
        .iter()
        .filter_map(|rule| rule(letter_id, record))
        .collect()
}

/// One-line badge list for display, truncated after `max_display`
pub fn format_badges(badges: &BadgeSet, max_display: usize) -> String {
    if badges.is_empty() {
        return "no badges yet".to_string();
    }
    let shown: Vec<&str> = badges.iter().take(max_display).collect();
    if badges.len() > max_display {
        format!("{} +{} more", shown.join(", "), badges.len() - max_display)
    } else {
        shown.join(", ")
    }
}

/// Toast text for a freshly unlocked badge
pub fn format_badge_unlock(name: &str) -> String {
    format!("[*] Badge unlocked: {}", name)
}
