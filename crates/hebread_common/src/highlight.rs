//! Cross-exercise "learned" highlighting.
//!
//! Letter tiles whose score reaches the learned threshold are highlighted.
//! Progress events only mark the highlighter dirty; the actual pass runs at
//! most once per frame in `flush_frame`, so a burst of outcomes costs one
//! pass.

use crate::bus::{CoreEvent, EventBus, EventName, SubscriptionId};
use crate::curriculum::Curriculum;
use crate::mastery::MASTERY_THRESHOLD_LOW;
use crate::state::AppState;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Frame {
    scores: BTreeMap<String, f64>,
    dirty: bool,
    passes: u64,
}

#[derive(Debug, Clone)]
pub struct LearnedHighlighter {
    curriculum: Curriculum,
    frame: Arc<Mutex<Frame>>,
}

impl LearnedHighlighter {
    /// Seed from the current state; the first frame paints it
    pub fn new(curriculum: Curriculum, state: &AppState) -> Self {
        let scores = state
            .progress
            .mastered_letters
            .iter()
            .map(|(id, r)| (id.clone(), r.score))
            .collect();
        Self {
            curriculum,
            frame: Arc::new(Mutex::new(Frame {
                scores,
                dirty: true,
                passes: 0,
            })),
        }
    }

    /// Subscribe to `letterProgress`
    pub fn attach(&self, bus: &EventBus) -> SubscriptionId {
        let this = self.clone();
        bus.on(EventName::LetterProgress, move |event| {
            if let CoreEvent::LetterProgress { letter_id, record } = event {
                this.note(letter_id, record.score);
            }
            Ok(())
        })
    }

    fn note(&self, letter_id: &str, score: f64) {
        if let Ok(mut frame) = self.frame.lock() {
            frame.scores.insert(letter_id.to_string(), score);
            frame.dirty = true;
        }
    }

    /// Schedule a pass on the next frame. Repeated calls coalesce.
    pub fn request_frame(&self) {
        if let Ok(mut frame) = self.frame.lock() {
            frame.dirty = true;
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.frame.lock().map(|f| f.dirty).unwrap_or(false)
    }

    /// Run the pending pass, if any, returning the highlighted tile ids
    pub fn flush_frame(&self) -> Option<BTreeSet<String>> {
        let mut frame = self.frame.lock().ok()?;
        if !frame.dirty {
            return None;
        }
        frame.dirty = false;
        frame.passes += 1;
        // Only real alphabet tiles can light up; wildcard buckets never match
        let lit = self
            .curriculum
            .letters()
            .iter()
            .filter(|l| {
                frame
                    .scores
                    .get(l.id)
                    .is_some_and(|s| *s >= MASTERY_THRESHOLD_LOW)
            })
            .map(|l| l.id.to_string())
            .collect();
        Some(lit)
    }

    /// Passes run so far
    pub fn passes(&self) -> u64 {
        self.frame.lock().map(|f| f.passes).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::LetterRecord;

    fn progress(letter: &str, seen: u32, correct: u32) -> CoreEvent {
        CoreEvent::LetterProgress {
            letter_id: letter.to_string(),
            record: LetterRecord {
                seen,
                correct,
                score: 0.0,
            }
            .normalized(),
        }
    }

    #[test]
    fn test_burst_coalesces_into_one_pass() {
        let bus = EventBus::new();
        let hl = LearnedHighlighter::new(Curriculum::hebrew(), &AppState::default());
        hl.attach(&bus);
        hl.flush_frame();

        bus.emit(&progress("alef", 1, 1));
        bus.emit(&progress("bet", 2, 1));
        bus.emit(&progress("gimel", 3, 1));
        hl.request_frame();

        let lit = hl.flush_frame().unwrap();
        assert_eq!(lit, BTreeSet::from(["alef".to_string()]));
        assert_eq!(hl.flush_frame(), None);
        assert_eq!(hl.passes(), 2);
    }

    #[test]
    fn test_wildcard_never_lights_a_tile() {
        let bus = EventBus::new();
        let hl = LearnedHighlighter::new(Curriculum::hebrew(), &AppState::default());
        hl.attach(&bus);
        bus.emit(&progress("*", 4, 4));
        assert!(hl.flush_frame().unwrap().is_empty());
    }

    #[test]
    fn test_seeded_from_state() {
        let mut state = AppState::default();
        state.progress.mastered_letters.insert(
            "tav".to_string(),
            LetterRecord {
                seen: 5,
                correct: 3,
                score: 0.6,
            },
        );
        let hl = LearnedHighlighter::new(Curriculum::hebrew(), &state);
        assert!(hl.is_dirty());
        assert!(hl.flush_frame().unwrap().contains("tav"));
    }
}
