//! Nikud lab: syllable drills and a multiple-choice quiz.

use super::{lock_session, not_mounted, Feature, MountContext};
use crate::curriculum::{compose_syllable, expand_drill_set, find_nikud, Curriculum, Drill, NIKUD};
use crate::error::{HebreadError, Result};
use crate::mastery::ProgressDelta;
use crate::reporter::ProgressReporter;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use std::sync::Mutex;
use tracing::debug;

pub const SYLLABLES_PANEL: &str = "syllables";

pub const QUIZ_SIZE: usize = 8;
pub const CONFUSIONS: usize = 2;

pub const XP_DRILL_OK: u32 = 6;
pub const XP_DRILL_AGAIN: u32 = 2;
pub const XP_QUIZ_OK: u32 = 7;
pub const XP_QUIZ_WRONG: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizQuestion {
    pub base: &'static str,
    pub vowel: &'static str,
    /// Correct syllable plus confusions, shuffled
    pub options: Vec<String>,
}

impl QuizQuestion {
    pub fn answer(&self) -> String {
        compose_syllable(self.base, self.vowel)
    }
}

/// Build a seeded quiz from the drill set
pub fn build_quiz(seed: u64) -> Vec<QuizQuestion> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut pool = expand_drill_set();
    pool.shuffle(&mut rng);
    pool.into_iter()
        .take(QUIZ_SIZE)
        .map(|drill| question(drill, &mut rng))
        .collect()
}

fn question(drill: Drill, rng: &mut StdRng) -> QuizQuestion {
    let correct = drill.syllable.clone();
    let mut others: Vec<&'static str> = NIKUD
        .iter()
        .map(|n| n.id)
        .filter(|id| *id != drill.vowel)
        .collect();
    others.shuffle(rng);

    let mut options = vec![correct];
    for vowel in others {
        if options.len() > CONFUSIONS {
            break;
        }
        let candidate = compose_syllable(drill.base, vowel);
        if !options.contains(&candidate) {
            options.push(candidate);
        }
    }
    options.shuffle(rng);
    QuizQuestion {
        base: drill.base,
        vowel: drill.vowel,
        options,
    }
}

struct SyllableSession {
    reporter: ProgressReporter,
    quiz: Option<Vec<QuizQuestion>>,
}

pub struct Syllables {
    curriculum: Curriculum,
    session: Mutex<Option<SyllableSession>>,
}

impl Default for Syllables {
    fn default() -> Self {
        Self::new()
    }
}

impl Syllables {
    pub fn new() -> Self {
        Self {
            curriculum: Curriculum::hebrew(),
            session: Mutex::new(None),
        }
    }

    pub fn drills(&self) -> Vec<Drill> {
        expand_drill_set()
    }

    /// Self-assessed drill answer, attributed to the base letter
    pub fn drill(&self, base: &str, vowel: &str, knew: bool) -> Result<String> {
        let letter = self
            .curriculum
            .find(base)
            .ok_or_else(|| HebreadError::InvalidInput(format!("unknown base letter '{}'", base)))?;
        if find_nikud(vowel).is_none() {
            return Err(HebreadError::InvalidInput(format!(
                "unknown vowel '{}'",
                vowel
            )));
        }
        let reporter = self.reporter()?;
        let xp = if knew { XP_DRILL_OK } else { XP_DRILL_AGAIN };
        reporter.report(ProgressDelta::letter(xp, letter.glyph, knew));
        Ok(compose_syllable(letter.glyph, vowel))
    }

    /// Start a quiz, replacing any running one
    pub fn start_quiz(&self, seed: u64) -> Result<Vec<QuizQuestion>> {
        let mut guard = lock_session(&self.session);
        let session = guard.as_mut().ok_or_else(|| not_mounted(SYLLABLES_PANEL))?;
        let quiz = build_quiz(seed);
        debug!(seed, questions = quiz.len(), "[syllables] quiz started");
        session.quiz = Some(quiz.clone());
        Ok(quiz)
    }

    pub fn end_quiz(&self) {
        if let Some(session) = lock_session(&self.session).as_mut() {
            session.quiz = None;
        }
    }

    pub fn quiz(&self) -> Option<Vec<QuizQuestion>> {
        lock_session(&self.session).as_ref().and_then(|s| s.quiz.clone())
    }

    /// Answer question `index` with `picked`; returns whether it was right
    pub fn answer(&self, index: usize, picked: &str) -> Result<bool> {
        let guard = lock_session(&self.session);
        let session = guard.as_ref().ok_or_else(|| not_mounted(SYLLABLES_PANEL))?;
        let quiz = session
            .quiz
            .as_ref()
            .ok_or_else(|| HebreadError::InvalidInput("no quiz running".to_string()))?;
        let q = quiz
            .get(index)
            .ok_or_else(|| HebreadError::InvalidInput(format!("no question {}", index)))?;
        let correct = picked == q.answer();
        let base = q.base;
        let reporter = session.reporter.clone();
        drop(guard);

        let xp = if correct { XP_QUIZ_OK } else { XP_QUIZ_WRONG };
        reporter.report(ProgressDelta::letter(xp, base, correct));
        Ok(correct)
    }

    fn reporter(&self) -> Result<ProgressReporter> {
        lock_session(&self.session)
            .as_ref()
            .map(|s| s.reporter.clone())
            .ok_or_else(|| not_mounted(SYLLABLES_PANEL))
    }
}

impl Feature for Syllables {
    fn panel(&self) -> &'static str {
        SYLLABLES_PANEL
    }

    fn mount(&self, ctx: MountContext) -> Result<()> {
        debug!(host = %ctx.host, "[syllables] mounted");
        *lock_session(&self.session) = Some(SyllableSession {
            reporter: ctx.reporter,
            quiz: None,
        });
        Ok(())
    }

    fn is_mounted(&self) -> bool {
        lock_session(&self.session).is_some()
    }
}
