//! Letter hunt: find every cell holding one of the target letters on a
//! 10x10 board. A round locks once checked until a new round starts.

use super::{lock_session, not_mounted, Feature, MountContext};
use crate::badges::Achievement;
use crate::curriculum::{Curriculum, WILDCARD_LETTER};
use crate::error::{HebreadError, Result};
use crate::mastery::ProgressDelta;
use crate::reporter::ProgressReporter;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::{debug, info};

pub const LETTER_HUNT_PANEL: &str = "letter-hunt";

pub const GRID: usize = 10;
pub const TARGET_MIN: usize = 1;
pub const TARGET_MAX: usize = 3;

/// Score needed for a round to count as correct
pub const HUNT_PASS: f64 = 0.6;
pub const MIN_XP: u32 = 2;
pub const MAX_XP: f64 = 12.0;

/// How many guaranteed target cells are placed on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Density {
    Low,
    #[default]
    Med,
    High,
}

impl Density {
    pub fn repeats(self) -> usize {
        match self {
            Density::Low => 6,
            Density::Med => 12,
            Density::High => 22,
        }
    }
}

impl FromStr for Density {
    type Err = HebreadError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Density::Low),
            "med" | "medium" => Ok(Density::Med),
            "high" => Ok(Density::High),
            other => Err(HebreadError::InvalidInput(format!(
                "unknown density '{}' (low, med, high)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HuntBoard {
    pub targets: Vec<&'static str>,
    pub cells: Vec<&'static str>,
}

impl HuntBoard {
    /// Random fill, then `density.repeats()` cells overwritten with targets
    pub fn generate(curriculum: &Curriculum, density: Density, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let pool: Vec<&'static str> = curriculum.letters().iter().map(|l| l.glyph).collect();

        let k = rng.gen_range(TARGET_MIN..=TARGET_MAX);
        let targets: Vec<&'static str> = pool.choose_multiple(&mut rng, k).copied().collect();

        let total = GRID * GRID;
        let mut cells: Vec<&'static str> = (0..total)
            .map(|_| pool[rng.gen_range(0..pool.len())])
            .collect();
        for _ in 0..density.repeats() {
            let idx = rng.gen_range(0..total);
            cells[idx] = targets[rng.gen_range(0..targets.len())];
        }
        Self { targets, cells }
    }

    /// Every cell holding a target glyph, including ones from the random fill
    pub fn target_cells(&self) -> BTreeSet<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| self.targets.contains(*c))
            .map(|(i, _)| i)
            .collect()
    }

    /// Rows of glyphs for display
    pub fn rows(&self) -> impl Iterator<Item = &[&'static str]> {
        self.cells.chunks(GRID)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoundResult {
    pub hits: usize,
    pub misses: usize,
    pub over: usize,
    pub need: usize,
    pub score: f64,
    pub xp: u32,
    pub correct: bool,
}

impl RoundResult {
    pub fn is_perfect(&self) -> bool {
        self.need > 0 && self.hits == self.need
    }
}

/// Score a set of picked cell indices against the board
pub fn score_round(board: &HuntBoard, picks: &BTreeSet<usize>) -> RoundResult {
    let targets = board.target_cells();
    let hits = targets.intersection(picks).count();
    let misses = targets.len() - hits;
    let over = picks.difference(&targets).count();
    let need = targets.len();
    let score = if need == 0 {
        0.0
    } else {
        hits as f64 / need as f64
    };
    RoundResult {
        hits,
        misses,
        over,
        need,
        score,
        xp: MIN_XP.max((score * MAX_XP).floor() as u32),
        correct: score >= HUNT_PASS,
    }
}

struct HuntSession {
    reporter: ProgressReporter,
    board: Option<HuntBoard>,
    picks: BTreeSet<usize>,
    locked: bool,
}

pub struct LetterHunt {
    curriculum: Curriculum,
    session: Mutex<Option<HuntSession>>,
}

impl Default for LetterHunt {
    fn default() -> Self {
        Self::new()
    }
}

impl LetterHunt {
    pub fn new() -> Self {
        Self {
            curriculum: Curriculum::hebrew(),
            session: Mutex::new(None),
        }
    }

    /// Deal a fresh board and unlock the round
    pub fn new_round(&self, density: Density, seed: u64) -> Result<HuntBoard> {
        let mut guard = lock_session(&self.session);
        let session = guard.as_mut().ok_or_else(|| not_mounted(LETTER_HUNT_PANEL))?;
        let board = HuntBoard::generate(&self.curriculum, density, seed);
        debug!(?density, seed, targets = ?board.targets, "[letter-hunt] new round");
        session.board = Some(board.clone());
        session.picks.clear();
        session.locked = false;
        Ok(board)
    }

    pub fn board(&self) -> Option<HuntBoard> {
        lock_session(&self.session).as_ref().and_then(|s| s.board.clone())
    }

    /// Toggle a cell; returns whether it is now picked
    pub fn toggle(&self, cell: usize) -> Result<bool> {
        let mut guard = lock_session(&self.session);
        let session = guard.as_mut().ok_or_else(|| not_mounted(LETTER_HUNT_PANEL))?;
        if session.locked {
            return Err(HebreadError::RoundLocked);
        }
        if session.board.is_none() {
            return Err(HebreadError::InvalidInput("no round dealt".to_string()));
        }
        if cell >= GRID * GRID {
            return Err(HebreadError::InvalidInput(format!(
                "cell {} is off the board",
                cell
            )));
        }
        if session.picks.remove(&cell) {
            Ok(false)
        } else {
            session.picks.insert(cell);
            Ok(true)
        }
    }

    /// Score the current picks and lock the round
    pub fn check(&self) -> Result<RoundResult> {
        let mut guard = lock_session(&self.session);
        let session = guard.as_mut().ok_or_else(|| not_mounted(LETTER_HUNT_PANEL))?;
        if session.locked {
            return Err(HebreadError::RoundLocked);
        }
        let board = session
            .board
            .as_ref()
            .ok_or_else(|| HebreadError::InvalidInput("no round dealt".to_string()))?;
        let result = score_round(board, &session.picks);
        session.locked = true;
        let reporter = session.reporter.clone();
        drop(guard);

        info!(
            hits = result.hits,
            need = result.need,
            over = result.over,
            "[letter-hunt] round checked"
        );
        reporter.report(ProgressDelta::letter(
            result.xp,
            WILDCARD_LETTER,
            result.correct,
        ));
        if result.is_perfect() {
            reporter.achievement(Achievement::PerfectHunt);
        }
        Ok(result)
    }
}

impl Feature for LetterHunt {
    fn panel(&self) -> &'static str {
        LETTER_HUNT_PANEL
    }

    fn mount(&self, ctx: MountContext) -> Result<()> {
        debug!(host = %ctx.host, "[letter-hunt] mounted");
        *lock_session(&self.session) = Some(HuntSession {
            reporter: ctx.reporter,
            board: None,
            picks: BTreeSet::new(),
            locked: false,
        });
        Ok(())
    }

    fn is_mounted(&self) -> bool {
        lock_session(&self.session).is_some()
    }
}
