//! Letter tracing.
//!
//! Accuracy is the share of the glyph's pixels the learner painted over.
//! The glyph mask and the strokes are plain boolean bitmaps of equal size.

use super::{lock_session, not_mounted, Feature, MountContext};
use crate::curriculum::{Curriculum, Letter};
use crate::error::{HebreadError, Result};
use crate::mastery::ProgressDelta;
use crate::reporter::ProgressReporter;
use std::sync::Mutex;
use tracing::debug;

pub const TRACE_PANEL: &str = "trace";

/// Coverage needed for a pass
pub const TRACE_PASS: f64 = 0.6;

pub const XP_PASS: u32 = 6;
pub const XP_FAIL: u32 = 2;

/// Width x height boolean grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: usize,
    height: usize,
    bits: Vec<bool>,
}

impl Bitmap {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            bits: vec![false; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.bits[y * self.width + x]
    }

    /// Out-of-range pixels are ignored
    pub fn set(&mut self, x: usize, y: usize) {
        if x < self.width && y < self.height {
            self.bits[y * self.width + x] = true;
        }
    }

    pub fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize) {
        for yy in y..y.saturating_add(h).min(self.height) {
            for xx in x..x.saturating_add(w).min(self.width) {
                self.set(xx, yy);
            }
        }
    }

    /// Paint a round-capped line of the given pen width
    pub fn stroke(&mut self, from: (f64, f64), to: (f64, f64), pen: f64) {
        let radius = (pen / 2.0).max(0.5);
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let len_sq = dx * dx + dy * dy;
        for y in 0..self.height {
            for x in 0..self.width {
                let (px, py) = (x as f64 + 0.5, y as f64 + 0.5);
                let t = if len_sq == 0.0 {
                    0.0
                } else {
                    (((px - from.0) * dx + (py - from.1) * dy) / len_sq).clamp(0.0, 1.0)
                };
                let (cx, cy) = (from.0 + t * dx, from.1 + t * dy);
                if (px - cx).powi(2) + (py - cy).powi(2) <= radius * radius {
                    self.set(x, y);
                }
            }
        }
    }

    pub fn count(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }
}

/// Covered glyph pixels / glyph pixels; 0 for an empty mask
pub fn coverage(mask: &Bitmap, strokes: &Bitmap) -> f64 {
    let need = mask.count();
    if need == 0 {
        return 0.0;
    }
    let hit = mask
        .bits
        .iter()
        .enumerate()
        .filter(|(i, m)| {
            **m && strokes.get(i % mask.width, i / mask.width)
        })
        .count();
    hit as f64 / need as f64
}

/// Outcome of one check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceResult {
    pub letter: &'static Letter,
    pub coverage: f64,
    pub ok: bool,
    pub xp: u32,
}

struct TraceSession {
    letter: &'static Letter,
    reporter: ProgressReporter,
}

pub struct Trace {
    curriculum: Curriculum,
    session: Mutex<Option<TraceSession>>,
}

impl Default for Trace {
    fn default() -> Self {
        Self::new()
    }
}

impl Trace {
    pub fn new() -> Self {
        Self {
            curriculum: Curriculum::hebrew(),
            session: Mutex::new(None),
        }
    }

    /// Letter currently being traced
    pub fn letter(&self) -> Option<&'static Letter> {
        lock_session(&self.session).as_ref().map(|s| s.letter)
    }

    pub fn select_letter(&self, token: &str) -> Result<&'static Letter> {
        let letter = self
            .curriculum
            .find(token)
            .ok_or_else(|| HebreadError::InvalidInput(format!("unknown letter '{}'", token)))?;
        let mut guard = lock_session(&self.session);
        let session = guard.as_mut().ok_or_else(|| not_mounted(TRACE_PANEL))?;
        session.letter = letter;
        Ok(letter)
    }

    /// Score a measured coverage (clamped to 0..=1, NaN counts as 0)
    pub fn check(&self, coverage: f64) -> Result<TraceResult> {
        let guard = lock_session(&self.session);
        let session = guard.as_ref().ok_or_else(|| not_mounted(TRACE_PANEL))?;
        let coverage = if coverage.is_nan() {
            0.0
        } else {
            coverage.clamp(0.0, 1.0)
        };
        let ok = coverage >= TRACE_PASS;
        let result = TraceResult {
            letter: session.letter,
            coverage,
            ok,
            xp: if ok { XP_PASS } else { XP_FAIL },
        };
        let reporter = session.reporter.clone();
        drop(guard);

        debug!(letter = result.letter.id, coverage, ok, "[trace] checked");
        reporter.report(ProgressDelta::letter(result.xp, result.letter.glyph, ok));
        Ok(result)
    }

    pub fn check_strokes(&self, mask: &Bitmap, strokes: &Bitmap) -> Result<TraceResult> {
        if mask.width != strokes.width || mask.height != strokes.height {
            return Err(HebreadError::InvalidInput(format!(
                "stroke bitmap {}x{} does not match mask {}x{}",
                strokes.width, strokes.height, mask.width, mask.height
            )));
        }
        self.check(coverage(mask, strokes))
    }
}

impl Feature for Trace {
    fn panel(&self) -> &'static str {
        TRACE_PANEL
    }

    fn mount(&self, ctx: MountContext) -> Result<()> {
        let mut guard = lock_session(&self.session);
        // Keep the selected letter across remounts
        let letter = guard
            .as_ref()
            .map(|s| s.letter)
            .unwrap_or(&self.curriculum.letters()[0]);
        debug!(host = %ctx.host, letter = letter.id, "[trace] mounted");
        *guard = Some(TraceSession {
            letter,
            reporter: ctx.reporter,
        });
        Ok(())
    }

    fn is_mounted(&self) -> bool {
        lock_session(&self.session).is_some()
    }
}
