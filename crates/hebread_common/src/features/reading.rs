//! Guided reading: short words, then phrases.

use super::{lock_session, not_mounted, Feature, MountContext};
use crate::curriculum::WILDCARD_LETTER;
use crate::error::{HebreadError, Result};
use crate::mastery::ProgressDelta;
use crate::reporter::ProgressReporter;
use serde::Serialize;
use std::sync::Mutex;
use tracing::debug;

pub const READING_PANEL: &str = "reading";

pub const XP_KNOW: u32 = 8;
pub const XP_AGAIN: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReadingItem {
    pub hebrew: &'static str,
    pub gloss: &'static str,
}

const fn item(hebrew: &'static str, gloss: &'static str) -> ReadingItem {
    ReadingItem { hebrew, gloss }
}

pub const WORDS: &[ReadingItem] = &[
    item("שָׁלוֹם", "peace / hello"),
    item("אָב", "father"),
    item("אֵם", "mother"),
    item("בַּיִת", "house"),
    item("לֶחֶם", "bread"),
    item("מַיִם", "water"),
    item("טוֹב", "good"),
];

pub const PHRASES: &[ReadingItem] = &[
    item("שָׁלוֹם אֲנִי תָּלְמִיד", "hello, I am a student"),
    item("זֶה בַּיִת גָּדוֹל", "this is a big house"),
    item("הַחֶבֶר טוֹב", "the friend is good"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadingKind {
    #[default]
    Words,
    Phrases,
}

impl ReadingKind {
    pub fn items(self) -> &'static [ReadingItem] {
        match self {
            ReadingKind::Words => WORDS,
            ReadingKind::Phrases => PHRASES,
        }
    }
}

struct ReadingSession {
    kind: ReadingKind,
    reporter: ProgressReporter,
}

pub struct Reading {
    session: Mutex<Option<ReadingSession>>,
}

impl Default for Reading {
    fn default() -> Self {
        Self::new()
    }
}

impl Reading {
    pub fn new() -> Self {
        Self {
            session: Mutex::new(None),
        }
    }

    /// Switch between words and phrases
    pub fn show(&self, kind: ReadingKind) -> Result<&'static [ReadingItem]> {
        let mut guard = lock_session(&self.session);
        let session = guard.as_mut().ok_or_else(|| not_mounted(READING_PANEL))?;
        session.kind = kind;
        Ok(kind.items())
    }

    pub fn items(&self) -> &'static [ReadingItem] {
        lock_session(&self.session)
            .as_ref()
            .map(|s| s.kind.items())
            .unwrap_or(WORDS)
    }

    pub fn know(&self, index: usize) -> Result<ReadingItem> {
        self.answer(index, true)
    }

    pub fn again(&self, index: usize) -> Result<ReadingItem> {
        self.answer(index, false)
    }

    fn answer(&self, index: usize, knew: bool) -> Result<ReadingItem> {
        let guard = lock_session(&self.session);
        let session = guard.as_ref().ok_or_else(|| not_mounted(READING_PANEL))?;
        let item = *session
            .kind
            .items()
            .get(index)
            .ok_or_else(|| HebreadError::InvalidInput(format!("no reading item {}", index)))?;
        let reporter = session.reporter.clone();
        drop(guard);

        let xp = if knew { XP_KNOW } else { XP_AGAIN };
        reporter.report(ProgressDelta::letter(xp, WILDCARD_LETTER, knew));
        Ok(item)
    }
}

impl Feature for Reading {
    fn panel(&self) -> &'static str {
        READING_PANEL
    }

    fn mount(&self, ctx: MountContext) -> Result<()> {
        debug!(host = %ctx.host, "[reading] mounted");
        *lock_session(&self.session) = Some(ReadingSession {
            kind: ReadingKind::Words,
            reporter: ctx.reporter,
        });
        Ok(())
    }

    fn is_mounted(&self) -> bool {
        lock_session(&self.session).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::testing;

    #[test]
    fn test_item_counts() {
        assert_eq!(WORDS.len(), 7);
        assert_eq!(PHRASES.len(), 3);
    }

    #[test]
    fn test_reading_reports_wildcard() {
        let reading = Reading::new();
        let reporter = testing::reporter();
        reading.mount(testing::mount_ctx(READING_PANEL, &reporter)).unwrap();

        assert_eq!(reading.know(0).unwrap().hebrew, "שָׁלוֹם");
        reading.show(ReadingKind::Phrases).unwrap();
        reading.again(2).unwrap();
        assert!(reading.know(3).is_err());

        assert_eq!(testing::xp(&reporter), 10);
        let bucket = testing::record(&reporter, WILDCARD_LETTER).unwrap();
        assert_eq!((bucket.seen, bucket.correct), (2, 1));
    }
}
