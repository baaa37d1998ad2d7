//! Alphabet flashcards with smart review.
//!
//! On mount the deck is built from the staged review set (consumed once);
//! without one, or when it matches nothing, the first letters are shown.

use super::{lock_session, not_mounted, Feature, MountContext};
use crate::curriculum::{Curriculum, Letter};
use crate::error::{HebreadError, Result};
use crate::mastery::ProgressDelta;
use crate::reporter::ProgressReporter;
use crate::review::ReviewHandoff;
use std::sync::{Arc, Mutex};
use tracing::debug;

pub const FLASHCARDS_PANEL: &str = "flashcards";

/// Cards shown when there is no review set
pub const FALLBACK_DECK_SIZE: usize = 12;

pub const XP_KNOW: u32 = 5;
pub const XP_AGAIN: u32 = 1;

struct Deck {
    cards: Vec<&'static Letter>,
    reporter: ProgressReporter,
}

pub struct Flashcards {
    curriculum: Curriculum,
    review: Arc<ReviewHandoff>,
    session: Mutex<Option<Deck>>,
}

impl Flashcards {
    pub fn new(review: Arc<ReviewHandoff>) -> Self {
        Self {
            curriculum: Curriculum::hebrew(),
            review,
            session: Mutex::new(None),
        }
    }

    /// Cards in the mounted deck
    pub fn deck(&self) -> Vec<&'static Letter> {
        lock_session(&self.session)
            .as_ref()
            .map(|d| d.cards.clone())
            .unwrap_or_default()
    }

    /// "I knew it"
    pub fn know(&self, token: &str) -> Result<&'static Letter> {
        self.answer(token, true)
    }

    /// "Show me again"
    pub fn again(&self, token: &str) -> Result<&'static Letter> {
        self.answer(token, false)
    }

    fn answer(&self, token: &str, knew: bool) -> Result<&'static Letter> {
        let guard = lock_session(&self.session);
        let deck = guard.as_ref().ok_or_else(|| not_mounted(FLASHCARDS_PANEL))?;
        let letter = self
            .curriculum
            .find(token)
            .ok_or_else(|| HebreadError::InvalidInput(format!("unknown letter '{}'", token)))?;
        let xp = if knew { XP_KNOW } else { XP_AGAIN };
        let reporter = deck.reporter.clone();
        drop(guard);

        reporter.report(ProgressDelta::letter(xp, letter.glyph, knew));
        Ok(letter)
    }
}

/// Curriculum filtered to the review ids (id or glyph); fallback when empty
pub fn build_deck(curriculum: &Curriculum, review: Option<Vec<String>>) -> Vec<&'static Letter> {
    let letters = curriculum.letters();
    let mut cards: Vec<&'static Letter> = match review {
        Some(ids) => letters
            .iter()
            .filter(|l| ids.iter().any(|id| id == l.id || id == l.glyph))
            .collect(),
        None => letters.iter().collect(),
    };
    if cards.is_empty() {
        cards = letters.iter().take(FALLBACK_DECK_SIZE).collect();
    }
    cards
}

impl Feature for Flashcards {
    fn panel(&self) -> &'static str {
        FLASHCARDS_PANEL
    }

    fn mount(&self, ctx: MountContext) -> Result<()> {
        let cards = build_deck(&self.curriculum, self.review.take());
        debug!(host = %ctx.host, cards = cards.len(), "[flashcards] mounted");
        *lock_session(&self.session) = Some(Deck {
            cards,
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
    fn test_full_alphabet_without_review() {
        let deck = build_deck(&Curriculum::hebrew(), None);
        assert_eq!(deck.len(), 22);
    }

    #[test]
    fn test_review_set_filters_by_id_or_glyph() {
        let deck = build_deck(
            &Curriculum::hebrew(),
            Some(vec!["gimel".to_string(), "ד".to_string()]),
        );
        let ids: Vec<_> = deck.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec!["gimel", "dalet"]);
    }

    #[test]
    fn test_unmatched_review_falls_back() {
        let deck = build_deck(&Curriculum::hebrew(), Some(vec!["xyz".to_string()]));
        assert_eq!(deck.len(), FALLBACK_DECK_SIZE);
        assert_eq!(deck[0].id, "alef");
    }

    #[test]
    fn test_mount_consumes_review_once() {
        let review = Arc::new(ReviewHandoff::new());
        review.offer(&["tav".to_string()]);
        let cards = Flashcards::new(Arc::clone(&review));
        let reporter = testing::reporter();

        cards.mount(testing::mount_ctx(FLASHCARDS_PANEL, &reporter)).unwrap();
        assert_eq!(cards.deck().len(), 1);
        cards.mount(testing::mount_ctx(FLASHCARDS_PANEL, &reporter)).unwrap();
        assert_eq!(cards.deck().len(), 22);
    }

    #[test]
    fn test_know_and_again_report() {
        let cards = Flashcards::new(Arc::new(ReviewHandoff::new()));
        let reporter = testing::reporter();
        assert!(matches!(cards.know("bet"), Err(HebreadError::NotMounted(_))));

        cards.mount(testing::mount_ctx(FLASHCARDS_PANEL, &reporter)).unwrap();
        cards.know("bet").unwrap();
        cards.again("ב").unwrap();

        assert_eq!(testing::xp(&reporter), 6);
        let record = testing::record(&reporter, "bet").unwrap();
        assert_eq!((record.seen, record.correct), (2, 1));
        assert!(matches!(cards.know("?"), Err(HebreadError::InvalidInput(_))));
    }
}
