//! End-to-end progress flows through the engine, reporter, router and
//! exercises, using in-memory and file-backed storage.

use hebread_common::badges::{mastery_badge_name, FIRST_ATTEMPT_BADGE, PERFECT_HUNT_BADGE};
use hebread_common::features::{
    Density, Feature, Flashcards, LetterHunt, MountContext, FLASHCARDS_PANEL, LETTER_HUNT_PANEL,
};
use hebread_common::highlight::LearnedHighlighter;
use hebread_common::review::ReviewHandoff;
use hebread_common::router::DEFAULT_PANEL;
use hebread_common::storage::DEFAULT_NAMESPACE;
use hebread_common::{
    CoreEvent, Curriculum, EventBus, EventName, FileMedium, LetterRecord, MasteryEngine,
    MemoryMedium, PanelRouter, ProgressDelta, ProgressReporter, SharedMedium, Store,
};
use std::sync::{Arc, Mutex};

fn memory_engine() -> MasteryEngine {
    let shared: SharedMedium = Arc::new(MemoryMedium::new());
    MasteryEngine::boot(
        Store::new(shared, DEFAULT_NAMESPACE),
        Arc::new(EventBus::new()),
        Curriculum::hebrew(),
    )
}

fn badge_log(engine: &MasteryEngine) -> Arc<Mutex<Vec<String>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    engine.bus().on(EventName::BadgeUnlocked, move |event| {
        if let CoreEvent::BadgeUnlocked { name } = event {
            sink.lock().unwrap().push(name.clone());
        }
        Ok(())
    });
    log
}

#[test]
fn test_first_outcome_on_fresh_state() {
    let mut engine = memory_engine();
    engine.record_outcome(ProgressDelta::letter(5, "alef", true));

    assert_eq!(
        engine.state().record("alef"),
        Some(&LetterRecord {
            seen: 1,
            correct: 1,
            score: 1.0
        })
    );
    assert_eq!(engine.state().progress.xp, 5);
    assert!(engine.state().badges.contains(FIRST_ATTEMPT_BADGE));
}

#[test]
fn test_mastery_badge_unlocks_once() {
    let mut engine = memory_engine();
    let log = badge_log(&engine);
    for _ in 0..5 {
        engine.record_outcome(ProgressDelta::letter(1, "bet", true));
    }
    let bet = engine.state().record("bet").copied().unwrap();
    assert_eq!((bet.seen, bet.score), (5, 1.0));
    assert!(engine.state().badges.contains(&mastery_badge_name("bet")));

    engine.record_outcome(ProgressDelta::letter(1, "bet", true));
    let mastered: Vec<_> = log
        .lock()
        .unwrap()
        .iter()
        .filter(|n| **n == mastery_badge_name("bet"))
        .cloned()
        .collect();
    assert_eq!(mastered.len(), 1);
}

#[test]
fn test_low_accuracy_earns_no_mastery_badge() {
    let mut engine = memory_engine();
    for _ in 0..4 {
        engine.record_outcome(ProgressDelta::letter(1, "gimel", false));
    }
    engine.record_outcome(ProgressDelta::letter(1, "gimel", true));

    let gimel = engine.state().record("gimel").copied().unwrap();
    assert_eq!((gimel.seen, gimel.correct), (5, 1));
    assert!((gimel.score - 0.2).abs() < 1e-12);
    assert!(!engine.state().badges.contains(&mastery_badge_name("gimel")));
}

#[tokio::test]
async fn test_unknown_panel_lands_on_default() {
    let router = PanelRouter::new(DEFAULT_PANEL);
    assert_eq!(router.go("no-such-panel").await, DEFAULT_PANEL);
    assert_eq!(router.visible_panels(), vec![DEFAULT_PANEL.to_string()]);
}

#[test]
fn test_corrupt_store_text_loads_as_fallback() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("storage.json"),
        r#"{"hebrew-read:app-state": "not json at all"}"#,
    )
    .unwrap();

    let store = Store::new(FileMedium::new(dir.path()), DEFAULT_NAMESPACE);
    assert_eq!(store.load_value("app-state"), None);

    let shared: SharedMedium = Arc::new(FileMedium::new(dir.path()));
    let engine = MasteryEngine::boot(
        Store::new(shared, DEFAULT_NAMESPACE),
        Arc::new(EventBus::new()),
        Curriculum::hebrew(),
    );
    assert_eq!(engine.state().progress.xp, 0);
    assert_eq!(engine.state().goals.len(), 3);
}

#[test]
fn test_progress_survives_restart_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let boot = || {
        let shared: SharedMedium = Arc::new(FileMedium::new(dir.path()));
        MasteryEngine::boot(
            Store::new(shared, DEFAULT_NAMESPACE),
            Arc::new(EventBus::new()),
            Curriculum::hebrew(),
        )
    };

    let mut first = boot();
    first.record_outcome(ProgressDelta::letter(6, "ש", true));
    first.record_outcome(ProgressDelta::letter(2, "shin", false));
    drop(first);

    let second = boot();
    let shin = second.state().record("shin").copied().unwrap();
    assert_eq!((shin.seen, shin.correct), (2, 1));
    assert_eq!(second.state().progress.xp, 8);
    assert!(second.state().started);
}

#[test]
fn test_weak_letters_flow_into_flashcards() {
    let engine = memory_engine();
    let reporter = ProgressReporter::new(Arc::new(Mutex::new(engine)));
    reporter.report(ProgressDelta::letter(1, "dalet", false));
    reporter.report(ProgressDelta::letter(1, "alef", true));

    let weak = reporter.engine().lock().unwrap().weak_letters();
    assert_eq!(weak, vec!["dalet".to_string()]);

    let review = Arc::new(ReviewHandoff::new());
    review.offer(&weak);
    let cards = Flashcards::new(Arc::clone(&review));
    let snapshot = reporter.engine().lock().unwrap().snapshot();
    cards
        .mount(MountContext::new(
            FLASHCARDS_PANEL,
            snapshot,
            reporter.clone(),
        ))
        .unwrap();
    let deck: Vec<_> = cards.deck().iter().map(|l| l.id).collect();
    assert_eq!(deck, vec!["dalet"]);
    assert!(!review.is_staged());
}

#[test]
fn test_highlighter_follows_reporter_outcomes() {
    let engine = memory_engine();
    let bus = Arc::clone(engine.bus());
    let highlighter = LearnedHighlighter::new(Curriculum::hebrew(), engine.state());
    highlighter.attach(&bus);
    highlighter.flush_frame();

    let reporter = ProgressReporter::new(Arc::new(Mutex::new(engine)));
    reporter.report(ProgressDelta::letter(5, "lamed", true));
    reporter.report(ProgressDelta::letter(5, "*", true));
    reporter.report(ProgressDelta::letter(5, "mem", false));

    let lit = highlighter.flush_frame().unwrap();
    assert!(lit.contains("lamed"));
    assert!(!lit.contains("mem"));
    assert_eq!(lit.len(), 1);
    assert_eq!(highlighter.flush_frame(), None);
}

#[tokio::test]
async fn test_router_mounts_letter_hunt() {
    let engine = Arc::new(Mutex::new(memory_engine()));
    let reporter = ProgressReporter::new(Arc::clone(&engine));
    let hunt = Arc::new(LetterHunt::new());
    let router = PanelRouter::new(DEFAULT_PANEL);

    {
        let hunt = Arc::clone(&hunt);
        let reporter = reporter.clone();
        router.register_async(LETTER_HUNT_PANEL, move || {
            let hunt = Arc::clone(&hunt);
            let reporter = reporter.clone();
            async move {
                let snapshot = reporter.engine().lock().unwrap().snapshot();
                hunt.mount(MountContext::new(LETTER_HUNT_PANEL, snapshot, reporter))?;
                anyhow::Ok(())
            }
        });
    }

    assert_eq!(router.go(LETTER_HUNT_PANEL).await, LETTER_HUNT_PANEL);
    assert!(hunt.is_mounted());

    let board = hunt.new_round(Density::Med, 2024).unwrap();
    for cell in board.target_cells() {
        hunt.toggle(cell).unwrap();
    }
    let result = hunt.check().unwrap();
    assert!(result.correct);

    let engine = engine.lock().unwrap();
    assert!(engine.state().badges.contains(PERFECT_HUNT_BADGE));
    assert_eq!(engine.state().progress.xp, 12);
}
