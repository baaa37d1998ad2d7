//! Property tests for the progress core.
//!
//! Randomized inputs come from a seeded xorshift generator so failures are
//! reproducible without an external property framework.
//!
//! ## Invariants Tested
//!
//! - Letter records: `correct <= seen` and `score == correct / seen`
//! - XP equals the sum of all gains until reset
//! - A badge is stored once and announced once
//! - Envelope survives a save/load round trip; corrupt text loads as fallback
//! - Exactly one panel is visible after any navigation

use hebread_common::badges::{mastery_badge_name, FIRST_ATTEMPT_BADGE};
use hebread_common::router::DEFAULT_PANEL;
use hebread_common::state::STATE_KEY;
use hebread_common::storage::DEFAULT_NAMESPACE;
use hebread_common::{
    AppState, CoreEvent, Curriculum, EventBus, EventName, KvMedium, MasteryEngine, MemoryMedium,
    PanelRouter, ProgressDelta, SharedMedium, Store,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// TEST HELPERS
// ============================================================================

/// Simple pseudo-random number generator for test inputs
/// Uses xorshift64 algorithm
struct TestRng {
    state: u64,
}

impl TestRng {
    fn new(seed: u64) -> Self {
        Self { state: if seed == 0 { 1 } else { seed } }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    fn next_bool(&mut self) -> bool {
        self.next_u64() % 2 == 0
    }

    fn next_range(&mut self, min: u64, max: u64) -> u64 {
        if max <= min {
            return min;
        }
        min + (self.next_u64() % (max - min))
    }
}

fn engine() -> (MasteryEngine, Arc<MemoryMedium>) {
    let medium = Arc::new(MemoryMedium::new());
    let shared: SharedMedium = medium.clone();
    let engine = MasteryEngine::boot(
        Store::new(shared, DEFAULT_NAMESPACE),
        Arc::new(EventBus::new()),
        Curriculum::hebrew(),
    );
    (engine, medium)
}

// ============================================================================
// Letter record invariant
// ============================================================================

mod score_properties {
    use super::*;

    #[test]
    fn test_score_matches_counts_after_every_call() {
        let letters = ["alef", "bet", "ג", "ך", "*"];
        for seed in 1..=20 {
            let mut rng = TestRng::new(seed);
            let (mut engine, _) = engine();
            for _ in 0..200 {
                let letter = letters[rng.next_range(0, letters.len() as u64) as usize];
                let report =
                    engine.record_outcome(ProgressDelta::letter(1, letter, rng.next_bool()));
                let (_, record) = report.letter.expect("letter outcome");
                assert!(record.correct <= record.seen);
                let expected = record.correct as f64 / record.seen as f64;
                assert!((record.score - expected).abs() < 1e-12, "seed {}", seed);
            }
            for record in engine.state().progress.mastered_letters.values() {
                assert!(record.correct <= record.seen);
                assert!((0.0..=1.0).contains(&record.score));
            }
        }
    }

    #[test]
    fn test_tampered_snapshot_is_normalized() {
        let medium = Arc::new(MemoryMedium::new());
        let tampered = serde_json::json!({
            "progress": {
                "masteredLetters": { "alef": { "seen": 2, "correct": 9, "score": 7.5 } },
                "xp": 3
            }
        });
        medium.insert_raw("hebrew-read:app-state", &tampered.to_string());
        let shared: SharedMedium = medium.clone();
        let engine = MasteryEngine::boot(
            Store::new(shared, DEFAULT_NAMESPACE),
            Arc::new(EventBus::new()),
            Curriculum::hebrew(),
        );
        let record = engine.state().record("alef").copied().unwrap();
        assert_eq!((record.seen, record.correct), (2, 2));
        assert_eq!(record.score, 1.0);
        assert_eq!(engine.state().progress.xp, 3);
    }
}

// ============================================================================
// XP monotonicity
// ============================================================================

mod xp_properties {
    use super::*;

    #[test]
    fn test_xp_is_sum_of_gains() {
        for seed in 1..=20 {
            let mut rng = TestRng::new(seed * 7919);
            let (mut engine, _) = engine();
            let mut expected = 0u64;
            let mut last = 0u64;
            for _ in 0..100 {
                let gain = rng.next_range(0, 20) as u32;
                expected += gain as u64;
                let delta = if rng.next_bool() {
                    ProgressDelta::xp(gain)
                } else {
                    ProgressDelta::letter(gain, "he", rng.next_bool())
                };
                engine.record_outcome(delta);
                let xp = engine.state().progress.xp;
                assert!(xp >= last);
                last = xp;
            }
            assert_eq!(engine.state().progress.xp, expected);
        }
    }

    #[test]
    fn test_reset_is_the_only_way_down() {
        let (mut engine, _) = engine();
        engine.record_outcome(ProgressDelta::xp(40));
        engine.reset();
        assert_eq!(engine.state().progress.xp, 0);
        engine.record_outcome(ProgressDelta::xp(2));
        assert_eq!(engine.state().progress.xp, 2);
    }
}

// ============================================================================
// Badge idempotence
// ============================================================================

mod badge_properties {
    use super::*;

    #[test]
    fn test_badges_unique_and_announced_once() {
        let (mut engine, _) = engine();
        let announced = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&announced);
        engine.bus().on(EventName::BadgeUnlocked, move |event| {
            if let CoreEvent::BadgeUnlocked { name } = event {
                sink.lock().unwrap().push(name.clone());
            }
            Ok(())
        });

        let mut rng = TestRng::new(99);
        for _ in 0..300 {
            let letter = ["alef", "bet"][rng.next_range(0, 2) as usize];
            engine.record_outcome(ProgressDelta::letter(1, letter, true));
        }

        let announced = announced.lock().unwrap().clone();
        let stored: Vec<String> = engine.state().badges.iter().map(String::from).collect();
        assert_eq!(announced, stored);
        let mut deduped = stored.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), stored.len());
        assert!(stored.contains(&FIRST_ATTEMPT_BADGE.to_string()));
        assert!(stored.contains(&mastery_badge_name("alef")));
        assert!(stored.contains(&mastery_badge_name("bet")));
    }
}

// ============================================================================
// Persistence round trip
// ============================================================================

mod persistence_properties {
    use super::*;

    #[test]
    fn test_envelope_round_trip() {
        let mut rng = TestRng::new(4242);
        let (mut engine, medium) = engine();
        for _ in 0..50 {
            let letter = ["alef", "mem", "*"][rng.next_range(0, 3) as usize];
            engine.record_outcome(ProgressDelta::letter(3, letter, rng.next_bool()));
        }

        let store: Store<Arc<MemoryMedium>> = Store::new(Arc::clone(&medium), DEFAULT_NAMESPACE);
        let loaded: AppState = store.load(STATE_KEY).unwrap();
        assert_eq!(&loaded, engine.state());

        assert!(store.save("copy", &loaded));
        assert_eq!(store.load::<AppState>("copy").unwrap(), loaded);
    }

    #[test]
    fn test_missing_and_corrupt_keys_fall_back() {
        let medium = Arc::new(MemoryMedium::new());
        let store = Store::new(Arc::clone(&medium), DEFAULT_NAMESPACE);
        assert_eq!(store.load::<AppState>("never-saved"), None);

        medium.set("hebrew-read:broken", "{\"started\": tru").unwrap();
        assert_eq!(store.load::<AppState>("broken"), None);
        assert_eq!(store.load_or("broken", 17u32), 17);
    }
}

// ============================================================================
// Router exclusivity
// ============================================================================

mod router_properties {
    use super::*;

    #[tokio::test]
    async fn test_exactly_one_visible_after_random_navigation() {
        let router = PanelRouter::new(DEFAULT_PANEL);
        let panels = ["flashcards", "trace", "syllables", "reading", "letter-hunt"];
        let calls = Arc::new(AtomicUsize::new(0));
        for (i, name) in panels.iter().enumerate() {
            let calls = Arc::clone(&calls);
            router.register_async(name, move || {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    // Every third panel fails to mount
                    if i % 3 == 2 {
                        anyhow::bail!("mount failed");
                    }
                    anyhow::Ok(())
                }
            });
        }

        let mut rng = TestRng::new(1234);
        let targets = ["flashcards", "trace", "syllables", "reading", "letter-hunt", "bogus", ""];
        for _ in 0..60 {
            let target = targets[rng.next_range(0, targets.len() as u64) as usize];
            let shown = router.go(target).await;
            let visible = router.visible_panels();
            assert_eq!(visible.len(), 1);
            assert_eq!(visible[0], shown);
            let expected = match panels.iter().position(|p| *p == target) {
                Some(i) if i % 3 != 2 => target,
                _ => DEFAULT_PANEL,
            };
            assert_eq!(shown, expected);
        }
        assert!(calls.load(Ordering::SeqCst) > 0);
    }
}
