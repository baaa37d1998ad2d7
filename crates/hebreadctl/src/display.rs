//! Terminal rendering for the progress panel and exercises.

use hebread_common::badges::format_badges;
use hebread_common::config::ColorMode;
use hebread_common::features::{HuntBoard, QuizQuestion, ReadingItem, RoundResult, TraceResult};
use hebread_common::summary::format_percent;
use hebread_common::{AppState, Curriculum, Letter, ProgressSummary};
use owo_colors::OwoColorize;
use std::collections::BTreeSet;
use std::io::IsTerminal;

pub const HR: &str = "------------------------------------------------------------";

/// Badges listed on the status screen before truncating
const MAX_BADGES_SHOWN: usize = 6;

/// Resolved color choice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    color: bool,
}

impl Palette {
    pub fn new(mode: ColorMode) -> Self {
        let color = match mode {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => std::io::stdout().is_terminal(),
        };
        Self { color }
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    fn paint(&self, s: &str, style: fn(&str) -> String) -> String {
        if self.color {
            style(s)
        } else {
            s.to_string()
        }
    }

    pub fn header(&self, s: &str) -> String {
        self.paint(s, |s| s.bold().to_string())
    }

    pub fn dim(&self, s: &str) -> String {
        self.paint(s, |s| s.dimmed().to_string())
    }

    pub fn ok(&self, s: &str) -> String {
        self.paint(s, |s| s.bright_green().to_string())
    }

    pub fn warn(&self, s: &str) -> String {
        self.paint(s, |s| s.yellow().to_string())
    }

    pub fn err(&self, s: &str) -> String {
        self.paint(s, |s| s.bright_red().to_string())
    }

    pub fn accent(&self, s: &str) -> String {
        self.paint(s, |s| s.cyan().to_string())
    }
}

/// Print key-value pair
fn print_kv(key: &str, value: &str, width: usize) {
    println!("{:width$} {}", key, value, width = width);
}

/// Ten-slot ASCII bar for a 0-1 ratio
pub fn bar(ratio: f64) -> String {
    let filled = if ratio.is_nan() {
        0
    } else {
        (ratio.clamp(0.0, 1.0) * 10.0).round() as usize
    };
    format!("[{}{}]", "#".repeat(filled), ".".repeat(10 - filled))
}

pub fn print_status(
    summary: &ProgressSummary,
    state: &AppState,
    learned: &BTreeSet<String>,
    weak: &[String],
    p: Palette,
) {
    println!();
    println!("{}", p.header(&format!("hebreadctl v{}", env!("CARGO_PKG_VERSION"))));
    println!("{}", p.dim(HR));

    let kw = 12; // key width
    let progress = format!("{} {}", bar(summary.percent), format_percent(summary.percent, 0));
    print_kv("progress", &progress, kw);
    print_kv("xp", &summary.xp.to_string(), kw);
    print_kv("practised", &summary.tracked_letters.to_string(), kw);
    print_kv("learned", &learned.len().to_string(), kw);
    print_kv("mastered", &summary.mastered_letters.to_string(), kw);
    let badges = format_badges(&state.badges, MAX_BADGES_SHOWN);
    print_kv("badges", &badges, kw);

    println!();
    println!("{}", p.header("Goals:"));
    for goal in &state.goals {
        println!("  - {}", goal);
    }

    if !weak.is_empty() {
        println!();
        println!("{} {}", p.warn("Needs review:"), weak.join(", "));
        println!("{}", p.dim("  run `hebreadctl review` to drill them"));
    }
    println!("{}", p.dim(HR));
    println!("{}", summary.progress_line);
    println!("{}", summary.stats_line);
}

pub fn print_letters(
    curriculum: &Curriculum,
    state: &AppState,
    lit: &BTreeSet<String>,
    p: Palette,
) {
    println!();
    println!(
        "  {:8} {:5} {:>5} {:>8} {:>6}",
        "Letter", "Glyph", "Seen", "Correct", "Score"
    );
    println!("{}", p.dim(&"-".repeat(40)));
    for letter in curriculum.letters() {
        let (seen, correct, score) = state
            .record(letter.id)
            .map(|r| (r.seen, r.correct, format_percent(r.score, 0)))
            .unwrap_or((0, 0, "-".to_string()));
        let name = format!("{:8}", letter.id);
        let name = if lit.contains(letter.id) {
            p.ok(&name)
        } else {
            name
        };
        println!(
            "  {} {:5} {:>5} {:>8} {:>6}",
            name,
            glyph_with_final(letter),
            seen,
            correct,
            score
        );
    }
    if let Some(bucket) = state.record(hebread_common::WILDCARD_LETTER) {
        println!("{}", p.dim(&"-".repeat(40)));
        println!(
            "  {:8} {:5} {:>5} {:>8} {:>6}",
            "(any)",
            "*",
            bucket.seen,
            bucket.correct,
            format_percent(bucket.score, 0)
        );
    }
}

fn glyph_with_final(letter: &Letter) -> String {
    match letter.final_form {
        Some(f) => format!("{} {}", letter.glyph, f),
        None => letter.glyph.to_string(),
    }
}

pub fn print_deck(cards: &[&'static Letter], p: Palette) {
    println!("{}", p.header(&format!("Flashcards ({} cards)", cards.len())));
    for card in cards {
        println!(
            "  {}  {:8} {:10} {}",
            card.glyph,
            card.name,
            card.sound,
            p.dim(card.example)
        );
    }
}

pub fn print_trace(result: &TraceResult, p: Palette) {
    let pct = format_percent(result.coverage, 0);
    let verdict = if result.ok {
        p.ok("[OK]")
    } else {
        p.warn("[AGAIN]")
    };
    println!("{} {} accuracy {} (+{} XP)", verdict, result.letter.glyph, pct, result.xp);
}

pub fn print_quiz(quiz: &[QuizQuestion], p: Palette) {
    println!("{}", p.header("Syllable quiz"));
    for (i, q) in quiz.iter().enumerate() {
        println!("  {:>2}. [{}]  options: {}", i, q.vowel, q.options.join("  "));
    }
}

pub fn print_reading(items: &[ReadingItem], p: Palette) {
    for (i, item) in items.iter().enumerate() {
        println!("  {:>2}. {}  {}", i, item.hebrew, p.dim(item.gloss));
    }
}

pub fn print_board(board: &HuntBoard, picks: &BTreeSet<usize>, p: Palette) {
    println!("{} {}", p.header("Find:"), board.targets.join(" "));
    for (row, cells) in board.rows().enumerate() {
        let line: Vec<String> = cells
            .iter()
            .enumerate()
            .map(|(col, glyph)| {
                let idx = row * cells.len() + col;
                if picks.contains(&idx) {
                    p.accent(&format!("[{}]", glyph))
                } else {
                    format!(" {} ", glyph)
                }
            })
            .collect();
        println!("  {:>2} {}", row * cells.len(), line.join(""));
    }
}

pub fn print_round(result: &RoundResult, p: Palette) {
    let pct = format_percent(result.score, 0);
    let verdict = if result.is_perfect() {
        p.ok("[PERFECT]")
    } else if result.correct {
        p.ok("[OK]")
    } else {
        p.err("[LOW]")
    };
    println!(
        "{} score {} - hits {}/{}, missed {}, extra picks {} (+{} XP)",
        verdict, pct, result.hits, result.need, result.misses, result.over, result.xp
    );
}
