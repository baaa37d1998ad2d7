//! Command handlers for hebreadctl.
//!
//! Exercise commands open their panel first so the router mounts the
//! exercise, then drive it and print the outcome.

use crate::app::App;
use crate::display;
use anyhow::Result;
use hebread_common::features::{
    Density, ReadingKind, FLASHCARDS_PANEL, LETTER_HUNT_PANEL, READING_PANEL, SYLLABLES_PANEL,
    TRACE_PANEL,
};
use std::collections::BTreeSet;
use std::io::{BufRead, Write};
use std::path::Path;

/// Print the progress line published after the last outcome
fn print_progress(app: &App) {
    let summary = app.subscribe_summary().borrow().clone();
    let line = format!("{} | {}", summary.progress_line, summary.stats_line);
    println!("{}", app.palette().dim(&line));
}

fn verdict(app: &App, knew: bool) -> String {
    let p = app.palette();
    if knew {
        p.ok("[KNEW]")
    } else {
        p.warn("[AGAIN]")
    }
}

pub fn status(app: &App) -> Result<()> {
    let snapshot = app.snapshot();
    display::print_status(
        &app.summary(),
        &snapshot,
        &app.learned_letters(),
        &app.weak_letters(),
        app.palette(),
    );
    Ok(())
}

pub fn letters(app: &App) -> Result<()> {
    let snapshot = app.snapshot();
    let lit = app.highlighter().flush_frame().unwrap_or_default();
    display::print_letters(
        &hebread_common::Curriculum::hebrew(),
        &snapshot,
        &lit,
        app.palette(),
    );
    Ok(())
}

pub async fn open(app: &App, token: &str) -> Result<()> {
    let shown = app.navigate(token).await;
    println!("{}", shown);
    Ok(())
}

pub async fn card(app: &App, letter: &str, knew: bool) -> Result<()> {
    app.open(FLASHCARDS_PANEL).await?;
    let card = if knew {
        app.flashcards.know(letter)?
    } else {
        app.flashcards.again(letter)?
    };
    println!("{} {} {}", verdict(app, knew), card.glyph, card.name);
    print_progress(app);
    Ok(())
}

pub async fn trace(app: &App, letter: &str, coverage: f64) -> Result<()> {
    app.open(TRACE_PANEL).await?;
    app.trace.select_letter(letter)?;
    let result = app.trace.check(coverage)?;
    display::print_trace(&result, app.palette());
    print_progress(app);
    Ok(())
}

pub async fn syllable(app: &App, base: &str, vowel: &str, knew: bool) -> Result<()> {
    app.open(SYLLABLES_PANEL).await?;
    let syllable = app.syllables.drill(base, vowel, knew)?;
    println!("{} {}", verdict(app, knew), syllable);
    print_progress(app);
    Ok(())
}

/// Without an answer, print the quiz for `seed`; with one, grade it
pub async fn quiz(
    app: &App,
    seed: u64,
    question: Option<usize>,
    answer: Option<&str>,
) -> Result<()> {
    app.open(SYLLABLES_PANEL).await?;
    let quiz = app.syllables.start_quiz(seed)?;
    let p = app.palette();
    match (question, answer) {
        (Some(index), Some(picked)) => {
            let correct = app.syllables.answer(index, picked)?;
            if correct {
                println!("{} {}", p.ok("[CORRECT]"), picked);
            } else {
                let expected = quiz.get(index).map(|q| q.answer()).unwrap_or_default();
                println!("{} {} (answer: {})", p.err("[WRONG]"), picked, expected);
            }
            print_progress(app);
        }
        (Some(_), None) => anyhow::bail!("an answer is required with a question number"),
        _ => display::print_quiz(&quiz, p),
    }
    app.syllables.end_quiz();
    Ok(())
}

/// Without a verdict, list the items
pub async fn read(
    app: &App,
    index: Option<usize>,
    phrases: bool,
    knew: Option<bool>,
) -> Result<()> {
    app.open(READING_PANEL).await?;
    let kind = if phrases {
        ReadingKind::Phrases
    } else {
        ReadingKind::Words
    };
    let items = app.reading.show(kind)?;
    match (index, knew) {
        (Some(i), Some(knew)) => {
            let item = if knew {
                app.reading.know(i)?
            } else {
                app.reading.again(i)?
            };
            println!("{} {}", verdict(app, knew), item.hebrew);
            print_progress(app);
        }
        (Some(_), None) => anyhow::bail!("pass --knew or --again with an item number"),
        _ => display::print_reading(items, app.palette()),
    }
    Ok(())
}

/// Deal the board for `seed`; with picks, check them
pub async fn hunt(app: &App, seed: u64, density: Density, picks: Option<Vec<usize>>) -> Result<()> {
    app.open(LETTER_HUNT_PANEL).await?;
    let board = app.letter_hunt.new_round(density, seed)?;
    let p = app.palette();
    let Some(picks) = picks else {
        display::print_board(&board, &BTreeSet::new(), p);
        println!("{}", p.dim("pick cells with --picks 3,17,42"));
        return Ok(());
    };
    let mut picked = BTreeSet::new();
    for cell in picks {
        if app.letter_hunt.toggle(cell)? {
            picked.insert(cell);
        } else {
            picked.remove(&cell);
        }
    }
    display::print_board(&board, &picked, p);
    let result = app.letter_hunt.check()?;
    display::print_round(&result, p);
    print_progress(app);
    Ok(())
}

/// Hand the weak letters to flashcards and show the review deck
pub async fn review(app: &App) -> Result<()> {
    let weak = app.offer_review();
    if weak.is_empty() {
        println!("{}", app.palette().ok("Nothing to review - every practised letter is above 60%"));
    }
    app.open(FLASHCARDS_PANEL).await?;
    display::print_deck(&app.flashcards.deck(), app.palette());
    Ok(())
}

/// Ask before erasing unless `yes`; returns whether the reset happened
pub fn reset<R: BufRead>(app: &App, yes: bool, input: &mut R) -> Result<bool> {
    if !yes {
        print!("Erase all progress, XP and badges? [y/N] ");
        std::io::stdout().flush()?;
        if !confirm(input)? {
            println!("Cancelled.");
            return Ok(false);
        }
    }
    let removed = app.reset();
    println!("Progress reset ({} keys removed).", removed);
    Ok(true)
}

fn confirm<R: BufRead>(input: &mut R) -> Result<bool> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Show the configuration in effect and the file it is read from
pub fn config(app: &App, path: &Path) -> Result<()> {
    let p = app.palette();
    let source = if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not present, using defaults)", path.display())
    };
    println!("{} {}", p.header("config:"), source);
    println!("{}", p.dim(display::HR));
    print!("{}", app.config().to_toml()?);
    Ok(())
}

/// Change one setting and write the configuration to `path`
pub fn config_set(app: &App, path: &Path, key: &str, value: &str) -> Result<()> {
    let mut config = app.config().clone();
    let (key, stored) = config.set(key, value)?;
    config.save_to(path)?;
    println!("{} {} = {}", app.palette().ok("[SET]"), key, stored);
    println!("Configuration saved to: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hebread_common::config::ColorMode;
    use hebread_common::{HebreadConfig, MemoryMedium};
    use std::sync::Arc;

    fn app() -> App {
        let mut config = HebreadConfig::default();
        config.output.color = ColorMode::Never;
        App::boot_with(config, Arc::new(MemoryMedium::new()))
    }

    #[tokio::test]
    async fn test_reset_requires_confirmation() {
        let app = app();
        trace(&app, "alef", 1.0).await.unwrap();

        let mut no = std::io::Cursor::new(b"n\n".to_vec());
        assert!(!reset(&app, false, &mut no).unwrap());
        assert_eq!(app.summary().xp, 6);

        let mut yes = std::io::Cursor::new(b"YES\n".to_vec());
        assert!(reset(&app, false, &mut yes).unwrap());
        assert_eq!(app.summary().xp, 0);
    }

    #[tokio::test]
    async fn test_question_without_answer_is_rejected() {
        let app = app();
        assert!(quiz(&app, 1, Some(0), None).await.is_err());
        assert!(quiz(&app, 1, None, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_config_set_writes_file() {
        let app = app();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        config_set(&app, &path, "color", "always").unwrap();

        let saved = HebreadConfig::load_from(&path).unwrap();
        assert_eq!(saved.output.color, ColorMode::Always);
        assert_eq!(saved.router, app.config().router);
        assert!(config_set(&app, &path, "nope", "x").is_err());
    }
}
