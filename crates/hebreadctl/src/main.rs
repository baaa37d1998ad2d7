//! Hebreadctl - Hebrew alphabet trainer for the terminal
//!
//! Every exercise outcome is recorded in the local progress store.

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use hebread_common::features::Density;
use hebread_common::HebreadConfig;
use hebreadctl::{commands, logging, App};
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser)]
#[command(name = "hebreadctl")]
#[command(about = "Learn to read the Hebrew alphabet", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (overrides $HEBREAD_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Navigation token to start at, e.g. "#/reading"
    #[arg(long, global = true)]
    at: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show progress, XP, badges and letters needing review
    Status,

    /// Per-letter mastery table
    Letters,

    /// Navigate to a panel (name or "#/name?..." token)
    Open { panel: String },

    /// Answer a flashcard
    #[command(group(ArgGroup::new("verdict").required(true).args(["knew", "again"])))]
    Card {
        /// Letter id or glyph
        letter: String,
        #[arg(long)]
        knew: bool,
        #[arg(long)]
        again: bool,
    },

    /// Score a tracing attempt by its coverage (0.0 - 1.0)
    Trace {
        letter: String,
        #[arg(long)]
        coverage: f64,
    },

    /// Answer a syllable drill
    #[command(group(ArgGroup::new("verdict").required(true).args(["knew", "again"])))]
    Syllable {
        /// Base letter id or glyph
        base: String,
        /// Vowel id (patah, qamats, hiriq, ...)
        vowel: String,
        #[arg(long)]
        knew: bool,
        #[arg(long)]
        again: bool,
    },

    /// Show the syllable quiz for a seed, or answer one question
    Quiz {
        #[arg(long, default_value_t = 0)]
        seed: u64,
        question: Option<usize>,
        answer: Option<String>,
    },

    /// List reading items, or mark one as read
    #[command(group(ArgGroup::new("verdict").args(["knew", "again"])))]
    Read {
        index: Option<usize>,
        #[arg(long)]
        phrases: bool,
        #[arg(long)]
        knew: bool,
        #[arg(long)]
        again: bool,
    },

    /// Play a letter hunt round
    Hunt {
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// low, med or high
        #[arg(long, default_value = "med")]
        density: Density,
        /// Picked cells, comma separated (0-99)
        #[arg(long, value_delimiter = ',')]
        picks: Option<Vec<usize>>,
    },

    /// Send weak letters to flashcards and show the deck
    Review,

    /// Erase all progress
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Show the active configuration, or change one setting
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Set a key: output.color (auto, always, never) or output.celebrate (on, off)
    Set { key: String, value: String },
}

fn load_config(explicit: Option<&PathBuf>) -> Result<HebreadConfig> {
    match explicit {
        Some(path) => HebreadConfig::load_from(path),
        None => HebreadConfig::load(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref()).context("Failed to load configuration")?;
    let app = App::boot(config)?;
    let panel = app.start(cli.at.as_deref()).await;
    debug!(panel = %panel, "[main] started");

    match cli.command {
        Commands::Status => commands::status(&app),
        Commands::Letters => commands::letters(&app),
        Commands::Open { panel } => commands::open(&app, &panel).await,
        Commands::Card { letter, knew, .. } => commands::card(&app, &letter, knew).await,
        Commands::Trace { letter, coverage } => commands::trace(&app, &letter, coverage).await,
        Commands::Syllable { base, vowel, knew, .. } => {
            commands::syllable(&app, &base, &vowel, knew).await
        }
        Commands::Quiz { seed, question, answer } => {
            commands::quiz(&app, seed, question, answer.as_deref()).await
        }
        Commands::Read { index, phrases, knew, again } => {
            let verdict = match (knew, again) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            commands::read(&app, index, phrases, verdict).await
        }
        Commands::Hunt { seed, density, picks } => commands::hunt(&app, seed, density, picks).await,
        Commands::Review => commands::review(&app).await,
        Commands::Reset { yes } => {
            let stdin = std::io::stdin();
            commands::reset(&app, yes, &mut stdin.lock()).map(|_| ())
        }
        Commands::Config { action } => {
            let path = match cli.config {
                Some(path) => path,
                None => HebreadConfig::active_path()?,
            };
            match action {
                None => commands::config(&app, &path),
                Some(ConfigAction::Set { key, value }) => {
                    commands::config_set(&app, &path, &key, &value)
                }
            }
        }
    }
}
