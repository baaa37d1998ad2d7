//! Composition root: wires store, engine, bus, router and exercises.

use crate::celebrate;
use crate::display::Palette;
use anyhow::{Context, Result};
use hebread_common::features::{
    Feature, Flashcards, LetterHunt, MountContext, Reading, Syllables, Trace,
};
use hebread_common::highlight::LearnedHighlighter;
use hebread_common::review::ReviewHandoff;
use hebread_common::summary::ProgressSummary;
use hebread_common::{
    AppState, Curriculum, EventBus, FileMedium, HebreadConfig, MasteryEngine, PanelRouter,
    ProgressReporter, SharedMedium, Store,
};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{debug, info};

pub struct App {
    config: HebreadConfig,
    palette: Palette,
    bus: Arc<EventBus>,
    reporter: ProgressReporter,
    router: PanelRouter,
    highlighter: LearnedHighlighter,
    review: Arc<ReviewHandoff>,
    pub flashcards: Arc<Flashcards>,
    pub trace: Arc<Trace>,
    pub syllables: Arc<Syllables>,
    pub reading: Arc<Reading>,
    pub letter_hunt: Arc<LetterHunt>,
}

impl App {
    /// Boot against the on-disk store from `config`
    pub fn boot(config: HebreadConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.storage.data_dir).with_context(|| {
            format!("Failed to create data directory {}", config.storage.data_dir.display())
        })?;
        let medium: SharedMedium = Arc::new(FileMedium::new(&config.storage.data_dir));
        Ok(Self::boot_with(config, medium))
    }

    /// Boot against any medium
    pub fn boot_with(config: HebreadConfig, medium: SharedMedium) -> Self {
        let palette = Palette::new(config.output.color);
        let curriculum = Curriculum::hebrew();
        let bus = Arc::new(EventBus::new());
        let store = Store::new(medium, &config.storage.namespace);
        let engine = MasteryEngine::boot(store, Arc::clone(&bus), curriculum);

        let highlighter = LearnedHighlighter::new(curriculum, engine.state());
        highlighter.attach(&bus);
        if config.output.celebrate {
            celebrate::attach(&bus, palette);
        }

        let reporter = ProgressReporter::new(Arc::new(Mutex::new(engine)));
        let review = Arc::new(ReviewHandoff::new());
        let router = PanelRouter::new(&config.router.default_panel)
            .with_on_change(|panel| debug!(panel, "[app] panel shown"));

        let app = Self {
            palette,
            bus,
            reporter,
            router,
            highlighter,
            flashcards: Arc::new(Flashcards::new(Arc::clone(&review))),
            review,
            trace: Arc::new(Trace::new()),
            syllables: Arc::new(Syllables::new()),
            reading: Arc::new(Reading::new()),
            letter_hunt: Arc::new(LetterHunt::new()),
            config,
        };

        let features: [Arc<dyn Feature>; 5] = [
            app.flashcards.clone(),
            app.trace.clone(),
            app.syllables.clone(),
            app.reading.clone(),
            app.letter_hunt.clone(),
        ];
        for feature in features {
            register_feature(&app.router, feature, &app.reporter);
        }
        info!(panels = ?app.router.panel_names(), "[app] booted");
        app
    }

    /// Initial navigation: `token` if it names a panel, else the default
    pub async fn start(&self, token: Option<&str>) -> String {
        self.router.start(token).await
    }

    /// Navigate and require that `panel` is the one shown afterwards
    pub async fn open(&self, panel: &str) -> Result<()> {
        let shown = self.router.go(panel).await;
        if shown != panel {
            anyhow::bail!("panel '{}' could not be opened (showing '{}')", panel, shown);
        }
        Ok(())
    }

    pub async fn navigate(&self, token: &str) -> String {
        self.router.navigate_token(token).await
    }

    pub fn config(&self) -> &HebreadConfig {
        &self.config
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn router(&self) -> &PanelRouter {
        &self.router
    }

    pub fn reporter(&self) -> &ProgressReporter {
        &self.reporter
    }

    pub fn highlighter(&self) -> &LearnedHighlighter {
        &self.highlighter
    }

    pub fn review(&self) -> &Arc<ReviewHandoff> {
        &self.review
    }

    fn engine(&self) -> MutexGuard<'_, MasteryEngine> {
        lock_engine(&self.reporter)
    }

    pub fn snapshot(&self) -> Arc<AppState> {
        self.engine().snapshot()
    }

    pub fn summary(&self) -> ProgressSummary {
        self.engine().summary()
    }

    pub fn subscribe_summary(&self) -> watch::Receiver<ProgressSummary> {
        self.engine().subscribe_summary()
    }

    pub fn learned_letters(&self) -> BTreeSet<String> {
        self.engine().learned_set()
    }

    pub fn weak_letters(&self) -> Vec<String> {
        self.engine().weak_letters()
    }

    /// Stage the weak letters for the next flashcards mount
    pub fn offer_review(&self) -> Vec<String> {
        let weak = self.weak_letters();
        self.review.offer(&weak);
        weak
    }

    /// Erase all progress under our namespace
    pub fn reset(&self) -> usize {
        let removed = self.engine().reset();
        self.highlighter.request_frame();
        removed
    }
}

fn lock_engine(reporter: &ProgressReporter) -> MutexGuard<'_, MasteryEngine> {
    match reporter.engine().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Register `feature` as a panel whose activation mounts it
fn register_feature(router: &PanelRouter, feature: Arc<dyn Feature>, reporter: &ProgressReporter) {
    let panel = feature.panel();
    let reporter = reporter.clone();
    router.register_async(panel, move || {
        let feature = Arc::clone(&feature);
        let reporter = reporter.clone();
        async move {
            let snapshot = lock_engine(&reporter).snapshot();
            debug!(panel = feature.panel(), "[app] mounting");
            feature
                .mount(MountContext::new(feature.panel(), snapshot, reporter))
                .with_context(|| format!("Failed to mount {}", feature.panel()))
        }
    });
}
