//! Panel router.
//!
//! Maps a navigation token (`#/flashcards?x=1`, or a bare panel name) to a
//! panel, awaits that panel's optional activation, then marks exactly that
//! panel visible. A failed activation falls back to the default panel. A
//! navigation that settles after a newer one has started is stale and its
//! visibility change is discarded.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};

/// Panel shown when nothing else resolves
pub const DEFAULT_PANEL: &str = "progress";

pub type ActivationFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'static>>;
pub type Activation = Arc<dyn Fn() -> ActivationFuture + Send + Sync>;
pub type VisibilityCallback = Arc<dyn Fn(&str) + Send + Sync>;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

struct Panel {
    name: String,
    activation: Option<Activation>,
    visible: bool,
}

pub struct PanelRouter {
    default_panel: String,
    panels: Mutex<Vec<Panel>>,
    current: Mutex<Option<String>>,
    generation: AtomicU64,
    on_change: Option<VisibilityCallback>,
}

impl std::fmt::Debug for PanelRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelRouter")
            .field("default_panel", &self.default_panel)
            .field("panels", &self.panel_names())
            .field("current", &self.current())
            .finish()
    }
}

impl PanelRouter {
    /// New router; the default panel is registered without an activation
    pub fn new(default_panel: &str) -> Self {
        let router = Self {
            default_panel: default_panel.to_string(),
            panels: Mutex::new(Vec::new()),
            current: Mutex::new(None),
            generation: AtomicU64::new(0),
            on_change: None,
        };
        router.register(default_panel, None);
        router
    }

    /// Called with the panel name every time visibility changes
    pub fn with_on_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_change = Some(Arc::new(callback));
        self
    }

    pub fn default_panel(&self) -> &str {
        &self.default_panel
    }

    /// Register (or replace) a panel
    pub fn register(&self, name: &str, activation: Option<Activation>) {
        let Ok(mut panels) = self.panels.lock() else {
            return;
        };
        match panels.iter_mut().find(|p| p.name == name) {
            Some(panel) => panel.activation = activation,
            None => panels.push(Panel {
                name: name.to_string(),
                activation,
                visible: false,
            }),
        }
    }

    /// Register a panel whose activation is an async closure
    pub fn register_async<F, Fut>(&self, name: &str, activate: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let activation: Activation = Arc::new(move || Box::pin(activate()) as ActivationFuture);
        self.register(name, Some(activation));
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.panels
            .lock()
            .map(|p| p.iter().any(|panel| panel.name == name))
            .unwrap_or(false)
    }

    pub fn panel_names(&self) -> Vec<String> {
        self.panels
            .lock()
            .map(|p| p.iter().map(|panel| panel.name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn visible_panels(&self) -> Vec<String> {
        self.panels
            .lock()
            .map(|p| {
                p.iter()
                    .filter(|panel| panel.visible)
                    .map(|panel| panel.name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn current(&self) -> Option<String> {
        self.current.lock().ok().and_then(|c| c.clone())
    }

    /// Extract a registered panel name from a fragment token.
    /// `#/flashcards?foo=1` -> `flashcards`; a bare name is accepted too.
    pub fn parse_token(&self, token: &str) -> Option<String> {
        let path = token.strip_prefix("#/").unwrap_or(token);
        let name = path.split('?').next().unwrap_or("").trim();
        if name.is_empty() || !self.is_registered(name) {
            return None;
        }
        Some(name.to_string())
    }

    /// Navigate to `name`; unknown names go to the default panel.
    /// Returns the panel that is visible once this navigation settles.
    pub async fn go(&self, name: &str) -> String {
        let target = if self.is_registered(name) {
            name.to_string()
        } else {
            debug!(panel = name, "[router] unknown panel, using default");
            self.default_panel.clone()
        };
        self.trigger(target).await
    }

    /// Navigate from a fragment token; invalid tokens resolve to the default
    pub async fn navigate_token(&self, token: &str) -> String {
        let target = self
            .parse_token(token)
            .unwrap_or_else(|| self.default_panel.clone());
        self.trigger(target).await
    }

    /// Initial navigation: the token if it names a panel, else the default
    pub async fn start(&self, initial_token: Option<&str>) -> String {
        match initial_token {
            Some(token) if !token.is_empty() => self.navigate_token(token).await,
            _ => self.go(&self.default_panel).await,
        }
    }

    fn activation_for(&self, name: &str) -> Option<Activation> {
        self.panels
            .lock()
            .ok()?
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.activation.clone())
    }

    fn trigger(&self, name: String) -> BoxFuture<'_, String> {
        Box::pin(async move {
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

            let outcome = match self.activation_for(&name) {
                Some(activate) => run_activation(activate).await,
                None => Ok(()),
            };

            if self.generation.load(Ordering::SeqCst) != generation {
                debug!(panel = %name, "[router] stale navigation settled, discarding");
                return self.current().unwrap_or_else(|| self.default_panel.clone());
            }

            match outcome {
                Ok(()) => {
                    self.show(&name);
                    name
                }
                Err(e) => {
                    error!(panel = %name, "[router] route error: {:#}", e);
                    let fallback = self.default_panel.clone();
                    self.show(&fallback);
                    if name != fallback {
                        self.trigger(fallback).await
                    } else {
                        fallback
                    }
                }
            }
        })
    }

    /// Exhaustive pass: exactly `target` ends up visible
    fn show(&self, target: &str) {
        if let Ok(mut panels) = self.panels.lock() {
            for panel in panels.iter_mut() {
                panel.visible = panel.name == target;
            }
        }
        if let Ok(mut current) = self.current.lock() {
            *current = Some(target.to_string());
        }
        info!(panel = target, "[router] panel shown");
        if let Some(callback) = &self.on_change {
            callback(target);
        }
    }
}

/// Run an activation, turning a panic into an error
async fn run_activation(activate: Activation) -> anyhow::Result<()> {
    match tokio::spawn(activate()).await {
        Ok(result) => result,
        Err(join) => Err(anyhow::anyhow!("activation aborted: {}", join)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    async fn failing_mount() -> anyhow::Result<()> {
        anyhow::bail!("mount failed")
    }

    async fn panicking_mount() -> anyhow::Result<()> {
        panic!("mount panicked")
    }

    fn counting(router: &PanelRouter, name: &str) -> Arc<AtomicUsize> {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        router.register_async(name, move || {
            let h = Arc::clone(&h);
            async move {
                h.fetch_add(1, Ordering::SeqCst);
                anyhow::Ok(())
            }
        });
        hits
    }

    #[test]
    fn test_parse_token() {
        let router = PanelRouter::new(DEFAULT_PANEL);
        router.register("flashcards", None);
        assert_eq!(router.parse_token("#/flashcards?foo=1"), Some("flashcards".into()));
        assert_eq!(router.parse_token("flashcards"), Some("flashcards".into()));
        assert_eq!(router.parse_token("#/"), None);
        assert_eq!(router.parse_token("#/nope"), None);
        assert_eq!(router.parse_token(""), None);
    }

    #[tokio::test]
    async fn test_go_shows_exactly_one_panel() {
        let router = PanelRouter::new(DEFAULT_PANEL);
        counting(&router, "trace");
        counting(&router, "reading");

        assert_eq!(router.go("trace").await, "trace");
        assert_eq!(router.visible_panels(), vec!["trace".to_string()]);
        assert_eq!(router.go("reading").await, "reading");
        assert_eq!(router.visible_panels(), vec!["reading".to_string()]);
    }

    #[tokio::test]
    async fn test_renavigation_reruns_activation() {
        let router = PanelRouter::new(DEFAULT_PANEL);
        let hits = counting(&router, "trace");
        router.go("trace").await;
        router.go("trace").await;
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unknown_panel_falls_back_to_default() {
        let router = PanelRouter::new(DEFAULT_PANEL);
        assert_eq!(router.go("does-not-exist").await, DEFAULT_PANEL);
        assert_eq!(router.visible_panels(), vec![DEFAULT_PANEL.to_string()]);
    }

    #[tokio::test]
    async fn test_failed_activation_redirects_to_default() {
        let router = PanelRouter::new(DEFAULT_PANEL);
        let default_hits = counting(&router, DEFAULT_PANEL);
        router.register_async("broken", failing_mount);

        assert_eq!(router.go("broken").await, DEFAULT_PANEL);
        assert_eq!(router.visible_panels(), vec![DEFAULT_PANEL.to_string()]);
        assert_eq!(default_hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panicking_activation_is_contained() {
        let router = PanelRouter::new(DEFAULT_PANEL);
        router.register_async("panics", panicking_mount);
        assert_eq!(router.go("panics").await, DEFAULT_PANEL);
    }

    #[tokio::test]
    async fn test_failing_default_does_not_loop() {
        let router = PanelRouter::new(DEFAULT_PANEL);
        router.register_async(DEFAULT_PANEL, failing_mount);
        assert_eq!(router.go(DEFAULT_PANEL).await, DEFAULT_PANEL);
        assert_eq!(router.visible_panels(), vec![DEFAULT_PANEL.to_string()]);
    }

    #[tokio::test]
    async fn test_start_with_and_without_token() {
        let router = PanelRouter::new(DEFAULT_PANEL);
        counting(&router, "syllables");
        assert_eq!(router.start(None).await, DEFAULT_PANEL);
        assert_eq!(router.start(Some("#/syllables")).await, "syllables");
        assert_eq!(router.start(Some("#/bogus")).await, DEFAULT_PANEL);
    }

    #[tokio::test]
    async fn test_stale_activation_is_discarded() {
        let router = Arc::new(PanelRouter::new(DEFAULT_PANEL));
        router.register_async("slow", || async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            anyhow::Ok(())
        });
        counting(&router, "fast");

        let slow = {
            let r = Arc::clone(&router);
            tokio::spawn(async move { r.go("slow").await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(router.go("fast").await, "fast");

        assert_eq!(slow.await.unwrap(), "fast");
        assert_eq!(router.visible_panels(), vec!["fast".to_string()]);
    }

    #[tokio::test]
    async fn test_on_change_callback() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let router = PanelRouter::new(DEFAULT_PANEL).with_on_change(move |name| {
            s.lock().unwrap().push(name.to_string());
        });
        router.register("reading", None);
        router.go("reading").await;
        router.go("nowhere").await;
        assert_eq!(*seen.lock().unwrap(), vec!["reading".to_string(), DEFAULT_PANEL.to_string()]);
    }
}
