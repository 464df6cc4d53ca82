//! Session Controller
//!
//! Composes the pipeline for one page: loads settings into a config snapshot,
//! wires the observer to the engine, routes pointer and click events to the
//! overlay manager, and sequences the reset-and-reapply cycle when settings
//! change. On an excluded domain the session constructs inactive and every
//! entry point is a no-op.

use crate::config::{is_excluded_domain, Config, SettingsStore};
use crate::dom::{Document, ElementId};
use crate::engine::{ProcessingState, StateStore, TransformEngine};
use crate::observe::{ElementObserver, VisibilityWatch};
use crate::overlay::{OverlayManager, RevealedTexts};
use crate::translate::TranslateBackend;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// One page's pipeline instance
pub struct Session {
    config: Config,
    engine: TransformEngine,
    observer: ElementObserver,
    overlays: OverlayManager,
    revealed: RevealedTexts,
    settings_rx: watch::Receiver<()>,
    active: bool,
}

impl Session {
    /// Initialize a session for a page: load settings, check the exclusion
    /// list, run the presence scan and connect the mutation watch.
    pub fn init(
        doc: &Document,
        store: &dyn SettingsStore,
        page_url: &str,
        backend: Arc<dyn TranslateBackend>,
    ) -> Self {
        let config = Config::load(store);
        let observer = ElementObserver::new(config.clone());
        Self::start(doc, store, page_url, backend, config, observer)
    }

    /// Like [`init`](Self::init), with a caller-supplied visibility watch
    pub fn init_with_watch(
        doc: &Document,
        store: &dyn SettingsStore,
        page_url: &str,
        backend: Arc<dyn TranslateBackend>,
        watch: Box<dyn VisibilityWatch>,
    ) -> Self {
        let config = Config::load(store);
        let observer = ElementObserver::with_watch(config.clone(), watch);
        Self::start(doc, store, page_url, backend, config, observer)
    }

    fn start(
        doc: &Document,
        store: &dyn SettingsStore,
        page_url: &str,
        backend: Arc<dyn TranslateBackend>,
        config: Config,
        mut observer: ElementObserver,
    ) -> Self {
        let engine = TransformEngine::new(backend);
        let active = !is_excluded_domain(page_url, &store.excluded_domains());

        if active {
            observer.start_observing(doc, engine.states());
            log::info!(
                "session started for {page_url}, targeting {:?} -> {}",
                config.target_tags,
                config.target_language
            );
        } else {
            log::info!("session inactive: {page_url} is on the exclusion list");
        }

        Self {
            config,
            engine,
            observer,
            overlays: OverlayManager::new(),
            revealed: RevealedTexts::new(),
            settings_rx: store.subscribe(),
            active,
        }
    }

    /// Whether the pipeline runs on this page
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Current configuration snapshot
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The per-element state side table
    pub fn states(&self) -> &StateStore {
        self.engine.states()
    }

    /// Live overlay count
    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    /// Drain the settings change notification. Returns true when a setting
    /// was written since the last check.
    pub fn settings_changed(&mut self) -> bool {
        let changed = self.settings_rx.has_changed().unwrap_or(false);
        if changed {
            self.settings_rx.mark_unchanged();
        }
        changed
    }

    /// Reset-and-reapply: revert every transformed element, tear down its
    /// overlays, swap in the new config snapshot and re-run the presence
    /// scan. In-flight requests are swept too; their late completions are
    /// discarded.
    pub fn handle_settings_changed(&mut self, doc: &mut Document, store: &dyn SettingsStore) {
        if !self.active {
            return;
        }
        self.observer.stop_observing();

        let orphaned = self.engine.reset_all(doc);
        for id in &orphaned {
            self.overlays.remove_now(doc, id);
        }

        self.config = Config::load(store);
        log::info!(
            "settings changed: reset {} overlays, now targeting {:?} -> {}",
            orphaned.len(),
            self.config.target_tags,
            self.config.target_language
        );
        self.observer.update_config(self.config.clone());
        self.observer.start_observing(doc, self.engine.states());
    }

    /// Mutation-watch entry point
    pub fn nodes_added(&mut self, doc: &Document, added: &[ElementId]) {
        if !self.active {
            return;
        }
        self.observer.nodes_added(doc, self.engine.states(), added);
    }

    /// Transform every element that became visible since the last poll.
    /// Returns the number of elements handed to the engine.
    ///
    /// Also drops state entries whose element has left the document, so the
    /// side table tracks live nodes only as page content churns.
    pub async fn poll(&mut self, doc: &mut Document) -> usize {
        if !self.active {
            return 0;
        }
        self.engine.states_mut().prune(doc);
        let visible = self.observer.poll_visible(doc);
        let count = visible.len();
        for id in visible {
            self.engine.transform(doc, id, &self.config).await;
        }
        count
    }

    /// Pointer entered a node: show the overlay for a transformed anchor, or
    /// cancel the pending hide when the pointer moved onto the overlay itself
    pub fn pointer_enter(&mut self, doc: &mut Document, node: ElementId) {
        if !self.active {
            return;
        }
        if self.engine.states().state(node) == ProcessingState::Done {
            self.overlays.show(
                doc,
                self.engine.states_mut(),
                node,
                &self.config,
                &self.revealed,
            );
        } else if let Some(id) = self.overlays.overlay_at(node).cloned() {
            self.overlays.mark_visible(&id);
        }
    }

    /// Pointer left a node: schedule the debounced hide
    pub fn pointer_leave(&mut self, node: ElementId, now: Instant) {
        if !self.active {
            return;
        }
        let id = if let Some(id) = self.engine.states().overlay(node) {
            Some(id.clone())
        } else {
            self.overlays.overlay_at(node).cloned()
        };
        if let Some(id) = id {
            self.overlays.hide(&id, now);
        }
    }

    /// Click on a node: reveal a quiz option, or answer the whole quiz when
    /// the transformed anchor itself is clicked.
    ///
    /// An anchor click always records its original text as revealed, even
    /// when no overlay is live, so the next overlay for that text renders
    /// pre-revealed.
    pub fn click(&mut self, doc: &mut Document, node: ElementId, now: Instant) {
        if !self.active {
            return;
        }
        if let Some((id, _)) = self.overlays.option_at(node) {
            self.overlays
                .reveal_option(doc, &id, node, &mut self.revealed, now);
            return;
        }
        if self.engine.states().state(node) == ProcessingState::Done {
            if let Some(text) = self.engine.states().original_text(node) {
                self.revealed.reveal(text.to_string());
            }
            if let Some(id) = self.engine.states().overlay(node).cloned() {
                self.overlays.answer(doc, &id, &mut self.revealed, now);
            }
        }
    }

    /// Expire overlay removal timers
    pub fn tick(&mut self, doc: &mut Document, now: Instant) -> usize {
        if !self.active {
            return 0;
        }
        self.overlays.tick(doc, self.engine.states_mut(), now)
    }

    /// Tear the session down: disconnect the watches, revert every element
    /// and remove all overlays. The page is left as it was found.
    pub fn stop(&mut self, doc: &mut Document) {
        self.observer.stop_observing();
        let orphaned = self.engine.reset_all(doc);
        for id in &orphaned {
            self.overlays.remove_now(doc, id);
        }
        self.revealed.clear();
        self.active = false;
    }
}
