//! Discovery & Liveness Observer
//!
//! Finds target elements, both those present at start and those added later,
//! and feeds each one to the transformation engine exactly once, gated on the
//! element approaching the viewport. Composes two watch mechanisms:
//! - a presence scan over the current document, run by `start_observing`
//! - a subtree mutation watch, fed through `nodes_added`
//! Both register matches with a [`VisibilityWatch`]; `poll_visible` drains the
//! elements that became intersecting (fire-once).

pub mod visibility;

pub use visibility::{ManualWatch, ViewportWatch, VisibilityWatch, VIEWPORT_MARGIN, VISIBILITY_THRESHOLD};

use crate::config::Config;
use crate::dom::{Document, ElementId};
use crate::engine::StateStore;

/// The element discovery observer
pub struct ElementObserver {
    config: Config,
    visibility: Box<dyn VisibilityWatch>,
    subtree_connected: bool,
}

impl ElementObserver {
    /// Create an observer with the geometry-driven viewport watch
    pub fn new(config: Config) -> Self {
        Self::with_watch(config, Box::new(ViewportWatch::new()))
    }

    /// Create an observer with a custom visibility watch
    pub fn with_watch(config: Config, visibility: Box<dyn VisibilityWatch>) -> Self {
        Self {
            config,
            visibility,
            subtree_connected: false,
        }
    }

    /// Current configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether the subtree mutation watch is connected
    pub fn is_observing(&self) -> bool {
        self.subtree_connected
    }

    /// Number of elements waiting on the visibility gate
    pub fn pending_count(&self) -> usize {
        self.visibility.watched_count()
    }

    /// Run the presence scan and connect the mutation watch.
    ///
    /// Every currently-present element whose tag is targeted and that is not
    /// yet processed is registered with the visibility watch; nothing is
    /// transformed here.
    pub fn start_observing(&mut self, doc: &Document, states: &StateStore) {
        for tag in &self.config.target_tags {
            for id in doc.elements_by_tag(tag) {
                if !states.is_processed(id) {
                    self.visibility.observe(id);
                }
            }
        }
        self.subtree_connected = true;
        log::debug!(
            "observing {} pending elements across tags {:?}",
            self.visibility.watched_count(),
            self.config.target_tags
        );
    }

    /// Disconnect both watch mechanisms
    pub fn stop_observing(&mut self) {
        self.visibility.disconnect();
        self.subtree_connected = false;
    }

    /// Replace the held configuration.
    ///
    /// Does not re-scan; the session controller sequences reset and restart.
    pub fn update_config(&mut self, config: Config) {
        self.config = config;
    }

    /// Mutation-watch entry point: register newly added elements.
    ///
    /// `added` holds the top-level added nodes; matches nested inside an
    /// added subtree are found here. Ignored while disconnected.
    pub fn nodes_added(&mut self, doc: &Document, states: &StateStore, added: &[ElementId]) {
        if !self.subtree_connected {
            return;
        }
        for &id in added {
            if let Some(tag) = doc.tag(id) {
                if self.config.targets_tag(tag) && !states.is_processed(id) {
                    self.visibility.observe(id);
                }
            }
            for tag in &self.config.target_tags {
                for descendant in doc.descendants_by_tag(id, tag) {
                    if !states.is_processed(descendant) {
                        self.visibility.observe(descendant);
                    }
                }
            }
        }
    }

    /// Elements that became intersecting since the last poll, ready for the
    /// transformation engine. Each element is returned at most once per
    /// observation cycle.
    pub fn poll_visible(&mut self, doc: &Document) -> Vec<ElementId> {
        self.visibility.poll_intersecting(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementNode;

    fn config(tags: &[&str]) -> Config {
        Config {
            target_tags: tags.iter().map(|t| t.to_string()).collect(),
            tooltip_class: "original-text-tooltip".to_string(),
            target_language: "es".to_string(),
            quiz_mode: false,
        }
    }

    fn on_screen(tag: &str, text: &str) -> ElementNode {
        ElementNode::new(tag)
            .with_text(text)
            .with_bounding_box(0.0, 100.0, 200.0, 40.0)
    }

    #[test]
    fn test_presence_scan_registers_target_tags_only() {
        let mut doc = Document::new();
        let h1 = doc.append_child(doc.root(), on_screen("h1", "a")).unwrap();
        let _h2 = doc.append_child(doc.root(), on_screen("h2", "b")).unwrap();
        let states = StateStore::new();

        let mut observer = ElementObserver::new(config(&["h1"]));
        observer.start_observing(&doc, &states);

        assert_eq!(observer.pending_count(), 1);
        assert_eq!(observer.poll_visible(&doc), vec![h1]);
    }

    #[test]
    fn test_presence_scan_skips_processed() {
        let mut doc = Document::new();
        let h1 = doc.append_child(doc.root(), on_screen("h1", "a")).unwrap();
        let mut states = StateStore::new();
        states.mark_in_flight(h1, "a".to_string(), None);

        let mut observer = ElementObserver::new(config(&["h1"]));
        observer.start_observing(&doc, &states);

        assert_eq!(observer.pending_count(), 0);
    }

    #[test]
    fn test_nodes_added_direct_and_nested_matches() {
        let mut doc = Document::new();
        let states = StateStore::new();
        let mut observer = ElementObserver::new(config(&["h1"]));
        observer.start_observing(&doc, &states);

        // A directly-matching node
        let direct = doc.append_child(doc.root(), on_screen("h1", "direct")).unwrap();
        // A container with a nested match
        let div = doc.append_child(doc.root(), ElementNode::new("div")).unwrap();
        let nested = doc.append_child(div, on_screen("h1", "nested")).unwrap();

        observer.nodes_added(&doc, &states, &[direct, div]);

        let fired = observer.poll_visible(&doc);
        assert!(fired.contains(&direct));
        assert!(fired.contains(&nested));
        assert!(!fired.contains(&div));
    }

    #[test]
    fn test_fire_once_when_matched_twice() {
        let mut doc = Document::new();
        let states = StateStore::new();
        let mut observer = ElementObserver::new(config(&["h1"]));
        observer.start_observing(&doc, &states);

        let div = doc.append_child(doc.root(), ElementNode::new("div")).unwrap();
        let h1 = doc.append_child(div, on_screen("h1", "x")).unwrap();

        // The same element reported through both the container and directly
        observer.nodes_added(&doc, &states, &[div]);
        observer.nodes_added(&doc, &states, &[h1]);

        assert_eq!(observer.poll_visible(&doc), vec![h1]);
        assert!(observer.poll_visible(&doc).is_empty());
    }

    #[test]
    fn test_mutations_ignored_while_disconnected() {
        let mut doc = Document::new();
        let states = StateStore::new();
        let mut observer = ElementObserver::new(config(&["h1"]));

        let h1 = doc.append_child(doc.root(), on_screen("h1", "x")).unwrap();
        observer.nodes_added(&doc, &states, &[h1]);
        assert_eq!(observer.pending_count(), 0);

        observer.start_observing(&doc, &states);
        observer.stop_observing();
        let h1b = doc.append_child(doc.root(), on_screen("h1", "y")).unwrap();
        observer.nodes_added(&doc, &states, &[h1b]);
        assert_eq!(observer.pending_count(), 0);
    }

    #[test]
    fn test_update_config_does_not_rescan() {
        let mut doc = Document::new();
        let states = StateStore::new();
        let _h2 = doc.append_child(doc.root(), on_screen("h2", "b")).unwrap();

        let mut observer = ElementObserver::new(config(&["h1"]));
        observer.start_observing(&doc, &states);
        assert_eq!(observer.pending_count(), 0);

        observer.update_config(config(&["h2"]));
        // Still nothing: the caller must restart the scan
        assert_eq!(observer.pending_count(), 0);

        observer.start_observing(&doc, &states);
        assert_eq!(observer.pending_count(), 1);
    }

    #[test]
    fn test_mutation_watch_reads_current_config() {
        let mut doc = Document::new();
        let states = StateStore::new();
        let mut observer = ElementObserver::new(config(&["h1"]));
        observer.start_observing(&doc, &states);

        observer.update_config(config(&["h2"]));

        // The subscription persists and re-reads the tag set per invocation
        let h2 = doc.append_child(doc.root(), on_screen("h2", "b")).unwrap();
        observer.nodes_added(&doc, &states, &[h2]);
        assert_eq!(observer.poll_visible(&doc), vec![h2]);
    }

    #[test]
    fn test_manual_watch_gates_discovery() {
        let mut doc = Document::new();
        let states = StateStore::new();
        let h1 = doc.append_child(doc.root(), on_screen("h1", "a")).unwrap();

        let mut observer = ElementObserver::with_watch(config(&["h1"]), Box::new(ManualWatch::new()));
        observer.start_observing(&doc, &states);

        // Nothing fires without an explicit visibility notification
        assert!(observer.poll_visible(&doc).is_empty());
        assert_eq!(observer.pending_count(), 1);
        let _ = h1;
    }
}
