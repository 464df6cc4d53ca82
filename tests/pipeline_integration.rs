//! End-to-end pipeline scenarios: discovery through transformation, overlay
//! interaction and the reset-and-reapply cycle, driven through the public
//! session API with a scriptable backend.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use swapsage::overlay::BLURRED_CLASS;
use swapsage::{
    BackendErrorKind, Document, ElementNode, ElementSettings, ManualWatch, MemorySettings,
    ProcessingState, Result, Session, SwapSageError, TranslateBackend,
};

const PAGE: &str = "https://news.example.org/story";

/// Backend that records every request and fails on scripted texts
struct FakeBackend {
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashSet<String>>,
}

impl FakeBackend {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashSet::new()),
        }
    }

    fn fail_on(&self, text: &str) {
        self.failures.lock().unwrap().insert(text.to_string());
    }

    fn recover(&self, text: &str) {
        self.failures.lock().unwrap().remove(text);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TranslateBackend for FakeBackend {
    fn is_configured(&self) -> bool {
        true
    }

    async fn translate(&self, text: &str, _source: &str, target: &str) -> Result<String> {
        self.calls.lock().unwrap().push(text.to_string());
        if self.failures.lock().unwrap().contains(text) {
            return Err(SwapSageError::backend(
                BackendErrorKind::Transport,
                "scripted failure",
            ));
        }
        Ok(format!("[{target}] {text}"))
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn store() -> MemorySettings {
    let store = MemorySettings::new();
    store.set_api_key("integration-key");
    store
}

fn on_screen(tag: &str, text: &str) -> ElementNode {
    ElementNode::new(tag)
        .with_text(text)
        .with_bounding_box(0.0, 100.0, 400.0, 40.0)
}

fn below_fold(tag: &str, text: &str, y: f64) -> ElementNode {
    ElementNode::new(tag)
        .with_text(text)
        .with_bounding_box(0.0, y, 400.0, 40.0)
}

#[tokio::test]
async fn test_transform_applies_to_configured_tags_only() {
    init_logging();
    let mut doc = Document::new();
    let h1 = doc.append_child(doc.root(), on_screen("h1", "Hello")).unwrap();
    let h2 = doc.append_child(doc.root(), on_screen("h2", "World")).unwrap();
    let backend = Arc::new(FakeBackend::new());
    let store = store();

    let mut session = Session::init(&doc, &store, PAGE, backend.clone());
    session.poll(&mut doc).await;

    assert_eq!(doc.text(h1), Some("[es] Hello"));
    assert_eq!(doc.text(h2), Some("World"));
    assert_eq!(backend.calls(), vec!["Hello"]);
}

#[tokio::test]
async fn test_settings_toggle_reverts_and_rescans() {
    init_logging();
    let mut doc = Document::new();
    let h1 = doc.append_child(doc.root(), on_screen("h1", "Hello")).unwrap();
    let h2 = doc.append_child(doc.root(), on_screen("h2", "World")).unwrap();
    let backend = Arc::new(FakeBackend::new());
    let store = store();

    let mut session = Session::init(&doc, &store, PAGE, backend.clone());
    session.poll(&mut doc).await;
    assert_eq!(doc.text(h1), Some("[es] Hello"));

    store.set_element_settings(ElementSettings {
        h1: false,
        h2: true,
        ..ElementSettings::default()
    });
    assert!(session.settings_changed());
    session.handle_settings_changed(&mut doc, &store);

    assert_eq!(doc.text(h1), Some("Hello"));
    assert_eq!(session.states().state(h1), ProcessingState::Untouched);

    session.poll(&mut doc).await;
    assert_eq!(doc.text(h1), Some("Hello"));
    assert_eq!(doc.text(h2), Some("[es] World"));
    assert_eq!(backend.calls(), vec!["Hello", "World"]);
}

#[tokio::test]
async fn test_failed_transform_leaves_no_residue_and_is_retryable() {
    init_logging();
    let mut doc = Document::new();
    let h1 = doc.append_child(doc.root(), on_screen("h1", "Foo")).unwrap();
    let backend = Arc::new(FakeBackend::new());
    backend.fail_on("Foo");
    let store = store();

    let mut session = Session::init(&doc, &store, PAGE, backend.clone());
    session.poll(&mut doc).await;

    // Text, classes and children all back to the pre-transform state
    assert_eq!(doc.text(h1), Some("Foo"));
    assert!(doc.children(h1).is_empty());
    assert_eq!(session.states().state(h1), ProcessingState::Untouched);

    // A later discovery retries the element
    backend.recover("Foo");
    session.nodes_added(&doc, &[h1]);
    session.poll(&mut doc).await;
    assert_eq!(doc.text(h1), Some("[es] Foo"));
    assert_eq!(backend.calls(), vec!["Foo", "Foo"]);
}

#[tokio::test]
async fn test_transform_is_exactly_once() {
    init_logging();
    let mut doc = Document::new();
    let h1 = doc.append_child(doc.root(), on_screen("h1", "Hello")).unwrap();
    let backend = Arc::new(FakeBackend::new());
    let store = store();

    let mut session = Session::init(&doc, &store, PAGE, backend.clone());
    session.poll(&mut doc).await;
    // Re-reported through the mutation watch and polled again
    session.nodes_added(&doc, &[h1]);
    session.poll(&mut doc).await;

    assert_eq!(backend.calls(), vec!["Hello"]);
    assert_eq!(doc.text(h1), Some("[es] Hello"));
}

#[tokio::test]
async fn test_viewport_gates_offscreen_elements() {
    init_logging();
    let mut doc = Document::new();
    let top = doc.append_child(doc.root(), on_screen("h1", "Top")).unwrap();
    let deep = doc
        .append_child(doc.root(), below_fold("h1", "Deep", 5000.0))
        .unwrap();
    let backend = Arc::new(FakeBackend::new());
    let store = store();

    let mut session = Session::init(&doc, &store, PAGE, backend.clone());
    session.poll(&mut doc).await;

    assert_eq!(doc.text(top), Some("[es] Top"));
    assert_eq!(doc.text(deep), Some("Deep"));

    doc.scroll_to(0.0, 4700.0);
    session.poll(&mut doc).await;
    assert_eq!(doc.text(deep), Some("[es] Deep"));
    assert_eq!(backend.calls(), vec!["Top", "Deep"]);
}

#[tokio::test]
async fn test_mutation_discovery_fires_once_per_element() {
    init_logging();
    let mut doc = Document::new();
    let backend = Arc::new(FakeBackend::new());
    let store = store();
    let mut session = Session::init(&doc, &store, PAGE, backend.clone());

    let div = doc.append_child(doc.root(), ElementNode::new("div")).unwrap();
    let nested = doc.append_child(div, on_screen("h1", "Nested")).unwrap();

    // The same subtree reported twice, plus the match reported directly
    session.nodes_added(&doc, &[div]);
    session.nodes_added(&doc, &[div, nested]);
    session.poll(&mut doc).await;

    assert_eq!(doc.text(nested), Some("[es] Nested"));
    assert_eq!(backend.calls(), vec!["Nested"]);
}

#[tokio::test]
async fn test_tooltip_debounced_hide() {
    init_logging();
    let mut doc = Document::new();
    let h1 = doc.append_child(doc.root(), on_screen("h1", "Hello")).unwrap();
    let backend = Arc::new(FakeBackend::new());
    let store = store();
    let now = Instant::now();

    let mut session = Session::init(&doc, &store, PAGE, backend);
    session.poll(&mut doc).await;

    session.pointer_enter(&mut doc, h1);
    assert_eq!(session.overlay_count(), 1);

    // Leave and return within the 300ms window: the overlay survives
    session.pointer_leave(h1, now);
    session.pointer_enter(&mut doc, h1);
    assert_eq!(session.tick(&mut doc, now + Duration::from_millis(400)), 0);
    assert_eq!(session.overlay_count(), 1);

    // Leave for good: removed once the window expires
    let later = now + Duration::from_secs(1);
    session.pointer_leave(h1, later);
    assert_eq!(session.tick(&mut doc, later + Duration::from_millis(299)), 0);
    assert_eq!(session.tick(&mut doc, later + Duration::from_millis(301)), 1);
    assert_eq!(session.overlay_count(), 0);
    assert!(session.states().overlay(h1).is_none());
}

#[tokio::test]
async fn test_quiz_reveal_and_auto_remove() {
    init_logging();
    let mut doc = Document::new();
    let h1 = doc.append_child(doc.root(), on_screen("h1", "Hello")).unwrap();
    let backend = Arc::new(FakeBackend::new());
    let store = store();
    store.set_element_settings(ElementSettings {
        quiz_mode: true,
        ..ElementSettings::default()
    });
    let now = Instant::now();

    let mut session = Session::init(&doc, &store, PAGE, backend);
    session.poll(&mut doc).await;

    session.pointer_enter(&mut doc, h1);
    let overlay_id = session.states().overlay(h1).cloned().unwrap();

    // Find the blurred option button under the overlay container
    let container = doc
        .elements_by_tag("div")
        .into_iter()
        .find(|&id| doc.attribute(id, "id") == Some(&overlay_id.as_str().to_string()))
        .unwrap();
    let button = doc
        .descendants_by_tag(container, "button")
        .into_iter()
        .next()
        .unwrap();
    assert!(doc.has_class(button, BLURRED_CLASS));

    session.click(&mut doc, button, now);
    assert!(!doc.has_class(button, BLURRED_CLASS));
    assert_eq!(doc.attribute(button, "disabled"), Some(&"true".to_string()));

    // Answered overlays auto-remove after 2s even while hovered
    session.pointer_enter(&mut doc, h1);
    assert_eq!(session.tick(&mut doc, now + Duration::from_secs(2)), 1);
    assert_eq!(session.overlay_count(), 0);

    // The revealed text renders unblurred in the next overlay
    session.pointer_enter(&mut doc, h1);
    let new_id = session.states().overlay(h1).cloned().unwrap();
    let new_container = doc
        .elements_by_tag("div")
        .into_iter()
        .find(|&id| doc.attribute(id, "id") == Some(&new_id.as_str().to_string()))
        .unwrap();
    let new_button = doc
        .descendants_by_tag(new_container, "button")
        .into_iter()
        .next()
        .unwrap();
    assert!(!doc.has_class(new_button, BLURRED_CLASS));
}

#[tokio::test]
async fn test_excluded_domain_never_touches_the_page() {
    init_logging();
    let mut doc = Document::new();
    let h1 = doc.append_child(doc.root(), on_screen("h1", "Hello")).unwrap();
    let backend = Arc::new(FakeBackend::new());
    let store = store();
    store.set_excluded_domains(vec!["news.example.org".to_string()]);

    let mut session = Session::init(&doc, &store, PAGE, backend.clone());
    assert!(!session.is_active());

    session.nodes_added(&doc, &[h1]);
    session.poll(&mut doc).await;
    assert_eq!(doc.text(h1), Some("Hello"));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_manual_watch_drives_discovery_deterministically() {
    init_logging();
    let mut doc = Document::new();
    let h1 = doc.append_child(doc.root(), on_screen("h1", "Hello")).unwrap();
    let backend = Arc::new(FakeBackend::new());
    let store = store();

    let watch = ManualWatch::new();
    let mut session =
        Session::init_with_watch(&doc, &store, PAGE, backend.clone(), Box::new(watch));

    // No intersection notification: nothing happens
    session.poll(&mut doc).await;
    assert_eq!(doc.text(h1), Some("Hello"));
    assert!(backend.calls().is_empty());
}
