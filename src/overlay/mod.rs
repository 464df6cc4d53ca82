//! Ephemeral Overlay Manager
//!
//! Creates, positions and tears down the transient UI anchored to a
//! transformed element: a plain tooltip showing the original text, or a quiz
//! whose options un-blur on click. Overlays are never persisted; they are
//! removed after a fixed linger once no longer hovered, and the delayed
//! removal re-checks the visibility flag so a re-hover inside the window
//! cancels it (debounced hide).

pub mod quiz;

pub use quiz::RevealedTexts;

use crate::config::Config;
use crate::dom::{Document, ElementId, ElementNode};
use crate::engine::StateStore;
use indexmap::IndexMap;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::fmt;
use std::time::{Duration, Instant};

/// Linger after hover-out before an overlay is removed
pub const HIDE_DELAY: Duration = Duration::from_millis(300);

/// Linger after a quiz is answered before the overlay auto-removes
pub const ANSWERED_LINGER: Duration = Duration::from_secs(2);

/// CSS classes of the quiz container and its parts
pub const QUIZ_OPTIONS_CLASS: &str = "quiz-options";
pub const QUIZ_CONTAINER_CLASS: &str = "quiz-container";
pub const OPTION_WRAPPER_CLASS: &str = "quiz-option-wrapper";
pub const OPTION_CLASS: &str = "quiz-option";
pub const BLURRED_CLASS: &str = "blurred";
pub const REVEAL_PROMPT_CLASS: &str = "reveal-text-overlay";

const REVEAL_PROMPT_TEXT: &str = "click to reveal...";

/// Unique overlay identity, also written to the container's `id` attribute
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OverlayId(String);

impl OverlayId {
    /// Generate a fresh random id
    pub fn generate() -> Self {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(13)
            .map(char::from)
            .collect();
        Self(format!("id-{}", suffix.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OverlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One clickable quiz option inside an overlay
#[derive(Debug)]
pub struct QuizOption {
    /// The option button node
    pub button: ElementId,
    /// The "click to reveal..." prompt node, present while blurred
    pub prompt: Option<ElementId>,
    /// Option text
    pub text: String,
}

/// A live overlay instance
#[derive(Debug)]
pub struct Overlay {
    pub id: OverlayId,
    /// Element the overlay is anchored to
    pub anchor: ElementId,
    /// Container node in the document
    pub node: ElementId,
    /// Hover state; re-checked when a scheduled removal comes due
    pub visible: bool,
    /// Whether the quiz has been answered (interaction disabled)
    pub answered: bool,
    /// Quiz options; empty for plain tooltips
    pub options: Vec<QuizOption>,
}

#[derive(Debug, Clone)]
struct PendingRemoval {
    id: OverlayId,
    due: Instant,
    /// Forced removals (answered quizzes) ignore the visibility flag
    forced: bool,
}

/// Manager of all live overlays and their removal timers
pub struct OverlayManager {
    overlays: IndexMap<OverlayId, Overlay>,
    removals: Vec<PendingRemoval>,
    hide_delay: Duration,
    answered_linger: Duration,
}

impl OverlayManager {
    pub fn new() -> Self {
        Self {
            overlays: IndexMap::new(),
            removals: Vec::new(),
            hide_delay: HIDE_DELAY,
            answered_linger: ANSWERED_LINGER,
        }
    }

    /// Show an overlay for a transformed anchor element.
    ///
    /// If the anchor's recorded overlay still exists, it is marked visible
    /// again (cancelling any pending removal at expiry) and no new overlay is
    /// created, so an anchor never carries more than one overlay. Returns
    /// `None` when the anchor has no recorded original text.
    pub fn show(
        &mut self,
        doc: &mut Document,
        states: &mut StateStore,
        anchor: ElementId,
        config: &Config,
        revealed: &RevealedTexts,
    ) -> Option<OverlayId> {
        let original = states.original_text(anchor)?.to_string();

        if let Some(existing) = states.overlay(anchor).cloned() {
            match self.overlays.get_mut(&existing) {
                Some(overlay) if doc.contains(overlay.node) => {
                    overlay.visible = true;
                    return Some(existing);
                }
                _ => {
                    // Stale link left by an external removal
                    states.clear_overlay(anchor);
                    self.overlays.shift_remove(&existing);
                }
            }
        }

        let id = OverlayId::generate();
        let mut container = if config.quiz_mode {
            ElementNode::new("div")
                .with_class(format!("{QUIZ_OPTIONS_CLASS} {QUIZ_CONTAINER_CLASS}"))
        } else {
            ElementNode::new("div")
                .with_class(config.tooltip_class.clone())
                .with_text(original.clone())
        };
        // Anchor position in document coordinates, scroll offset included
        if let Some(bbox) = doc.bounding_box(anchor) {
            container.bounding_box = Some(bbox);
        }

        let node = doc.append_child(doc.root(), container).ok()?;
        doc.set_attribute(node, "id", id.as_str());

        let mut options = Vec::new();
        if config.quiz_mode {
            for text in quiz::variants(&original) {
                let wrapper = doc
                    .append_child(node, ElementNode::new("div").with_class(OPTION_WRAPPER_CLASS))
                    .ok()?;
                let button = doc
                    .append_child(
                        wrapper,
                        ElementNode::new("button")
                            .with_class(OPTION_CLASS)
                            .with_text(text.clone()),
                    )
                    .ok()?;
                let mut prompt = None;
                if !revealed.is_revealed(&text) {
                    doc.add_class(button, BLURRED_CLASS);
                    prompt = doc
                        .append_child(
                            wrapper,
                            ElementNode::new("span")
                                .with_class(REVEAL_PROMPT_CLASS)
                                .with_text(REVEAL_PROMPT_TEXT),
                        )
                        .ok();
                }
                options.push(QuizOption {
                    button,
                    prompt,
                    text,
                });
            }
        }

        self.overlays.insert(
            id.clone(),
            Overlay {
                id: id.clone(),
                anchor,
                node,
                visible: true,
                answered: false,
                options,
            },
        );
        states.set_overlay(anchor, id.clone());
        log::debug!("overlay {id} shown for anchor {anchor}");
        Some(id)
    }

    /// Hover-out: mark not visible and schedule removal after the linger.
    /// The visibility flag is re-checked at expiry, not here.
    pub fn hide(&mut self, id: &OverlayId, now: Instant) {
        if let Some(overlay) = self.overlays.get_mut(id) {
            overlay.visible = false;
            self.removals.push(PendingRemoval {
                id: id.clone(),
                due: now + self.hide_delay,
                forced: false,
            });
        }
    }

    /// Hover onto the overlay itself: cancel a pending hide
    pub fn mark_visible(&mut self, id: &OverlayId) {
        if let Some(overlay) = self.overlays.get_mut(id) {
            overlay.visible = true;
        }
    }

    /// Click on a quiz option: un-blur it, record its text as revealed, then
    /// finish the quiz (disable all options, auto-remove after the answered
    /// linger). No-op on an already-answered overlay.
    pub fn reveal_option(
        &mut self,
        doc: &mut Document,
        id: &OverlayId,
        button: ElementId,
        revealed: &mut RevealedTexts,
        now: Instant,
    ) {
        let mut answered = false;
        if let Some(overlay) = self.overlays.get_mut(id) {
            if overlay.answered {
                return;
            }
            let Some(option) = overlay.options.iter_mut().find(|o| o.button == button) else {
                return;
            };
            doc.remove_class(option.button, BLURRED_CLASS);
            if let Some(prompt) = option.prompt.take() {
                doc.remove(prompt);
            }
            revealed.reveal(option.text.clone());

            overlay.answered = true;
            for option in &overlay.options {
                doc.set_attribute(option.button, "disabled", "true");
            }
            answered = true;
        }
        if answered {
            self.removals.push(PendingRemoval {
                id: id.clone(),
                due: now + self.answered_linger,
                forced: true,
            });
        }
    }

    /// Click on the anchor element: reveal every option, disable interaction
    /// and auto-remove after the answered linger
    pub fn answer(
        &mut self,
        doc: &mut Document,
        id: &OverlayId,
        revealed: &mut RevealedTexts,
        now: Instant,
    ) {
        let mut answered = false;
        if let Some(overlay) = self.overlays.get_mut(id) {
            if overlay.answered {
                return;
            }
            for option in &mut overlay.options {
                doc.remove_class(option.button, BLURRED_CLASS);
                if let Some(prompt) = option.prompt.take() {
                    doc.remove(prompt);
                }
                revealed.reveal(option.text.clone());
                doc.set_attribute(option.button, "disabled", "true");
            }
            overlay.answered = true;
            answered = true;
        }
        if answered {
            self.removals.push(PendingRemoval {
                id: id.clone(),
                due: now + self.answered_linger,
                forced: true,
            });
        }
    }

    /// Expire removal timers that have come due.
    ///
    /// A non-forced removal only proceeds if the overlay is still not
    /// visible; a `show` or overlay hover inside the window keeps it alive.
    /// Returns the number of overlays removed.
    pub fn tick(&mut self, doc: &mut Document, states: &mut StateStore, now: Instant) -> usize {
        let mut due = Vec::new();
        self.removals.retain(|pending| {
            if pending.due <= now {
                due.push(pending.clone());
                false
            } else {
                true
            }
        });

        let mut removed = 0;
        for pending in due {
            let should_remove = self
                .overlays
                .get(&pending.id)
                .map(|overlay| pending.forced || !overlay.visible)
                .unwrap_or(false);
            if !should_remove {
                continue;
            }
            if let Some(overlay) = self.overlays.shift_remove(&pending.id) {
                doc.remove(overlay.node);
                states.clear_overlay(overlay.anchor);
                removed += 1;
            }
        }
        removed
    }

    /// Tear an overlay down immediately (configuration reset path)
    pub fn remove_now(&mut self, doc: &mut Document, id: &OverlayId) {
        if let Some(overlay) = self.overlays.shift_remove(id) {
            doc.remove(overlay.node);
        }
    }

    /// Overlay owning the given node (container, option button or prompt)
    pub fn overlay_at(&self, node: ElementId) -> Option<&OverlayId> {
        self.overlays
            .values()
            .find(|overlay| {
                overlay.node == node
                    || overlay
                        .options
                        .iter()
                        .any(|o| o.button == node || o.prompt == Some(node))
            })
            .map(|overlay| &overlay.id)
    }

    /// Overlay and option text for an option button node
    pub fn option_at(&self, node: ElementId) -> Option<(OverlayId, String)> {
        for overlay in self.overlays.values() {
            if let Some(option) = overlay.options.iter().find(|o| o.button == node) {
                return Some((overlay.id.clone(), option.text.clone()));
            }
        }
        None
    }

    /// Look up a live overlay
    pub fn get(&self, id: &OverlayId) -> Option<&Overlay> {
        self.overlays.get(id)
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }
}

impl Default for OverlayManager {
    fn default() -> Self {
        Self::new()
    }
}
