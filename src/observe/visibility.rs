use crate::dom::{Document, ElementId};
use indexmap::IndexSet;

/// Distance outside the viewport at which an element already counts as
/// approaching, so work starts slightly before it scrolls into view
pub const VIEWPORT_MARGIN: f64 = 50.0;

/// Fraction of an element's area that must be inside the (expanded) viewport
/// before it fires
pub const VISIBILITY_THRESHOLD: f64 = 0.1;

/// Capability interface over viewport-intersection watching.
///
/// Registered elements fire exactly once: an implementation removes an
/// element from its watch set when it reports it as intersecting. In a
/// browser host this wraps `IntersectionObserver`; [`ManualWatch`] is the
/// hand-driven stand-in for tests.
pub trait VisibilityWatch {
    /// Register an element. Re-registering a watched element is a no-op.
    fn observe(&mut self, id: ElementId);

    /// Unregister an element without firing
    fn unobserve(&mut self, id: ElementId);

    /// Whether an element is currently registered
    fn is_watching(&self, id: ElementId) -> bool;

    /// Number of registered elements
    fn watched_count(&self) -> usize;

    /// Elements that became intersecting since the last poll, unregistered
    /// as they are returned (fire-once). Dead elements are silently dropped.
    fn poll_intersecting(&mut self, doc: &Document) -> Vec<ElementId>;

    /// Unregister everything
    fn disconnect(&mut self);
}

/// Geometry-driven visibility watch.
///
/// An element fires when at least [`VISIBILITY_THRESHOLD`] of its area lies
/// inside the viewport expanded by [`VIEWPORT_MARGIN`]. Elements without
/// layout geometry never fire and stay registered.
#[derive(Debug)]
pub struct ViewportWatch {
    watched: IndexSet<ElementId>,
    margin: f64,
    threshold: f64,
}

impl ViewportWatch {
    pub fn new() -> Self {
        Self {
            watched: IndexSet::new(),
            margin: VIEWPORT_MARGIN,
            threshold: VISIBILITY_THRESHOLD,
        }
    }

    /// Builder method: override the viewport margin
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    /// Builder method: override the visibility threshold
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }
}

impl Default for ViewportWatch {
    fn default() -> Self {
        Self::new()
    }
}

impl VisibilityWatch for ViewportWatch {
    fn observe(&mut self, id: ElementId) {
        self.watched.insert(id);
    }

    fn unobserve(&mut self, id: ElementId) {
        self.watched.shift_remove(&id);
    }

    fn is_watching(&self, id: ElementId) -> bool {
        self.watched.contains(&id)
    }

    fn watched_count(&self) -> usize {
        self.watched.len()
    }

    fn poll_intersecting(&mut self, doc: &Document) -> Vec<ElementId> {
        let visible_rect = doc.viewport().rect().expanded(self.margin);
        let mut fired = Vec::new();

        self.watched.retain(|&id| {
            if !doc.contains(id) {
                return false;
            }
            let Some(bbox) = doc.bounding_box(id) else {
                return true;
            };
            if bbox.visible_fraction(&visible_rect) >= self.threshold {
                fired.push(id);
                false
            } else {
                true
            }
        });

        fired
    }

    fn disconnect(&mut self) {
        self.watched.clear();
    }
}

/// Hand-driven visibility watch for tests: elements fire only when marked
/// intersecting explicitly.
#[derive(Debug, Default)]
pub struct ManualWatch {
    watched: IndexSet<ElementId>,
    intersecting: IndexSet<ElementId>,
}

impl ManualWatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an intersection notification for a watched element
    pub fn mark_intersecting(&mut self, id: ElementId) {
        self.intersecting.insert(id);
    }
}

impl VisibilityWatch for ManualWatch {
    fn observe(&mut self, id: ElementId) {
        self.watched.insert(id);
    }

    fn unobserve(&mut self, id: ElementId) {
        self.watched.shift_remove(&id);
        self.intersecting.shift_remove(&id);
    }

    fn is_watching(&self, id: ElementId) -> bool {
        self.watched.contains(&id)
    }

    fn watched_count(&self) -> usize {
        self.watched.len()
    }

    fn poll_intersecting(&mut self, doc: &Document) -> Vec<ElementId> {
        let fired: Vec<ElementId> = self
            .intersecting
            .drain(..)
            .filter(|id| self.watched.contains(id) && doc.contains(*id))
            .collect();
        for id in &fired {
            self.watched.shift_remove(id);
        }
        fired
    }

    fn disconnect(&mut self) {
        self.watched.clear();
        self.intersecting.clear();
    }
}
