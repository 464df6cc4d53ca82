use crate::dom::{Document, ElementId};
use crate::overlay::OverlayId;
use indexmap::IndexMap;

/// Per-element transform lifecycle state.
///
/// `InFlight` is strictly transient: it resolves to `Done` on success or back
/// to `Untouched` on failure, so a reverted element stays eligible for retry.
/// `Errored` is reserved for hosts that want to pin a terminal failure; the
/// engine's own revert path never enters it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessingState {
    /// Never handed to the engine, or reverted after a failure/reset
    #[default]
    Untouched,
    /// A transform request is outstanding for this element
    InFlight,
    /// Visible text has been replaced; original text is retained
    Done,
    /// Terminal failure (not produced by the engine itself)
    Errored,
}

/// Everything the pipeline remembers about one element
#[derive(Debug, Clone, Default)]
pub struct ElementState {
    pub state: ProcessingState,
    /// Trimmed pre-transform text, recorded from `InFlight` onward
    pub original_text: Option<String>,
    /// Loading indicator node attached while `InFlight`
    pub spinner: Option<ElementId>,
    /// Overlay currently anchored to this element, if any
    pub overlay: Option<OverlayId>,
}

/// Side table mapping element identity to transform state.
///
/// Replaces DOM attribute tagging: the document never carries pipeline
/// markers, and entries for removed elements are pruned lazily (element ids
/// are never reused, so stale entries cannot alias live nodes).
#[derive(Debug, Default)]
pub struct StateStore {
    entries: IndexMap<ElementId, ElementState>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current processing state; absent entries read as `Untouched`
    pub fn state(&self, id: ElementId) -> ProcessingState {
        self.entries
            .get(&id)
            .map(|entry| entry.state)
            .unwrap_or_default()
    }

    /// Whether the element is anything other than `Untouched`
    pub fn is_processed(&self, id: ElementId) -> bool {
        self.state(id) != ProcessingState::Untouched
    }

    /// Recorded pre-transform text
    pub fn original_text(&self, id: ElementId) -> Option<&str> {
        self.entries
            .get(&id)
            .and_then(|entry| entry.original_text.as_deref())
    }

    /// Loading indicator node for an in-flight element
    pub fn spinner(&self, id: ElementId) -> Option<ElementId> {
        self.entries.get(&id).and_then(|entry| entry.spinner)
    }

    /// Begin tracking an in-flight transform
    pub fn mark_in_flight(&mut self, id: ElementId, original_text: String, spinner: Option<ElementId>) {
        let entry = self.entries.entry(id).or_default();
        entry.state = ProcessingState::InFlight;
        entry.original_text = Some(original_text);
        entry.spinner = spinner;
    }

    /// Flip an in-flight element to `Done`, detaching its spinner handle.
    /// Returns false if the element was not in flight.
    pub fn mark_done(&mut self, id: ElementId) -> bool {
        match self.entries.get_mut(&id) {
            Some(entry) if entry.state == ProcessingState::InFlight => {
                entry.state = ProcessingState::Done;
                entry.spinner = None;
                true
            }
            _ => false,
        }
    }

    /// Drop all state for an element, returning the final entry. The element
    /// reads as `Untouched` afterwards.
    pub fn clear(&mut self, id: ElementId) -> Option<ElementState> {
        self.entries.shift_remove(&id)
    }

    /// Record the overlay anchored to an element
    pub fn set_overlay(&mut self, id: ElementId, overlay: OverlayId) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.overlay = Some(overlay);
        }
    }

    /// Overlay currently anchored to an element
    pub fn overlay(&self, id: ElementId) -> Option<&OverlayId> {
        self.entries.get(&id).and_then(|entry| entry.overlay.as_ref())
    }

    /// Detach the overlay link from an element
    pub fn clear_overlay(&mut self, id: ElementId) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.overlay = None;
        }
    }

    /// Ids of all tracked elements, in tracking order
    pub fn tracked(&self) -> Vec<ElementId> {
        self.entries.keys().copied().collect()
    }

    /// Ids of all `Done` elements
    pub fn done(&self) -> Vec<ElementId> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.state == ProcessingState::Done)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Drop entries whose element no longer lives in the document
    pub fn prune(&mut self, doc: &Document) {
        self.entries.retain(|id, _| doc.contains(*id));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
