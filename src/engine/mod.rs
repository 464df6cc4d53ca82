//! Transformation Engine
//!
//! Drives the transform-once operation for a single element: guard, credential
//! preflight, placeholder + spinner while the translate request is in flight,
//! then apply-or-revert on completion. The engine owns the per-element state
//! side table and the `reset_all` sweep used on configuration changes.
//!
//! The suspension point (the translate call) is made explicit by splitting the
//! operation into [`TransformEngine::begin`] and [`TransformEngine::complete`]:
//! the in-flight marker is set synchronously before control yields, and
//! completion re-validates it, so a reset that lands mid-request invalidates
//! the late result instead of racing it.

pub mod state;

pub use state::{ElementState, ProcessingState, StateStore};

use crate::config::Config;
use crate::dom::{Document, ElementId, ElementNode};
use crate::error::Result;
use crate::overlay::OverlayId;
use crate::translate::TranslateBackend;
use std::sync::Arc;

/// CSS class marking an element whose text has been transformed
pub const TRANSLATED_CLASS: &str = "translated-element";

/// CSS class of the transient loading indicator node
pub const SPINNER_CLASS: &str = "translation-spinner";

/// Neutral text shown while a translate request is outstanding
pub const PLACEHOLDER_TEXT: &str = "…";

/// Handle for a transform whose translate request is outstanding.
///
/// Produced by [`TransformEngine::begin`]; must be handed back to
/// [`TransformEngine::complete`] with the backend's result.
#[derive(Debug)]
pub struct PendingTransform {
    pub element: ElementId,
    pub original_text: String,
}

/// How a transform attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformOutcome {
    /// Element text replaced, state is `Done`
    Completed,
    /// Backend failed; element reverted to its original text and `Untouched`
    Failed,
    /// Guard or preflight rejected the element; nothing changed
    Skipped,
    /// The element was reset or removed while the request was in flight;
    /// the late result was discarded
    Stale,
}

/// The transformation engine
pub struct TransformEngine {
    states: StateStore,
    backend: Arc<dyn TranslateBackend>,
    source_language: String,
}

impl TransformEngine {
    /// Create an engine transforming from English source text
    pub fn new(backend: Arc<dyn TranslateBackend>) -> Self {
        Self {
            states: StateStore::new(),
            backend,
            source_language: "en".to_string(),
        }
    }

    /// The element state side table
    pub fn states(&self) -> &StateStore {
        &self.states
    }

    /// Mutable access to the element state side table
    pub fn states_mut(&mut self) -> &mut StateStore {
        &mut self.states
    }

    /// Whether an element has already been handed to the engine
    /// (`InFlight` or beyond)
    pub fn is_processed(&self, id: ElementId) -> bool {
        self.states.is_processed(id)
    }

    /// Start a transform: guard, preflight, mark in flight, swap in the
    /// placeholder and spinner.
    ///
    /// Returns `None` without any state change when the element is empty,
    /// already processed, dead, or the backend credential is missing. In the
    /// credential case the element stays eligible for a later retry.
    pub fn begin(&mut self, doc: &mut Document, id: ElementId) -> Option<PendingTransform> {
        if !doc.contains(id) {
            log::debug!("skipping {id}: not in document");
            return None;
        }
        let Some(text) = doc.node(id).and_then(|node| node.trimmed_text()) else {
            log::debug!("skipping {id}: no text content");
            return None;
        };
        if self.states.is_processed(id) {
            return None;
        }
        if !self.backend.is_configured() {
            log::warn!("skipping {id}: no API key configured");
            return None;
        }

        let original_text = text.to_string();
        doc.set_text(id, PLACEHOLDER_TEXT);
        doc.add_class(id, TRANSLATED_CLASS);
        let spinner = doc
            .append_child(id, ElementNode::new("div").with_class(SPINNER_CLASS))
            .ok();
        self.states.mark_in_flight(id, original_text.clone(), spinner);

        Some(PendingTransform {
            element: id,
            original_text,
        })
    }

    /// Finish a transform with the backend's result.
    ///
    /// Re-validates that the element is still in flight before mutating: a
    /// reset or removal that happened during the request turns the completion
    /// into a no-op (`Stale`). On failure the element is reverted to its
    /// original text and returns to `Untouched`.
    pub fn complete(
        &mut self,
        doc: &mut Document,
        pending: PendingTransform,
        result: Result<String>,
    ) -> TransformOutcome {
        let id = pending.element;

        if self.states.state(id) != ProcessingState::InFlight {
            log::debug!("discarding stale completion for {id}");
            return TransformOutcome::Stale;
        }
        if !doc.contains(id) {
            self.states.clear(id);
            return TransformOutcome::Stale;
        }

        if let Some(spinner) = self.states.spinner(id) {
            doc.remove(spinner);
        }

        match result {
            Ok(translated) => {
                doc.set_text(id, translated);
                self.states.mark_done(id);
                TransformOutcome::Completed
            }
            Err(err) => {
                log::error!("translation failed for {id}: {err}");
                doc.set_text(id, &pending.original_text);
                doc.remove_class(id, TRANSLATED_CLASS);
                self.states.clear(id);
                TransformOutcome::Failed
            }
        }
    }

    /// Run the whole transform-once operation for one element.
    ///
    /// Idempotent: calling it again on an element that is `InFlight` or
    /// `Done` is a no-op (`Skipped`) and issues no backend request.
    pub async fn transform(
        &mut self,
        doc: &mut Document,
        id: ElementId,
        config: &Config,
    ) -> TransformOutcome {
        let Some(pending) = self.begin(doc, id) else {
            return TransformOutcome::Skipped;
        };
        let backend = Arc::clone(&self.backend);
        let source = self.source_language.clone();
        let result = backend
            .translate(&pending.original_text, &source, &config.target_language)
            .await;
        self.complete(doc, pending, result)
    }

    /// Revert every tracked element to its original text and drop all state.
    ///
    /// Sweeps `Done` and `InFlight` elements alike: an in-flight element gets
    /// its placeholder and spinner removed here, and its eventual completion
    /// is discarded by the re-validation in [`complete`](Self::complete).
    /// Returns the overlay ids that were anchored to reset elements so the
    /// caller can tear them down.
    pub fn reset_all(&mut self, doc: &mut Document) -> Vec<OverlayId> {
        let mut orphaned_overlays = Vec::new();

        for id in self.states.tracked() {
            let Some(entry) = self.states.clear(id) else {
                continue;
            };
            if let Some(overlay) = entry.overlay {
                orphaned_overlays.push(overlay);
            }
            if !doc.contains(id) {
                continue;
            }
            if let Some(spinner) = entry.spinner {
                doc.remove(spinner);
            }
            if let Some(original) = entry.original_text {
                doc.set_text(id, original);
            }
            doc.remove_class(id, TRANSLATED_CLASS);
        }

        orphaned_overlays
    }
}
