//! In-place page text transformation pipeline.
//!
//! swapsage discovers target elements on a page, replaces their visible text
//! through a pluggable translation backend exactly once per element, and
//! offers the original text back through hover tooltips or click-to-reveal
//! quizzes. The page itself stays authoritative: all pipeline state lives in
//! side tables keyed by element identity, and a settings change reverts every
//! element before re-applying under the new configuration.
//!
//! The pipeline is host-agnostic: [`Document`] models the page, the
//! [`VisibilityWatch`](observe::VisibilityWatch) trait abstracts viewport
//! intersection, and [`SettingsStore`] abstracts persisted settings, so the
//! whole flow runs identically under a browser host or in a test.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use swapsage::{Document, ElementNode, MemorySettings, Session, UppercaseBackend};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let mut doc = Document::new();
//! let heading = doc
//!     .append_child(
//!         doc.root(),
//!         ElementNode::new("h1")
//!             .with_text("hello")
//!             .with_bounding_box(0.0, 100.0, 300.0, 40.0),
//!     )
//!     .unwrap();
//!
//! let store = MemorySettings::new();
//! store.set_api_key("demo-key");
//!
//! let mut session = Session::init(
//!     &doc,
//!     &store,
//!     "https://example.com/",
//!     Arc::new(UppercaseBackend),
//! );
//! session.poll(&mut doc).await;
//!
//! assert_eq!(doc.text(heading), Some("HELLO"));
//! # });
//! ```

pub mod config;
pub mod dom;
pub mod engine;
pub mod error;
pub mod observe;
pub mod overlay;
pub mod session;
pub mod translate;

pub use config::{Config, ElementSettings, MemorySettings, SettingsStore};
pub use dom::{BoundingBox, Document, ElementId, ElementNode, Viewport};
pub use engine::{ProcessingState, StateStore, TransformEngine, TransformOutcome};
pub use error::{BackendErrorKind, Result, SwapSageError};
pub use observe::{ElementObserver, ManualWatch, ViewportWatch, VisibilityWatch};
pub use overlay::{OverlayId, OverlayManager, RevealedTexts};
pub use session::Session;
#[cfg(feature = "deepl")]
pub use translate::DeepLBackend;
pub use translate::{TranslateBackend, TranslationCache, UppercaseBackend};
