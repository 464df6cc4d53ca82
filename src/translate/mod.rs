//! Translation Backend
//!
//! The backend seam of the pipeline: a capability trait the engine calls for
//! each transform, a deterministic stand-in for tests, and the DeepL HTTP
//! client behind the `deepl` feature. Backends classify their failures as
//! auth, quota or transport so callers can tell a bad key from a flaky
//! network.

pub mod cache;
#[cfg(feature = "deepl")]
pub mod deepl;

pub use cache::TranslationCache;
#[cfg(feature = "deepl")]
pub use deepl::DeepLBackend;

use crate::error::Result;
use async_trait::async_trait;

/// A service that rewrites text from a source to a target language.
///
/// `is_configured` is the synchronous credential preflight: the engine checks
/// it before mutating any element, so a missing key never leaves placeholder
/// residue behind.
#[async_trait]
pub trait TranslateBackend: Send + Sync {
    /// Whether the backend holds the credentials it needs
    fn is_configured(&self) -> bool;

    /// Translate one text. Language codes follow the backend's own
    /// conventions (DeepL uses uppercase ISO codes internally).
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String>;
}

/// Deterministic offline backend: uppercases the input.
///
/// Always configured; used in tests and doctests where a network backend
/// would be noise.
#[derive(Debug, Clone, Copy, Default)]
pub struct UppercaseBackend;

#[async_trait]
impl TranslateBackend for UppercaseBackend {
    fn is_configured(&self) -> bool {
        true
    }

    async fn translate(&self, text: &str, _source_lang: &str, _target_lang: &str) -> Result<String> {
        Ok(text.to_uppercase())
    }
}
