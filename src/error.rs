use thiserror::Error;

/// Classification of translation backend failures.
///
/// The pipeline treats every kind identically (the element is reverted and
/// stays eligible for retry), but callers inspecting logs or errors can tell
/// an expired key from a flaky network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// Authentication failure (bad or revoked API key)
    Auth,
    /// Quota exhausted (rate limit or character budget)
    Quota,
    /// Network or protocol failure
    Transport,
}

impl std::fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendErrorKind::Auth => write!(f, "auth"),
            BackendErrorKind::Quota => write!(f, "quota"),
            BackendErrorKind::Transport => write!(f, "transport"),
        }
    }
}

/// Errors produced by the swapsage pipeline
#[derive(Debug, Error)]
pub enum SwapSageError {
    /// No API key configured. Preflight-checked before a transform starts;
    /// the element is skipped, not marked processed.
    #[error("no API key configured")]
    MissingCredential,

    /// The translation backend failed. The affected element is reverted to
    /// its original text and returns to the untouched state.
    #[error("translation backend {kind} failure: {message}")]
    Backend {
        kind: BackendErrorKind,
        message: String,
    },

    /// Element has no text content to transform
    #[error("element has no text content")]
    MalformedElement,

    /// Element handle does not refer to a live node in the document
    #[error("element {0} not found in document")]
    ElementNotFound(String),

    /// Settings store failure
    #[error("settings store error: {0}")]
    Settings(String),
}

impl SwapSageError {
    /// Shorthand for a backend failure of the given kind
    pub fn backend(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        SwapSageError::Backend {
            kind,
            message: message.into(),
        }
    }
}

/// Result type alias for swapsage operations
pub type Result<T> = std::result::Result<T, SwapSageError>;
