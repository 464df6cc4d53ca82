use std::collections::HashSet;

/// Texts the user has already revealed during this page session.
///
/// Keyed by the text string itself, so a heading revealed once renders
/// pre-revealed in every later overlay showing the same text. Owned by the
/// session controller and cleared on navigation; never a module-level
/// singleton.
#[derive(Debug, Default)]
pub struct RevealedTexts {
    texts: HashSet<String>,
}

impl RevealedTexts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a text has been revealed this session
    pub fn is_revealed(&self, text: &str) -> bool {
        self.texts.contains(text)
    }

    /// Record a text as revealed
    pub fn reveal(&mut self, text: impl Into<String>) {
        self.texts.insert(text.into());
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Forget everything (page navigation)
    pub fn clear(&mut self) {
        self.texts.clear();
    }
}

/// Quiz option texts for an original string.
///
/// The shipped behavior is a single option, the original text itself, which
/// turns the quiz into a click-to-reveal rather than a multiple-choice test.
pub fn variants(original_text: &str) -> Vec<String> {
    vec![original_text.to_string()]
}
