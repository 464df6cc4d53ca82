use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// CSS class applied to tooltip overlays
pub const TOOLTIP_CLASS: &str = "original-text-tooltip";

/// Per-tag enablement flags as persisted by the popup UI.
///
/// Mirrors the `elementSettings` storage key: one checkbox per supported tag
/// plus the quiz-mode toggle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementSettings {
    pub h1: bool,
    pub h2: bool,
    pub h3: bool,
    pub p: bool,
    pub quiz_mode: bool,
}

impl Default for ElementSettings {
    fn default() -> Self {
        Self {
            h1: true,
            h2: false,
            h3: false,
            p: false,
            quiz_mode: false,
        }
    }
}

impl ElementSettings {
    /// Tags enabled for transformation, in a fixed order
    pub fn enabled_tags(&self) -> Vec<String> {
        [("h1", self.h1), ("h2", self.h2), ("h3", self.h3), ("p", self.p)]
            .iter()
            .filter(|(_, enabled)| *enabled)
            .map(|(tag, _)| tag.to_string())
            .collect()
    }
}

/// Immutable configuration snapshot driving one observation cycle.
///
/// The session controller swaps the whole snapshot on a settings change; it
/// is never mutated while the observer iterates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Tag names eligible for transformation (e.g., "h1", "p")
    pub target_tags: Vec<String>,

    /// CSS class for the hover tooltip overlay
    pub tooltip_class: String,

    /// Language code translations are produced in (e.g., "es")
    pub target_language: String,

    /// Whether hover overlays render as a quiz instead of a plain tooltip
    pub quiz_mode: bool,
}

impl Config {
    /// Build a snapshot from persisted settings
    pub fn from_settings(settings: &ElementSettings, target_language: impl Into<String>) -> Self {
        Self {
            target_tags: settings.enabled_tags(),
            tooltip_class: TOOLTIP_CLASS.to_string(),
            target_language: target_language.into(),
            quiz_mode: settings.quiz_mode,
        }
    }

    /// Load a snapshot from a settings store
    pub fn load(store: &dyn SettingsStore) -> Self {
        Self::from_settings(&store.element_settings(), store.target_language())
    }

    /// Whether a tag name is targeted (case-insensitive, as in HTML)
    pub fn targets_tag(&self, tag: &str) -> bool {
        self.target_tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// Persisted key/value settings the pipeline consumes.
///
/// The popup UI writes these; the session controller reads them on init and
/// re-reads them when the change notification fires.
pub trait SettingsStore {
    /// Per-tag enablement flags (`elementSettings`)
    fn element_settings(&self) -> ElementSettings;

    /// Target language code (`targetLanguage`)
    fn target_language(&self) -> String;

    /// DeepL API key (`deeplApiKey`); `None` when not configured
    fn api_key(&self) -> Option<String>;

    /// Hostnames the pipeline must not touch (`excludedDomains`)
    fn excluded_domains(&self) -> Vec<String>;

    /// Change notification. The receiver is marked changed whenever any
    /// setting is written.
    fn subscribe(&self) -> watch::Receiver<()>;
}

/// In-memory settings store.
///
/// Stands in for browser extension storage in tests and non-extension hosts.
#[derive(Debug)]
pub struct MemorySettings {
    element_settings: std::sync::Mutex<ElementSettings>,
    target_language: std::sync::Mutex<String>,
    api_key: std::sync::Mutex<Option<String>>,
    excluded_domains: std::sync::Mutex<Vec<String>>,
    changed: watch::Sender<()>,
}

impl MemorySettings {
    pub fn new() -> Self {
        let (changed, _) = watch::channel(());
        Self {
            element_settings: std::sync::Mutex::new(ElementSettings::default()),
            target_language: std::sync::Mutex::new("es".to_string()),
            api_key: std::sync::Mutex::new(None),
            excluded_domains: std::sync::Mutex::new(Vec::new()),
            changed,
        }
    }

    pub fn set_element_settings(&self, settings: ElementSettings) {
        if let Ok(mut guard) = self.element_settings.lock() {
            *guard = settings;
        }
        self.notify();
    }

    pub fn set_target_language(&self, language: impl Into<String>) {
        if let Ok(mut guard) = self.target_language.lock() {
            *guard = language.into();
        }
        self.notify();
    }

    pub fn set_api_key(&self, key: impl Into<String>) {
        if let Ok(mut guard) = self.api_key.lock() {
            *guard = Some(key.into());
        }
        self.notify();
    }

    pub fn set_excluded_domains(&self, domains: Vec<String>) {
        if let Ok(mut guard) = self.excluded_domains.lock() {
            *guard = domains;
        }
        self.notify();
    }

    fn notify(&self) {
        self.changed.send_replace(());
    }
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore for MemorySettings {
    fn element_settings(&self) -> ElementSettings {
        self.element_settings
            .lock()
            .map(|guard| *guard)
            .unwrap_or_default()
    }

    fn target_language(&self) -> String {
        self.target_language
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_else(|_| "es".to_string())
    }

    fn api_key(&self) -> Option<String> {
        self.api_key
            .lock()
            .map(|guard| guard.clone())
            .ok()
            .flatten()
            .filter(|key| !key.is_empty())
    }

    fn excluded_domains(&self) -> Vec<String> {
        self.excluded_domains
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    fn subscribe(&self) -> watch::Receiver<()> {
        self.changed.subscribe()
    }
}

/// Whether the page at `page_url` is on the exclusion list.
///
/// Matches the hostname exactly (case-insensitive); unparsable URLs are
/// never excluded.
pub fn is_excluded_domain(page_url: &str, excluded: &[String]) -> bool {
    let Ok(parsed) = url::Url::parse(page_url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    excluded.iter().any(|domain| domain.eq_ignore_ascii_case(host))
}
