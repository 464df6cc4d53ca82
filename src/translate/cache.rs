use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Default entry lifetime
pub const CACHE_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    text: String,
    source: String,
    target: String,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    translated: String,
    inserted_at: Instant,
}

/// In-memory translation cache with lazy expiry.
///
/// Entries older than the max age are dropped on lookup rather than by a
/// background sweep, so a hit is always fresh but stale entries may linger
/// until touched.
#[derive(Debug)]
pub struct TranslationCache {
    entries: HashMap<CacheKey, CacheEntry>,
    max_age: Duration,
}

impl TranslationCache {
    pub fn new() -> Self {
        Self::with_max_age(CACHE_MAX_AGE)
    }

    pub fn with_max_age(max_age: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            max_age,
        }
    }

    /// Look up a cached translation, expiring the entry if it is too old
    pub fn lookup(&mut self, text: &str, source: &str, target: &str, now: Instant) -> Option<String> {
        let key = CacheKey {
            text: text.to_string(),
            source: source.to_string(),
            target: target.to_string(),
        };
        let entry = self.entries.get(&key)?;
        if now.saturating_duration_since(entry.inserted_at) >= self.max_age {
            self.entries.remove(&key);
            return None;
        }
        Some(entry.translated.clone())
    }

    /// Record a translation
    pub fn insert(&mut self, text: &str, source: &str, target: &str, translated: String, now: Instant) {
        let key = CacheKey {
            text: text.to_string(),
            source: source.to_string(),
            target: target.to_string(),
        };
        self.entries.insert(
            key,
            CacheEntry {
                translated,
                inserted_at: now,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new()
    }
}
