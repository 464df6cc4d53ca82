use crate::error::{BackendErrorKind, Result, SwapSageError};
use crate::translate::{TranslateBackend, TranslationCache};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tokio::sync::Mutex;

/// DeepL free-tier endpoint
pub const DEEPL_FREE_ENDPOINT: &str = "https://api-free.deepl.com/v2/translate";

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    text: Vec<&'a str>,
    source_lang: String,
    target_lang: String,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
struct Translation {
    text: String,
}

/// Map a DeepL HTTP status to a backend error kind.
///
/// 401/403 are credential problems, 429 and 456 (character limit reached) are
/// quota, everything else is transport.
fn error_kind_for_status(status: u16) -> BackendErrorKind {
    match status {
        401 | 403 => BackendErrorKind::Auth,
        429 | 456 => BackendErrorKind::Quota,
        _ => BackendErrorKind::Transport,
    }
}

/// DeepL HTTP backend with an in-memory response cache.
///
/// Identical (text, source, target) requests within the cache lifetime are
/// served locally and issue no HTTP call.
pub struct DeepLBackend {
    api_key: String,
    endpoint: String,
    client: reqwest::Client,
    cache: Mutex<TranslationCache>,
}

impl DeepLBackend {
    /// Create a backend against the free-tier endpoint
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_endpoint(api_key, DEEPL_FREE_ENDPOINT)
    }

    /// Create a backend against a custom endpoint (pro tier, test server)
    pub fn with_endpoint(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
            cache: Mutex::new(TranslationCache::new()),
        }
    }

    async fn request(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String> {
        let body = TranslateRequest {
            text: vec![text],
            source_lang: source_lang.to_uppercase(),
            target_lang: target_lang.to_uppercase(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|err| SwapSageError::backend(BackendErrorKind::Transport, err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let kind = error_kind_for_status(status.as_u16());
            let message = response.text().await.unwrap_or_else(|_| status.to_string());
            return Err(SwapSageError::backend(kind, message));
        }

        let parsed: TranslateResponse = response
            .json()
            .await
            .map_err(|err| SwapSageError::backend(BackendErrorKind::Transport, err.to_string()))?;

        parsed
            .translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .ok_or_else(|| {
                SwapSageError::backend(BackendErrorKind::Transport, "empty translations array")
            })
    }
}

#[async_trait]
impl TranslateBackend for DeepLBackend {
    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String> {
        if !self.is_configured() {
            return Err(SwapSageError::MissingCredential);
        }

        let now = Instant::now();
        {
            let mut cache = self.cache.lock().await;
            if let Some(hit) = cache.lookup(text, source_lang, target_lang, now) {
                log::debug!("translation cache hit for {:?}", text);
                return Ok(hit);
            }
        }

        let translated = self.request(text, source_lang, target_lang).await?;

        self.cache
            .lock()
            .await
            .insert(text, source_lang, target_lang, translated.clone(), Instant::now());
        Ok(translated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(error_kind_for_status(401), BackendErrorKind::Auth);
        assert_eq!(error_kind_for_status(403), BackendErrorKind::Auth);
        assert_eq!(error_kind_for_status(429), BackendErrorKind::Quota);
        assert_eq!(error_kind_for_status(456), BackendErrorKind::Quota);
        assert_eq!(error_kind_for_status(500), BackendErrorKind::Transport);
        assert_eq!(error_kind_for_status(503), BackendErrorKind::Transport);
    }

    #[test]
    fn test_empty_key_is_unconfigured() {
        assert!(!DeepLBackend::new("").is_configured());
        assert!(DeepLBackend::new("k").is_configured());
    }

    #[tokio::test]
    async fn test_unconfigured_translate_fails_fast() {
        let backend = DeepLBackend::new("");
        let err = backend.translate("Hello", "en", "es").await.unwrap_err();
        assert!(matches!(err, SwapSageError::MissingCredential));
    }

    #[test]
    fn test_request_serialization() {
        let body = TranslateRequest {
            text: vec!["Hello"],
            source_lang: "EN".to_string(),
            target_lang: "ES".to_string(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["text"][0], "Hello");
        assert_eq!(json["source_lang"], "EN");
        assert_eq!(json["target_lang"], "ES");
    }

    #[test]
    fn test_response_deserialization() {
        let json = r#"{"translations":[{"detected_source_language":"EN","text":"Hola"}]}"#;
        let parsed: TranslateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.translations[0].text, "Hola");
    }
}
