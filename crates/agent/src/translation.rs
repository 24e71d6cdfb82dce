//! Translation around the resolution pipeline.
//!
//! [`TranslatingPipeline`] decorates any [`Resolver`]: the query is moved into
//! the pipeline's working language, resolved, and the answer is moved back
//! into the caller's language. Every translation or detection failure leaves
//! the text as it was.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::warn;

use helpdesk_core::config::TranslationConfig;
use helpdesk_core::domain::envelope::ResponseEnvelope;
use helpdesk_core::errors::TranslationError;
use helpdesk_core::services::{LanguageDetector, TranslationService};

use crate::runtime::Resolver;

#[derive(Debug, Clone)]
pub struct HttpTranslatorConfig {
    pub endpoint: String,
    pub api_key: Option<SecretString>,
    pub timeout_secs: u64,
}

impl HttpTranslatorConfig {
    /// `None` when translation is disabled or has no endpoint.
    pub fn from_translation_config(config: &TranslationConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let endpoint = config.endpoint.as_deref()?.trim_end_matches('/').to_string();
        Some(Self {
            endpoint,
            api_key: config.api_key.clone(),
            timeout_secs: config.timeout_secs,
        })
    }
}

/// Client for a LibreTranslate-compatible service (`/translate`, `/detect`).
pub struct HttpTranslator {
    client: reqwest::Client,
    config: HttpTranslatorConfig,
}

impl HttpTranslator {
    pub fn new(config: HttpTranslatorConfig) -> Result<Self, TranslationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| TranslationError::Request(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn api_key(&self) -> Option<&str> {
        self.config.api_key.as_ref().map(|key| key.expose_secret())
    }

    async fn post<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<String, TranslationError> {
        let response = self
            .client
            .post(format!("{}/{path}", self.config.endpoint))
            .json(body)
            .send()
            .await
            .map_err(|e| TranslationError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(TranslationError::Response(format!("HTTP {status}: {text}")));
        }
        response.text().await.map_err(|e| TranslationError::Request(e.to_string()))
    }
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'static str,
    target: &'a str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

#[derive(Debug, Serialize)]
struct DetectRequest<'a> {
    q: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct Detection {
    language: String,
    #[serde(default)]
    confidence: f64,
}

#[async_trait]
impl TranslationService for HttpTranslator {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String, TranslationError> {
        let body = TranslateRequest {
            q: text,
            source: "auto",
            target: target_lang,
            format: "text",
            api_key: self.api_key(),
        };
        let raw = self.post("translate", &body).await?;
        parse_translation(&raw)
    }
}

#[async_trait]
impl LanguageDetector for HttpTranslator {
    async fn detect(&self, text: &str) -> Result<String, TranslationError> {
        let raw = self.post("detect", &DetectRequest { q: text, api_key: self.api_key() }).await?;
        parse_detection(&raw)
    }
}

fn parse_translation(raw: &str) -> Result<String, TranslationError> {
    let parsed: TranslateResponse =
        serde_json::from_str(raw).map_err(|e| TranslationError::Response(e.to_string()))?;
    Ok(parsed.translated_text)
}

/// Most confident candidate language.
fn parse_detection(raw: &str) -> Result<String, TranslationError> {
    let candidates: Vec<Detection> =
        serde_json::from_str(raw).map_err(|e| TranslationError::Response(e.to_string()))?;
    candidates
        .into_iter()
        .filter(|candidate| !candidate.language.trim().is_empty())
        .max_by(|left, right| left.confidence.total_cmp(&right.confidence))
        .map(|candidate| candidate.language.trim().to_lowercase())
        .ok_or_else(|| TranslationError::Response("no language detected".to_string()))
}

pub struct TranslatingPipeline {
    inner: Arc<dyn Resolver>,
    translator: Arc<dyn TranslationService>,
    detector: Option<Arc<dyn LanguageDetector>>,
    default_language: String,
}

impl TranslatingPipeline {
    pub fn new(
        inner: Arc<dyn Resolver>,
        translator: Arc<dyn TranslationService>,
        default_language: impl Into<String>,
    ) -> Self {
        Self { inner, translator, detector: None, default_language: default_language.into() }
    }

    /// Enables source-language detection for queries.
    pub fn with_detector(mut self, detector: Arc<dyn LanguageDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    async fn detect_source(&self, text: &str) -> Option<String> {
        let detector = self.detector.as_ref()?;
        match detector.detect(text).await {
            Ok(language) => Some(language),
            Err(error) => {
                warn!(
                    event_name = "translation.detect.failed",
                    error = %error,
                    "language detection failed, assuming default language"
                );
                None
            }
        }
    }

    /// Translated text, or `None` when the call failed.
    async fn translate(&self, text: &str, target: &str) -> Option<String> {
        match self.translator.translate(text, target).await {
            Ok(translated) if !translated.trim().is_empty() => Some(translated),
            Ok(_) => None,
            Err(error) => {
                warn!(
                    event_name = "translation.translate.failed",
                    target_lang = target,
                    error = %error,
                    "translation failed, keeping original text"
                );
                None
            }
        }
    }
}

fn same_language(left: &str, right: &str) -> bool {
    left.trim().eq_ignore_ascii_case(right.trim())
}

#[async_trait]
impl Resolver for TranslatingPipeline {
    async fn resolve(
        &self,
        question: &str,
        user_id: &str,
        target_lang: Option<&str>,
    ) -> ResponseEnvelope {
        let source = self
            .detect_source(question)
            .await
            .filter(|source| !same_language(source, &self.default_language));

        let working_question = match &source {
            Some(_) => self
                .translate(question, &self.default_language)
                .await
                .unwrap_or_else(|| question.to_string()),
            None => question.to_string(),
        };

        let mut envelope = self.inner.resolve(&working_question, user_id, None).await;
        envelope.question = question.to_string();

        let reply_lang = target_lang
            .map(str::trim)
            .filter(|lang| !lang.is_empty())
            .map(str::to_string)
            .or(source);
        if let Some(reply_lang) = reply_lang {
            if !same_language(&reply_lang, &envelope.language) {
                if let Some(translated) = self.translate(&envelope.answer, &reply_lang).await {
                    envelope.set_answer(translated);
                    envelope.language = reply_lang;
                }
            }
        }

        envelope
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use helpdesk_core::config::TranslationConfig;
    use helpdesk_core::domain::envelope::ResponseEnvelope;
    use helpdesk_core::errors::TranslationError;
    use helpdesk_core::services::{LanguageDetector, TranslationService};

    use super::{
        parse_detection, parse_translation, HttpTranslatorConfig, TranslatingPipeline,
    };
    use crate::runtime::Resolver;

    /// Echoes the question it was asked, so tests can see what reached it.
    #[derive(Default)]
    struct EchoResolver {
        seen: Mutex<Vec<(String, Option<String>)>>,
    }

    #[async_trait]
    impl Resolver for EchoResolver {
        async fn resolve(
            &self,
            question: &str,
            _user_id: &str,
            target_lang: Option<&str>,
        ) -> ResponseEnvelope {
            self.seen
                .lock()
                .expect("seen")
                .push((question.to_string(), target_lang.map(str::to_string)));
            ResponseEnvelope::new(question, format!("answer to {question}"), "en")
        }
    }

    /// Prefixes text with the target language.
    #[derive(Default)]
    struct TaggingTranslator {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TranslationService for TaggingTranslator {
        async fn translate(&self, text: &str, target: &str) -> Result<String, TranslationError> {
            self.calls.lock().expect("calls").push(target.to_string());
            Ok(format!("[{target}] {text}"))
        }
    }

    struct BrokenTranslator;

    #[async_trait]
    impl TranslationService for BrokenTranslator {
        async fn translate(&self, _text: &str, _target: &str) -> Result<String, TranslationError> {
            Err(TranslationError::Request("connection refused".to_string()))
        }
    }

    /// Reports the same language for every input.
    struct FixedLanguageDetector(&'static str);

    impl FixedLanguageDetector {
        fn new(language: &'static str) -> Self {
            Self(language)
        }
    }

    #[async_trait]
    impl LanguageDetector for FixedLanguageDetector {
        async fn detect(&self, _text: &str) -> Result<String, TranslationError> {
            Ok(self.0.to_string())
        }
    }

    struct BrokenDetector;

    #[async_trait]
    impl LanguageDetector for BrokenDetector {
        async fn detect(&self, _text: &str) -> Result<String, TranslationError> {
            Err(TranslationError::Response("no language detected".to_string()))
        }
    }

    #[tokio::test]
    async fn explicit_target_translates_only_the_answer() {
        let inner = Arc::new(EchoResolver::default());
        let translator = Arc::new(TaggingTranslator::default());
        let pipeline = TranslatingPipeline::new(inner.clone(), translator.clone(), "en");

        let envelope = pipeline.resolve("Where is SH123?", "u1", Some("es")).await;

        assert_eq!(envelope.question, "Where is SH123?");
        assert_eq!(envelope.answer, "[es] answer to Where is SH123?");
        assert_eq!(envelope.language, "es");
        assert_eq!(
            inner.seen.lock().expect("seen").clone(),
            vec![("Where is SH123?".to_string(), None)]
        );
        assert_eq!(translator.calls.lock().expect("calls").clone(), vec!["es".to_string()]);
    }

    #[tokio::test]
    async fn no_target_and_no_detection_leaves_answer_untranslated() {
        let translator = Arc::new(TaggingTranslator::default());
        let pipeline =
            TranslatingPipeline::new(Arc::new(EchoResolver::default()), translator.clone(), "en");

        let envelope = pipeline.resolve("hello", "u1", None).await;

        assert_eq!(envelope.answer, "answer to hello");
        assert_eq!(envelope.language, "en");
        assert!(translator.calls.lock().expect("calls").is_empty());
    }

    #[tokio::test]
    async fn detected_source_round_trips_through_default_language() {
        let inner = Arc::new(EchoResolver::default());
        let translator = Arc::new(TaggingTranslator::default());
        let pipeline = TranslatingPipeline::new(inner.clone(), translator.clone(), "en")
            .with_detector(Arc::new(FixedLanguageDetector::new("fr")));

        let envelope = pipeline.resolve("Où est SH123 ?", "u1", None).await;

        assert_eq!(inner.seen.lock().expect("seen")[0].0, "[en] Où est SH123 ?");
        assert_eq!(envelope.question, "Où est SH123 ?");
        assert_eq!(envelope.answer, "[fr] answer to [en] Où est SH123 ?");
        assert_eq!(envelope.language, "fr");
    }

    #[tokio::test]
    async fn matching_languages_skip_translation() {
        let translator = Arc::new(TaggingTranslator::default());
        let pipeline =
            TranslatingPipeline::new(Arc::new(EchoResolver::default()), translator.clone(), "en")
                .with_detector(Arc::new(FixedLanguageDetector::new("EN")));

        let envelope = pipeline.resolve("hello", "u1", Some("en")).await;

        assert_eq!(envelope.answer, "answer to hello");
        assert!(translator.calls.lock().expect("calls").is_empty());
    }

    #[tokio::test]
    async fn failures_return_original_text() {
        let pipeline = TranslatingPipeline::new(
            Arc::new(EchoResolver::default()),
            Arc::new(BrokenTranslator),
            "en",
        )
        .with_detector(Arc::new(FixedLanguageDetector::new("de")));

        let envelope = pipeline.resolve("Wo ist SH123?", "u1", Some("de")).await;
        assert_eq!(envelope.answer, "answer to Wo ist SH123?");
        assert_eq!(envelope.language, "en");

        let pipeline = TranslatingPipeline::new(
            Arc::new(EchoResolver::default()),
            Arc::new(TaggingTranslator::default()),
            "en",
        )
        .with_detector(Arc::new(BrokenDetector));
        let envelope = pipeline.resolve("hello", "u1", None).await;
        assert_eq!(envelope.answer, "answer to hello");
    }

    #[test]
    fn parses_service_responses() {
        assert_eq!(
            parse_translation(r#"{"translatedText":"Hola"}"#).expect("translation"),
            "Hola"
        );
        assert!(parse_translation("{}").is_err());

        let detected = parse_detection(
            r#"[{"language":"fr","confidence":40.0},{"language":"ES","confidence":91.5}]"#,
        )
        .expect("detection");
        assert_eq!(detected, "es");
        assert!(parse_detection("[]").is_err());
    }

    #[test]
    fn config_requires_enabled_endpoint() {
        let mut config = TranslationConfig {
            enabled: false,
            endpoint: Some("http://localhost:5000/".to_string()),
            api_key: None,
            timeout_secs: 5,
        };
        assert!(HttpTranslatorConfig::from_translation_config(&config).is_none());

        config.enabled = true;
        let http = HttpTranslatorConfig::from_translation_config(&config).expect("config");
        assert_eq!(http.endpoint, "http://localhost:5000");
    }
}
