//! Generative fallback under a deadline.
//!
//! The provider chain runs on its own task. When the deadline passes first the
//! join handle is dropped: the task keeps running detached and whatever it
//! produces later is discarded.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::llm::CompletionService;

pub const TIMEOUT_MESSAGE: &str = "Sorry, the bot is taking too long to reply. Please try again.";
pub const ERROR_MESSAGE: &str = "Sorry, there was an error with the AI response.";
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(8);

#[derive(Debug, Error)]
pub enum DispatchFailure {
    #[error("completion did not finish within {0:?}")]
    DeadlineExceeded(Duration),
    #[error("all completion providers failed: {0}")]
    ProvidersFailed(String),
    #[error("completion task aborted: {0}")]
    TaskAborted(String),
}

impl DispatchFailure {
    /// Fixed text shown to the user in place of a completion.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::DeadlineExceeded(_) => TIMEOUT_MESSAGE,
            Self::ProvidersFailed(_) | Self::TaskAborted(_) => ERROR_MESSAGE,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Responder {
    Primary,
    Secondary,
}

impl Responder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FallbackAnswer {
    pub text: String,
    pub responder: Responder,
}

#[derive(Clone)]
pub struct FallbackDispatcher {
    primary: Option<Arc<dyn CompletionService>>,
    secondary: Arc<dyn CompletionService>,
    system_instruction: String,
    deadline: Duration,
}

impl FallbackDispatcher {
    pub fn new(
        primary: Option<Arc<dyn CompletionService>>,
        secondary: Arc<dyn CompletionService>,
        system_instruction: impl Into<String>,
    ) -> Self {
        Self {
            primary,
            secondary,
            system_instruction: system_instruction.into(),
            deadline: DEFAULT_DEADLINE,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    fn instruction_for(&self, language_hint: Option<&str>) -> String {
        match language_hint.map(str::trim).filter(|lang| !lang.is_empty()) {
            Some(lang) => format!("{} Respond in {lang}.", self.system_instruction.trim_end()),
            None => self.system_instruction.clone(),
        }
    }

    pub async fn dispatch(
        &self,
        prompt: &str,
        language_hint: Option<&str>,
    ) -> Result<FallbackAnswer, DispatchFailure> {
        let primary = self.primary.clone();
        let secondary = Arc::clone(&self.secondary);
        let prompt = prompt.to_string();
        let instruction = self.instruction_for(language_hint);

        let task = tokio::spawn(async move {
            run_chain(primary.as_deref(), secondary.as_ref(), &prompt, &instruction).await
        });

        match tokio::time::timeout(self.deadline, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(DispatchFailure::TaskAborted(join_error.to_string())),
            Err(_) => Err(DispatchFailure::DeadlineExceeded(self.deadline)),
        }
    }

    /// Completion text, or the fixed timeout/error message. Never fails.
    pub async fn resolve_via_ai(&self, prompt: &str, language_hint: Option<&str>) -> String {
        match self.dispatch(prompt, language_hint).await {
            Ok(answer) => {
                info!(
                    event_name = "pipeline.fallback.answered",
                    responder = answer.responder.as_str(),
                    "fallback produced an answer"
                );
                answer.text
            }
            Err(failure) => {
                warn!(
                    event_name = "pipeline.fallback.failed",
                    error = %failure,
                    "fallback degraded to a fixed message"
                );
                failure.user_message().to_string()
            }
        }
    }
}

async fn run_chain(
    primary: Option<&dyn CompletionService>,
    secondary: &dyn CompletionService,
    prompt: &str,
    instruction: &str,
) -> Result<FallbackAnswer, DispatchFailure> {
    if let Some(primary) = primary {
        match primary.complete(prompt, instruction).await {
            Ok(text) if !text.trim().is_empty() => {
                return Ok(FallbackAnswer { text, responder: Responder::Primary });
            }
            Ok(_) => {
                warn!(event_name = "pipeline.fallback.primary_empty", "primary returned no text");
            }
            Err(error) => {
                warn!(
                    event_name = "pipeline.fallback.primary_failed",
                    error = %error,
                    "primary provider failed, using secondary"
                );
            }
        }
    }

    match secondary.complete(prompt, instruction).await {
        Ok(text) => Ok(FallbackAnswer { text, responder: Responder::Secondary }),
        Err(error) => Err(DispatchFailure::ProvidersFailed(error.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::{
        FallbackDispatcher, Responder, DEFAULT_DEADLINE, ERROR_MESSAGE, TIMEOUT_MESSAGE,
    };
    use crate::llm::{CannedResponder, CompletionService, ProviderError};

    struct FailingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionService for FailingProvider {
        async fn complete(&self, _prompt: &str, _system: &str) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ProviderError::Http("connection refused".to_string()))
        }
    }

    struct SlowProvider {
        delay: Duration,
        finished: Arc<AtomicBool>,
    }

    #[async_trait]
    impl CompletionService for SlowProvider {
        async fn complete(&self, _prompt: &str, _system: &str) -> Result<String, ProviderError> {
            tokio::time::sleep(self.delay).await;
            self.finished.store(true, Ordering::SeqCst);
            Ok("late answer".to_string())
        }
    }

    #[derive(Default)]
    struct RecordingProvider {
        instructions: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CompletionService for RecordingProvider {
        async fn complete(&self, _prompt: &str, system: &str) -> Result<String, ProviderError> {
            self.instructions.lock().expect("instructions").push(system.to_string());
            Ok("recorded".to_string())
        }
    }

    struct PanickingProvider;

    #[async_trait]
    impl CompletionService for PanickingProvider {
        async fn complete(&self, _prompt: &str, _system: &str) -> Result<String, ProviderError> {
            panic!("provider bug");
        }
    }

    #[tokio::test]
    async fn primary_failure_falls_back_to_secondary_once() {
        let primary = Arc::new(FailingProvider { calls: AtomicUsize::new(0) });
        let dispatcher = FallbackDispatcher::new(
            Some(primary.clone() as Arc<dyn CompletionService>),
            Arc::new(CannedResponder::new("canned")),
            "You are a helpful customer support assistant.",
        );

        let answer = dispatcher.dispatch("what's up", None).await.expect("answer");

        assert_eq!(answer.text, "canned");
        assert_eq!(answer.responder, Responder::Secondary);
        assert_eq!(primary.calls.load(Ordering::SeqCst), 1, "primary is never retried");
    }

    #[tokio::test]
    async fn both_providers_failing_yields_error_message() {
        let dispatcher = FallbackDispatcher::new(
            Some(Arc::new(FailingProvider { calls: AtomicUsize::new(0) })),
            Arc::new(FailingProvider { calls: AtomicUsize::new(0) }),
            "system",
        );

        assert_eq!(dispatcher.resolve_via_ai("hmm", None).await, ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn panicking_task_yields_error_message() {
        let dispatcher = FallbackDispatcher::new(None, Arc::new(PanickingProvider), "system");

        assert_eq!(dispatcher.resolve_via_ai("hmm", None).await, ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn language_hint_is_appended_to_instruction() {
        let recorder = Arc::new(RecordingProvider::default());
        let dispatcher = FallbackDispatcher::new(
            Some(recorder.clone() as Arc<dyn CompletionService>),
            Arc::new(CannedResponder::default()),
            "You are a helpful customer support assistant.",
        );

        dispatcher.dispatch("hola", Some("es")).await.expect("answer");
        dispatcher.dispatch("hello", None).await.expect("answer");

        let instructions = recorder.instructions.lock().expect("instructions").clone();
        assert_eq!(
            instructions,
            vec![
                "You are a helpful customer support assistant. Respond in es.".to_string(),
                "You are a helpful customer support assistant.".to_string(),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_wins_over_late_completion() {
        let finished = Arc::new(AtomicBool::new(false));
        let dispatcher = FallbackDispatcher::new(
            Some(Arc::new(SlowProvider {
                delay: Duration::from_secs(9),
                finished: Arc::clone(&finished),
            })),
            Arc::new(CannedResponder::default()),
            "system",
        );
        assert_eq!(dispatcher.deadline(), DEFAULT_DEADLINE);

        let started = tokio::time::Instant::now();
        let answer = dispatcher.resolve_via_ai("slow question", None).await;

        assert_eq!(answer, TIMEOUT_MESSAGE);
        assert!(started.elapsed() >= DEFAULT_DEADLINE);
        assert!(started.elapsed() < Duration::from_secs(9));
        assert!(!finished.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(finished.load(Ordering::SeqCst), "abandoned task still runs to completion");
        assert_eq!(answer, TIMEOUT_MESSAGE);
    }

    #[tokio::test(start_paused = true)]
    async fn completion_inside_deadline_is_returned() {
        let dispatcher = FallbackDispatcher::new(
            Some(Arc::new(SlowProvider {
                delay: Duration::from_secs(3),
                finished: Arc::new(AtomicBool::new(false)),
            })),
            Arc::new(CannedResponder::default()),
            "system",
        )
        .with_deadline(Duration::from_secs(5));

        assert_eq!(dispatcher.resolve_via_ai("question", None).await, "late answer");
    }
}
