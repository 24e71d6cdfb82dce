//! Readiness of the answering pipeline: what the lookup stages can see and
//! how the generative fallback and translation are wired.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use helpdesk_agent::{HttpCompletionConfig, HttpTranslatorConfig};
use helpdesk_core::config::AppConfig;
use helpdesk_db::{knowledge_base_counts, DbPool, KnowledgeBaseCounts};
use serde::Serialize;
use tracing::warn;

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
    answering: AnsweringSetup,
}

impl HealthState {
    pub fn new(db_pool: DbPool, config: &AppConfig) -> Self {
        Self { db_pool, answering: AnsweringSetup::from_config(config) }
    }
}

/// How questions that reach the fallback get answered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackMode {
    Model,
    Canned,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AnsweringSetup {
    pub fallback: FallbackMode,
    pub provider: &'static str,
    pub deadline_secs: u64,
    pub default_language: String,
    pub translation_enabled: bool,
    pub auto_detect_language: bool,
}

impl AnsweringSetup {
    pub fn from_config(config: &AppConfig) -> Self {
        let fallback = if HttpCompletionConfig::from_llm_config(&config.llm).is_some() {
            FallbackMode::Model
        } else {
            FallbackMode::Canned
        };
        let translation_enabled =
            HttpTranslatorConfig::from_translation_config(&config.translation).is_some();

        Self {
            fallback,
            provider: config.llm.provider.as_str(),
            deadline_secs: config.pipeline.deadline_secs,
            default_language: config.pipeline.default_language.clone(),
            translation_enabled,
            auto_detect_language: translation_enabled && config.pipeline.auto_detect_language,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeBaseStatus {
    Ready,
    /// Reachable but unseeded: every question ends in the fallback.
    Empty,
    Unreachable,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KnowledgeBaseCheck {
    pub status: KnowledgeBaseStatus,
    pub faqs: i64,
    pub orders: i64,
    pub products: i64,
    pub tickets: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub knowledge_base: KnowledgeBaseCheck,
    pub answering: AnsweringSetup,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

/// 200 while the knowledge base is reachable; `degraded` when it is empty.
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let knowledge_base = knowledge_base_check(&state.db_pool).await;

    let (status_code, status) = match knowledge_base.status {
        KnowledgeBaseStatus::Ready => (StatusCode::OK, "ready"),
        KnowledgeBaseStatus::Empty => (StatusCode::OK, "degraded"),
        KnowledgeBaseStatus::Unreachable => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
    };

    let payload = HealthResponse {
        status,
        knowledge_base,
        answering: state.answering.clone(),
        checked_at: Utc::now().to_rfc3339(),
    };
    (status_code, Json(payload))
}

async fn knowledge_base_check(pool: &DbPool) -> KnowledgeBaseCheck {
    match knowledge_base_counts(pool).await {
        Ok(counts) => {
            let status = if counts.is_empty() {
                KnowledgeBaseStatus::Empty
            } else {
                KnowledgeBaseStatus::Ready
            };
            check_from(status, counts, None)
        }
        Err(error) => {
            warn!(
                event_name = "system.health.knowledge_base_unreachable",
                correlation_id = "health",
                error = %error,
                "knowledge base counts unavailable"
            );
            check_from(
                KnowledgeBaseStatus::Unreachable,
                KnowledgeBaseCounts::default(),
                Some(error.to_string()),
            )
        }
    }
}

fn check_from(
    status: KnowledgeBaseStatus,
    counts: KnowledgeBaseCounts,
    error: Option<String>,
) -> KnowledgeBaseCheck {
    KnowledgeBaseCheck {
        status,
        faqs: counts.faqs,
        orders: counts.orders,
        products: counts.products,
        tickets: counts.tickets,
        error,
    }
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode, Json};
    use helpdesk_core::config::{AppConfig, LlmProvider};
    use helpdesk_db::{connect_with_settings, migrations, DbPool, SupportSeedDataset};
    use secrecy::SecretString;

    use super::{health, FallbackMode, HealthState, KnowledgeBaseStatus};

    fn offline_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.llm.provider = LlmProvider::None;
        config.llm.api_key = None;
        config.translation.enabled = false;
        config
    }

    async fn migrated_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool should connect");
        migrations::run_pending(&pool).await.expect("migrate");
        pool
    }

    #[tokio::test]
    async fn seeded_knowledge_base_is_ready_with_canned_fallback() {
        let pool = migrated_pool().await;
        SupportSeedDataset::load(&pool).await.expect("seed");

        let (status, Json(payload)) =
            health(State(HealthState::new(pool.clone(), &offline_config()))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.knowledge_base.status, KnowledgeBaseStatus::Ready);
        assert_eq!(payload.knowledge_base.faqs, 3);
        assert_eq!(payload.knowledge_base.orders, 3);
        assert_eq!(payload.answering.fallback, FallbackMode::Canned);
        assert_eq!(payload.answering.provider, "none");
        assert!(!payload.answering.translation_enabled);

        pool.close().await;
    }

    #[tokio::test]
    async fn unseeded_knowledge_base_is_degraded() {
        let pool = migrated_pool().await;

        let (status, Json(payload)) =
            health(State(HealthState::new(pool.clone(), &offline_config()))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.knowledge_base.status, KnowledgeBaseStatus::Empty);

        pool.close().await;
    }

    #[tokio::test]
    async fn closed_pool_is_unavailable() {
        let pool = migrated_pool().await;
        pool.close().await;

        let (status, Json(payload)) =
            health(State(HealthState::new(pool, &offline_config()))).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "unavailable");
        assert_eq!(payload.knowledge_base.status, KnowledgeBaseStatus::Unreachable);
        assert!(payload.knowledge_base.error.is_some());
    }

    #[tokio::test]
    async fn configured_model_and_translation_are_reported() {
        let pool = migrated_pool().await;
        let mut config = offline_config();
        config.llm.provider = LlmProvider::OpenAi;
        config.llm.api_key = Some(SecretString::from("sk-test".to_string()));
        config.pipeline.deadline_secs = 5;
        config.pipeline.auto_detect_language = true;
        config.translation.enabled = true;
        config.translation.endpoint = Some("http://localhost:5000".to_string());

        let (_, Json(payload)) = health(State(HealthState::new(pool.clone(), &config))).await;

        assert_eq!(payload.answering.fallback, FallbackMode::Model);
        assert_eq!(payload.answering.deadline_secs, 5);
        assert!(payload.answering.translation_enabled);
        assert!(payload.answering.auto_detect_language);

        pool.close().await;
    }
}
