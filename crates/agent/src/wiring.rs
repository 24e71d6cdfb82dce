//! Assembles a [`Resolver`] from application configuration.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use helpdesk_core::audit::AuditSink;
use helpdesk_core::config::AppConfig;
use helpdesk_core::errors::TranslationError;
use helpdesk_core::services::LookupService;

use crate::fallback::FallbackDispatcher;
use crate::llm::{
    CannedResponder, CompletionService, HttpCompletionClient, HttpCompletionConfig, ProviderError,
};
use crate::runtime::{Resolver, SupportPipeline};
use crate::translation::{HttpTranslator, HttpTranslatorConfig, TranslatingPipeline};

#[derive(Debug, Error)]
pub enum WiringError {
    #[error("completion client setup failed: {0}")]
    Provider(#[from] ProviderError),
    #[error("translation client setup failed: {0}")]
    Translation(#[from] TranslationError),
}

pub fn build_dispatcher(config: &AppConfig) -> Result<FallbackDispatcher, WiringError> {
    let primary = match HttpCompletionConfig::from_llm_config(&config.llm) {
        Some(http) => {
            let client: Arc<dyn CompletionService> = Arc::new(HttpCompletionClient::new(http)?);
            Some(client)
        }
        None => None,
    };

    let dispatcher = FallbackDispatcher::new(
        primary,
        Arc::new(CannedResponder::default()),
        config.llm.system_instruction.clone(),
    )
    .with_deadline(Duration::from_secs(config.pipeline.deadline_secs));

    info!(
        event_name = "system.wiring.fallback",
        correlation_id = "bootstrap",
        provider = config.llm.provider.as_str(),
        primary_enabled = dispatcher.has_primary(),
        deadline_secs = config.pipeline.deadline_secs,
        "generative fallback configured"
    );
    Ok(dispatcher)
}

/// The support pipeline, wrapped in translation when it is enabled.
pub fn build_resolver(
    config: &AppConfig,
    lookup: Arc<dyn LookupService>,
    audit_sink: Arc<dyn AuditSink>,
) -> Result<Arc<dyn Resolver>, WiringError> {
    let pipeline = SupportPipeline::new(lookup, build_dispatcher(config)?)
        .with_audit_sink(audit_sink)
        .with_default_language(config.pipeline.default_language.clone());

    let Some(http) = HttpTranslatorConfig::from_translation_config(&config.translation) else {
        return Ok(Arc::new(pipeline));
    };

    let translator = Arc::new(HttpTranslator::new(http)?);
    let mut translating = TranslatingPipeline::new(
        Arc::new(pipeline),
        translator.clone(),
        config.pipeline.default_language.clone(),
    );
    if config.pipeline.auto_detect_language {
        translating = translating.with_detector(translator);
    }

    info!(
        event_name = "system.wiring.translation",
        correlation_id = "bootstrap",
        auto_detect = config.pipeline.auto_detect_language,
        "translation enabled"
    );
    Ok(Arc::new(translating))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use helpdesk_core::audit::NoopAuditSink;
    use helpdesk_core::config::{AppConfig, LlmProvider};
    use helpdesk_core::domain::order::{OrderDetails, OrderId};
    use helpdesk_core::domain::product::{Product, ProductId};
    use helpdesk_core::domain::ticket::{Ticket, TicketId};
    use helpdesk_core::errors::LookupError;
    use helpdesk_core::services::LookupService;

    use super::{build_dispatcher, build_resolver};
    use crate::llm::CANNED_RESPONSE;

    struct EmptyLookup;

    #[async_trait::async_trait]
    impl LookupService for EmptyLookup {
        async fn find_faq(&self, _question: &str) -> Result<Option<String>, LookupError> {
            Ok(None)
        }
        async fn find_order(&self, _id: &OrderId) -> Result<Option<OrderDetails>, LookupError> {
            Ok(None)
        }
        async fn find_ticket(&self, _id: &TicketId) -> Result<Option<Ticket>, LookupError> {
            Ok(None)
        }
        async fn find_product(&self, _id: &ProductId) -> Result<Option<Product>, LookupError> {
            Ok(None)
        }
    }

    fn offline_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.llm.provider = LlmProvider::None;
        config.llm.api_key = None;
        config.pipeline.deadline_secs = 3;
        config
    }

    #[test]
    fn offline_provider_has_no_primary() {
        let dispatcher = build_dispatcher(&offline_config()).expect("dispatcher");
        assert!(!dispatcher.has_primary());
        assert_eq!(dispatcher.deadline().as_secs(), 3);
    }

    #[tokio::test]
    async fn offline_resolver_answers_with_canned_text() {
        let resolver =
            build_resolver(&offline_config(), Arc::new(EmptyLookup), Arc::new(NoopAuditSink))
                .expect("resolver");

        let envelope = resolver.resolve("why is the sky blue", "u1", None).await;
        assert_eq!(envelope.answer, CANNED_RESPONSE);
        assert_eq!(envelope.language, "en");
    }
}
