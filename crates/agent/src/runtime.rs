//! The resolution pipeline.
//!
//! Stages run in a fixed order (handoff, custom intent, FAQ, entity, pronoun,
//! generative fallback) and the first terminal stage ends the run. Lookup
//! failures are logged and treated as "no answer", so resolving a question
//! never fails.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use helpdesk_core::analytics::{
    META_ELAPSED_MS, META_FAQ_KEY, META_GREETING, META_RESOLVED, RESOLUTION_COMPLETED,
};
use helpdesk_core::audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink, NoopAuditSink};
use helpdesk_core::domain::envelope::ResponseEnvelope;
use helpdesk_core::domain::order::OrderDetails;
use helpdesk_core::domain::product::Product;
use helpdesk_core::domain::query::{EntityRef, Query};
use helpdesk_core::domain::ticket::Ticket;
use helpdesk_core::normalize::{normalize, NormalizedQuery};
use helpdesk_core::services::LookupService;

use crate::context::ContextStore;
use crate::extraction::{IntentExtractor, HANDOFF_ANSWER};
use crate::fallback::FallbackDispatcher;
use crate::pronoun::{PronounResolver, PronounTarget, REFERENT_UNKNOWN_ANSWER};

const PIPELINE_ACTOR: &str = "support-pipeline";

/// Entry point shared by the pipeline and its decorators.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(
        &self,
        question: &str,
        user_id: &str,
        target_lang: Option<&str>,
    ) -> ResponseEnvelope;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Handoff,
    CustomIntent,
    Faq,
    Entity,
    Pronoun,
    Fallback,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Handoff => "handoff",
            Self::CustomIntent => "custom_intent",
            Self::Faq => "faq",
            Self::Entity => "entity",
            Self::Pronoun => "pronoun",
            Self::Fallback => "fallback",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionOutcome {
    Handoff { phrase: String },
    CustomIntent { key: String, answer: String },
    FaqMatch { answer: String },
    OrderResult { order: OrderDetails },
    TicketResult { ticket: Ticket },
    ProductResult { product: Product },
    PronounResolved { answer: String, referent: EntityRef, payload: Option<Value> },
    ReferentUnknown,
    AiFallback { answer: String },
    Unresolved,
}

impl ResolutionOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Handoff { .. } => "handoff",
            Self::CustomIntent { .. } => "custom_intent",
            Self::FaqMatch { .. } => "faq_match",
            Self::OrderResult { .. } => "order_result",
            Self::TicketResult { .. } => "ticket_result",
            Self::ProductResult { .. } => "product_result",
            Self::PronounResolved { .. } => "pronoun_resolved",
            Self::ReferentUnknown => "referent_unknown",
            Self::AiFallback { .. } => "ai_fallback",
            Self::Unresolved => "unresolved",
        }
    }

    /// Answered by a deterministic stage with real content.
    pub fn is_resolved(&self) -> bool {
        matches!(
            self,
            Self::CustomIntent { .. }
                | Self::FaqMatch { .. }
                | Self::OrderResult { .. }
                | Self::TicketResult { .. }
                | Self::ProductResult { .. }
                | Self::PronounResolved { .. }
        )
    }

    pub fn answer(&self) -> String {
        match self {
            Self::Handoff { .. } => HANDOFF_ANSWER.to_string(),
            Self::CustomIntent { answer, .. }
            | Self::FaqMatch { answer }
            | Self::PronounResolved { answer, .. }
            | Self::AiFallback { answer } => answer.clone(),
            Self::OrderResult { order } => order.status_line(),
            Self::TicketResult { ticket } => ticket.summary(),
            Self::ProductResult { product } => product.summary(),
            Self::ReferentUnknown => REFERENT_UNKNOWN_ANSWER.to_string(),
            Self::Unresolved => String::new(),
        }
    }

    pub fn payload(&self) -> Option<Value> {
        match self {
            Self::OrderResult { order } => serde_json::to_value(order).ok(),
            Self::TicketResult { ticket } => serde_json::to_value(ticket).ok(),
            Self::ProductResult { product } => serde_json::to_value(product).ok(),
            Self::PronounResolved { payload, .. } => payload.clone(),
            _ => None,
        }
    }
}

/// Outcome of one run plus the stages that were evaluated to reach it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Resolution {
    pub outcome: ResolutionOutcome,
    pub stages: Vec<Stage>,
    pub correlation_id: String,
}

impl Resolution {
    pub fn final_stage(&self) -> Option<Stage> {
        self.stages.last().copied()
    }

    pub fn into_envelope(self, question: &str, language: &str) -> ResponseEnvelope {
        let handoff = matches!(self.outcome, ResolutionOutcome::Handoff { .. });
        ResponseEnvelope::new(question, self.outcome.answer(), language)
            .with_handoff(handoff)
            .with_payload(self.outcome.payload())
    }
}

enum EntityRecord {
    Order(OrderDetails),
    Ticket(Ticket),
    Product(Product),
}

impl EntityRecord {
    fn status(&self) -> String {
        match self {
            Self::Order(order) => order.status_line(),
            Self::Ticket(ticket) => ticket.summary(),
            Self::Product(product) => product.summary(),
        }
    }

    /// State line that leaves naming the entity to the caller.
    fn current_state(&self) -> String {
        match self {
            Self::Order(order) => order.progress(),
            Self::Ticket(ticket) => ticket.progress(),
            Self::Product(product) => product.availability(),
        }
    }

    fn payload(&self) -> Option<Value> {
        match self {
            Self::Order(order) => serde_json::to_value(order).ok(),
            Self::Ticket(ticket) => serde_json::to_value(ticket).ok(),
            Self::Product(product) => serde_json::to_value(product).ok(),
        }
    }

    fn into_outcome(self) -> ResolutionOutcome {
        match self {
            Self::Order(order) => ResolutionOutcome::OrderResult { order },
            Self::Ticket(ticket) => ResolutionOutcome::TicketResult { ticket },
            Self::Product(product) => ResolutionOutcome::ProductResult { product },
        }
    }
}

pub struct SupportPipeline {
    lookup: Arc<dyn LookupService>,
    context: ContextStore,
    extractor: IntentExtractor,
    pronouns: PronounResolver,
    fallback: FallbackDispatcher,
    audit_sink: Arc<dyn AuditSink>,
    default_language: String,
}

impl SupportPipeline {
    pub fn new(lookup: Arc<dyn LookupService>, fallback: FallbackDispatcher) -> Self {
        Self {
            lookup,
            context: ContextStore::new(),
            extractor: IntentExtractor::new(),
            pronouns: PronounResolver::new(),
            fallback,
            audit_sink: Arc::new(NoopAuditSink),
            default_language: "en".to_string(),
        }
    }

    pub fn with_audit_sink(mut self, audit_sink: Arc<dyn AuditSink>) -> Self {
        self.audit_sink = audit_sink;
        self
    }

    pub fn with_default_language(mut self, language: impl Into<String>) -> Self {
        self.default_language = language.into();
        self
    }

    pub fn context(&self) -> &ContextStore {
        &self.context
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    pub async fn run(&self, query: &Query) -> Resolution {
        let correlation_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        let normalized = normalize(&query.text);

        info!(
            event_name = "pipeline.resolve.start",
            correlation_id = %correlation_id,
            user_id = %query.user_id,
            "resolving support query"
        );

        let mut stages = Vec::new();
        let outcome = self.evaluate(query, &normalized, &mut stages, &correlation_id).await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let resolution = Resolution { outcome, stages, correlation_id };

        self.record(query, &normalized, &resolution, elapsed_ms);
        resolution
    }

    async fn evaluate(
        &self,
        query: &Query,
        normalized: &NormalizedQuery,
        stages: &mut Vec<Stage>,
        correlation_id: &str,
    ) -> ResolutionOutcome {
        stages.push(Stage::Handoff);
        if let Some(phrase) = self.extractor.handoff_phrase(normalized) {
            return ResolutionOutcome::Handoff { phrase: phrase.to_string() };
        }

        stages.push(Stage::CustomIntent);
        if let Some(intent) = self.extractor.custom_intent(normalized) {
            return ResolutionOutcome::CustomIntent {
                key: intent.key.to_string(),
                answer: intent.answer.to_string(),
            };
        }

        stages.push(Stage::Faq);
        match self.lookup.find_faq(&query.text).await {
            Ok(Some(answer)) => return ResolutionOutcome::FaqMatch { answer },
            Ok(None) => {}
            Err(error) => warn!(
                event_name = "pipeline.lookup.failed",
                correlation_id = %correlation_id,
                stage = Stage::Faq.as_str(),
                error = %error,
                "faq lookup failed, treating as no match"
            ),
        }

        stages.push(Stage::Entity);
        if let Some(entity) = self.extractor.entity(&query.text) {
            self.context.upsert(&query.user_id, &entity);
            if let Some(record) = self.find_entity(&entity, correlation_id).await {
                return record.into_outcome();
            }
        }

        if self.extractor.mentions_referent(normalized) {
            stages.push(Stage::Pronoun);
            match self.pronouns.target(&self.context, &query.user_id) {
                PronounTarget::Unknown => return ResolutionOutcome::ReferentUnknown,
                PronounTarget::Referent(referent) => {
                    if let Some(record) = self.find_entity(&referent, correlation_id).await {
                        return ResolutionOutcome::PronounResolved {
                            answer: self.pronouns.annotate(&referent, &record.current_state()),
                            payload: record.payload(),
                            referent,
                        };
                    }
                }
            }
        }

        stages.push(Stage::Fallback);
        let answer =
            self.fallback.resolve_via_ai(&query.text, query.target_lang.as_deref()).await;
        if answer.trim().is_empty() {
            ResolutionOutcome::Unresolved
        } else {
            ResolutionOutcome::AiFallback { answer }
        }
    }

    async fn find_entity(&self, entity: &EntityRef, correlation_id: &str) -> Option<EntityRecord> {
        let found = match entity {
            EntityRef::Order(id) => {
                self.lookup.find_order(id).await.map(|record| record.map(EntityRecord::Order))
            }
            EntityRef::Ticket(id) => {
                self.lookup.find_ticket(id).await.map(|record| record.map(EntityRecord::Ticket))
            }
            EntityRef::Product(id) => {
                self.lookup.find_product(id).await.map(|record| record.map(EntityRecord::Product))
            }
        };

        match found {
            Ok(record) => record,
            Err(error) => {
                warn!(
                    event_name = "pipeline.lookup.failed",
                    correlation_id = %correlation_id,
                    entity = %entity,
                    error = %error,
                    "entity lookup failed, treating as not found"
                );
                None
            }
        }
    }

    fn record(
        &self,
        query: &Query,
        normalized: &NormalizedQuery,
        resolution: &Resolution,
        elapsed_ms: u64,
    ) {
        let outcome = &resolution.outcome;
        let stage = resolution.final_stage().map(|stage| stage.as_str()).unwrap_or("none");
        let greeting = self.extractor.is_greeting(normalized);

        info!(
            event_name = "pipeline.resolve.completed",
            correlation_id = %resolution.correlation_id,
            outcome = outcome.kind(),
            stage,
            elapsed_ms,
            "support query resolved"
        );

        let audit_outcome =
            if outcome.is_resolved() { AuditOutcome::Success } else { AuditOutcome::Degraded };
        let mut event = AuditEvent::new(
            Some(query.user_id.clone()),
            resolution.correlation_id.clone(),
            RESOLUTION_COMPLETED,
            AuditCategory::Resolution,
            PIPELINE_ACTOR,
            audit_outcome,
        )
        .with_metadata("outcome", outcome.kind())
        .with_metadata("stage", stage)
        .with_metadata(META_ELAPSED_MS, elapsed_ms.to_string())
        .with_metadata(META_RESOLVED, outcome.is_resolved().to_string())
        .with_metadata(META_GREETING, greeting.to_string());
        if matches!(outcome, ResolutionOutcome::FaqMatch { .. }) {
            event = event.with_metadata(META_FAQ_KEY, query.text.trim().to_lowercase());
        }

        self.audit_sink.emit(event);
    }
}

#[async_trait]
impl Resolver for SupportPipeline {
    async fn resolve(
        &self,
        question: &str,
        user_id: &str,
        target_lang: Option<&str>,
    ) -> ResponseEnvelope {
        let query = Query::new(question, user_id).with_target_lang(target_lang.map(str::to_string));
        let resolution = self.run(&query).await;

        let language = match (&resolution.outcome, query.target_lang.as_deref()) {
            (ResolutionOutcome::AiFallback { .. }, Some(target)) => target.to_string(),
            _ => self.default_language.clone(),
        };
        resolution.into_envelope(question, &language)
    }
}
