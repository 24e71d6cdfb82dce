//! Running conversation statistics, fed from resolution audit events.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::audit::{AuditEvent, AuditSink};

pub const RESOLUTION_COMPLETED: &str = "resolution.completed";

pub const META_RESOLVED: &str = "resolved";
pub const META_ELAPSED_MS: &str = "elapsed_ms";
pub const META_GREETING: &str = "greeting";
pub const META_FAQ_KEY: &str = "faq_key";

const TOP_FAQ_LIMIT: usize = 5;

#[derive(Debug, Default)]
struct AnalyticsState {
    conversation_count: u64,
    faq_hits: HashMap<String, u64>,
    total_queries: u64,
    total_elapsed_ms: u64,
    resolved_queries: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FaqHitCount {
    pub question: String,
    pub hits: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalyticsSnapshot {
    pub conversation_count: u64,
    pub top_faqs: Vec<FaqHitCount>,
    pub total_queries: u64,
    pub avg_response_ms: f64,
    /// Percentage of queries answered by a deterministic stage.
    pub resolution_rate: f64,
}

#[derive(Clone, Default)]
pub struct AnalyticsSink {
    state: Arc<Mutex<AnalyticsState>>,
}

impl AnalyticsSink {
    pub fn snapshot(&self) -> AnalyticsSnapshot {
        let state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };

        let mut top_faqs = state
            .faq_hits
            .iter()
            .map(|(question, hits)| FaqHitCount { question: question.clone(), hits: *hits })
            .collect::<Vec<_>>();
        top_faqs.sort_by(|left, right| {
            right.hits.cmp(&left.hits).then_with(|| left.question.cmp(&right.question))
        });
        top_faqs.truncate(TOP_FAQ_LIMIT);

        let (avg_response_ms, resolution_rate) = if state.total_queries == 0 {
            (0.0, 0.0)
        } else {
            let total = state.total_queries as f64;
            (
                round_two(state.total_elapsed_ms as f64 / total),
                round_two(state.resolved_queries as f64 / total * 100.0),
            )
        };

        AnalyticsSnapshot {
            conversation_count: state.conversation_count,
            top_faqs,
            total_queries: state.total_queries,
            avg_response_ms,
            resolution_rate,
        }
    }
}

impl AuditSink for AnalyticsSink {
    fn emit(&self, event: AuditEvent) {
        if event.event_type != RESOLUTION_COMPLETED {
            return;
        }

        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };

        state.total_queries += 1;
        if event.metadata_value(META_RESOLVED) == Some("true") {
            state.resolved_queries += 1;
        }
        if event.metadata_value(META_GREETING) == Some("true") {
            state.conversation_count += 1;
        }
        if let Some(elapsed) =
            event.metadata_value(META_ELAPSED_MS).and_then(|value| value.parse::<u64>().ok())
        {
            state.total_elapsed_ms = state.total_elapsed_ms.saturating_add(elapsed);
        }
        if let Some(faq_key) = event.metadata_value(META_FAQ_KEY) {
            *state.faq_hits.entry(faq_key.to_string()).or_insert(0) += 1;
        }
    }
}

fn round_two(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
