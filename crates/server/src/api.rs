//! Public support API: question answering, ticket intake and usage stats.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use helpdesk_agent::Resolver;
use helpdesk_core::analytics::{AnalyticsSink, FaqHitCount};
use helpdesk_core::audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink};
use helpdesk_core::domain::envelope::ResponseEnvelope;
use helpdesk_core::domain::ticket::NewTicket;
use helpdesk_core::errors::{ApplicationError, InterfaceError};
use helpdesk_core::services::TicketingService;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use uuid::Uuid;

pub const HOME_MESSAGE: &str = "Hello, chatbot backend is running!";
const ANONYMOUS_USER: &str = "anonymous";
const TICKET_ACTOR: &str = "support-ticket-route";

#[derive(Clone)]
pub struct ApiState {
    pub resolver: Arc<dyn Resolver>,
    pub ticketing: Arc<dyn TicketingService>,
    pub analytics: AnalyticsSink,
    pub audit_sink: Arc<dyn AuditSink>,
}

#[derive(Debug, Deserialize)]
pub struct AskParams {
    pub question: String,
    pub user_id: Option<String>,
    pub target_lang: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TicketRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub issue: String,
}

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketCreated {
    pub status: String,
    pub ticket_id: String,
}

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub status: String,
    pub error: String,
    pub detail: String,
    pub correlation_id: String,
}

impl From<&InterfaceError> for ApiError {
    fn from(error: &InterfaceError) -> Self {
        Self {
            status: "error".to_string(),
            error: error.user_message().to_string(),
            detail: error.to_string(),
            correlation_id: error.correlation_id().to_string(),
        }
    }
}

#[derive(Debug, PartialEq, Serialize)]
pub struct HomeResponse {
    pub message: &'static str,
    pub conversation_count: u64,
    pub top_faqs: Vec<FaqHitCount>,
    pub total_queries: u64,
    pub avg_response_ms: f64,
    pub resolution_rate: f64,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/ask", get(ask))
        .route("/support_ticket", post(support_ticket))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn home(State(state): State<ApiState>) -> Json<HomeResponse> {
    let snapshot = state.analytics.snapshot();
    Json(HomeResponse {
        message: HOME_MESSAGE,
        conversation_count: snapshot.conversation_count,
        top_faqs: snapshot.top_faqs,
        total_queries: snapshot.total_queries,
        avg_response_ms: snapshot.avg_response_ms,
        resolution_rate: snapshot.resolution_rate,
    })
}

pub async fn ask(
    State(state): State<ApiState>,
    Query(params): Query<AskParams>,
) -> Json<ResponseEnvelope> {
    let user_id = params
        .user_id
        .as_deref()
        .map(str::trim)
        .filter(|user| !user.is_empty())
        .unwrap_or(ANONYMOUS_USER);
    let target_lang = params.target_lang.as_deref().filter(|lang| !lang.trim().is_empty());

    Json(state.resolver.resolve(&params.question, user_id, target_lang).await)
}

pub async fn support_ticket(
    State(state): State<ApiState>,
    Json(body): Json<TicketRequest>,
) -> Result<Json<TicketCreated>, (StatusCode, Json<ApiError>)> {
    let correlation_id = Uuid::new_v4().to_string();

    let created = match NewTicket::new(&body.email, &body.issue) {
        Ok(ticket) => state.ticketing.create(ticket).await.map_err(ApplicationError::from),
        Err(error) => Err(ApplicationError::from(error)),
    };

    match created {
        Ok(ticket_id) => {
            info!(
                event_name = "api.support_ticket.created",
                correlation_id = %correlation_id,
                ticket_id = %ticket_id,
                "support ticket created"
            );
            state.audit_sink.emit(
                AuditEvent::new(
                    None,
                    correlation_id,
                    "ticket.created",
                    AuditCategory::Ticketing,
                    TICKET_ACTOR,
                    AuditOutcome::Success,
                )
                .with_metadata("ticket_id", ticket_id.0.clone()),
            );
            Ok(Json(TicketCreated { status: "success".to_string(), ticket_id: ticket_id.0 }))
        }
        Err(error) => {
            let interface = error.into_interface(correlation_id);
            warn!(
                event_name = "api.support_ticket.rejected",
                correlation_id = %interface.correlation_id(),
                error = %interface,
                "support ticket rejected"
            );
            Err((status_for(&interface), Json(ApiError::from(&interface))))
        }
    }
}

fn status_for(error: &InterfaceError) -> StatusCode {
    match error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
