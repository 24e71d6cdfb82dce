pub mod analytics;
pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod normalize;
pub mod services;

pub use analytics::{AnalyticsSink, AnalyticsSnapshot, FaqHitCount};
pub use audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink};
pub use domain::envelope::{ResponseEnvelope, DEFAULT_ANSWER};
pub use domain::faq::FaqEntry;
pub use domain::order::{OrderDetails, OrderId};
pub use domain::product::{Product, ProductId};
pub use domain::query::{EntityKind, EntityRef, Query};
pub use domain::ticket::{NewTicket, Ticket, TicketId, TicketStatus};
pub use errors::{
    ApplicationError, DomainError, InterfaceError, LookupError, TicketingError, TranslationError,
};
pub use normalize::{normalize, NormalizedQuery};
pub use services::{LanguageDetector, LookupService, TicketingService, TranslationService};
