//! Collaborator boundaries consumed by the resolution pipeline.
//!
//! Storage, ticketing, translation and language detection live behind these
//! traits so the pipeline can be exercised against in-memory fakes. Concrete
//! SQL implementations are in `helpdesk-db`; HTTP ones in `helpdesk-agent`.

use async_trait::async_trait;

use crate::domain::order::{OrderDetails, OrderId};
use crate::domain::product::{Product, ProductId};
use crate::domain::ticket::{NewTicket, Ticket, TicketId};
use crate::errors::{LookupError, TicketingError, TranslationError};

#[async_trait]
pub trait LookupService: Send + Sync {
    /// FAQ answer for a question: exact match first, then two distinct keywords.
    async fn find_faq(&self, question: &str) -> Result<Option<String>, LookupError>;
    async fn find_order(&self, id: &OrderId) -> Result<Option<OrderDetails>, LookupError>;
    async fn find_ticket(&self, id: &TicketId) -> Result<Option<Ticket>, LookupError>;
    async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, LookupError>;
}

#[async_trait]
pub trait TicketingService: Send + Sync {
    async fn create(&self, ticket: NewTicket) -> Result<TicketId, TicketingError>;
}

#[async_trait]
pub trait TranslationService: Send + Sync {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String, TranslationError>;
}

#[async_trait]
pub trait LanguageDetector: Send + Sync {
    /// ISO 639-1 code of the text's language.
    async fn detect(&self, text: &str) -> Result<String, TranslationError>;
}
