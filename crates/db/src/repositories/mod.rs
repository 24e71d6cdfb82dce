use thiserror::Error;

use helpdesk_core::errors::{LookupError, TicketingError};

pub mod lookup;
pub mod memory;
pub mod ticket;

pub use lookup::{knowledge_base_counts, KnowledgeBaseCounts, SqlLookupService};
pub use memory::{InMemoryLookupService, InMemoryTicketingService};
pub use ticket::SqlTicketingService;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for LookupError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Database(error) => Self::Storage(error.to_string()),
            RepositoryError::Decode(message) => Self::Decode(message),
        }
    }
}

impl From<RepositoryError> for TicketingError {
    fn from(value: RepositoryError) -> Self {
        Self::Storage(value.to_string())
    }
}
