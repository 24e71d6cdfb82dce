use chrono::Utc;

use helpdesk_core::domain::ticket::{NewTicket, TicketId, TicketStatus};
use helpdesk_core::errors::TicketingError;
use helpdesk_core::services::TicketingService;

use super::RepositoryError;
use crate::DbPool;

pub struct SqlTicketingService {
    pool: DbPool,
}

impl SqlTicketingService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl TicketingService for SqlTicketingService {
    async fn create(&self, ticket: NewTicket) -> Result<TicketId, TicketingError> {
        let result = sqlx::query(
            "INSERT INTO support_tickets (email, issue, status, created_at)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&ticket.email)
        .bind(&ticket.issue)
        .bind(TicketStatus::Open.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(TicketId::from_sequence(result.last_insert_rowid()))
    }
}
