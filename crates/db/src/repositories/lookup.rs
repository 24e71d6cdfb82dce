use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use helpdesk_core::domain::faq::{faq_keywords, faq_match_key, FaqEntry, KeywordTally};
use helpdesk_core::domain::order::{OrderDetails, OrderId};
use helpdesk_core::domain::product::{Product, ProductId};
use helpdesk_core::domain::ticket::{
    Ticket, TicketId, TicketStatus, TICKET_ID_PREFIX, TICKET_NUMBER_OFFSET,
};
use helpdesk_core::errors::LookupError;
use helpdesk_core::services::LookupService;

use super::RepositoryError;
use crate::DbPool;

/// Row counts behind the lookup stages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KnowledgeBaseCounts {
    pub faqs: i64,
    pub orders: i64,
    pub products: i64,
    pub tickets: i64,
}

impl KnowledgeBaseCounts {
    /// Nothing for the FAQ or entity stages to find.
    pub fn is_empty(&self) -> bool {
        self.faqs == 0 && self.orders == 0 && self.products == 0
    }
}

pub async fn knowledge_base_counts(pool: &DbPool) -> Result<KnowledgeBaseCounts, RepositoryError> {
    let (faqs, orders, products, tickets) = sqlx::query_as::<_, (i64, i64, i64, i64)>(
        "SELECT (SELECT COUNT(*) FROM faq), (SELECT COUNT(*) FROM orders),
                (SELECT COUNT(*) FROM products), (SELECT COUNT(*) FROM support_tickets)",
    )
    .fetch_one(pool)
    .await?;
    Ok(KnowledgeBaseCounts { faqs, orders, products, tickets })
}

pub struct SqlLookupService {
    pool: DbPool,
}

impl SqlLookupService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Stores an FAQ entry together with its match key.
    pub async fn insert_faq(&self, entry: &FaqEntry) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO faq (question, match_key, answer) VALUES (?1, ?2, ?3)")
            .bind(&entry.question)
            .bind(faq_match_key(&entry.question))
            .bind(&entry.answer)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn exact_faq(&self, question: &str) -> Result<Option<String>, RepositoryError> {
        let answer = sqlx::query_scalar::<_, String>(
            "SELECT answer FROM faq WHERE match_key = ?1 ORDER BY id LIMIT 1",
        )
        .bind(faq_match_key(question))
        .fetch_optional(&self.pool)
        .await?;
        Ok(answer)
    }

    async fn keyword_faq(&self, question: &str) -> Result<Option<String>, RepositoryError> {
        let mut tally = KeywordTally::default();
        for keyword in faq_keywords(question) {
            let rows = sqlx::query(
                "SELECT id, answer FROM faq WHERE match_key LIKE ?1 ORDER BY id",
            )
            .bind(format!("%{keyword}%"))
            .fetch_all(&self.pool)
            .await?;

            for row in rows {
                let id = row.try_get::<i64, _>("id")?;
                if tally.record(id) {
                    return Ok(Some(row.try_get::<String, _>("answer")?));
                }
            }
        }
        Ok(None)
    }
}

#[async_trait::async_trait]
impl LookupService for SqlLookupService {
    async fn find_faq(&self, question: &str) -> Result<Option<String>, LookupError> {
        if question.trim().is_empty() {
            return Ok(None);
        }
        if let Some(answer) = self.exact_faq(question).await? {
            return Ok(Some(answer));
        }
        Ok(self.keyword_faq(question).await?)
    }

    async fn find_order(&self, id: &OrderId) -> Result<Option<OrderDetails>, LookupError> {
        let row = sqlx::query(
            "SELECT id, status, customer_name, items, total_price_cents, shipping_address,
                    created_at, tracking_number
             FROM orders WHERE id = ?1",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(row.map(|row| order_from_row(&row)).transpose()?)
    }

    async fn find_ticket(&self, id: &TicketId) -> Result<Option<Ticket>, LookupError> {
        let Some(row_id) = ticket_row_id(id) else {
            return Ok(None);
        };

        let row = sqlx::query(
            "SELECT id, email, issue, status, created_at FROM support_tickets WHERE id = ?1",
        )
        .bind(row_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(row.map(|row| ticket_from_row(&row)).transpose()?)
    }

    async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, LookupError> {
        let row = sqlx::query(
            "SELECT id, name, sku, quantity, price_cents FROM products WHERE id = ?1",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(row.map(|row| product_from_row(&row)).transpose()?)
    }
}

/// Row id behind a `TICKET{n}` identifier, if it can exist at all.
pub(crate) fn ticket_row_id(id: &TicketId) -> Option<i64> {
    let number = id.0.strip_prefix(TICKET_ID_PREFIX)?.parse::<i64>().ok()?;
    let row_id = number.checked_sub(TICKET_NUMBER_OFFSET)?;
    (row_id > 0).then_some(row_id)
}

fn order_from_row(row: &SqliteRow) -> Result<OrderDetails, RepositoryError> {
    let id = row.try_get::<String, _>("id")?;
    let created_at_raw = row.try_get::<String, _>("created_at")?;
    let created_at = NaiveDate::parse_from_str(&created_at_raw, "%Y-%m-%d").map_err(|error| {
        RepositoryError::Decode(format!("order {id} has invalid created_at `{created_at_raw}`: {error}"))
    })?;

    Ok(OrderDetails {
        status: row.try_get("status")?,
        customer_name: row.try_get("customer_name")?,
        items: row.try_get("items")?,
        total_price: Decimal::new(row.try_get::<i64, _>("total_price_cents")?, 2),
        shipping_address: row.try_get("shipping_address")?,
        created_at,
        tracking_number: row.try_get("tracking_number")?,
        id: OrderId(id),
    })
}

fn ticket_from_row(row: &SqliteRow) -> Result<Ticket, RepositoryError> {
    let status_raw = row.try_get::<String, _>("status")?;
    let status = status_raw
        .parse::<TicketStatus>()
        .map_err(|error| RepositoryError::Decode(error.to_string()))?;

    Ok(Ticket {
        id: TicketId::from_sequence(row.try_get::<i64, _>("id")?),
        email: row.try_get("email")?,
        issue: row.try_get("issue")?,
        status,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

fn product_from_row(row: &SqliteRow) -> Result<Product, RepositoryError> {
    let id = row.try_get::<String, _>("id")?;
    let quantity = u32::try_from(row.try_get::<i64, _>("quantity")?)
        .map_err(|_| RepositoryError::Decode(format!("product {id} has a negative quantity")))?;

    Ok(Product {
        name: row.try_get("name")?,
        sku: row.try_get("sku")?,
        quantity,
        price: Decimal::new(row.try_get::<i64, _>("price_cents")?, 2),
        id: ProductId(id),
    })
}
