use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;

use helpdesk_core::domain::faq::{match_faq, FaqEntry};
use helpdesk_core::domain::order::{OrderDetails, OrderId};
use helpdesk_core::domain::product::{Product, ProductId};
use helpdesk_core::domain::ticket::{NewTicket, Ticket, TicketId, TicketStatus};
use helpdesk_core::errors::{LookupError, TicketingError};
use helpdesk_core::services::{LookupService, TicketingService};

use super::RepositoryError;
use crate::fixtures;

#[derive(Default)]
pub struct InMemoryLookupService {
    faqs: RwLock<Vec<FaqEntry>>,
    orders: RwLock<HashMap<String, OrderDetails>>,
    tickets: RwLock<HashMap<String, Ticket>>,
    products: RwLock<HashMap<String, Product>>,
}

impl InMemoryLookupService {
    /// Lookup preloaded with the demo catalogue.
    pub fn seeded() -> Result<Self, RepositoryError> {
        let orders = fixtures::seed_orders()?
            .into_iter()
            .map(|order| (order.id.0.clone(), order))
            .collect::<HashMap<_, _>>();
        let products = fixtures::seed_products()?
            .into_iter()
            .map(|product| (product.id.0.clone(), product))
            .collect::<HashMap<_, _>>();

        Ok(Self {
            faqs: RwLock::new(fixtures::seed_faqs()),
            orders: RwLock::new(orders),
            tickets: RwLock::new(HashMap::new()),
            products: RwLock::new(products),
        })
    }

    pub async fn insert_faq(&self, entry: FaqEntry) {
        self.faqs.write().await.push(entry);
    }

    pub async fn insert_order(&self, order: OrderDetails) {
        self.orders.write().await.insert(order.id.0.clone(), order);
    }

    pub async fn insert_ticket(&self, ticket: Ticket) {
        self.tickets.write().await.insert(ticket.id.0.clone(), ticket);
    }

    pub async fn insert_product(&self, product: Product) {
        self.products.write().await.insert(product.id.0.clone(), product);
    }
}

#[async_trait::async_trait]
impl LookupService for InMemoryLookupService {
    async fn find_faq(&self, question: &str) -> Result<Option<String>, LookupError> {
        let faqs = self.faqs.read().await;
        Ok(match_faq(&faqs, question).map(|entry| entry.answer.clone()))
    }

    async fn find_order(&self, id: &OrderId) -> Result<Option<OrderDetails>, LookupError> {
        Ok(self.orders.read().await.get(&id.0).cloned())
    }

    async fn find_ticket(&self, id: &TicketId) -> Result<Option<Ticket>, LookupError> {
        Ok(self.tickets.read().await.get(&id.0).cloned())
    }

    async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, LookupError> {
        Ok(self.products.read().await.get(&id.0).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryTicketingService {
    tickets: RwLock<Vec<Ticket>>,
}

impl InMemoryTicketingService {
    pub async fn tickets(&self) -> Vec<Ticket> {
        self.tickets.read().await.clone()
    }
}

#[async_trait::async_trait]
impl TicketingService for InMemoryTicketingService {
    async fn create(&self, ticket: NewTicket) -> Result<TicketId, TicketingError> {
        let mut tickets = self.tickets.write().await;
        let sequence = i64::try_from(tickets.len())
            .map_err(|_| TicketingError::Storage("ticket sequence overflow".to_string()))?
            + 1;
        let id = TicketId::from_sequence(sequence);
        tickets.push(Ticket {
            id: id.clone(),
            email: ticket.email,
            issue: ticket.issue,
            status: TicketStatus::Open,
            created_at: Utc::now(),
        });
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;

    use helpdesk_core::domain::faq::FaqEntry;
    use helpdesk_core::domain::order::{OrderDetails, OrderId};
    use helpdesk_core::domain::product::{Product, ProductId};
    use helpdesk_core::domain::ticket::{NewTicket, Ticket, TicketId, TicketStatus};
    use helpdesk_core::services::{LookupService, TicketingService};

    use crate::repositories::{InMemoryLookupService, InMemoryTicketingService};

    #[tokio::test]
    async fn seeded_lookup_serves_demo_catalogue() {
        let lookup = InMemoryLookupService::seeded().expect("seeded lookup");

        let order = lookup.find_order(&OrderId("SH123".to_string())).await.expect("lookup");
        assert_eq!(order.map(|order| order.status), Some("Shipped".to_string()));

        let product = lookup.find_product(&ProductId("PROD003".to_string())).await.expect("lookup");
        assert_eq!(product.map(|product| product.name), Some("Widget C".to_string()));

        let faq = lookup.find_faq("how do i track my order?").await.expect("lookup");
        assert_eq!(faq.as_deref(), Some("Go to your account > Orders > Track."));
    }

    #[tokio::test]
    async fn inserted_records_are_visible() {
        let lookup = InMemoryLookupService::default();
        lookup.insert_faq(FaqEntry::new("Where is my refund?", "Refunds take 5 days.")).await;
        lookup
            .insert_ticket(Ticket {
                id: TicketId("TICKET1007".to_string()),
                email: "c@example.com".to_string(),
                issue: "late delivery".to_string(),
                status: TicketStatus::InProgress,
                created_at: Utc::now(),
            })
            .await;

        let faq = lookup.find_faq("where is my refund?").await.expect("lookup");
        assert_eq!(faq.as_deref(), Some("Refunds take 5 days."));

        let ticket = lookup.find_ticket(&TicketId("TICKET1007".to_string())).await.expect("lookup");
        assert_eq!(ticket.map(|ticket| ticket.status), Some(TicketStatus::InProgress));
    }

    #[tokio::test]
    async fn inserted_order_and_product_replace_seeded_rows() {
        let lookup = InMemoryLookupService::seeded().expect("seeded lookup");
        lookup
            .insert_order(OrderDetails {
                id: OrderId("SH123".to_string()),
                status: "Delivered".to_string(),
                customer_name: "Alice Smith".to_string(),
                items: "Widget A".to_string(),
                total_price: Decimal::new(2499, 2),
                shipping_address: "1 Main St".to_string(),
                created_at: NaiveDate::from_ymd_opt(2024, 5, 1).expect("date"),
                tracking_number: None,
            })
            .await;
        lookup
            .insert_product(Product {
                id: ProductId("PROD010".to_string()),
                name: "Gadget X".to_string(),
                sku: "GX-010".to_string(),
                quantity: 0,
                price: Decimal::new(999, 2),
            })
            .await;

        let order = lookup.find_order(&OrderId("SH123".to_string())).await.expect("lookup");
        assert_eq!(order.map(|order| order.status), Some("Delivered".to_string()));

        let product = lookup.find_product(&ProductId("PROD010".to_string())).await.expect("lookup");
        assert_eq!(product.map(|product| product.quantity), Some(0));
    }

    #[tokio::test]
    async fn in_memory_ticketing_numbers_from_offset() {
        let ticketing = InMemoryTicketingService::default();

        let id = ticketing
            .create(NewTicket::new("d@example.com", "wrong colour").expect("ticket"))
            .await
            .expect("create");

        assert_eq!(id.0, "TICKET1001");
        assert_eq!(ticketing.tickets().await.len(), 1);
    }
}
