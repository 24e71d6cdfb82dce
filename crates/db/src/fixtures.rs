//! Demo catalogue: the FAQ entries, orders and inventory the helpdesk ships
//! with. Shared by the SQL seeder and [`InMemoryLookupService::seeded`].
//!
//! [`InMemoryLookupService::seeded`]: crate::repositories::InMemoryLookupService::seeded

use chrono::NaiveDate;
use rust_decimal::Decimal;

use helpdesk_core::domain::faq::{faq_match_key, FaqEntry};
use helpdesk_core::domain::order::{OrderDetails, OrderId};
use helpdesk_core::domain::product::{Product, ProductId};

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

pub const SEED_FAQS: &[(&str, &str)] = &[
    ("What is your return policy?", "You can return items within 30 days."),
    ("How do I track my order?", "Go to your account > Orders > Track."),
    ("Do you ship internationally?", "Yes, we ship to most countries worldwide."),
];

#[derive(Debug, Clone, Copy)]
struct SeedOrder {
    id: &'static str,
    status: &'static str,
    customer_name: &'static str,
    items: &'static str,
    total_price_cents: i64,
    shipping_address: &'static str,
    created_at: &'static str,
    tracking_number: Option<&'static str>,
}

const SEED_ORDERS: &[SeedOrder] = &[
    SeedOrder {
        id: "SH123",
        status: "Shipped",
        customer_name: "Alice Smith",
        items: "Widget A x2, Widget B x1",
        total_price_cents: 5999,
        shipping_address: "123 Main St, Springfield",
        created_at: "2026-10-15",
        tracking_number: Some("1Z999AA1234567890"),
    },
    SeedOrder {
        id: "SH124",
        status: "Processing",
        customer_name: "Bob Johnson",
        items: "Widget C x3",
        total_price_cents: 3999,
        shipping_address: "456 Oak Ave, Metropolis",
        created_at: "2026-10-17",
        tracking_number: None,
    },
    SeedOrder {
        id: "SH125",
        status: "Delivered",
        customer_name: "Carol Lee",
        items: "Widget D x1, Widget E x2",
        total_price_cents: 8999,
        shipping_address: "789 Pine Rd, Gotham",
        created_at: "2026-10-13",
        tracking_number: Some("1Z999AA1234567891"),
    },
];

#[derive(Debug, Clone, Copy)]
struct SeedProduct {
    id: &'static str,
    name: &'static str,
    sku: &'static str,
    quantity: i64,
    price_cents: i64,
}

const SEED_PRODUCTS: &[SeedProduct] = &[
    SeedProduct { id: "PROD001", name: "Widget A", sku: "WA-001", quantity: 45, price_cents: 2499 },
    SeedProduct { id: "PROD002", name: "Widget B", sku: "WB-002", quantity: 8, price_cents: 1999 },
    SeedProduct { id: "PROD003", name: "Widget C", sku: "WC-003", quantity: 15, price_cents: 3499 },
];

impl SeedOrder {
    fn to_domain(self) -> Result<OrderDetails, RepositoryError> {
        let created_at = NaiveDate::parse_from_str(self.created_at, "%Y-%m-%d")
            .map_err(|error| RepositoryError::Decode(format!("seed order {}: {error}", self.id)))?;
        Ok(OrderDetails {
            id: OrderId(self.id.to_string()),
            status: self.status.to_string(),
            customer_name: self.customer_name.to_string(),
            items: self.items.to_string(),
            total_price: Decimal::new(self.total_price_cents, 2),
            shipping_address: self.shipping_address.to_string(),
            created_at,
            tracking_number: self.tracking_number.map(str::to_string),
        })
    }
}

impl SeedProduct {
    fn to_domain(self) -> Result<Product, RepositoryError> {
        let quantity = u32::try_from(self.quantity)
            .map_err(|_| RepositoryError::Decode(format!("seed product {}: quantity", self.id)))?;
        Ok(Product {
            id: ProductId(self.id.to_string()),
            name: self.name.to_string(),
            sku: self.sku.to_string(),
            quantity,
            price: Decimal::new(self.price_cents, 2),
        })
    }
}

pub fn seed_faqs() -> Vec<FaqEntry> {
    SEED_FAQS.iter().map(|(question, answer)| FaqEntry::new(*question, *answer)).collect()
}

pub fn seed_orders() -> Result<Vec<OrderDetails>, RepositoryError> {
    SEED_ORDERS.iter().map(|order| order.to_domain()).collect()
}

pub fn seed_products() -> Result<Vec<Product>, RepositoryError> {
    SEED_PRODUCTS.iter().map(|product| product.to_domain()).collect()
}

/// Demo dataset loaded by `helpdesk seed`.
pub struct SupportSeedDataset;

impl SupportSeedDataset {
    /// Inserts the demo rows. Orders and products are upserted; FAQ entries
    /// are only added when their question is not already present, so loading
    /// twice is harmless.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        let mut faqs_inserted = 0;

        for (question, answer) in SEED_FAQS {
            let result = sqlx::query(
                "INSERT INTO faq (question, match_key, answer)
                 SELECT ?1, ?2, ?3
                 WHERE NOT EXISTS (SELECT 1 FROM faq WHERE question = ?1)",
            )
            .bind(*question)
            .bind(faq_match_key(question))
            .bind(*answer)
            .execute(&mut *tx)
            .await?;
            faqs_inserted += result.rows_affected();
        }

        for order in SEED_ORDERS {
            sqlx::query(
                "INSERT INTO orders (
                    id, status, customer_name, items, total_price_cents,
                    shipping_address, created_at, tracking_number
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(id) DO UPDATE SET
                    status = excluded.status,
                    customer_name = excluded.customer_name,
                    items = excluded.items,
                    total_price_cents = excluded.total_price_cents,
                    shipping_address = excluded.shipping_address,
                    created_at = excluded.created_at,
                    tracking_number = excluded.tracking_number",
            )
            .bind(order.id)
            .bind(order.status)
            .bind(order.customer_name)
            .bind(order.items)
            .bind(order.total_price_cents)
            .bind(order.shipping_address)
            .bind(order.created_at)
            .bind(order.tracking_number)
            .execute(&mut *tx)
            .await?;
        }

        for product in SEED_PRODUCTS {
            sqlx::query(
                "INSERT INTO products (id, name, sku, quantity, price_cents)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    sku = excluded.sku,
                    quantity = excluded.quantity,
                    price_cents = excluded.price_cents",
            )
            .bind(product.id)
            .bind(product.name)
            .bind(product.sku)
            .bind(product.quantity)
            .bind(product.price_cents)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(SeedResult {
            faqs_inserted,
            orders_seeded: SEED_ORDERS.iter().map(|order| order.id).collect(),
            products_seeded: SEED_PRODUCTS.iter().map(|product| product.id).collect(),
        })
    }

    /// Checks every seeded row is present.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for (question, _) in SEED_FAQS {
            let present: i64 =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM faq WHERE question = ?1)")
                    .bind(*question)
                    .fetch_one(pool)
                    .await?;
            checks.push((*question, present == 1));
        }

        for order in SEED_ORDERS {
            let present: i64 =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM orders WHERE id = ?1)")
                    .bind(order.id)
                    .fetch_one(pool)
                    .await?;
            checks.push((order.id, present == 1));
        }

        for product in SEED_PRODUCTS {
            let present: i64 =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE id = ?1)")
                    .bind(product.id)
                    .fetch_one(pool)
                    .await?;
            checks.push((product.id, present == 1));
        }

        let all_present = checks.iter().all(|(_, present)| *present);
        Ok(VerificationResult { all_present, checks })
    }

    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;

        for (question, _) in SEED_FAQS {
            sqlx::query("DELETE FROM faq WHERE question = ?1")
                .bind(*question)
                .execute(&mut *tx)
                .await?;
        }
        for order in SEED_ORDERS {
            sqlx::query("DELETE FROM orders WHERE id = ?1").bind(order.id).execute(&mut *tx).await?;
        }
        for product in SEED_PRODUCTS {
            sqlx::query("DELETE FROM products WHERE id = ?1")
                .bind(product.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct SeedResult {
    pub faqs_inserted: u64,
    pub orders_seeded: Vec<&'static str>,
    pub products_seeded: Vec<&'static str>,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}
