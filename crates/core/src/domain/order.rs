use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Full order record as returned by the lookup service and echoed back to
/// the caller as the structured payload of an order answer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetails {
    pub id: OrderId,
    pub status: String,
    pub customer_name: String,
    pub items: String,
    pub total_price: Decimal,
    pub shipping_address: String,
    pub created_at: NaiveDate,
    pub tracking_number: Option<String>,
}

impl OrderDetails {
    pub fn status_line(&self) -> String {
        format!("Order {}: {}", self.id, self.progress())
    }

    /// Status and tracking without the order id.
    pub fn progress(&self) -> String {
        match &self.tracking_number {
            Some(tracking) => format!("{}. Tracking number: {tracking}.", self.status),
            None => format!("{}.", self.status),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{OrderDetails, OrderId};

    #[test]
    fn status_line_includes_tracking_number_when_shipped() {
        let order = OrderDetails {
            id: OrderId("SH123".to_string()),
            status: "Shipped".to_string(),
            customer_name: "Alice Smith".to_string(),
            items: "Widget A x2".to_string(),
            total_price: Decimal::new(5999, 2),
            shipping_address: "123 Main St, Springfield".to_string(),
            created_at: NaiveDate::from_ymd_opt(2026, 10, 15).expect("valid date"),
            tracking_number: Some("1Z999AA1234567890".to_string()),
        };

        assert_eq!(
            order.status_line(),
            "Order SH123: Shipped. Tracking number: 1Z999AA1234567890."
        );
        assert_eq!(order.progress(), "Shipped. Tracking number: 1Z999AA1234567890.");
    }
}
