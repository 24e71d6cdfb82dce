use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub sku: String,
    pub quantity: u32,
    pub price: Decimal,
}

impl Product {
    pub fn in_stock(&self) -> bool {
        self.quantity > 0
    }

    pub fn summary(&self) -> String {
        if self.in_stock() {
            format!(
                "{} ({}): {} in stock at ${}.",
                self.name, self.id, self.quantity, self.price
            )
        } else {
            format!("{} ({}) is currently out of stock.", self.name, self.id)
        }
    }

    /// Stock line without the product id.
    pub fn availability(&self) -> String {
        if self.in_stock() {
            format!("{}, {} in stock at ${}.", self.name, self.quantity, self.price)
        } else {
            format!("{}, currently out of stock.", self.name)
        }
    }
}
