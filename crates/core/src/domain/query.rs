use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::order::OrderId;
use crate::domain::product::ProductId;
use crate::domain::ticket::TicketId;

/// One incoming support question. Immutable for the lifetime of a request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    pub user_id: String,
    pub target_lang: Option<String>,
}

impl Query {
    pub fn new(text: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self { text: text.into(), user_id: user_id.into(), target_lang: None }
    }

    pub fn with_target_lang(mut self, target_lang: Option<String>) -> Self {
        self.target_lang = target_lang.filter(|lang| !lang.trim().is_empty());
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Order,
    Ticket,
    Product,
}

impl EntityKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Order => "order",
            Self::Ticket => "ticket",
            Self::Product => "product",
        }
    }
}

/// An identifier recognised in free text.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EntityRef {
    Order(OrderId),
    Ticket(TicketId),
    Product(ProductId),
}

impl EntityRef {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Order(_) => EntityKind::Order,
            Self::Ticket(_) => EntityKind::Ticket,
            Self::Product(_) => EntityKind::Product,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Order(id) => &id.0,
            Self::Ticket(id) => &id.0,
            Self::Product(id) => &id.0,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind().label(), self.id())
    }
}
