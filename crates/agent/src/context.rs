use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use helpdesk_core::domain::order::OrderId;
use helpdesk_core::domain::product::ProductId;
use helpdesk_core::domain::query::EntityRef;
use helpdesk_core::domain::ticket::TicketId;

/// Last entity of each kind a user asked about.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub last_order_id: Option<OrderId>,
    pub last_ticket_id: Option<TicketId>,
    pub last_product_id: Option<ProductId>,
}

impl ContextEntry {
    pub fn record(&mut self, entity: &EntityRef) {
        match entity {
            EntityRef::Order(id) => self.last_order_id = Some(id.clone()),
            EntityRef::Ticket(id) => self.last_ticket_id = Some(id.clone()),
            EntityRef::Product(id) => self.last_product_id = Some(id.clone()),
        }
    }

    /// First populated referent in order, ticket, product order.
    pub fn referent(&self) -> Option<EntityRef> {
        self.last_order_id
            .clone()
            .map(EntityRef::Order)
            .or_else(|| self.last_ticket_id.clone().map(EntityRef::Ticket))
            .or_else(|| self.last_product_id.clone().map(EntityRef::Product))
    }
}

/// Per-user conversation memory. Entries are never evicted while the
/// process runs.
#[derive(Debug, Default)]
pub struct ContextStore {
    entries: RwLock<HashMap<String, ContextEntry>>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user_id: &str) -> Option<ContextEntry> {
        let entries = match self.entries.read() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.get(user_id).cloned()
    }

    /// Records `entity` for the user, creating the entry on first write.
    pub fn upsert(&self, user_id: &str, entity: &EntityRef) {
        let mut entries = match self.entries.write() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.entry(user_id.to_string()).or_default().record(entity);
    }

    pub fn len(&self) -> usize {
        match self.entries.read() {
            Ok(entries) => entries.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
