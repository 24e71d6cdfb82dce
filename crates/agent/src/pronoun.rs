use helpdesk_core::domain::query::EntityRef;

use crate::context::ContextStore;

pub const REFERENT_UNKNOWN_ANSWER: &str = "I'm not sure what \"it\" refers to. Could you \
include the order, ticket or product id?";

/// What "it" points at for a user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PronounTarget {
    Referent(EntityRef),
    Unknown,
}

/// First-match resolution: the most specific populated field wins (order,
/// then ticket, then product) and referents are never merged.
#[derive(Clone, Debug, Default)]
pub struct PronounResolver;

impl PronounResolver {
    pub fn new() -> Self {
        Self
    }

    pub fn target(&self, context: &ContextStore, user_id: &str) -> PronounTarget {
        context
            .get(user_id)
            .and_then(|entry| entry.referent())
            .map(PronounTarget::Referent)
            .unwrap_or(PronounTarget::Unknown)
    }

    /// `state` must not name the entity again; the referent is the prefix.
    pub fn annotate(&self, referent: &EntityRef, state: &str) -> String {
        format!("Regarding {referent}: {state}")
    }
}

#[cfg(test)]
mod tests {
    use helpdesk_core::domain::order::OrderId;
    use helpdesk_core::domain::product::ProductId;
    use helpdesk_core::domain::query::EntityRef;

    use super::{PronounResolver, PronounTarget};
    use crate::context::ContextStore;

    #[test]
    fn unknown_without_context() {
        let resolver = PronounResolver::new();
        assert_eq!(resolver.target(&ContextStore::new(), "u2"), PronounTarget::Unknown);
    }

    #[test]
    fn order_beats_newer_product() {
        let store = ContextStore::new();
        store.upsert("u1", &EntityRef::Order(OrderId("SH123".to_string())));
        store.upsert("u1", &EntityRef::Product(ProductId("PROD001".to_string())));

        let resolver = PronounResolver::new();
        assert_eq!(
            resolver.target(&store, "u1"),
            PronounTarget::Referent(EntityRef::Order(OrderId("SH123".to_string())))
        );
    }

    #[test]
    fn annotation_names_the_referent() {
        let resolver = PronounResolver::new();
        let referent = EntityRef::Order(OrderId("SH123".to_string()));

        assert_eq!(
            resolver.annotate(&referent, "Shipped."),
            "Regarding order SH123: Shipped."
        );
    }
}
