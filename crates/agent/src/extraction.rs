//! Pattern-based recognition of handoff requests, canned intents, greetings
//! and entity identifiers.

use std::sync::LazyLock;

use regex::Regex;

use helpdesk_core::domain::order::OrderId;
use helpdesk_core::domain::product::ProductId;
use helpdesk_core::domain::query::EntityRef;
use helpdesk_core::domain::ticket::TicketId;
use helpdesk_core::normalize::NormalizedQuery;

pub const HANDOFF_ANSWER: &str = "I'm unable to assist further. Please provide your email and \
issue so we can connect you to a human agent.";

pub const HANDOFF_PHRASES: &[&str] = &[
    "speak to a human",
    "talk to a human",
    "real person",
    "human agent",
    "customer service rep",
    "connect me to a human",
    "need a human",
];

/// Matched by substring in table order; the first hit wins.
pub const CUSTOM_INTENTS: &[(&str, &str)] = &[
    ("hello", "Hi there! How can I help you today?"),
    ("can you help", "Absolutely! Please tell me more about your issue."),
    (
        "i need more help",
        "I'm here to assist you. Could you please describe your problem in detail?",
    ),
    ("thank you", "You're welcome! If you have any more questions, feel free to ask."),
    ("thanks", "You're welcome!"),
    ("help", "Sure, I'm here to help. What do you need assistance with?"),
    (
        "who are you",
        "I'm your customer support assistant, here to help you with any questions or issues.",
    ),
    ("i need some help", "I'm happy to help! Please provide more details about your issue."),
    ("how are you", "I'm just a bot, but I'm here to help you! How can I assist you today?"),
    (
        "what can you do",
        "I can answer questions about your orders, our policies, and provide support. How can I help?",
    ),
];

pub const GREETING_TOKENS: &[&str] = &["hello", "hi", "hey"];

/// Token that triggers pronoun resolution.
pub const REFERENT_PRONOUN: &str = "it";

static ENTITY_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b(SH|TICKET|PROD)(\d+)\b").ok());

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CustomIntent {
    pub key: &'static str,
    pub answer: &'static str,
}

#[derive(Clone, Debug, Default)]
pub struct IntentExtractor;

impl IntentExtractor {
    pub fn new() -> Self {
        Self
    }

    /// First handoff phrase contained in the normalized query.
    pub fn handoff_phrase(&self, query: &NormalizedQuery) -> Option<&'static str> {
        HANDOFF_PHRASES.iter().copied().find(|phrase| query.contains_phrase(phrase))
    }

    pub fn custom_intent(&self, query: &NormalizedQuery) -> Option<CustomIntent> {
        CUSTOM_INTENTS
            .iter()
            .find(|(key, _)| query.contains_phrase(key))
            .map(|(key, answer)| CustomIntent { key, answer })
    }

    pub fn is_greeting(&self, query: &NormalizedQuery) -> bool {
        GREETING_TOKENS.iter().any(|token| query.has_token(token))
    }

    pub fn mentions_referent(&self, query: &NormalizedQuery) -> bool {
        query.has_token(REFERENT_PRONOUN)
    }

    /// One identifier from the original text: the first order id if any,
    /// else the first ticket id, else the first product id.
    pub fn entity(&self, text: &str) -> Option<EntityRef> {
        let pattern = ENTITY_PATTERN.as_ref()?;
        let upper = text.to_uppercase();

        let mut ticket = None;
        let mut product = None;
        for captures in pattern.captures_iter(&upper) {
            let (Some(prefix), Some(digits)) = (captures.get(1), captures.get(2)) else {
                continue;
            };
            let id = format!("{}{}", prefix.as_str(), digits.as_str());
            match prefix.as_str() {
                "SH" => return Some(EntityRef::Order(OrderId(id))),
                "TICKET" if ticket.is_none() => ticket = Some(EntityRef::Ticket(TicketId(id))),
                "PROD" if product.is_none() => product = Some(EntityRef::Product(ProductId(id))),
                _ => {}
            }
        }
        ticket.or(product)
    }
}
